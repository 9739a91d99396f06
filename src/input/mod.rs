/// Stick values inside this band are treated as centred
pub const STICK_DEADZONE: f32 = 0.1;

/// Ring rotation per frame at full stick deflection (radians)
pub const ROTATE_SPEED: f32 = 0.05;

/// One frame's worth of controller state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControllerSample {
	pub stick_x: f32,
	pub audio_button: bool,
	pub next_button: bool,
	pub prev_button: bool,
	pub skip_button: bool,
	pub session_button: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
	Rotate(f32),
	ToggleAudio,
	NextPage,
	PrevPage,
	Skip,
	ToggleSession,
}

/// Rising-edge detection for buttons, continuous rotation for the stick
pub fn edges(previous: &ControllerSample, current: &ControllerSample) -> Vec<InputEvent> {
	let mut events = Vec::new();

	if current.stick_x.abs() > STICK_DEADZONE {
		events.push(InputEvent::Rotate(-current.stick_x * ROTATE_SPEED));
	}

	let buttons = [
		(previous.audio_button, current.audio_button, InputEvent::ToggleAudio),
		(previous.next_button, current.next_button, InputEvent::NextPage),
		(previous.prev_button, current.prev_button, InputEvent::PrevPage),
		(previous.skip_button, current.skip_button, InputEvent::Skip),
		(previous.session_button, current.session_button, InputEvent::ToggleSession),
	];
	for (was, is, event) in buttons {
		if is && !was {
			events.push(event);
		}
	}

	events
}

/// Remembers the previous sample between frames
#[derive(Default)]
pub struct InputPort {
	previous: ControllerSample,
}

impl InputPort {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn sample(&mut self, current: ControllerSample) -> Vec<InputEvent> {
		let events = edges(&self.previous, &current);
		self.previous = current;
		events
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_button_fires_on_press_only() {
		let released = ControllerSample::default();
		let pressed = ControllerSample {
			next_button: true,
			..Default::default()
		};

		assert_eq!(edges(&released, &pressed), vec![InputEvent::NextPage]);
		assert!(edges(&pressed, &pressed).is_empty());
		assert!(edges(&pressed, &released).is_empty());
	}

	#[test]
	fn test_stick_respects_deadzone() {
		let idle = ControllerSample::default();
		let nudge = ControllerSample {
			stick_x: 0.05,
			..Default::default()
		};
		let full_right = ControllerSample {
			stick_x: 1.0,
			..Default::default()
		};

		assert!(edges(&idle, &nudge).is_empty());
		assert_eq!(edges(&idle, &full_right), vec![InputEvent::Rotate(-ROTATE_SPEED)]);
		// Held stick keeps rotating
		assert_eq!(edges(&full_right, &full_right), vec![InputEvent::Rotate(-ROTATE_SPEED)]);
	}

	#[test]
	fn test_port_tracks_previous_sample() {
		let mut port = InputPort::new();
		let held = ControllerSample {
			skip_button: true,
			audio_button: true,
			..Default::default()
		};

		let first = port.sample(held);
		let second = port.sample(held);
		let _ = port.sample(ControllerSample::default());
		let third = port.sample(held);

		assert_eq!(first, vec![InputEvent::ToggleAudio, InputEvent::Skip]);
		assert!(second.is_empty());
		assert_eq!(third.len(), 2);
	}
}
