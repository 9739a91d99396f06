mod rodio_output;

pub use rodio_output::{RodioOutput, open_output_stream};

use std::sync::mpsc;
use thiserror::Error;

/// Identifies one opened voice for the lifetime of its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub enum NoticeKind {
	Started,
	Ended,
	Failed(String),
}

/// Lifecycle notification sent by a voice to its owner
#[derive(Debug, Clone)]
pub struct VoiceNotice {
	pub id: VoiceId,
	pub kind: NoticeKind,
}

#[derive(Debug, Clone)]
pub struct VoiceRequest {
	pub id: VoiceId,
	pub locator: String,
	pub looping: bool,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
	#[error("no audio output device")]
	NoDevice,
	#[error("audio resource unavailable: {0}")]
	Unavailable(String),
	#[error("playback rejected: {0}")]
	Rejected(String),
}

/// A playable clip. After `stop` returns the voice must not send any
/// further notice.
pub trait Voice: Send {
	fn play(&mut self);
	fn stop(&mut self);
}

pub trait AudioOutput: Send + Sync {
	fn open(
		&self,
		request: VoiceRequest,
		notices: mpsc::Sender<VoiceNotice>,
	) -> Result<Box<dyn Voice>, AudioError>;
}

/// Exclusive owner of one voice. Releasing or dropping it stops and
/// detaches the voice.
pub struct VoiceHandle {
	id: VoiceId,
	voice: Option<Box<dyn Voice>>,
}

impl VoiceHandle {
	pub fn new(id: VoiceId, voice: Box<dyn Voice>) -> Self {
		Self {
			id,
			voice: Some(voice),
		}
	}

	pub fn id(&self) -> VoiceId {
		self.id
	}

	pub fn play(&mut self) {
		if let Some(voice) = self.voice.as_mut() {
			voice.play();
		}
	}

	pub fn release(mut self) {
		self.detach();
	}

	fn detach(&mut self) {
		if let Some(mut voice) = self.voice.take() {
			log::debug!("[Audio] Releasing voice {:?}", self.id);
			voice.stop();
		}
	}
}

impl Drop for VoiceHandle {
	fn drop(&mut self) {
		self.detach();
	}
}

/// Output used when no device could be opened
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
	fn open(
		&self,
		_request: VoiceRequest,
		_notices: mpsc::Sender<VoiceNotice>,
	) -> Result<Box<dyn Voice>, AudioError> {
		Err(AudioError::NoDevice)
	}
}


#[cfg(test)]
mod tests {
	use super::testing::FakeOutput;
	use super::*;

	#[test]
	fn test_dropping_handle_stops_voice() {
		let output = FakeOutput::default();
		let (tx, _rx) = mpsc::channel();
		let voice = output
			.open(
				VoiceRequest {
					id: VoiceId(7),
					locator: "a.mp3".into(),
					looping: false,
				},
				tx,
			)
			.unwrap();
		let handle = VoiceHandle::new(VoiceId(7), voice);
		assert_eq!(output.live_count(), 1);

		drop(handle);

		assert_eq!(output.live_count(), 0);
		assert_eq!(output.stopped(), vec![VoiceId(7)]);
	}

	#[test]
	fn test_release_stops_exactly_once() {
		let output = FakeOutput::default();
		let (tx, _rx) = mpsc::channel();
		let request = VoiceRequest {
			id: VoiceId(1),
			locator: "a.mp3".into(),
			looping: false,
		};
		let handle = VoiceHandle::new(VoiceId(1), output.open(request, tx).unwrap());

		handle.release();

		assert_eq!(output.stopped(), vec![VoiceId(1)]);
	}

	#[test]
	fn test_silent_output_has_no_device() {
		let (tx, _rx) = mpsc::channel();
		let result = SilentOutput.open(
			VoiceRequest {
				id: VoiceId(1),
				locator: "a.mp3".into(),
				looping: false,
			},
			tx,
		);
		assert!(matches!(result, Err(AudioError::NoDevice)));
	}
}
