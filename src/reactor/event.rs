use crate::audio::VoiceId;
use crate::types::{GalleryItem, GuideStep, NavDirection};
use std::time::Duration;

#[derive(Clone, Debug)]
pub enum Event {
	Session(SessionEvent),
	Gateway(GatewayEvent),
	Guide(GuideEvent),
	Carousel(CarouselEvent),
	Media(MediaEvent),
	Settings(SettingsEvent),
	View(ViewEvent),
}

impl Event {
	pub fn priority(&self) -> Priority {
		match self {
			Event::Session(_) => Priority::High,
			// Cancellation must win over any queued voice notice
			Event::Guide(GuideEvent::Skip) | Event::Guide(GuideEvent::End) => Priority::Critical,
			Event::Guide(_) => Priority::High,
			Event::Gateway(GatewayEvent::LoadError { .. }) => Priority::Critical,
			Event::Gateway(_) => Priority::Normal,
			Event::Carousel(_) => Priority::Normal,
			Event::Media(MediaEvent::Prefetch { .. }) => Priority::Low,
			Event::Media(_) => Priority::Normal,
			Event::Settings(SettingsEvent::AutoTurnAdvance) => Priority::Normal,
			Event::Settings(_) => Priority::Normal,
			Event::View(_) => Priority::Low,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
	Critical = 0,
	High = 1,
	Normal = 2,
	Low = 3,
}

impl Priority {
	pub fn as_index(&self) -> usize {
		*self as usize
	}
}

#[derive(Clone, Debug)]
pub enum SessionEvent {
	Enter,
	Leave,
	Toggle,
	ToggleBgm,
	/// Delayed guide start after entering
	GuideCue { epoch: u64 },
}

#[derive(Clone, Debug)]
pub enum GatewayEvent {
	ReloadGallery,
	LoadError { message: String },
}

#[derive(Clone, Debug)]
pub enum GuideEvent {
	ScriptLoaded { steps: Vec<GuideStep> },
	Start,
	Skip,
	End,
	VoiceStarted { id: VoiceId },
	VoiceEnded { id: VoiceId },
	VoiceFailed { id: VoiceId, reason: String },
	RevealElapsed { epoch: u64 },
}

#[derive(Clone, Debug)]
pub enum CarouselEvent {
	ItemsLoaded { items: Vec<GalleryItem> },
	Navigate { direction: NavDirection },
	Rotate { amount: f32 },
	/// Halfway through a turn, photos are below the floor
	Swap { epoch: u64 },
	TurnComplete { epoch: u64 },
}

#[derive(Clone, Debug)]
pub enum MediaEvent {
	LoadRequest { urls: Vec<String> },
	LoadError { url: String, error: String },
	Prefetch { urls: Vec<String> },
	Clear,
}

#[derive(Clone, Debug)]
pub enum SettingsEvent {
	/// Toggle automatic page turning
	ToggleAutoTurn,
	/// Set auto-turn delay
	SetDelay { duration: Duration },
	/// Adjust auto-turn delay by delta
	AdjustDelay { delta_secs: i64 },
	/// Timer fired, turn the page
	AutoTurnAdvance,
}

#[derive(Clone, Debug)]
pub enum ViewEvent {
	MediaReady { url: String },
	DismissStatus,
}

/// Response from component.handle()
#[derive(Default, Debug)]
pub struct ComponentResponse {
	/// Events to dispatch immediately
	pub events: Vec<Event>,
	/// Events to schedule (event, delay)
	pub scheduled: Vec<(Event, Duration)>,
}

impl ComponentResponse {
	pub fn none() -> Self {
		Self::default()
	}

	pub fn emit(event: Event) -> Self {
		Self {
			events: vec![event],
			scheduled: vec![],
		}
	}

	pub fn emit_many(events: Vec<Event>) -> Self {
		Self {
			events,
			scheduled: vec![],
		}
	}

	pub fn schedule(event: Event, delay: Duration) -> Self {
		Self {
			events: vec![],
			scheduled: vec![(event, delay)],
		}
	}

	/// Fold another response into this one
	pub fn merge(mut self, other: ComponentResponse) -> Self {
		self.events.extend(other.events);
		self.scheduled.extend(other.scheduled);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.events.is_empty() && self.scheduled.is_empty()
	}
}
