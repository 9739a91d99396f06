pub mod event;
pub mod queue;
pub mod scheduler;

pub use event::{
	CarouselEvent, ComponentResponse, Event, GatewayEvent, GuideEvent, MediaEvent, SessionEvent,
	SettingsEvent, ViewEvent,
};
pub use queue::EventQueue;
pub use scheduler::Scheduler;

use crate::api::ContentClient;
use crate::audio::AudioOutput;
use crate::carousel::GalleryCarousel;
use crate::gateway::ContentGateway;
use crate::guide::GuideSequencer;
use crate::media::MediaCache;
use crate::session::SessionManager;
use crate::settings::{Settings, SettingsManager};
use crate::view::ViewManager;
use eframe::egui;
use std::sync::Arc;
use std::time::Duration;

/// Events processed per tick before yielding to the renderer
const MAX_ITERATIONS: usize = 1000;

pub struct Reactor {
	queue: EventQueue,
	scheduler: Scheduler,

	pub gateway: ContentGateway,
	pub session: SessionManager,
	pub guide: GuideSequencer,
	pub carousel: GalleryCarousel,
	pub media: MediaCache,
	pub view: ViewManager,
	pub settings: SettingsManager,
}

impl Reactor {
	pub fn new(
		ctx: &egui::Context,
		settings: &Settings,
		output: Arc<dyn AudioOutput>,
	) -> anyhow::Result<Self> {
		log::info!("Initializing all components");
		let mut reactor = Self::assemble(ctx, settings, output)?;

		// Startup loads: guide script and gallery
		reactor.gateway.init();
		log::info!("Initialization complete");

		Ok(reactor)
	}

	fn assemble(
		ctx: &egui::Context,
		settings: &Settings,
		output: Arc<dyn AudioOutput>,
	) -> anyhow::Result<Self> {
		let client = ContentClient::new(settings.content.assets_root.clone())?;
		Ok(Self {
			queue: EventQueue::new(),
			scheduler: Scheduler::new(),
			gateway: ContentGateway::new(
				client,
				settings.content.gallery.clone(),
				settings.content.guide_script.clone(),
			),
			session: SessionManager::new(
				output.clone(),
				settings.audio.bgm.clone(),
				settings.audio.bgm_enabled,
				settings.guide_start_delay(),
			),
			guide: GuideSequencer::new(output, settings.reveal_duration()),
			carousel: GalleryCarousel::new(
				settings.gallery.photos_per_page,
				settings.turn_duration(),
			),
			media: MediaCache::new(ctx, settings.content.assets_root.clone()),
			view: ViewManager::new(),
			settings: SettingsManager::new(settings.auto_turn_delay()),
		})
	}

	fn process_response(&mut self, response: ComponentResponse) {
		for e in response.events {
			self.queue.push(e);
		}
		for (e, d) in response.scheduled {
			self.scheduler.schedule(e, d);
		}
	}

	fn poll_components(&mut self) {
		let gateway_response = self.gateway.poll();
		let media_response = self.media.poll();
		let guide_response = self.guide.poll();
		let session_response = self.session.poll();
		self.process_response(gateway_response);
		self.process_response(media_response);
		self.process_response(guide_response);
		self.process_response(session_response);
	}

	/// Process the event queue until empty
	fn drain(&mut self) {
		let mut iterations = 0;
		while let Some(event) = self.queue.pop() {
			log::trace!("Processing event: {:?}", event);
			let response = self.route(&event);
			self.process_response(response);

			iterations += 1;
			if iterations > MAX_ITERATIONS {
				log::warn!(
					"Event loop exceeded {} iterations, breaking with {} queued",
					MAX_ITERATIONS,
					self.queue.len()
				);
				break;
			}
		}
	}

	pub fn tick(&mut self, ctx: &egui::Context) {
		// Drain scheduled events
		self.scheduler.tick(&mut self.queue);

		// Poll async components
		self.poll_components();

		self.drain();

		// Render
		let events = {
			let session = &self.session;
			let guide = &self.guide;
			let carousel = &self.carousel;
			let gateway = &self.gateway;
			let settings = &self.settings;

			self.view
				.render(ctx, session, guide, carousel, &self.media, gateway, settings)
		};

		// Process any events from rendering immediately
		for event in events {
			log::trace!("Processing render event: {:?}", event);
			let response = self.route(&event);
			self.process_response(response);
		}

		// Timers and voice notices arrive without input, keep frames coming
		if self.scheduler.pending() > 0 || self.guide.is_showing() || self.session.is_active() {
			ctx.request_repaint_after(Duration::from_millis(16));
		}
	}

	fn route(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Session(_) => self.session.handle(event),
			Event::Gateway(GatewayEvent::LoadError { .. }) => self.view.handle(event),
			Event::Gateway(_) => self.gateway.handle(event),
			Event::Guide(_) => self.guide.handle(event),
			Event::Carousel(_) => self.carousel.handle(event),
			Event::Media(MediaEvent::LoadError { .. }) => {
				let media_response = self.media.handle(event);
				media_response.merge(self.view.handle(event))
			}
			Event::Media(MediaEvent::Clear) => {
				let media_response = self.media.handle(event);
				media_response.merge(self.view.handle(event))
			}
			Event::Media(_) => self.media.handle(event),
			Event::Settings(_) => self.settings.handle(event),
			Event::View(_) => self.view.handle(event),
		}
	}
}

impl eframe::App for Reactor {
	fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
		self.tick(ctx);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::audio::testing::FakeOutput;
	use crate::types::{GalleryItem, GuidePhase, GuideStep};
	use std::time::Instant;

	fn reactor(output: &Arc<FakeOutput>) -> Reactor {
		let mut settings = Settings::default();
		settings.audio.bgm = Some("/mp3/bgm.mp3".into());
		Reactor::assemble(&egui::Context::default(), &settings, output.clone()).unwrap()
	}

	fn dispatch(reactor: &mut Reactor, event: Event) {
		reactor.queue.push(event);
		reactor.drain();
	}

	/// Fire every timer due within `after` and process the fallout
	fn advance(reactor: &mut Reactor, after: Duration) {
		reactor
			.scheduler
			.tick_at(Instant::now() + after, &mut reactor.queue);
		reactor.poll_components();
		reactor.drain();
	}

	fn script() -> Vec<GuideStep> {
		vec![
			GuideStep {
				audio: "/mp3/guide1.mp3".into(),
				caption: "Hello".into(),
			},
			GuideStep {
				audio: "/mp3/guide2.mp3".into(),
				caption: "World".into(),
			},
		]
	}

	#[test]
	fn test_entering_session_cues_guide_after_delay() {
		// Arrange
		let output = Arc::new(FakeOutput::default());
		let mut reactor = reactor(&output);
		dispatch(
			&mut reactor,
			Event::Guide(GuideEvent::ScriptLoaded { steps: script() }),
		);

		// Act
		dispatch(&mut reactor, Event::Session(SessionEvent::Enter));
		let before_cue = reactor.guide.phase();
		advance(&mut reactor, Duration::from_millis(200));

		// Assert
		assert_eq!(before_cue, GuidePhase::Idle);
		assert_eq!(reactor.guide.phase(), GuidePhase::Playing { step: 0 });
		assert_eq!(reactor.guide.caption(), "Hello");
		assert_eq!(
			output.opened_locators(),
			vec!["/mp3/bgm.mp3".to_string(), "/mp3/guide1.mp3".to_string()]
		);
	}

	#[test]
	fn test_leaving_before_cue_never_starts_guide() {
		let output = Arc::new(FakeOutput::default());
		let mut reactor = reactor(&output);
		dispatch(
			&mut reactor,
			Event::Guide(GuideEvent::ScriptLoaded { steps: script() }),
		);

		dispatch(&mut reactor, Event::Session(SessionEvent::Enter));
		dispatch(&mut reactor, Event::Session(SessionEvent::Leave));
		advance(&mut reactor, Duration::from_millis(200));

		assert_eq!(reactor.guide.phase(), GuidePhase::Idle);
		assert!(reactor.guide.photos_visible());
	}

	#[test]
	fn test_skip_then_reveal_elapses_to_finished() {
		// Arrange
		let output = Arc::new(FakeOutput::default());
		let mut reactor = reactor(&output);
		dispatch(
			&mut reactor,
			Event::Guide(GuideEvent::ScriptLoaded { steps: script() }),
		);
		dispatch(&mut reactor, Event::Session(SessionEvent::Enter));
		advance(&mut reactor, Duration::from_millis(200));

		// Act
		dispatch(&mut reactor, Event::Guide(GuideEvent::Skip));
		let after_skip = reactor.guide.phase();
		advance(&mut reactor, Duration::from_secs(3));

		// Assert
		assert_eq!(after_skip, GuidePhase::Revealing);
		assert_eq!(reactor.guide.phase(), GuidePhase::Finished);
		assert_eq!(output.live_count(), 0);
	}

	#[test]
	fn test_gallery_items_request_first_page() {
		let output = Arc::new(FakeOutput::default());
		let mut reactor = reactor(&output);
		let items: Vec<GalleryItem> = (0..8)
			.map(|i| GalleryItem {
				image_url: format!("/photos/{}.jpg", i),
				title: format!("Photo {}", i),
			})
			.collect();

		dispatch(&mut reactor, Event::Carousel(CarouselEvent::ItemsLoaded { items }));

		assert_eq!(reactor.carousel.page_count(), 2);
		assert_eq!(reactor.carousel.visible_items().len(), 6);
		// Visible page first, then the prefetched next page
		let pending = reactor.media.pending_urls();
		assert_eq!(pending.first().map(String::as_str), Some("/photos/0.jpg"));
		assert_eq!(pending.len(), 8);
	}

	#[test]
	fn test_gallery_error_reaches_status_line() {
		let output = Arc::new(FakeOutput::default());
		let mut reactor = reactor(&output);

		dispatch(
			&mut reactor,
			Event::Gateway(GatewayEvent::LoadError {
				message: "offline".into(),
			}),
		);

		assert_eq!(reactor.view.status(), Some("offline"));
	}
}
