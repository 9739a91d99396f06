use crate::reactor::{CarouselEvent, ComponentResponse, Event, MediaEvent};
use crate::types::{GalleryItem, NavDirection, ease_out_cubic};
use std::collections::VecDeque;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

/// Page requests arriving mid-turn beyond this are dropped
pub const MAX_QUEUED: usize = 8;

/// Where a photo sits on the ring around the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSlot {
	pub angle: f32,
	/// -1.0 (left) ..= 1.0 (right)
	pub x: f32,
	/// 0.0 (behind the viewer) ..= 1.0 (straight ahead)
	pub depth: f32,
}

/// Page appearance during a turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePose {
	pub opacity: f32,
	/// 0.0 on the floor line, 1.0 fully sunk
	pub sink: f32,
}

impl PagePose {
	pub const REST: PagePose = PagePose {
		opacity: 1.0,
		sink: 0.0,
	};
}

struct Turn {
	started: Instant,
	epoch: u64,
}

/// Pages the gallery `per_page` photos at a time with a sink/rise turn.
pub struct GalleryCarousel {
	items: Vec<GalleryItem>,
	per_page: usize,
	turn_duration: Duration,
	target_page: usize,
	display_page: usize,
	turn: Option<Turn>,
	queued: VecDeque<NavDirection>,
	epoch: u64,
	rotation: f32,
}

impl GalleryCarousel {
	pub fn new(per_page: usize, turn_duration: Duration) -> Self {
		log::info!("[Carousel] Initializing ({} per page, turn {:?})", per_page, turn_duration);
		Self {
			items: Vec::new(),
			per_page: per_page.max(1),
			turn_duration,
			target_page: 0,
			display_page: 0,
			turn: None,
			queued: VecDeque::new(),
			epoch: 0,
			rotation: 0.0,
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Carousel(CarouselEvent::ItemsLoaded { items }) => {
				log::info!("[Carousel] {} photos, {} pages", items.len(), self.page_count_for(items.len()));
				self.items = items.clone();
				self.target_page = 0;
				self.display_page = 0;
				self.turn = None;
				self.queued.clear();
				self.epoch += 1;
				self.emit_page_requests()
			}
			Event::Carousel(CarouselEvent::Navigate { direction }) => {
				if self.page_count() <= 1 {
					log::debug!("[Carousel] Navigate ignored: single page");
					return ComponentResponse::none();
				}
				if self.turn.is_some() {
					if self.queued.len() < MAX_QUEUED {
						self.queued.push_back(*direction);
						log::debug!("[Carousel] Queued {:?} ({} waiting)", direction, self.queued.len());
					} else {
						log::debug!("[Carousel] Queue full, dropping {:?}", direction);
					}
					return ComponentResponse::none();
				}
				self.start_turn(*direction)
			}
			Event::Carousel(CarouselEvent::Swap { epoch }) => {
				if !self.owns(*epoch) {
					return ComponentResponse::none();
				}
				log::debug!("[Carousel] Swap page {} -> {}", self.display_page, self.target_page);
				self.display_page = self.target_page;
				self.emit_page_requests()
			}
			Event::Carousel(CarouselEvent::TurnComplete { epoch }) => {
				if !self.owns(*epoch) {
					return ComponentResponse::none();
				}
				self.turn = None;
				match self.queued.pop_front() {
					Some(direction) => {
						log::debug!("[Carousel] Dequeued {:?} ({} left)", direction, self.queued.len());
						self.start_turn(direction)
					}
					None => ComponentResponse::none(),
				}
			}
			Event::Carousel(CarouselEvent::Rotate { amount }) => {
				self.rotation = (self.rotation + amount).rem_euclid(TAU);
				ComponentResponse::none()
			}
			_ => ComponentResponse::none(),
		}
	}

	fn start_turn(&mut self, direction: NavDirection) -> ComponentResponse {
		let pages = self.page_count();
		let old = self.target_page;
		self.target_page = match direction {
			NavDirection::Next => (self.target_page + 1) % pages,
			NavDirection::Prev => (self.target_page + pages - 1) % pages,
		};
		log::info!("[Carousel] Turn {:?}: {} -> {} (of {})", direction, old, self.target_page, pages);

		self.epoch += 1;
		self.turn = Some(Turn {
			started: Instant::now(),
			epoch: self.epoch,
		});

		let mut response = ComponentResponse::schedule(
			Event::Carousel(CarouselEvent::Swap { epoch: self.epoch }),
			self.turn_duration / 2,
		);
		response.scheduled.push((
			Event::Carousel(CarouselEvent::TurnComplete { epoch: self.epoch }),
			self.turn_duration,
		));
		// Warm the incoming page while the current one sinks
		response.events.push(Event::Media(MediaEvent::Prefetch {
			urls: self.page_urls(self.target_page),
		}));
		response
	}

	fn owns(&self, epoch: u64) -> bool {
		self.turn.as_ref().map(|t| t.epoch == epoch).unwrap_or(false)
	}

	fn emit_page_requests(&self) -> ComponentResponse {
		let mut events = Vec::new();
		let visible = self.page_urls(self.display_page);
		if !visible.is_empty() {
			events.push(Event::Media(MediaEvent::LoadRequest { urls: visible }));
		}
		let pages = self.page_count();
		if pages > 1 {
			let upcoming = self.page_urls((self.display_page + 1) % pages);
			events.push(Event::Media(MediaEvent::Prefetch { urls: upcoming }));
		}
		ComponentResponse::emit_many(events)
	}

	fn page_urls(&self, page: usize) -> Vec<String> {
		self.page_items(page)
			.iter()
			.map(|item| item.image_url.clone())
			.collect()
	}

	fn page_items(&self, page: usize) -> &[GalleryItem] {
		let start = (page * self.per_page).min(self.items.len());
		let end = (start + self.per_page).min(self.items.len());
		&self.items[start..end]
	}

	fn page_count_for(&self, len: usize) -> usize {
		len.div_ceil(self.per_page)
	}

	// Accessors for ViewManager
	pub fn page_count(&self) -> usize {
		self.page_count_for(self.items.len())
	}

	/// Page the user asked for (shown in the page label)
	pub fn current_page(&self) -> usize {
		self.target_page
	}

	pub fn visible_items(&self) -> &[GalleryItem] {
		self.page_items(self.display_page)
	}

	pub fn rotation(&self) -> f32 {
		self.rotation
	}

	pub fn queued(&self) -> usize {
		self.queued.len()
	}

	pub fn is_turning(&self) -> bool {
		self.turn.is_some()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn pose(&self) -> PagePose {
		match &self.turn {
			Some(turn) => {
				let total = self.turn_duration.as_secs_f32();
				if total <= 0.0 {
					return PagePose::REST;
				}
				turn_pose(turn.started.elapsed().as_secs_f32() / total)
			}
			None => PagePose::REST,
		}
	}
}

/// Sink and fade out over the first half, rise and fade in over the second
pub fn turn_pose(progress: f32) -> PagePose {
	let progress = progress.clamp(0.0, 1.0);
	if progress < 0.5 {
		let t = ease_out_cubic(progress * 2.0);
		PagePose {
			opacity: 1.0 - t,
			sink: t,
		}
	} else {
		let t = ease_out_cubic((progress - 0.5) * 2.0);
		PagePose {
			opacity: t,
			sink: 1.0 - t,
		}
	}
}

/// Evenly spaced slots around the viewer, offset by `rotation`
pub fn ring_layout(count: usize, rotation: f32) -> Vec<RingSlot> {
	(0..count)
		.map(|i| {
			let angle = (i as f32 * TAU / count as f32 + rotation).rem_euclid(TAU);
			RingSlot {
				angle,
				x: angle.sin(),
				depth: (angle.cos() + 1.0) * 0.5,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	const TURN: Duration = Duration::from_secs(2);

	fn items(n: usize) -> Vec<GalleryItem> {
		(1..=n)
			.map(|i| GalleryItem {
				image_url: format!("/images/photo{:02}.jpg", i),
				title: format!("作品 {:02}", i),
			})
			.collect()
	}

	fn loaded(n: usize) -> GalleryCarousel {
		let mut carousel = GalleryCarousel::new(6, TURN);
		carousel.handle(&Event::Carousel(CarouselEvent::ItemsLoaded { items: items(n) }));
		carousel
	}

	fn navigate(carousel: &mut GalleryCarousel, direction: NavDirection) -> ComponentResponse {
		carousel.handle(&Event::Carousel(CarouselEvent::Navigate { direction }))
	}

	fn turn_epochs(response: &ComponentResponse) -> (u64, u64) {
		match response.scheduled.as_slice() {
			[
				(Event::Carousel(CarouselEvent::Swap { epoch: swap }), half),
				(Event::Carousel(CarouselEvent::TurnComplete { epoch: done }), full),
			] => {
				assert_eq!(*half, TURN / 2);
				assert_eq!(*full, TURN);
				(*swap, *done)
			}
			other => panic!("expected swap + complete timers, got {other:?}"),
		}
	}

	#[test]
	fn test_items_loaded_shows_first_page_and_requests_media() {
		// Arrange
		let mut carousel = GalleryCarousel::new(6, TURN);

		// Act
		let response =
			carousel.handle(&Event::Carousel(CarouselEvent::ItemsLoaded { items: items(16) }));

		// Assert
		assert_eq!(carousel.page_count(), 3);
		assert_eq!(carousel.visible_items().len(), 6);
		match response.events.as_slice() {
			[
				Event::Media(MediaEvent::LoadRequest { urls: visible }),
				Event::Media(MediaEvent::Prefetch { urls: upcoming }),
			] => {
				assert_eq!(visible[0], "/images/photo01.jpg");
				assert_eq!(upcoming[0], "/images/photo07.jpg");
			}
			other => panic!("unexpected events: {other:?}"),
		}
	}

	#[test]
	fn test_turn_swaps_at_half_and_completes() {
		// Arrange
		let mut carousel = loaded(16);

		// Act
		let response = navigate(&mut carousel, NavDirection::Next);
		let (swap, done) = turn_epochs(&response);

		// Assert: target changes now, displayed page at the swap
		assert_eq!(carousel.current_page(), 1);
		assert_eq!(carousel.visible_items()[0].title, "作品 01");
		carousel.handle(&Event::Carousel(CarouselEvent::Swap { epoch: swap }));
		assert_eq!(carousel.visible_items()[0].title, "作品 07");
		carousel.handle(&Event::Carousel(CarouselEvent::TurnComplete { epoch: done }));
		assert!(!carousel.is_turning());
	}

	#[test]
	fn test_prev_from_first_page_wraps_to_last() {
		let mut carousel = loaded(16);

		let (swap, _) = turn_epochs(&navigate(&mut carousel, NavDirection::Prev));
		carousel.handle(&Event::Carousel(CarouselEvent::Swap { epoch: swap }));

		assert_eq!(carousel.current_page(), 2);
		assert_eq!(carousel.visible_items()[0].title, "作品 13");
	}

	#[test]
	fn test_requests_during_turn_are_queued_then_replayed() {
		// Arrange
		let mut carousel = loaded(16);
		let (_, first_done) = turn_epochs(&navigate(&mut carousel, NavDirection::Next));
		navigate(&mut carousel, NavDirection::Next);
		navigate(&mut carousel, NavDirection::Next);
		assert_eq!(carousel.queued(), 2);

		// Act
		let response =
			carousel.handle(&Event::Carousel(CarouselEvent::TurnComplete { epoch: first_done }));

		// Assert
		let (swap, _) = turn_epochs(&response);
		assert_eq!(carousel.current_page(), 2);
		assert_eq!(carousel.queued(), 1);
		carousel.handle(&Event::Carousel(CarouselEvent::Swap { epoch: swap }));
		assert_eq!(carousel.visible_items().len(), 4);
	}

	#[test]
	fn test_queue_is_bounded() {
		let mut carousel = loaded(16);
		navigate(&mut carousel, NavDirection::Next);

		for _ in 0..(MAX_QUEUED + 5) {
			navigate(&mut carousel, NavDirection::Next);
		}

		assert_eq!(carousel.queued(), MAX_QUEUED);
	}

	#[test]
	fn test_reload_invalidates_inflight_turn() {
		let mut carousel = loaded(16);
		let (swap, done) = turn_epochs(&navigate(&mut carousel, NavDirection::Next));
		navigate(&mut carousel, NavDirection::Next);

		carousel.handle(&Event::Carousel(CarouselEvent::ItemsLoaded { items: items(12) }));
		carousel.handle(&Event::Carousel(CarouselEvent::Swap { epoch: swap }));
		let response = carousel.handle(&Event::Carousel(CarouselEvent::TurnComplete { epoch: done }));

		assert!(response.is_empty());
		assert_eq!(carousel.current_page(), 0);
		assert_eq!(carousel.visible_items()[0].title, "作品 01");
		assert_eq!(carousel.queued(), 0);
	}

	#[test]
	fn test_single_page_ignores_navigation() {
		let mut carousel = loaded(6);

		let response = navigate(&mut carousel, NavDirection::Next);

		assert!(response.is_empty());
		assert!(!carousel.is_turning());
	}

	#[test]
	fn test_rotation_wraps() {
		let mut carousel = loaded(6);
		carousel.handle(&Event::Carousel(CarouselEvent::Rotate { amount: -0.5 }));
		assert!((carousel.rotation() - (TAU - 0.5)).abs() < 1e-5);
	}

	#[test]
	fn test_turn_pose_sinks_then_rises() {
		assert_eq!(turn_pose(0.0), PagePose::REST);
		let bottom = turn_pose(0.5);
		assert!(bottom.opacity.abs() < 1e-6);
		assert!((bottom.sink - 1.0).abs() < 1e-6);
		let end = turn_pose(1.0);
		assert!((end.opacity - 1.0).abs() < 1e-6);
		assert!(end.sink.abs() < 1e-6);
		assert!(turn_pose(0.25).opacity < 1.0);
	}

	#[test]
	fn test_ring_layout_spreads_evenly() {
		let slots = ring_layout(4, 0.0);

		assert_eq!(slots.len(), 4);
		assert!((slots[0].depth - 1.0).abs() < 1e-6);
		assert!((slots[1].x - 1.0).abs() < 1e-6);
		assert!(slots[2].depth.abs() < 1e-6);
		assert!(ring_layout(0, 1.0).is_empty());
	}
}
