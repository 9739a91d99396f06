use super::event::Event;
use std::collections::VecDeque;

/// Priority event queue with 4 priority levels
pub struct EventQueue {
	queues: [VecDeque<Event>; 4],
}

impl EventQueue {
	pub fn new() -> Self {
		Self {
			queues: [
				VecDeque::new(), // Critical
				VecDeque::new(), // High
				VecDeque::new(), // Normal
				VecDeque::new(), // Low
			],
		}
	}

	/// Push an event to the appropriate priority queue
	pub fn push(&mut self, event: Event) {
		let priority = event.priority();
		self.queues[priority.as_index()].push_back(event);
	}

	/// Pop the highest priority event available
	pub fn pop(&mut self) -> Option<Event> {
		for queue in &mut self.queues {
			if let Some(event) = queue.pop_front() {
				return Some(event);
			}
		}
		None
	}

	pub fn len(&self) -> usize {
		self.queues.iter().map(VecDeque::len).sum()
	}
}

impl Default for EventQueue {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::reactor::event::{CarouselEvent, GuideEvent, MediaEvent, ViewEvent};
	use crate::types::NavDirection;

	#[test]
	fn test_pop_prefers_higher_priority() {
		// Arrange
		let mut queue = EventQueue::new();
		queue.push(Event::Media(MediaEvent::Prefetch { urls: vec![] }));
		queue.push(Event::Carousel(CarouselEvent::Navigate {
			direction: NavDirection::Next,
		}));
		queue.push(Event::Guide(GuideEvent::Skip));

		// Act
		let first = queue.pop();
		let second = queue.pop();
		let third = queue.pop();

		// Assert
		assert!(matches!(first, Some(Event::Guide(GuideEvent::Skip))));
		assert!(matches!(second, Some(Event::Carousel(_))));
		assert!(matches!(third, Some(Event::Media(MediaEvent::Prefetch { .. }))));
		assert!(queue.pop().is_none());
	}

	#[test]
	fn test_same_priority_is_fifo() {
		let mut queue = EventQueue::new();
		queue.push(Event::View(ViewEvent::MediaReady { url: "a".into() }));
		queue.push(Event::View(ViewEvent::MediaReady { url: "b".into() }));
		assert_eq!(queue.len(), 2);

		match (queue.pop(), queue.pop()) {
			(
				Some(Event::View(ViewEvent::MediaReady { url: first })),
				Some(Event::View(ViewEvent::MediaReady { url: second })),
			) => {
				assert_eq!(first, "a");
				assert_eq!(second, "b");
			}
			other => panic!("unexpected order: {other:?}"),
		}
	}
}
