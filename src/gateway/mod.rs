use crate::api::{ContentClient, placeholder_gallery};
use crate::reactor::{CarouselEvent, ComponentResponse, Event, GatewayEvent, GuideEvent};
use crate::types::{GalleryItem, GuideStep};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Message from async tasks back to the component
pub enum GatewayMessage {
	ScriptLoaded(anyhow::Result<Vec<GuideStep>>),
	GalleryLoaded(anyhow::Result<Vec<GalleryItem>>),
}

pub struct ContentGateway {
	client: Arc<ContentClient>,
	sender: mpsc::Sender<GatewayMessage>,
	receiver: mpsc::Receiver<GatewayMessage>,
	gallery_locator: String,
	script_locator: String,
	gallery_pending: bool,
	script_pending: bool,
}

impl ContentGateway {
	pub fn new(client: ContentClient, gallery_locator: String, script_locator: String) -> Self {
		log::info!(
			"Initializing Gateway (gallery='{}', script='{}')",
			gallery_locator,
			script_locator
		);
		let (sender, receiver) = mpsc::channel(16);
		Self {
			client: Arc::new(client),
			sender,
			receiver,
			gallery_locator,
			script_locator,
			gallery_pending: false,
			script_pending: false,
		}
	}

	/// Kick off the startup loads
	pub fn init(&mut self) {
		self.spawn_script_load();
		self.spawn_gallery_load();
	}

	pub fn poll(&mut self) -> ComponentResponse {
		let mut responses = Vec::new();
		while let Ok(msg) = self.receiver.try_recv() {
			match msg {
				GatewayMessage::ScriptLoaded(result) => {
					self.script_pending = false;
					responses.extend(script_events(result));
				}
				GatewayMessage::GalleryLoaded(result) => {
					self.gallery_pending = false;
					responses.extend(gallery_events(result));
				}
			}
		}
		ComponentResponse::emit_many(responses)
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		if let Event::Gateway(GatewayEvent::ReloadGallery) = event {
			if self.gallery_pending {
				log::debug!("ReloadGallery ignored: load already pending");
			} else {
				self.spawn_gallery_load();
			}
		}
		ComponentResponse::none()
	}

	fn spawn_script_load(&mut self) {
		self.script_pending = true;
		let client = self.client.clone();
		let sender = self.sender.clone();
		let locator = self.script_locator.clone();

		tokio::spawn(async move {
			let result = client.load_script(&locator).await;
			let _ = sender.send(GatewayMessage::ScriptLoaded(result)).await;
		});
	}

	fn spawn_gallery_load(&mut self) {
		self.gallery_pending = true;
		let client = self.client.clone();
		let sender = self.sender.clone();
		let locator = self.gallery_locator.clone();

		tokio::spawn(async move {
			let result = client.load_gallery(&locator).await;
			let _ = sender.send(GatewayMessage::GalleryLoaded(result)).await;
		});
	}

	pub fn is_loading(&self) -> bool {
		self.gallery_pending || self.script_pending
	}
}

/// A failed script leaves the guide with no steps
fn script_events(result: anyhow::Result<Vec<GuideStep>>) -> Vec<Event> {
	let steps = match result {
		Ok(steps) => steps,
		Err(e) => {
			log::error!("Guide script unavailable, guide disabled: {:#}", e);
			Vec::new()
		}
	};
	vec![Event::Guide(GuideEvent::ScriptLoaded { steps })]
}

fn gallery_events(result: anyhow::Result<Vec<GalleryItem>>) -> Vec<Event> {
	match result {
		Ok(items) if !items.is_empty() => {
			vec![Event::Carousel(CarouselEvent::ItemsLoaded { items })]
		}
		Ok(_) => {
			log::warn!("Gallery list is empty, using placeholders");
			vec![Event::Carousel(CarouselEvent::ItemsLoaded {
				items: placeholder_gallery(),
			})]
		}
		Err(e) => {
			log::error!("Failed to load gallery, using placeholders: {:#}", e);
			vec![
				Event::Gateway(GatewayEvent::LoadError {
					message: format!("Gallery unavailable: {}", e),
				}),
				Event::Carousel(CarouselEvent::ItemsLoaded {
					items: placeholder_gallery(),
				}),
			]
		}
	}
}
