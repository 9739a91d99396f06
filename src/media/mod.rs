use crate::reactor::{ComponentResponse, Event, MediaEvent, ViewEvent};
use crate::types::LoadedMedia;
use eframe::egui;
use indexmap::{IndexMap, IndexSet};
use std::collections::VecDeque;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Concurrent downloads
const MAX_IN_FLIGHT: usize = 2;

pub enum MediaMessage {
	ImageLoaded {
		url: String,
		result: Result<egui::ColorImage, String>,
	},
}

/// Texture cache keyed by URL. Entries live until `Clear`.
pub struct MediaCache {
	cache: IndexMap<String, LoadedMedia>,
	failed: IndexSet<String>,
	loading_set: IndexSet<String>,
	pending: VecDeque<String>,
	wanted: IndexSet<String>,
	sender: mpsc::Sender<MediaMessage>,
	receiver: mpsc::Receiver<MediaMessage>,
	assets_root: PathBuf,
	egui_ctx: egui::Context,
}

impl MediaCache {
	pub fn new(ctx: &egui::Context, assets_root: PathBuf) -> Self {
		log::info!("[Media] Initializing");
		let (sender, receiver) = mpsc::channel(100);
		Self {
			cache: IndexMap::new(),
			failed: IndexSet::new(),
			loading_set: IndexSet::new(),
			pending: VecDeque::new(),
			wanted: IndexSet::new(),
			sender,
			receiver,
			assets_root,
			egui_ctx: ctx.clone(),
		}
	}

	pub fn poll(&mut self) -> ComponentResponse {
		let mut responses = Vec::new();
		while let Ok(msg) = self.receiver.try_recv() {
			match msg {
				MediaMessage::ImageLoaded { url, result } => {
					if !self.loading_set.shift_remove(&url) {
						// Cleared while in flight
						continue;
					}
					match result {
						Ok(color_image) => {
							log::info!("[Media] Image loaded: {}", url);
							let texture = self.egui_ctx.load_texture(
								&url,
								color_image,
								egui::TextureOptions::LINEAR,
							);
							self.cache.insert(url.clone(), LoadedMedia::Image { texture });
							if self.wanted.contains(&url) {
								responses.push(Event::View(ViewEvent::MediaReady { url }));
							}
						}
						Err(error) => {
							log::error!("[Media] Image load failed: {} - {}", url, error);
							self.failed.insert(url.clone());
							responses.push(Event::Media(MediaEvent::LoadError { url, error }));
						}
					}
				}
			}
		}

		while self.loading_set.len() < MAX_IN_FLIGHT {
			match self.pending.pop_front() {
				Some(url) => self.start_load(url),
				None => break,
			}
		}

		ComponentResponse::emit_many(responses)
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Media(MediaEvent::LoadRequest { urls }) => {
				log::debug!("[Media] LoadRequest for {} URLs", urls.len());
				self.wanted = urls.iter().cloned().collect();
				// Visible photos jump the prefetch queue, in page order
				for url in urls.iter().rev() {
					self.enqueue(url, true);
				}
			}
			Event::Media(MediaEvent::Prefetch { urls }) => {
				log::debug!("[Media] Prefetch requested for {} URLs", urls.len());
				for url in urls {
					self.enqueue(url, false);
				}
			}
			Event::Media(MediaEvent::Clear) => {
				log::info!("[Media] Clearing {} cached textures", self.cache.len());
				self.cache.clear();
				self.failed.clear();
				self.pending.clear();
				self.loading_set.clear();
			}
			_ => {}
		}
		ComponentResponse::none()
	}

	fn enqueue(&mut self, url: &str, front: bool) {
		if self.cache.contains_key(url)
			|| self.loading_set.contains(url)
			|| self.failed.contains(url)
		{
			return;
		}
		if let Some(pos) = self.pending.iter().position(|u| u == url) {
			if !front {
				return;
			}
			self.pending.remove(pos);
		}
		if front {
			self.pending.push_front(url.to_string());
		} else {
			self.pending.push_back(url.to_string());
		}
	}

	fn start_load(&mut self, url: String) {
		self.loading_set.insert(url.clone());
		log::debug!("[Media] Spawning async image load: {}", url);
		let sender = self.sender.clone();
		let ctx = self.egui_ctx.clone();
		let root = self.assets_root.clone();

		tokio::spawn(async move {
			let result = async {
				let bytes = if url.starts_with("http://") || url.starts_with("https://") {
					let resp = reqwest::get(&url).await?;
					if !resp.status().is_success() {
						anyhow::bail!("HTTP Status: {}", resp.status());
					}
					resp.bytes().await?.to_vec()
				} else {
					tokio::fs::read(root.join(url.trim_start_matches('/'))).await?
				};
				let img = image::load_from_memory(&bytes)?;
				let size = [img.width() as usize, img.height() as usize];
				let img_buffer = img.to_rgba8();
				let pixels = img_buffer.as_flat_samples();
				let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
				Ok::<_, anyhow::Error>(color_image)
			}
			.await;

			let _ = sender
				.send(MediaMessage::ImageLoaded {
					url,
					result: result.map_err(|e| e.to_string()),
				})
				.await;
			ctx.request_repaint();
		});
	}

	pub fn get_media(&self, url: &str) -> Option<&LoadedMedia> {
		self.cache.get(url)
	}

	pub fn has_failed(&self, url: &str) -> bool {
		self.failed.contains(url)
	}

	pub fn is_loading(&self) -> bool {
		!self.loading_set.is_empty() || !self.pending.is_empty()
	}

	pub fn pending_urls(&self) -> Vec<String> {
		self.pending.iter().cloned().collect()
	}
}
