use super::{AudioError, AudioOutput, NoticeKind, Voice, VoiceNotice, VoiceRequest};
use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

/// Open the output stream on a named device, falling back to the default.
/// The returned stream must stay alive on the calling thread.
pub fn open_output_stream(device_name: Option<&str>) -> Option<(OutputStream, OutputStreamHandle)> {
	let host = cpal::default_host();

	if let Some(name) = device_name {
		match host.output_devices() {
			Ok(devices) => {
				for device in devices {
					if device.name().map(|n| n == name).unwrap_or(false) {
						log::info!("[Audio] Using output device: {}", name);
						match OutputStream::try_from_device(&device) {
							Ok(stream) => return Some(stream),
							Err(e) => {
								log::error!("[Audio] Failed to open '{}': {}", name, e);
							}
						}
					}
				}
				log::warn!("[Audio] Output device '{}' not found, falling back to default", name);
			}
			Err(e) => log::error!("[Audio] Failed to enumerate devices: {}", e),
		}
	}

	let device = match host.default_output_device() {
		Some(d) => d,
		None => {
			log::warn!("[Audio] No default output device found");
			return None;
		}
	};
	let name = device.name().unwrap_or_else(|_| "unknown".into());
	match OutputStream::try_from_device(&device) {
		Ok(stream) => {
			log::info!("[Audio] Using default output: {}", name);
			Some(stream)
		}
		Err(e) => {
			log::error!("[Audio] Failed to open default output '{}': {}", name, e);
			None
		}
	}
}

/// rodio-backed output. Locators are `http(s)` URLs or paths under the
/// assets root.
#[derive(Clone)]
pub struct RodioOutput {
	handle: OutputStreamHandle,
	assets_root: PathBuf,
}

impl RodioOutput {
	pub fn new(handle: OutputStreamHandle, assets_root: PathBuf) -> Self {
		Self {
			handle,
			assets_root,
		}
	}
}

impl AudioOutput for RodioOutput {
	fn open(
		&self,
		request: VoiceRequest,
		notices: mpsc::Sender<VoiceNotice>,
	) -> Result<Box<dyn Voice>, AudioError> {
		let sink = Sink::try_new(&self.handle).map_err(|e| AudioError::Rejected(e.to_string()))?;
		log::debug!("[Audio] Opened voice {:?}: {}", request.id, request.locator);
		Ok(Box::new(RodioVoice {
			request,
			sink: Arc::new(sink),
			detached: Arc::new(AtomicBool::new(false)),
			notices,
			assets_root: self.assets_root.clone(),
			started: false,
		}))
	}
}

struct RodioVoice {
	request: VoiceRequest,
	sink: Arc<Sink>,
	detached: Arc<AtomicBool>,
	notices: mpsc::Sender<VoiceNotice>,
	assets_root: PathBuf,
	started: bool,
}

impl Voice for RodioVoice {
	fn play(&mut self) {
		if self.started {
			return;
		}
		self.started = true;

		let request = self.request.clone();
		let sink = self.sink.clone();
		let detached = self.detached.clone();
		let notices = self.notices.clone();
		let root = self.assets_root.clone();

		tokio::spawn(async move {
			let notify = |kind: NoticeKind| {
				if !detached.load(Ordering::SeqCst) {
					let _ = notices.send(VoiceNotice {
						id: request.id,
						kind,
					});
				}
			};

			let bytes = match load_bytes(&request.locator, &root).await {
				Ok(b) => b,
				Err(e) => {
					log::error!("[Audio] Failed to load {}: {:#}", request.locator, e);
					notify(NoticeKind::Failed(e.to_string()));
					return;
				}
			};

			let cursor = Cursor::new(bytes);
			let decoded = if request.looping {
				Decoder::new_looped(cursor).map(|d| sink.append(d))
			} else {
				Decoder::new(cursor).map(|d| sink.append(d))
			};
			if let Err(e) = decoded {
				log::error!("[Audio] Failed to decode {}: {}", request.locator, e);
				notify(NoticeKind::Failed(e.to_string()));
				return;
			}

			if detached.load(Ordering::SeqCst) {
				sink.stop();
				return;
			}
			notify(NoticeKind::Started);

			if request.looping {
				return;
			}

			let waiting = sink.clone();
			let _ = tokio::task::spawn_blocking(move || waiting.sleep_until_end()).await;
			notify(NoticeKind::Ended);
		});
	}

	fn stop(&mut self) {
		self.detached.store(true, Ordering::SeqCst);
		self.sink.stop();
	}
}

async fn load_bytes(locator: &str, root: &Path) -> anyhow::Result<Vec<u8>> {
	if locator.starts_with("http://") || locator.starts_with("https://") {
		let resp = reqwest::get(locator).await?;
		if !resp.status().is_success() {
			anyhow::bail!("HTTP Status: {}", resp.status());
		}
		return Ok(resp.bytes().await?.to_vec());
	}

	let path = resolve_local(locator, root);
	tokio::fs::read(&path)
		.await
		.with_context(|| format!("reading {}", path.display()))
}

/// Site-absolute locators (`/mp3/guide01.mp3`) are relative to the assets root
pub(crate) fn resolve_local(locator: &str, root: &Path) -> PathBuf {
	root.join(locator.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_resolve_local_strips_leading_slash() {
		let root = Path::new("/srv/photovr/public");
		assert_eq!(
			resolve_local("/mp3/guide01.mp3", root),
			PathBuf::from("/srv/photovr/public/mp3/guide01.mp3")
		);
		assert_eq!(
			resolve_local("mp3/guide02.mp3", root),
			PathBuf::from("/srv/photovr/public/mp3/guide02.mp3")
		);
	}
}
