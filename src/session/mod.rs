use crate::audio::{AudioOutput, NoticeKind, VoiceHandle, VoiceId, VoiceNotice, VoiceRequest};
use crate::reactor::{ComponentResponse, Event, GuideEvent, SessionEvent};
use std::sync::{Arc, mpsc};
use std::time::Duration;

/// The immersive session: owns the background music and cues the guide.
pub struct SessionManager {
	output: Arc<dyn AudioOutput>,
	notice_tx: mpsc::Sender<VoiceNotice>,
	notice_rx: mpsc::Receiver<VoiceNotice>,
	next_voice: u64,

	active: bool,
	epoch: u64,
	guide_delay: Duration,

	bgm_locator: Option<String>,
	bgm_wanted: bool,
	bgm: Option<VoiceHandle>,
	bgm_playing: bool,
}

impl SessionManager {
	pub fn new(
		output: Arc<dyn AudioOutput>,
		bgm_locator: Option<String>,
		bgm_enabled: bool,
		guide_delay: Duration,
	) -> Self {
		let (notice_tx, notice_rx) = mpsc::channel();
		Self {
			output,
			notice_tx,
			notice_rx,
			next_voice: 0,
			active: false,
			epoch: 0,
			guide_delay,
			bgm_locator,
			bgm_wanted: bgm_enabled,
			bgm: None,
			bgm_playing: false,
		}
	}

	pub fn poll(&mut self) -> ComponentResponse {
		while let Ok(notice) = self.notice_rx.try_recv() {
			let current = self.bgm.as_ref().map(VoiceHandle::id);
			if current != Some(notice.id) {
				continue;
			}
			match notice.kind {
				NoticeKind::Started => self.bgm_playing = true,
				NoticeKind::Ended => self.bgm_playing = false,
				NoticeKind::Failed(reason) => {
					log::warn!("[Session] Background music failed: {}", reason);
					self.stop_bgm();
				}
			}
		}
		ComponentResponse::none()
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Session(SessionEvent::Enter) => self.enter(),
			Event::Session(SessionEvent::Leave) => self.leave(),
			Event::Session(SessionEvent::Toggle) => {
				if self.active {
					self.leave()
				} else {
					self.enter()
				}
			}
			Event::Session(SessionEvent::ToggleBgm) => {
				self.bgm_wanted = !self.bgm_wanted;
				log::info!("[Session] Background music wanted: {}", self.bgm_wanted);
				if self.bgm_wanted && self.active {
					self.start_bgm();
				} else {
					self.stop_bgm();
				}
				ComponentResponse::none()
			}
			Event::Session(SessionEvent::GuideCue { epoch }) => {
				if self.active && *epoch == self.epoch {
					ComponentResponse::emit(Event::Guide(GuideEvent::Start))
				} else {
					log::debug!("[Session] Dropping stale guide cue");
					ComponentResponse::none()
				}
			}
			_ => ComponentResponse::none(),
		}
	}

	fn enter(&mut self) -> ComponentResponse {
		if self.active {
			return ComponentResponse::none();
		}
		log::info!("[Session] Entering immersive session");
		self.active = true;
		self.epoch += 1;
		if self.bgm_wanted {
			self.start_bgm();
		}
		ComponentResponse::schedule(
			Event::Session(SessionEvent::GuideCue { epoch: self.epoch }),
			self.guide_delay,
		)
	}

	fn leave(&mut self) -> ComponentResponse {
		if !self.active {
			return ComponentResponse::none();
		}
		log::info!("[Session] Leaving immersive session");
		self.active = false;
		self.epoch += 1;
		self.stop_bgm();
		ComponentResponse::emit(Event::Guide(GuideEvent::End))
	}

	fn start_bgm(&mut self) {
		if self.bgm.is_some() {
			return;
		}
		let Some(locator) = self.bgm_locator.clone() else {
			return;
		};
		self.next_voice += 1;
		let id = VoiceId(self.next_voice);
		let request = VoiceRequest {
			id,
			locator,
			looping: true,
		};
		match self.output.open(request, self.notice_tx.clone()) {
			Ok(voice) => {
				let mut handle = VoiceHandle::new(id, voice);
				handle.play();
				self.bgm = Some(handle);
			}
			Err(e) => log::warn!("[Session] Background music unavailable: {}", e),
		}
	}

	fn stop_bgm(&mut self) {
		if let Some(bgm) = self.bgm.take() {
			bgm.release();
		}
		self.bgm_playing = false;
	}

	// Accessors for ViewManager
	pub fn is_active(&self) -> bool {
		self.active
	}

	pub fn bgm_wanted(&self) -> bool {
		self.bgm_wanted
	}

	pub fn bgm_playing(&self) -> bool {
		self.bgm_playing
	}
}

impl Drop for SessionManager {
	fn drop(&mut self) {
		self.stop_bgm();
	}
}
