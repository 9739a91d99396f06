use crate::audio::{AudioOutput, NoticeKind, VoiceHandle, VoiceId, VoiceNotice, VoiceRequest};
use crate::reactor::{ComponentResponse, Event, GuideEvent};
use crate::types::{GuidePhase, GuideStep};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

/// Scripted audio + caption onboarding that runs when the session starts.
///
/// At most one voice is owned at a time. Every voice notice and reveal timer
/// is tagged (voice id, reveal epoch) so anything belonging to a superseded
/// step or reveal is dropped on arrival.
pub struct GuideSequencer {
	output: Arc<dyn AudioOutput>,
	notice_tx: mpsc::Sender<VoiceNotice>,
	notice_rx: mpsc::Receiver<VoiceNotice>,
	next_voice: u64,

	steps: Vec<GuideStep>,
	phase: GuidePhase,
	caption: String,
	voice: Option<VoiceHandle>,
	audio_active: bool,

	photos_visible: bool,
	reveal_duration: Duration,
	reveal_started: Option<Instant>,
	reveal_epoch: u64,
}

impl GuideSequencer {
	pub fn new(output: Arc<dyn AudioOutput>, reveal_duration: Duration) -> Self {
		log::info!("[Guide] Initializing (reveal {:?})", reveal_duration);
		let (notice_tx, notice_rx) = mpsc::channel();
		Self {
			output,
			notice_tx,
			notice_rx,
			next_voice: 0,
			steps: Vec::new(),
			phase: GuidePhase::Idle,
			caption: String::new(),
			voice: None,
			audio_active: false,
			photos_visible: true,
			reveal_duration,
			reveal_started: None,
			reveal_epoch: 0,
		}
	}

	/// Convert pending voice notices into guide events
	pub fn poll(&mut self) -> ComponentResponse {
		let mut events = Vec::new();
		while let Ok(notice) = self.notice_rx.try_recv() {
			let id = notice.id;
			events.push(Event::Guide(match notice.kind {
				NoticeKind::Started => GuideEvent::VoiceStarted { id },
				NoticeKind::Ended => GuideEvent::VoiceEnded { id },
				NoticeKind::Failed(reason) => GuideEvent::VoiceFailed { id, reason },
			}));
		}
		ComponentResponse::emit_many(events)
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Guide(GuideEvent::ScriptLoaded { steps }) => {
				self.load_script(steps.clone());
				ComponentResponse::none()
			}
			Event::Guide(GuideEvent::Start) => self.start_guide(),
			Event::Guide(GuideEvent::Skip) => self.skip_guide(),
			Event::Guide(GuideEvent::End) => {
				self.end_guide();
				ComponentResponse::none()
			}
			Event::Guide(GuideEvent::VoiceStarted { id }) => {
				if self.owns(*id) {
					log::debug!("[Guide] Voice {:?} started", id);
					self.audio_active = true;
				}
				ComponentResponse::none()
			}
			Event::Guide(GuideEvent::VoiceEnded { id }) => {
				if !self.owns(*id) {
					log::debug!("[Guide] Ignoring stale end from {:?}", id);
					return ComponentResponse::none();
				}
				self.on_step_finished()
			}
			Event::Guide(GuideEvent::VoiceFailed { id, reason }) => {
				if self.owns(*id) {
					log::error!("[Guide] Playback failed, aborting guide: {}", reason);
					self.abort();
				}
				ComponentResponse::none()
			}
			Event::Guide(GuideEvent::RevealElapsed { epoch }) => {
				if self.phase == GuidePhase::Revealing && *epoch == self.reveal_epoch {
					log::info!("[Guide] Reveal finished");
					self.phase = GuidePhase::Finished;
					self.reveal_started = None;
				} else {
					log::debug!("[Guide] Ignoring stale reveal timer (epoch {})", epoch);
				}
				ComponentResponse::none()
			}
			_ => ComponentResponse::none(),
		}
	}

	/// Replace the step list. Only honoured while resting.
	pub fn load_script(&mut self, steps: Vec<GuideStep>) {
		if !self.phase.is_resting() {
			log::warn!("[Guide] Script arrived mid-guide, ignoring");
			return;
		}
		log::info!("[Guide] Script loaded: {} steps", steps.len());
		self.steps = steps;
	}

	pub fn start_guide(&mut self) -> ComponentResponse {
		if self.steps.is_empty() {
			log::debug!("[Guide] Start ignored: no steps");
			return ComponentResponse::none();
		}
		if self.audio_active || self.voice.is_some() || !self.phase.is_resting() {
			log::debug!("[Guide] Start ignored: already running ({:?})", self.phase);
			return ComponentResponse::none();
		}

		log::info!("[Guide] Starting guide");
		self.photos_visible = false;
		self.reveal_started = None;
		self.begin_step(0)
	}

	pub fn skip_guide(&mut self) -> ComponentResponse {
		match self.phase {
			GuidePhase::Playing { step } => {
				log::info!("[Guide] Skipped at step {}", step);
				self.release_voice();
				self.enter_reveal()
			}
			_ => {
				log::debug!("[Guide] Skip ignored in {:?}", self.phase);
				ComponentResponse::none()
			}
		}
	}

	/// Hard reset to the resting state; safe from any phase, any number of times
	pub fn end_guide(&mut self) {
		if self.phase != GuidePhase::Idle {
			log::info!("[Guide] Ending guide from {:?}", self.phase);
		}
		self.release_voice();
		self.caption.clear();
		self.photos_visible = true;
		self.reveal_started = None;
		self.reveal_epoch += 1;
		self.phase = GuidePhase::Idle;
	}

	fn begin_step(&mut self, index: usize) -> ComponentResponse {
		self.release_voice();

		let Some(step) = self.steps.get(index) else {
			log::warn!("[Guide] Step {} out of range, finishing", index);
			self.abort();
			return ComponentResponse::none();
		};

		self.phase = GuidePhase::Playing { step: index };
		self.caption = unescape_caption(&step.caption);

		self.next_voice += 1;
		let id = VoiceId(self.next_voice);
		let request = VoiceRequest {
			id,
			locator: step.audio.clone(),
			looping: false,
		};
		log::info!("[Guide] Step {}: {}", index, request.locator);

		match self.output.open(request, self.notice_tx.clone()) {
			Ok(voice) => {
				let mut handle = VoiceHandle::new(id, voice);
				handle.play();
				self.voice = Some(handle);
			}
			Err(e) => {
				log::error!("[Guide] Could not open step {} audio: {}", index, e);
				self.abort();
			}
		}
		ComponentResponse::none()
	}

	fn on_step_finished(&mut self) -> ComponentResponse {
		self.audio_active = false;
		match self.phase {
			GuidePhase::Playing { step } if step + 1 >= self.steps.len() => {
				log::info!("[Guide] Last step finished");
				self.release_voice();
				self.enter_reveal()
			}
			GuidePhase::Playing { step } => self.begin_step(step + 1),
			_ => ComponentResponse::none(),
		}
	}

	fn enter_reveal(&mut self) -> ComponentResponse {
		self.caption.clear();
		self.photos_visible = true;
		self.phase = GuidePhase::Revealing;
		self.reveal_started = Some(Instant::now());
		self.reveal_epoch += 1;
		ComponentResponse::schedule(
			Event::Guide(GuideEvent::RevealElapsed {
				epoch: self.reveal_epoch,
			}),
			self.reveal_duration,
		)
	}

	/// Playback failure: back to rest without the reveal animation
	fn abort(&mut self) {
		self.release_voice();
		self.caption.clear();
		self.photos_visible = true;
		self.reveal_started = None;
		self.phase = GuidePhase::Idle;
	}

	fn release_voice(&mut self) {
		if let Some(voice) = self.voice.take() {
			voice.release();
		}
		self.audio_active = false;
	}

	fn owns(&self, id: VoiceId) -> bool {
		self.voice.as_ref().map(|v| v.id() == id).unwrap_or(false)
	}

	// Accessors for ViewManager
	pub fn phase(&self) -> GuidePhase {
		self.phase
	}

	pub fn caption(&self) -> &str {
		&self.caption
	}

	pub fn is_audio_active(&self) -> bool {
		self.audio_active
	}

	/// Caption and skip button are shown
	pub fn is_showing(&self) -> bool {
		matches!(self.phase, GuidePhase::Playing { .. })
	}

	pub fn photos_visible(&self) -> bool {
		self.photos_visible
	}

	pub fn photos_animating(&self) -> bool {
		self.phase == GuidePhase::Revealing
	}

	/// 0.0 at reveal start, 1.0 once finished or resting
	pub fn reveal_progress(&self) -> f32 {
		match self.reveal_started {
			Some(started) if self.phase == GuidePhase::Revealing => {
				let total = self.reveal_duration.as_secs_f32();
				if total <= 0.0 {
					1.0
				} else {
					(started.elapsed().as_secs_f32() / total).clamp(0.0, 1.0)
				}
			}
			_ => 1.0,
		}
	}

	pub fn step_count(&self) -> usize {
		self.steps.len()
	}
}

impl Drop for GuideSequencer {
	fn drop(&mut self) {
		self.release_voice();
	}
}

/// Turn literal `\n` sequences from the script into line breaks
pub fn unescape_caption(raw: &str) -> String {
	raw.replace("\\r\\n", "\n").replace("\\n", "\n")
}
