use crate::reactor::{CarouselEvent, ComponentResponse, Event, SettingsEvent};
use crate::types::NavDirection;
use anyhow::Context;
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
	/// Gallery list (`photovr.json` format)
	pub gallery: String,
	/// Guide step list
	pub guide_script: String,
	/// Root for site-relative locators
	pub assets_root: PathBuf,
}

impl Default for ContentConfig {
	fn default() -> Self {
		Self {
			gallery: "/photovr.json".into(),
			guide_script: "/guide.json".into(),
			assets_root: PathBuf::from("public"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GuideConfig {
	pub reveal_ms: u64,
	pub start_delay_ms: u64,
}

impl Default for GuideConfig {
	fn default() -> Self {
		Self {
			reveal_ms: 2000,
			start_delay_ms: 100,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
	pub photos_per_page: usize,
	pub turn_ms: u64,
	pub auto_turn_secs: u64,
}

impl Default for GalleryConfig {
	fn default() -> Self {
		Self {
			photos_per_page: 6,
			turn_ms: 2000,
			auto_turn_secs: 16,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
	pub bgm: Option<String>,
	pub bgm_enabled: bool,
	pub output_device: Option<String>,
}

impl Default for AudioConfig {
	fn default() -> Self {
		Self {
			bgm: Some("/mp3/bgm.mp3".into()),
			bgm_enabled: true,
			output_device: None,
		}
	}
}

/// `settings.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
	pub content: ContentConfig,
	pub guide: GuideConfig,
	pub gallery: GalleryConfig,
	pub audio: AudioConfig,
}

impl Settings {
	pub fn default_path() -> Option<PathBuf> {
		ProjectDirs::from("", "", "photovr").map(|dirs| dirs.config_dir().join("settings.toml"))
	}

	pub fn from_toml(text: &str) -> anyhow::Result<Self> {
		Ok(toml::from_str(text)?)
	}

	pub fn load_from(path: &Path) -> anyhow::Result<Self> {
		let text =
			std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
		Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
	}

	/// Missing file or bad content falls back to defaults
	pub fn load() -> Self {
		let Some(path) = Self::default_path() else {
			log::warn!("No config directory available, using default settings");
			return Self::default();
		};
		if !path.exists() {
			log::info!("No settings at {}, using defaults", path.display());
			return Self::default();
		}
		match Self::load_from(&path) {
			Ok(settings) => {
				log::info!("Loaded settings from {}", path.display());
				settings
			}
			Err(e) => {
				log::warn!("Ignoring settings: {:#}", e);
				Self::default()
			}
		}
	}

	pub fn reveal_duration(&self) -> Duration {
		Duration::from_millis(self.guide.reveal_ms)
	}

	pub fn guide_start_delay(&self) -> Duration {
		Duration::from_millis(self.guide.start_delay_ms)
	}

	pub fn turn_duration(&self) -> Duration {
		Duration::from_millis(self.gallery.turn_ms)
	}

	pub fn auto_turn_delay(&self) -> Duration {
		Duration::from_secs(self.gallery.auto_turn_secs).clamp(MIN_DELAY, MAX_DELAY)
	}
}

/// Bounds of the auto-turn delay
pub const MIN_DELAY: Duration = Duration::from_secs(1);
pub const MAX_DELAY: Duration = Duration::from_secs(60);

/// Runtime settings: automatic page turning
pub struct SettingsManager {
	auto_turn: bool,
	auto_turn_delay: Duration,
	auto_turn_scheduled: bool,
}

impl SettingsManager {
	pub fn new(auto_turn_delay: Duration) -> Self {
		Self {
			auto_turn: false,
			auto_turn_delay,
			auto_turn_scheduled: false,
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::Settings(SettingsEvent::ToggleAutoTurn) => {
				self.auto_turn = !self.auto_turn;
				log::info!("Auto-turn: {}", self.auto_turn);
				if self.auto_turn && !self.auto_turn_scheduled {
					self.auto_turn_scheduled = true;
					return ComponentResponse::schedule(
						Event::Settings(SettingsEvent::AutoTurnAdvance),
						self.auto_turn_delay,
					);
				}
				ComponentResponse::none()
			}
			Event::Settings(SettingsEvent::SetDelay { duration }) => {
				self.auto_turn_delay = (*duration).clamp(MIN_DELAY, MAX_DELAY);
				ComponentResponse::none()
			}
			Event::Settings(SettingsEvent::AdjustDelay { delta_secs }) => {
				let current_secs = self.auto_turn_delay.as_secs() as i64;
				let new_secs = (current_secs + delta_secs)
					.clamp(MIN_DELAY.as_secs() as i64, MAX_DELAY.as_secs() as i64);
				self.auto_turn_delay = Duration::from_secs(new_secs as u64);
				ComponentResponse::none()
			}
			Event::Settings(SettingsEvent::AutoTurnAdvance) => {
				self.auto_turn_scheduled = false;
				if self.auto_turn {
					self.auto_turn_scheduled = true;
					let mut response =
						ComponentResponse::emit(Event::Carousel(CarouselEvent::Navigate {
							direction: NavDirection::Next,
						}));
					response.scheduled.push((
						Event::Settings(SettingsEvent::AutoTurnAdvance),
						self.auto_turn_delay,
					));
					return response;
				}
				ComponentResponse::none()
			}
			_ => ComponentResponse::none(),
		}
	}

	// Accessors for ViewManager/UI
	pub fn auto_turn(&self) -> bool {
		self.auto_turn
	}

	pub fn auto_turn_delay(&self) -> Duration {
		self.auto_turn_delay
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_partial_toml_keeps_other_defaults() {
		let settings = Settings::from_toml(
			r#"
			[guide]
			reveal_ms = 1500

			[audio]
			bgm_enabled = false
			"#,
		)
		.unwrap();

		assert_eq!(settings.reveal_duration(), Duration::from_millis(1500));
		assert_eq!(settings.guide.start_delay_ms, 100);
		assert!(!settings.audio.bgm_enabled);
		assert_eq!(settings.gallery.photos_per_page, 6);
		assert_eq!(settings.content.gallery, "/photovr.json");
	}

	#[test]
	fn test_malformed_toml_is_error() {
		assert!(Settings::from_toml("[guide\nreveal_ms = ").is_err());
	}

	#[test]
	fn test_load_from_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("settings.toml");
		std::fs::write(&path, "[audio]\noutput_device = \"Headphones\"\n").unwrap();

		let loaded = Settings::load_from(&path).unwrap();

		assert_eq!(loaded.audio.output_device.as_deref(), Some("Headphones"));
		assert!(loaded.audio.bgm_enabled);
	}

	#[test]
	fn test_load_from_missing_file_is_error() {
		let dir = tempfile::tempdir().unwrap();
		assert!(Settings::load_from(&dir.path().join("absent.toml")).is_err());
	}

	#[test]
	fn test_auto_turn_delay_is_clamped() {
		let mut settings = Settings::default();
		settings.gallery.auto_turn_secs = 0;
		assert_eq!(settings.auto_turn_delay(), Duration::from_secs(1));
	}

	#[test]
	fn test_auto_turn_schedules_and_advances() {
		// Arrange
		let mut manager = SettingsManager::new(Duration::from_secs(16));

		// Act
		let toggled = manager.handle(&Event::Settings(SettingsEvent::ToggleAutoTurn));
		let advanced = manager.handle(&Event::Settings(SettingsEvent::AutoTurnAdvance));

		// Assert
		assert_eq!(toggled.scheduled.len(), 1);
		assert!(matches!(
			advanced.events.as_slice(),
			[Event::Carousel(CarouselEvent::Navigate {
				direction: NavDirection::Next
			})]
		));
		assert_eq!(advanced.scheduled.len(), 1);
	}

	#[test]
	fn test_advance_after_disable_stops_chain() {
		let mut manager = SettingsManager::new(Duration::from_secs(16));
		manager.handle(&Event::Settings(SettingsEvent::ToggleAutoTurn));
		manager.handle(&Event::Settings(SettingsEvent::ToggleAutoTurn));

		let advanced = manager.handle(&Event::Settings(SettingsEvent::AutoTurnAdvance));

		assert!(advanced.is_empty());
	}

	#[test]
	fn test_set_delay_clamps() {
		// Arrange
		let mut manager = SettingsManager::new(Duration::from_secs(16));

		// Act
		manager.handle(&Event::Settings(SettingsEvent::SetDelay {
			duration: Duration::ZERO,
		}));
		let floor = manager.auto_turn_delay();
		manager.handle(&Event::Settings(SettingsEvent::SetDelay {
			duration: Duration::from_secs(600),
		}));

		// Assert
		assert_eq!(floor, Duration::from_secs(1));
		assert_eq!(manager.auto_turn_delay(), Duration::from_secs(60));
	}

	#[test]
	fn test_adjust_delay_clamps() {
		let mut manager = SettingsManager::new(Duration::from_secs(16));
		manager.handle(&Event::Settings(SettingsEvent::AdjustDelay { delta_secs: 100 }));
		assert_eq!(manager.auto_turn_delay(), Duration::from_secs(60));
		manager.handle(&Event::Settings(SettingsEvent::AdjustDelay { delta_secs: -100 }));
		assert_eq!(manager.auto_turn_delay(), Duration::from_secs(1));
	}
}
