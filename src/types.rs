use eframe::egui;

/// Loaded media content
pub enum LoadedMedia {
	Image { texture: egui::TextureHandle },
}

/// Onboarding guide phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuidePhase {
	Idle,
	Playing { step: usize },
	Revealing,
	Finished,
}

impl GuidePhase {
	/// Resting phases have no active guide and all photos visible
	pub fn is_resting(&self) -> bool {
		matches!(self, GuidePhase::Idle | GuidePhase::Finished)
	}
}

/// Page navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
	Next,
	Prev,
}

/// One photo of the gallery
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
	pub image_url: String,
	pub title: String,
}

/// One step of the onboarding script
#[derive(Debug, Clone, PartialEq)]
pub struct GuideStep {
	pub audio: String,
	pub caption: String,
}

/// easeOutCubic over 0..=1
pub fn ease_out_cubic(t: f32) -> f32 {
	let t = t.clamp(0.0, 1.0);
	1.0 - (1.0 - t).powi(3)
}
