#![windows_subsystem = "windows"]

mod api;
mod audio;
mod carousel;
mod gateway;
mod guide;
mod input;
mod media;
mod reactor;
mod session;
mod settings;
mod types;
mod view;

use audio::{AudioOutput, RodioOutput, SilentOutput, open_output_stream};
use reactor::Reactor;
use settings::Settings;
use std::sync::Arc;

#[tokio::main]
async fn main() -> eframe::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let settings = Settings::load();

	// The stream must outlive every voice, so it stays on main's stack
	let stream = open_output_stream(settings.audio.output_device.as_deref());
	let output: Arc<dyn AudioOutput> = match &stream {
		Some((_stream, handle)) => Arc::new(RodioOutput::new(
			handle.clone(),
			settings.content.assets_root.clone(),
		)),
		None => {
			log::warn!("No audio output available, guide and music are silent");
			Arc::new(SilentOutput)
		}
	};

	let native_options = eframe::NativeOptions {
		viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1280.0, 720.0]),
		..Default::default()
	};

	let result = eframe::run_native(
		"PhotoVR",
		native_options,
		Box::new(move |cc| Ok(Box::new(Reactor::new(&cc.egui_ctx, &settings, output)?))),
	);
	drop(stream);
	result
}
