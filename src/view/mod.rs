use crate::carousel::{GalleryCarousel, ring_layout};
use crate::gateway::ContentGateway;
use crate::guide::GuideSequencer;
use crate::input::{ControllerSample, InputEvent, InputPort};
use crate::media::MediaCache;
use crate::reactor::{
	CarouselEvent, ComponentResponse, Event, GatewayEvent, GuideEvent, MediaEvent, SessionEvent,
	SettingsEvent, ViewEvent,
};
use crate::session::SessionManager;
use crate::settings::SettingsManager;
use crate::types::{GuidePhase, LoadedMedia, NavDirection, ease_out_cubic};
use eframe::egui;
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub mod text_utils;

/// Delay between consecutive photos fading in, as a share of the reveal
pub const REVEAL_STAGGER: f32 = 0.1;
/// Fade length of a single photo, as a share of the reveal
pub const REVEAL_FADE: f32 = 0.4;
/// Fade length for a texture that just finished loading
const TEXTURE_FADE_SECS: f32 = 0.3;

/// Opacity of photo `index` at reveal `progress` (0.0..=1.0)
pub fn reveal_alpha(index: usize, progress: f32) -> f32 {
	let local = (progress - index as f32 * REVEAL_STAGGER) / REVEAL_FADE;
	ease_out_cubic(local)
}

/// `[` shortens and `]` lengthens the auto-turn interval by a second
pub fn delay_events(shorter: bool, longer: bool) -> Vec<Event> {
	let mut events = Vec::new();
	if shorter {
		events.push(Event::Settings(SettingsEvent::AdjustDelay { delta_secs: -1 }));
	}
	if longer {
		events.push(Event::Settings(SettingsEvent::AdjustDelay { delta_secs: 1 }));
	}
	events
}

/// Map one controller frame onto reactor events
pub fn input_events(inputs: &[InputEvent], guide_showing: bool) -> Vec<Event> {
	inputs
		.iter()
		.filter_map(|input| match input {
			InputEvent::Rotate(amount) => {
				Some(Event::Carousel(CarouselEvent::Rotate { amount: *amount }))
			}
			InputEvent::ToggleAudio => Some(Event::Session(SessionEvent::ToggleBgm)),
			InputEvent::NextPage => Some(Event::Carousel(CarouselEvent::Navigate {
				direction: NavDirection::Next,
			})),
			InputEvent::PrevPage => Some(Event::Carousel(CarouselEvent::Navigate {
				direction: NavDirection::Prev,
			})),
			InputEvent::Skip if guide_showing => Some(Event::Guide(GuideEvent::Skip)),
			InputEvent::Skip => None,
			InputEvent::ToggleSession => Some(Event::Session(SessionEvent::Toggle)),
		})
		.collect()
}

pub struct ViewManager {
	input: InputPort,
	status: Option<String>,
	ready_at: HashMap<String, Instant>,
}

impl ViewManager {
	pub fn new() -> Self {
		Self {
			input: InputPort::new(),
			status: None,
			ready_at: HashMap::new(),
		}
	}

	pub fn handle(&mut self, event: &Event) -> ComponentResponse {
		match event {
			Event::View(ViewEvent::MediaReady { url }) => {
				self.ready_at.insert(url.clone(), Instant::now());
				ComponentResponse::none()
			}
			Event::Media(MediaEvent::Clear) => {
				self.ready_at.clear();
				ComponentResponse::none()
			}
			Event::View(ViewEvent::DismissStatus) => {
				self.status = None;
				ComponentResponse::none()
			}
			Event::Gateway(GatewayEvent::LoadError { message }) => {
				self.status = Some(message.clone());
				ComponentResponse::none()
			}
			Event::Media(MediaEvent::LoadError { url, error }) => {
				self.status = Some(format!("Failed to load {}: {}", url, error));
				ComponentResponse::none()
			}
			_ => ComponentResponse::none(),
		}
	}

	pub fn status(&self) -> Option<&str> {
		self.status.as_deref()
	}

	/// Main render function of the whole thing
	#[allow(clippy::too_many_arguments)]
	pub fn render(
		&mut self,
		ctx: &egui::Context,
		session: &SessionManager,
		guide: &GuideSequencer,
		carousel: &GalleryCarousel,
		media: &MediaCache,
		gateway: &ContentGateway,
		settings: &SettingsManager,
	) -> Vec<Event> {
		let mut events = Vec::new();

		self.handle_controller_input(ctx, guide, &mut events);

		self.render_top_panel(ctx, session, guide, carousel, gateway, settings, &mut events);
		self.render_central_panel(ctx, session, guide, carousel, media, gateway);
		self.render_info_overlay(ctx, guide, carousel);
		self.render_guide_overlay(ctx, guide, &mut events);

		events
	}

	fn handle_controller_input(
		&mut self,
		ctx: &egui::Context,
		guide: &GuideSequencer,
		events: &mut Vec<Event>,
	) {
		let is_typing = ctx.memory(|m| m.focused().is_some());
		let sample = if is_typing {
			ControllerSample::default()
		} else {
			ctx.input(|i| {
				let shift = i.modifiers.shift;
				let mut stick_x = 0.0;
				if i.key_down(egui::Key::A) || (shift && i.key_down(egui::Key::ArrowLeft)) {
					stick_x -= 1.0;
				}
				if i.key_down(egui::Key::D) || (shift && i.key_down(egui::Key::ArrowRight)) {
					stick_x += 1.0;
				}
				ControllerSample {
					stick_x,
					audio_button: i.key_down(egui::Key::B),
					next_button: i.key_down(egui::Key::N)
						|| (!shift && i.key_down(egui::Key::ArrowRight)),
					prev_button: i.key_down(egui::Key::P)
						|| (!shift && i.key_down(egui::Key::ArrowLeft)),
					skip_button: i.key_down(egui::Key::Space) || i.key_down(egui::Key::Enter),
					session_button: i.key_down(egui::Key::V),
				}
			})
		};

		let inputs = self.input.sample(sample);
		events.extend(input_events(&inputs, guide.is_showing()));

		if !is_typing {
			let (shorter, longer) = ctx.input(|i| {
				(
					i.key_pressed(egui::Key::OpenBracket),
					i.key_pressed(egui::Key::CloseBracket),
				)
			});
			events.extend(delay_events(shorter, longer));
		}
	}

	#[allow(clippy::too_many_arguments)]
	fn render_top_panel(
		&mut self,
		ctx: &egui::Context,
		session: &SessionManager,
		guide: &GuideSequencer,
		carousel: &GalleryCarousel,
		gateway: &ContentGateway,
		settings: &SettingsManager,
		events: &mut Vec<Event>,
	) {
		egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
			ui.horizontal(|ui| {
				let session_label = if session.is_active() {
					"Leave VR"
				} else {
					"Enter VR"
				};
				if ui.button(session_label).clicked() {
					events.push(Event::Session(SessionEvent::Toggle));
				}

				let mut bgm = session.bgm_wanted();
				if ui.checkbox(&mut bgm, "Music").changed() {
					events.push(Event::Session(SessionEvent::ToggleBgm));
				}
				let bgm_color = if session.bgm_playing() {
					egui::Color32::GREEN
				} else {
					egui::Color32::DARK_GRAY
				};
				ui.label(egui::RichText::new("●").color(bgm_color).size(10.0));

				ui.separator();

				let guide_label = match guide.phase() {
					GuidePhase::Idle => "Guide: idle".to_string(),
					GuidePhase::Playing { step } => {
						format!("Guide: step {} / {}", step + 1, guide.step_count())
					}
					GuidePhase::Revealing => "Guide: revealing".to_string(),
					GuidePhase::Finished => "Guide: done".to_string(),
				};
				ui.label(guide_label);

				ui.separator();

				if ui.button("◀").clicked() {
					events.push(Event::Carousel(CarouselEvent::Navigate {
						direction: NavDirection::Prev,
					}));
				}
				if carousel.is_empty() {
					ui.label("No photos");
				} else {
					ui.label(format!(
						"Page {} / {}",
						carousel.current_page() + 1,
						carousel.page_count()
					));
				}
				if ui.button("▶").clicked() {
					events.push(Event::Carousel(CarouselEvent::Navigate {
						direction: NavDirection::Next,
					}));
				}
				if carousel.queued() > 0 {
					ui.label(
						egui::RichText::new(format!("+{} queued", carousel.queued()))
							.color(egui::Color32::GRAY),
					);
				}

				ui.separator();

				let mut auto_turn = settings.auto_turn();
				if ui.checkbox(&mut auto_turn, "Auto-turn").changed() {
					events.push(Event::Settings(SettingsEvent::ToggleAutoTurn));
				}

				if settings.auto_turn() {
					if ui.small_button("−").clicked() {
						events.extend(delay_events(true, false));
					}
					let mut seconds = settings.auto_turn_delay().as_secs_f32();
					if ui
						.add(egui::Slider::new(&mut seconds, 1.0..=60.0).text("Interval (s)"))
						.changed()
					{
						events.push(Event::Settings(SettingsEvent::SetDelay {
							duration: Duration::from_secs_f32(seconds),
						}));
					}
					if ui.small_button("+").clicked() {
						events.extend(delay_events(false, true));
					}
				}

				ui.separator();

				if ui.button("Reload").clicked() {
					events.push(Event::Media(MediaEvent::Clear));
					events.push(Event::Gateway(GatewayEvent::ReloadGallery));
				}
				if gateway.is_loading() {
					ui.spinner();
				}
			});

			if let Some(status) = &self.status {
				ui.horizontal(|ui| {
					ui.label(egui::RichText::new(status).color(egui::Color32::RED));
					if ui.small_button("✕").clicked() {
						events.push(Event::View(ViewEvent::DismissStatus));
					}
				});
			}
		});
	}

	fn render_central_panel(
		&mut self,
		ctx: &egui::Context,
		session: &SessionManager,
		guide: &GuideSequencer,
		carousel: &GalleryCarousel,
		media: &MediaCache,
		gateway: &ContentGateway,
	) {
		egui::CentralPanel::default()
			.frame(egui::Frame::none().fill(egui::Color32::from_gray(12)))
			.show(ctx, |ui| {
				if gateway.is_loading() && carousel.is_empty() {
					ui.centered_and_justified(|ui| {
						ui.spinner();
					});
				} else if carousel.is_empty() {
					ui.centered_and_justified(|ui| {
						ui.label("No photos to show.");
					});
				} else {
					self.render_ring(ui, ctx, guide, carousel, media);
				}

				if !session.is_active() {
					let rect = ui.max_rect();
					ui.painter().text(
						rect.center_bottom() - egui::vec2(0.0, 24.0),
						egui::Align2::CENTER_BOTTOM,
						"Press V or \"Enter VR\" to start",
						egui::FontId::proportional(16.0),
						egui::Color32::GRAY,
					);
				}
			});
	}

	fn render_ring(
		&mut self,
		ui: &mut egui::Ui,
		ctx: &egui::Context,
		guide: &GuideSequencer,
		carousel: &GalleryCarousel,
		media: &MediaCache,
	) {
		let rect = ui.available_rect_before_wrap();
		let floor_y = rect.center().y + rect.height() * 0.25;
		ui.painter().line_segment(
			[
				egui::pos2(rect.left(), floor_y),
				egui::pos2(rect.right(), floor_y),
			],
			egui::Stroke::new(1.0, egui::Color32::from_gray(60)),
		);

		if !guide.photos_visible() {
			return;
		}

		// Photos sink below the floor line during a page turn
		let painter = ui
			.painter_at(rect)
			.with_clip_rect(egui::Rect::from_min_max(rect.min, egui::pos2(rect.right(), floor_y)));

		let items = carousel.visible_items();
		let pose = carousel.pose();
		let reveal_progress = guide.photos_animating().then(|| guide.reveal_progress());
		let slots = ring_layout(items.len(), carousel.rotation());

		let mut order: Vec<usize> = (0..items.len()).collect();
		order.sort_by(|a, b| slots[*a].depth.total_cmp(&slots[*b].depth));

		let base_width = (rect.width() / 4.0).min(rect.height() * 0.5);
		let mut animating = carousel.is_turning() || reveal_progress.is_some();

		for index in order {
			let slot = slots[index];
			let item = &items[index];

			let scale = 0.45 + 0.55 * slot.depth;
			let size = egui::vec2(base_width, base_width * 0.75) * scale;
			let sink = pose.sink * (size.y + 20.0);
			let center = egui::pos2(
				rect.center().x + slot.x * rect.width() * 0.42,
				floor_y - size.y / 2.0 - 10.0 + sink,
			);
			let photo_rect = egui::Rect::from_center_size(center, size);

			let mut alpha = pose.opacity * (0.35 + 0.65 * slot.depth);
			if let Some(progress) = reveal_progress {
				alpha *= reveal_alpha(index, progress);
			}

			match media.get_media(&item.image_url) {
				Some(LoadedMedia::Image { texture }) => {
					if let Some(ready) = self.ready_at.get(&item.image_url) {
						let fade = ready.elapsed().as_secs_f32() / TEXTURE_FADE_SECS;
						if fade < 1.0 {
							animating = true;
						}
						alpha *= ease_out_cubic(fade);
					}
					painter.image(
						texture.id(),
						photo_rect,
						egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
						egui::Color32::WHITE.gamma_multiply(alpha),
					);
				}
				None => {
					let fill = if media.has_failed(&item.image_url) {
						egui::Color32::from_rgb(70, 20, 20)
					} else {
						egui::Color32::from_gray(40)
					};
					painter.rect_filled(photo_rect, 4.0, fill.gamma_multiply(alpha));
				}
			}

			painter.text(
				photo_rect.center_top() - egui::vec2(0.0, 4.0),
				egui::Align2::CENTER_BOTTOM,
				&item.title,
				egui::FontId::proportional(14.0 * scale),
				egui::Color32::WHITE.gamma_multiply(alpha),
			);
		}

		if animating {
			ctx.request_repaint();
		}
	}

	/// Title of the photo straight ahead
	fn render_info_overlay(
		&self,
		ctx: &egui::Context,
		guide: &GuideSequencer,
		carousel: &GalleryCarousel,
	) {
		if carousel.is_empty() || !guide.photos_visible() || guide.is_showing() {
			return;
		}

		let items = carousel.visible_items();
		let slots = ring_layout(items.len(), carousel.rotation());
		let front = slots
			.iter()
			.enumerate()
			.max_by(|a, b| a.1.depth.total_cmp(&b.1.depth))
			.map(|(i, _)| i);
		let Some(item) = front.and_then(|i| items.get(i)) else {
			return;
		};

		let screen_height = ctx.screen_rect().height();
		let font_size = (screen_height * 0.02).max(12.0);
		let margin = (screen_height * 0.03).max(10.0);
		let stroke_width = (font_size * 0.05).max(1.0);

		egui::Area::new(egui::Id::new("photo_info_overlay"))
			.anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(margin, -margin))
			.interactable(false)
			.order(egui::Order::Foreground)
			.show(ctx, |ui| {
				Self::draw_outlined_text(
					ui,
					&item.title,
					egui::FontId::proportional(font_size),
					egui::Color32::WHITE,
					stroke_width,
				);
			});
	}

	/// Caption and skip button while the guide plays
	fn render_guide_overlay(
		&self,
		ctx: &egui::Context,
		guide: &GuideSequencer,
		events: &mut Vec<Event>,
	) {
		if !guide.is_showing() {
			return;
		}

		let screen_rect = ctx.screen_rect();
		let font_size = (screen_rect.height() * 0.035).max(18.0);

		egui::Area::new(egui::Id::new("guide_backdrop"))
			.fixed_pos(screen_rect.min)
			.order(egui::Order::Middle)
			.interactable(false)
			.show(ctx, |ui| {
				ui.painter().rect_filled(
					screen_rect,
					0.0,
					egui::Color32::from_rgba_unmultiplied(0, 0, 0, 160),
				);
			});

		egui::Window::new("guide_caption")
			.title_bar(false)
			.resizable(false)
			.collapsible(false)
			.anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
			.order(egui::Order::Foreground)
			.frame(
				egui::Frame::none()
					.fill(egui::Color32::from_gray(30))
					.inner_margin(16.0)
					.rounding(8.0),
			)
			.show(ctx, |ui| {
				ui.set_width((screen_rect.width() * 0.5).max(320.0));
				text_utils::render_caption(ui, guide.caption(), font_size);
				ui.add_space(12.0);
				ui.vertical_centered(|ui| {
					if ui.button("   Skip   ").clicked() {
						events.push(Event::Guide(GuideEvent::Skip));
					}
				});
			});
	}

	fn draw_outlined_text(
		ui: &mut egui::Ui,
		text: &str,
		font_id: egui::FontId,
		color: egui::Color32,
		stroke_width: f32,
	) {
		let galley = ui
			.painter()
			.layout_no_wrap(text.to_string(), font_id.clone(), color);
		let (rect, _) = ui.allocate_exact_size(galley.size(), egui::Sense::hover());

		let offsets = [
			egui::vec2(-stroke_width, -stroke_width),
			egui::vec2(stroke_width, -stroke_width),
			egui::vec2(-stroke_width, stroke_width),
			egui::vec2(stroke_width, stroke_width),
		];

		let per_pass_alpha = (color.a() as f32 / offsets.len() as f32).max(1.0) as u8;
		let shadow_color = egui::Color32::from_rgba_unmultiplied(0, 0, 0, per_pass_alpha);

		for offset in offsets {
			let shadow_galley =
				ui.painter()
					.layout_no_wrap(text.to_string(), font_id.clone(), shadow_color);
			ui.painter()
				.galley(rect.min + offset, shadow_galley, shadow_color);
		}

		ui.painter().galley(rect.min, galley, color);
	}
}

impl Default for ViewManager {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_reveal_staggers_photos() {
		// Arrange
		let progress = 0.15;

		// Act
		let first = reveal_alpha(0, progress);
		let second = reveal_alpha(1, progress);
		let last = reveal_alpha(5, progress);

		// Assert
		assert!(first > second);
		assert!(second > 0.0);
		assert_eq!(last, 0.0);
		assert_eq!(reveal_alpha(5, 1.0), 1.0);
	}

	#[test]
	fn test_bracket_keys_adjust_delay() {
		let shorter = delay_events(true, false);
		let both = delay_events(true, true);

		assert!(matches!(
			shorter.as_slice(),
			[Event::Settings(SettingsEvent::AdjustDelay { delta_secs: -1 })]
		));
		assert_eq!(both.len(), 2);
		assert!(delay_events(false, false).is_empty());
	}

	#[test]
	fn test_clear_forgets_fade_timestamps() {
		// Arrange
		let mut view = ViewManager::new();
		view.handle(&Event::View(ViewEvent::MediaReady {
			url: "/photos/1.jpg".into(),
		}));

		// Act
		view.handle(&Event::Media(MediaEvent::Clear));

		// Assert
		assert!(view.ready_at.is_empty());
	}

	#[test]
	fn test_skip_only_while_guide_showing() {
		let inputs = [InputEvent::Skip, InputEvent::NextPage];

		let hidden = input_events(&inputs, false);
		let showing = input_events(&inputs, true);

		assert_eq!(hidden.len(), 1);
		assert!(matches!(showing[0], Event::Guide(GuideEvent::Skip)));
	}

	#[test]
	fn test_status_set_and_dismissed() {
		let mut view = ViewManager::new();

		view.handle(&Event::Gateway(GatewayEvent::LoadError {
			message: "gallery unavailable".into(),
		}));
		let shown = view.status().map(str::to_string);
		view.handle(&Event::View(ViewEvent::DismissStatus));

		assert_eq!(shown.as_deref(), Some("gallery unavailable"));
		assert!(view.status().is_none());
	}
}
