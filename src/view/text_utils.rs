use eframe::egui;

/// Lays out a guide caption, centred and wrapped.
///
/// Supports:
/// - `*text*` for emphasised (yellow) text
/// - line breaks from the unescaped script text
pub fn caption_job(text: &str, font_size: f32, max_width: f32) -> egui::text::LayoutJob {
	let mut job = egui::text::LayoutJob::default();
	job.wrap = egui::text::TextWrapping {
		max_width,
		..Default::default()
	};
	job.halign = egui::Align::Center;

	let format = |emphasis: bool| egui::TextFormat {
		font_id: egui::FontId::proportional(font_size),
		color: if emphasis {
			egui::Color32::YELLOW
		} else {
			egui::Color32::WHITE
		},
		..Default::default()
	};

	let mut emphasis = false;
	let mut current_text = String::new();
	for ch in text.chars() {
		if ch == '*' {
			if !current_text.is_empty() {
				job.append(&current_text, 0.0, format(emphasis));
				current_text.clear();
			}
			emphasis = !emphasis;
		} else {
			current_text.push(ch);
		}
	}
	if !current_text.is_empty() {
		job.append(&current_text, 0.0, format(emphasis));
	}

	job
}

pub fn render_caption(ui: &mut egui::Ui, text: &str, font_size: f32) {
	let job = caption_job(text, font_size, ui.available_width());
	ui.vertical_centered(|ui| {
		ui.label(job);
	});
}
