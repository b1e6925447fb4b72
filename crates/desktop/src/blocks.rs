//! Draws rendered message blocks with egui widgets.

use eframe::egui;
use lib::session::Sender;
use lib::ui::{Block, CodeToken, MessageNode, Span};

const CODE_LABEL_SIZE: f32 = 11.0;

pub fn message(ui: &mut egui::Ui, m: &MessageNode) {
    let is_user = m.sender == Sender::User;
    let frame = egui::Frame::none()
        .fill(if is_user {
            ui.style().visuals.extreme_bg_color
        } else {
            ui.style().visuals.panel_fill
        })
        .stroke(egui::Stroke::new(
            1.0,
            ui.style().visuals.widgets.noninteractive.bg_stroke.color,
        ))
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(egui::Margin::same(8.0));

    frame.show(ui, |ui| {
        ui.set_width(ui.available_width());
        for (idx, block) in m.blocks.iter().enumerate() {
            if idx > 0 {
                ui.add_space(6.0);
            }
            self::block(ui, block);
        }
    });
}

fn block(ui: &mut egui::Ui, block: &Block) {
    match block {
        Block::Literal(text) => {
            ui.label(egui::RichText::new(text).strong());
        }
        Block::Paragraph(spans) => spans_row(ui, spans, None),
        Block::Heading { level, spans } => {
            let size = match level {
                1 => 22.0,
                2 => 19.0,
                3 => 17.0,
                _ => 15.0,
            };
            spans_row(ui, spans, Some(size));
        }
        Block::ListItem {
            depth,
            marker,
            spans,
        } => {
            ui.horizontal_wrapped(|ui| {
                ui.add_space(16.0 * (*depth as f32 + 1.0));
                ui.label(marker.as_str());
                spans_inline(ui, spans, None);
            });
        }
        Block::Quote { depth, spans } => {
            ui.horizontal_wrapped(|ui| {
                for _ in 0..*depth {
                    ui.label(egui::RichText::new("▌").weak());
                }
                spans_inline(ui, spans, None);
            });
        }
        Block::Code { language, tokens, .. } => {
            egui::Frame::none()
                .fill(ui.style().visuals.extreme_bg_color)
                .rounding(egui::Rounding::same(4.0))
                .inner_margin(egui::Margin::same(6.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(egui::RichText::new(*language).size(CODE_LABEL_SIZE).weak());
                    let job = code_job(ui, tokens);
                    ui.label(job);
                });
        }
        Block::Table { header, rows } => {
            egui::Grid::new(ui.next_auto_id())
                .striped(true)
                .show(ui, |ui| {
                    for cell in header {
                        ui.label(egui::RichText::new(cell).strong());
                    }
                    ui.end_row();
                    for row in rows {
                        for cell in row {
                            ui.label(cell);
                        }
                        ui.end_row();
                    }
                });
        }
        Block::Rule => {
            ui.separator();
        }
    }
}

/// Lay out highlighted tokens in one monospace job; uncoloured tokens use the text colour.
fn code_job(ui: &egui::Ui, tokens: &[CodeToken]) -> egui::text::LayoutJob {
    let mut job = egui::text::LayoutJob::default();
    let font_id = egui::TextStyle::Monospace.resolve(ui.style());
    let default_color = ui.visuals().text_color();
    let last = tokens.len().saturating_sub(1);
    for (idx, token) in tokens.iter().enumerate() {
        let text = if idx == last {
            token.text.trim_end_matches('\n')
        } else {
            token.text.as_str()
        };
        let color = token
            .color
            .map(|[r, g, b]| egui::Color32::from_rgb(r, g, b))
            .unwrap_or(default_color);
        job.append(
            text,
            0.0,
            egui::TextFormat {
                font_id: font_id.clone(),
                color,
                italics: token.italic,
                ..Default::default()
            },
        );
    }
    job
}

fn spans_row(ui: &mut egui::Ui, spans: &[Span], size: Option<f32>) {
    ui.horizontal_wrapped(|ui| spans_inline(ui, spans, size));
}

fn spans_inline(ui: &mut egui::Ui, spans: &[Span], size: Option<f32>) {
    ui.spacing_mut().item_spacing.x = 0.0;
    for span in spans {
        let mut text = egui::RichText::new(&span.text);
        if let Some(size) = size {
            text = text.size(size).strong();
        }
        if span.style.strong {
            text = text.strong();
        }
        if span.style.emphasis {
            text = text.italics();
        }
        if span.style.strikethrough {
            text = text.strikethrough();
        }
        if span.style.code {
            text = text.code();
        }
        match &span.link {
            Some(url) => {
                ui.hyperlink_to(text, url);
            }
            None => {
                ui.label(text);
            }
        }
    }
}
