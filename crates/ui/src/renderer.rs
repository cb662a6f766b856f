use egui::{Align2, CornerRadius, FontId, Pos2, Rect, Stroke, StrokeKind};
use emberview_protocol::{Color, RenderCommand};

const FRAME_FONT_SIZE: f32 = 12.0;
const LABEL_INSET_X: f32 = 3.0;

fn to_color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

/// Paint an engine command stream into an egui painter.
///
/// `origin` is the canvas top-left in screen coordinates; commands use
/// canvas-local coordinates. Labels arrive pre-truncated, so painting
/// is a straight pass with no text measurement.
pub fn paint_commands(
    painter: &egui::Painter,
    commands: &[RenderCommand],
    origin: Pos2,
    canvas_size: egui::Vec2,
) {
    for command in commands {
        match command {
            RenderCommand::Clear { color } => {
                let rect = Rect::from_min_size(origin, canvas_size);
                painter.rect_filled(rect, CornerRadius::ZERO, to_color32(*color));
            }

            RenderCommand::DrawFrame {
                rect,
                color,
                label,
                dimmed,
                ..
            } => {
                let egui_rect = Rect::from_min_size(
                    Pos2::new(origin.x + rect.x as f32, origin.y + rect.y as f32),
                    egui::vec2(rect.w as f32, rect.h as f32),
                );

                if !painter.clip_rect().intersects(egui_rect) {
                    continue;
                }

                painter.rect_filled(egui_rect, CornerRadius::ZERO, to_color32(*color));
                painter.rect_stroke(
                    egui_rect,
                    CornerRadius::ZERO,
                    Stroke::new(1.0, egui::Color32::WHITE),
                    StrokeKind::Inside,
                );

                if let Some(text) = label {
                    // Left-anchored inside the visible part of the frame.
                    let x = egui_rect.left().max(origin.x) + LABEL_INSET_X;
                    painter.text(
                        Pos2::new(x, egui_rect.center().y),
                        Align2::LEFT_CENTER,
                        text.as_str(),
                        FontId::proportional(FRAME_FONT_SIZE),
                        egui::Color32::BLACK,
                    );
                }

                if *dimmed {
                    painter.rect_filled(
                        egui_rect,
                        CornerRadius::ZERO,
                        egui::Color32::from_rgba_unmultiplied(255, 255, 255, 128),
                    );
                }
            }
        }
    }
}
