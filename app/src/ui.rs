use crate::app::{NoticeKind, SpamDetectorApp};

use eframe::egui::{
    self, Align2, Color32, FontId, Key, Pos2, RichText, Stroke, TextEdit, Vec2,
};
use spamdet::Label;

const BACKGROUND: Color32 = Color32::BLACK;
const TITLE_COLOR: Color32 = Color32::from_gray(0x44);
const SPAM_COLOR: Color32 = Color32::RED;
const HAM_COLOR: Color32 = Color32::from_rgb(144, 238, 144);

/// Draws the black backdrop, the falling particles and the faded title.
pub fn draw_background(app: &SpamDetectorApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::default().fill(BACKGROUND))
        .show(ctx, |ui| {
            let rect = ui.max_rect();
            let painter = ui.painter();

            for particle in app.particles.particles() {
                let radius = particle.size / 2.0;
                let center = particle.pos + Vec2::splat(radius);
                painter.circle_filled(center, radius, Color32::WHITE);
            }

            painter.text(
                Pos2::new(rect.center().x, rect.top() + rect.height() * 0.25),
                Align2::CENTER_CENTER,
                "SPAM DETECTOR",
                FontId::proportional((rect.width() / 12.0).max(24.0)),
                TITLE_COLOR,
            );
        });
}

/// Draws the prompt, the message input and the CHECK button.
///
/// Enter in the input runs the same check as the button, even while the
/// button is disabled, so a missing model is reported rather than ignored.
pub fn draw_input_area(app: &mut SpamDetectorApp, ctx: &egui::Context) {
    let width = ctx.screen_rect().width() * 0.8;

    egui::Area::new(egui::Id::new("input_area"))
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_width(width);
            ui.label(
                RichText::new("Enter a message to check:")
                    .size(14.0)
                    .color(Color32::WHITE),
            );
            ui.add_space(5.0);

            let response = ui.add(
                TextEdit::singleline(&mut app.input)
                    .font(FontId::proportional(22.0))
                    .desired_width(width),
            );
            let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

            ui.add_space(15.0);
            let clicked = ui
                .vertical_centered(|ui| {
                    let button = egui::Button::new(
                        RichText::new("CHECK").size(18.0).strong().color(Color32::BLACK),
                    )
                    .fill(Color32::WHITE)
                    .stroke(Stroke::NONE)
                    .min_size(Vec2::new(140.0, 44.0));
                    ui.add_enabled(app.can_classify(), button).clicked()
                })
                .inner;

            if clicked || submitted {
                app.check_message();
                response.request_focus();
            }
        });
}

/// Draws the last result and the status line below the input.
pub fn draw_result_area(app: &SpamDetectorApp, ctx: &egui::Context) {
    let height = ctx.screen_rect().height();

    if let Some(result) = &app.result {
        let color = match result.label {
            Label::Spam => SPAM_COLOR,
            Label::Ham => HAM_COLOR,
        };
        egui::Area::new(egui::Id::new("result_area"))
            .anchor(Align2::CENTER_CENTER, [0.0, height * 0.2])
            .show(ctx, |ui| {
                ui.label(
                    RichText::new(result.to_string())
                        .size(24.0)
                        .strong()
                        .color(color),
                );
            });
    }

    egui::Area::new(egui::Id::new("status_area"))
        .anchor(Align2::CENTER_CENTER, [0.0, height * 0.3])
        .show(ctx, |ui| {
            ui.label(RichText::new(&app.status).size(12.0).color(Color32::WHITE));
        });
}

/// Shows the pending notice, if any, as a centered dialog.
pub fn draw_notice(app: &mut SpamDetectorApp, ctx: &egui::Context) {
    let Some(notice) = &app.notice else {
        return;
    };
    let accent = match notice.kind {
        NoticeKind::Info => Color32::LIGHT_BLUE,
        NoticeKind::Warning => Color32::YELLOW,
        NoticeKind::Error => Color32::LIGHT_RED,
    };

    let mut dismissed = ctx.input(|i| i.key_pressed(Key::Escape));
    egui::Window::new(notice.kind.title())
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(RichText::new(&notice.message).color(accent));
            ui.add_space(8.0);
            ui.vertical_centered(|ui| {
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        });

    if dismissed {
        app.dismiss_notice();
    }
}
