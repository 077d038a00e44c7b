//! Canvas drawing for the play field plus the transient effects (judgement
//! text, hit-line flash, screen shake) that outlive a single frame.

use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::game::animator::FrameReport;
use crate::game::{GameEvent, Session};

/// Height of the key indicator strip below the field.
pub const INDICATOR_HEIGHT: f64 = 60.0;
const NOTE_HEIGHT: f64 = 20.0;
const FEEDBACK_MS: f64 = 300.0;
const SHAKE_MS: f64 = 300.0;
const FLASH_MS: f64 = 100.0;

#[derive(Default)]
pub struct Effects {
    feedback: Option<(&'static str, f64)>,
    shake_start: Option<f64>,
    flash_until: f64,
}

impl Effects {
    pub fn apply(&mut self, events: &[GameEvent], now_ms: f64) {
        for ev in events {
            if let Some(text) = ev.feedback() {
                self.feedback = Some((text, now_ms));
            }
            if ev.shakes() {
                self.shake_start = Some(now_ms);
            }
        }
    }

    pub fn flash_hit_line(&mut self, now_ms: f64) {
        self.flash_until = now_ms + FLASH_MS;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn shake_offset(&self, now_ms: f64) -> f64 {
        match self.shake_start {
            Some(start) if now_ms - start < SHAKE_MS => {
                let fade = 1.0 - (now_ms - start) / SHAKE_MS;
                (now_ms * 0.09).sin() * 6.0 * fade
            }
            _ => 0.0,
        }
    }
}

pub fn draw(
    canvas: &HtmlCanvasElement,
    ctx: &CanvasRenderingContext2d,
    session: &Session,
    report: Option<&FrameReport>,
    fx: &Effects,
    now_ms: f64,
) {
    let width = canvas.width() as f64;
    let height = canvas.height() as f64;
    let lanes = &session.config().lanes;
    let lane_w = width / lanes.len().max(1) as f64;
    let mapping = session.mapping();
    let field_end = mapping.field_length();

    ctx.save();
    ctx.translate(fx.shake_offset(now_ms), 0.0).ok();

    ctx.set_fill_style_str("#181818");
    ctx.fill_rect(0.0, 0.0, width, height);

    // Lane separators
    ctx.set_stroke_style_str("#2a2a2a");
    ctx.set_line_width(2.0);
    for i in 1..lanes.len() {
        let x = i as f64 * lane_w;
        line(ctx, x, 0.0, x, field_end);
    }

    // Hit band and hit line
    let (band_lo, band_hi) = mapping.band();
    ctx.set_fill_style_str("rgba(255,220,120,0.10)");
    ctx.fill_rect(0.0, band_lo, width, band_hi - band_lo);
    let flashing = now_ms < fx.flash_until;
    ctx.set_stroke_style_str(if flashing { "#ffffff" } else { "#777777" });
    ctx.set_line_width(if flashing { 4.0 } else { 2.0 });
    line(ctx, 0.0, mapping.hit_line(), width, mapping.hit_line());

    // Notes
    if let Some(report) = report {
        for sprite in &report.sprites {
            let Some(lane) = lanes.get(sprite.lane) else {
                continue;
            };
            let x = sprite.lane as f64 * lane_w;
            let top = (sprite.position - NOTE_HEIGHT / 2.0).max(0.0);
            let bottom = (sprite.position + NOTE_HEIGHT / 2.0).min(field_end);
            if bottom <= top {
                continue;
            }
            ctx.set_fill_style_str(&lane.color);
            ctx.fill_rect(x + 6.0, top, lane_w - 12.0, bottom - top);
        }
    }

    // Key indicators
    ctx.set_font("22px 'Fira Code', monospace");
    ctx.set_text_align("center");
    for (i, lane) in lanes.iter().enumerate() {
        let x = i as f64 * lane_w;
        let pressed = session.keymap().is_pressed(i);
        ctx.set_global_alpha(if pressed { 1.0 } else { 0.35 });
        ctx.set_fill_style_str(&lane.color);
        ctx.fill_rect(x + 4.0, field_end + 6.0, lane_w - 8.0, INDICATOR_HEIGHT - 12.0);
        ctx.set_global_alpha(1.0);
        ctx.set_fill_style_str("#ffffff");
        ctx.fill_text(&lane.key, x + lane_w / 2.0, field_end + INDICATOR_HEIGHT / 2.0 + 8.0).ok();
    }

    // Judgement text fades out like the old slash effect
    if let Some((text, start)) = fx.feedback {
        let alpha = 1.0 - ((now_ms - start) / FEEDBACK_MS).clamp(0.0, 1.0);
        if alpha > 0.0 {
            ctx.set_global_alpha(alpha);
            ctx.set_font("36px 'Fira Code', monospace");
            ctx.set_fill_style_str(if text == "Perfect" { "#ffd166" } else { "#ff4d4d" });
            ctx.fill_text(text, width / 2.0, band_lo - 30.0).ok();
            ctx.set_global_alpha(1.0);
        }
    }

    ctx.restore();
}

fn line(ctx: &CanvasRenderingContext2d, x1: f64, y1: f64, x2: f64, y2: f64) {
    ctx.begin_path();
    ctx.move_to(x1, y1);
    ctx.line_to(x2, y2);
    ctx.stroke();
}
