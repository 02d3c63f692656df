//! Canvas 2D drawing of a `RenderSnapshot`

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::*;
use crate::sim::{RenderSnapshot, RoundPhase, Vfx, VfxKind};

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    dpr: f64,
}

impl CanvasRenderer {
    /// `None` if the canvas has no 2D context
    pub fn new(canvas: HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self {
            canvas,
            ctx,
            dpr: 1.0,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Size the backing store for `css_width` x `css_height` CSS pixels.
    /// Drawing afterwards is in CSS pixels.
    pub fn resize(&mut self, css_width: f64, css_height: f64, device_pixel_ratio: f64) {
        self.dpr = clamp_dpr(device_pixel_ratio);
        self.canvas
            .set_width((css_width * self.dpr).round().max(1.0) as u32);
        self.canvas
            .set_height((css_height * self.dpr).round().max(1.0) as u32);
        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", css_width));
        let _ = style.set_property("height", &format!("{}px", css_height));
        let _ = self
            .ctx
            .set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0);
    }

    pub fn draw(&self, snap: &RenderSnapshot<'_>) {
        let ctx = &self.ctx;
        let w = snap.bounds.width as f64;
        let h = snap.bounds.height as f64;

        ctx.clear_rect(0.0, 0.0, w, h);
        ctx.set_fill_style_str(BACKGROUND);
        ctx.fill_rect(0.0, 0.0, w, h);

        for entity in snap.entities {
            let scale = vanish_scale(entity) as f64;
            if scale <= 0.0 {
                continue;
            }
            let x = entity.pos.x as f64;
            let y = (entity.pos.y + bob_offset(entity)) as f64;
            let r = entity.radius as f64 * scale;

            ctx.begin_path();
            let _ = ctx.arc(x, y, r, 0.0, TAU);
            ctx.set_fill_style_str(kind_color(entity.kind));
            ctx.fill();

            ctx.begin_path();
            let _ = ctx.arc(x - r * 0.25, y - r * 0.25, r * 0.35, 0.0, TAU);
            ctx.set_fill_style_str(HIGHLIGHT);
            ctx.fill();
        }

        for vfx in snap.vfx {
            self.draw_vfx(vfx);
        }

        if snap.frozen {
            ctx.set_fill_style_str(FREEZE_TINT);
            ctx.fill_rect(0.0, 0.0, w, h);
        }

        if let RoundPhase::Countdown { remaining } = snap.phase {
            ctx.set_fill_style_str(TEXT_COLOR);
            ctx.set_font("bold 96px system-ui, sans-serif");
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            let _ = ctx.fill_text(&remaining.to_string(), w / 2.0, h / 2.0);
        }
    }

    fn draw_vfx(&self, vfx: &Vfx) {
        let ctx = &self.ctx;
        let alpha = vfx.alpha();
        let (x, y) = (vfx.pos.x as f64, vfx.pos.y as f64);

        match &vfx.kind {
            VfxKind::Ring { tint, .. } => {
                let Some(r) = vfx.ring_radius() else { return };
                ctx.begin_path();
                let _ = ctx.arc(x, y, r as f64, 0.0, TAU);
                ctx.set_stroke_style_str(&kind_rgba(*tint, alpha));
                ctx.set_line_width(3.0);
                ctx.stroke();
            }
            VfxKind::FloatText { text, tint } => {
                ctx.set_fill_style_str(&kind_rgba(*tint, alpha));
                ctx.set_font("bold 20px system-ui, sans-serif");
                ctx.set_text_align("center");
                ctx.set_text_baseline("middle");
                let _ = ctx.fill_text(text, x, y);
            }
        }
    }
}
