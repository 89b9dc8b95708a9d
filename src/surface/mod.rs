mod bitmap;
mod brush;

pub use bitmap::Bitmap;
pub use brush::{Brush, BrushColor};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// A pointer position in on-screen logical coordinates.
pub type PointerPosition = (f32, f32);

/// Snapshot of the brush taken when a stroke starts. The stroke keeps these
/// values until it ends, so `set_brush` never recolors a stroke in progress.
#[derive(Debug, Clone, Copy)]
struct ActiveStroke {
    last: (f32, f32),
    color: u32,
    radius: f32,
}

/// The drawing surface: a white pixel buffer at native device resolution plus
/// the machinery to turn pointer movement into painted strokes.
///
/// The backing bitmap is sized `logical * device_pixel_ratio`, while pointer
/// input arrives in logical (CSS) coordinates against the displayed size.
/// The two diverge on high-DPI displays and under flexible layouts, so every
/// pointer position is rescaled per axis before it touches the bitmap.
pub struct DrawingSurface {
    bitmap: Bitmap,
    view_width: f32,
    view_height: f32,
    device_pixel_ratio: f32,
    brush: Brush,
    active: Option<ActiveStroke>,
}

impl DrawingSurface {
    /// Allocate a white bitmap of `logical * device_pixel_ratio` pixels.
    /// The displayed size starts equal to the logical size.
    pub fn new(logical_width: u32, logical_height: u32, device_pixel_ratio: f32) -> Self {
        let dpr = if device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        let width = (logical_width as f32 * dpr).round() as usize;
        let height = (logical_height as f32 * dpr).round() as usize;
        log::debug!(
            target: "surface",
            "surface initialized: {}x{} logical, {}x{} bitmap (dpr {})",
            logical_width, logical_height, width, height, dpr
        );
        Self {
            bitmap: Bitmap::new(width, height),
            view_width: logical_width as f32,
            view_height: logical_height as f32,
            device_pixel_ratio: dpr,
            brush: Brush::default(),
            active: None,
        }
    }

    pub fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    /// Update the displayed size the surface is mapped against. The bitmap is
    /// untouched; only the pointer scale factors change. Called when the
    /// on-screen footprint is resized out from under the bitmap.
    pub fn set_view_size(&mut self, width: f32, height: f32) {
        self.view_width = width;
        self.view_height = height;
    }

    /// Map a pointer position in displayed coordinates to bitmap coordinates.
    ///
    /// The scale factors are independent per axis: a surface displayed at
    /// 300x200 over a 600x300 bitmap maps (150, 100) to (300, 150). Assuming
    /// a uniform scale here is exactly the "cursor drift" bug this exists to
    /// avoid.
    fn map_to_bitmap(&self, pos: PointerPosition) -> Option<(f32, f32)> {
        if self.bitmap.is_empty() || self.view_width <= 0.0 || self.view_height <= 0.0 {
            return None;
        }
        let scale_x = self.bitmap.width as f32 / self.view_width;
        let scale_y = self.bitmap.height as f32 / self.view_height;
        Some((pos.0 * scale_x, pos.1 * scale_y))
    }

    /// Start a new stroke at the mapped pointer position. Nothing is painted
    /// until the stroke is extended. No-op on an unsized surface.
    pub fn begin_stroke(&mut self, pos: PointerPosition) {
        let Some(mapped) = self.map_to_bitmap(pos) else {
            return;
        };
        self.active = Some(ActiveStroke {
            last: mapped,
            color: self.brush.color.rgb(),
            radius: self.brush.width * self.device_pixel_ratio / 2.0,
        });
    }

    /// Extend the active stroke to the mapped pointer position, painting a
    /// round-capped segment from the previous point. Ignored when no stroke
    /// is active, so stray move events cannot paint.
    pub fn extend_stroke(&mut self, pos: PointerPosition) {
        let Some(stroke) = self.active else {
            return;
        };
        let Some(mapped) = self.map_to_bitmap(pos) else {
            return;
        };
        self.bitmap
            .draw_segment(stroke.last, mapped, stroke.radius, stroke.color);
        if let Some(active) = self.active.as_mut() {
            active.last = mapped;
        }
    }

    /// Terminate the active stroke. Further `extend_stroke` calls are no-ops
    /// until the next `begin_stroke`.
    pub fn end_stroke(&mut self) {
        self.active = None;
    }

    /// Refill the bitmap with white and discard any in-progress stroke.
    pub fn clear(&mut self) {
        self.active = None;
        self.bitmap.fill(bitmap::WHITE);
    }

    /// Swap the brush used by strokes begun after this call. A stroke in
    /// progress keeps the brush it started with.
    pub fn set_brush(&mut self, color: BrushColor, width: f32) {
        self.brush = Brush { color, width };
    }

    /// Encode the current bitmap as a PNG, exactly as it stands.
    pub fn export_png(&self) -> Vec<u8> {
        self.bitmap.to_png()
    }

    /// PNG export as bare base64, with no `data:` prefix, ready for the wire.
    pub fn export_base64(&self) -> String {
        BASE64.encode(self.export_png())
    }
}

impl Default for DrawingSurface {
    /// An unsized surface: every mutating call is a no-op and exports are
    /// empty. Stands in for a surface whose backing store never materialized.
    fn default() -> Self {
        Self::new(0, 0, 1.0)
    }
}
