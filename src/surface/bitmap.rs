use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

pub const WHITE: u32 = 0x00FFFFFF;

/// Raster memory the surface paints into. Each entry is `0x00RRGGBB`.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![WHITE; width * height],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.fill(color);
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, color: u32) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return;
        }
        self.pixels[y * self.width + x] = color;
    }

    /// Stamp a filled disk centered at (cx, cy). Off-bitmap parts are clipped.
    pub fn stamp_disk(&mut self, cx: i32, cy: i32, radius: f32, color: u32) {
        let r = radius.max(0.5);
        let span = r.ceil() as i32;
        let r2 = r * r;
        for dy in -span..=span {
            for dx in -span..=span {
                if (dx * dx + dy * dy) as f32 <= r2 {
                    self.put(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Draw a thick segment from p0 to p1 by stamping disks along a Bresenham
    /// traversal. Disks at both endpoints give the segment round caps, and
    /// consecutive segments sharing an endpoint get round joins for free.
    pub fn draw_segment(&mut self, p0: (f32, f32), p1: (f32, f32), radius: f32, color: u32) {
        let (mut x0, mut y0) = (p0.0.round() as i32, p0.1.round() as i32);
        let (x1, y1) = (p1.0.round() as i32, p1.1.round() as i32);

        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.stamp_disk(x0, y0, radius, color);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Encode the bitmap as a lossless PNG. An empty bitmap encodes to an
    /// empty byte vector.
    pub fn to_png(&self) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut rgb = Vec::with_capacity(self.pixels.len() * 3);
        for px in &self.pixels {
            rgb.push((px >> 16) as u8);
            rgb.push((px >> 8) as u8);
            rgb.push(*px as u8);
        }

        let mut out = Vec::new();
        let encoder = PngEncoder::new(&mut out);
        match encoder.write_image(
            &rgb,
            self.width as u32,
            self.height as u32,
            ExtendedColorType::Rgb8,
        ) {
            Ok(()) => out,
            Err(e) => {
                log::error!(target: "surface", "PNG encoding failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_bitmap_is_white() {
        let bitmap = Bitmap::new(4, 3);
        assert_eq!(bitmap.pixels.len(), 12);
        assert!(bitmap.pixels.iter().all(|&px| px == WHITE));
    }

    #[test]
    fn stamp_disk_clips_at_edges() {
        let mut bitmap = Bitmap::new(8, 8);
        bitmap.stamp_disk(0, 0, 3.0, 0x00123456);
        assert_eq!(bitmap.get(0, 0), Some(0x00123456));
        // Nothing outside the bitmap blows up, nothing far away is painted.
        assert_eq!(bitmap.get(7, 7), Some(WHITE));
    }

    #[test]
    fn segment_paints_both_endpoints() {
        let mut bitmap = Bitmap::new(32, 32);
        bitmap.draw_segment((4.0, 4.0), (20.0, 12.0), 1.0, 0x00AA0000);
        assert_eq!(bitmap.get(4, 4), Some(0x00AA0000));
        assert_eq!(bitmap.get(20, 12), Some(0x00AA0000));
        assert_eq!(bitmap.get(31, 31), Some(WHITE));
    }

    #[test]
    fn png_round_trip_preserves_dimensions() {
        let mut bitmap = Bitmap::new(10, 6);
        bitmap.stamp_disk(5, 3, 2.0, 0x001E293B);
        let png = bitmap.to_png();
        let decoded = image::load_from_memory(&png).expect("decode png").to_rgb8();
        assert_eq!(decoded.dimensions(), (10, 6));
        assert_eq!(decoded.get_pixel(5, 3).0, [0x1E, 0x29, 0x3B]);
    }

    #[test]
    fn empty_bitmap_encodes_to_nothing() {
        let bitmap = Bitmap::new(0, 0);
        assert!(bitmap.to_png().is_empty());
    }
}
