//! Software framebuffer used to render the mock surface.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageBuffer, RgbImage};
use std::io::Cursor;

use super::types::{ClipRect, SurfaceError, SurfaceResult};

/// A virtual framebuffer for testing and programmatic drawing
///
/// Provides a full drawing API for creating test fixtures:
/// - `fill()` - Fill entire buffer with a color
/// - `draw_rect()` - Draw a filled rectangle
/// - `draw_text()` - Draw text using font8x8 glyphs
/// - `get_pixel()` / `set_pixel()` - Direct pixel access
/// - `crop()` - Cut out a sub-region, as a clipped screenshot would
#[derive(Debug, Clone)]
pub struct MockFramebuffer {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
}

impl MockFramebuffer {
    /// Create a new framebuffer with the given dimensions, initialized to black
    pub fn new(width: u32, height: u32) -> Self {
        let buffer = vec![0u8; (width as usize) * (height as usize) * 3];
        Self {
            width,
            height,
            buffer,
        }
    }

    /// Create a framebuffer initialized to a specific color
    pub fn with_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        let mut fb = Self::new(width, height);
        fb.fill(color);
        fb
    }

    /// Load a framebuffer from PNG image bytes
    pub fn from_png_bytes(data: &[u8]) -> SurfaceResult<Self> {
        let img = image::load_from_memory(data)
            .map_err(|e| SurfaceError::Capture(format!("Failed to load PNG: {}", e)))?;
        let rgb = img.to_rgb8();
        Ok(Self {
            width: rgb.width(),
            height: rgb.height(),
            buffer: rgb.into_raw(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fill the entire framebuffer with a color
    pub fn fill(&mut self, color: [u8; 3]) {
        for chunk in self.buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Draw a filled rectangle
    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for py in y..y.saturating_add(h).min(self.height) {
            for px in x..x.saturating_add(w).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Draw a one-pixel rectangle outline
    pub fn draw_outline(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        if w == 0 || h == 0 {
            return;
        }
        self.draw_rect(x, y, w, 1, color);
        self.draw_rect(x, y + h - 1, w, 1, color);
        self.draw_rect(x, y, 1, h, color);
        self.draw_rect(x + w - 1, y, 1, h, color);
    }

    /// Draw text using font8x8 glyphs
    ///
    /// Each character is 8x8 pixels. Text does not wrap.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            if cursor_x >= self.width {
                break;
            }
            self.draw_char(cursor_x, y, ch, fg, bg);
            cursor_x += 8;
        }
    }

    fn draw_char(&mut self, x: u32, y: u32, ch: char, fg: [u8; 3], bg: [u8; 3]) {
        let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
        for (row_idx, row) in glyph.iter().enumerate() {
            let py = y + row_idx as u32;
            if py >= self.height {
                break;
            }
            for bit in 0..8 {
                let px = x + bit;
                if px >= self.width {
                    break;
                }
                // font8x8 stores LSB as leftmost pixel
                let is_fg = (row >> bit) & 1 == 1;
                self.set_pixel(px, py, if is_fg { fg } else { bg });
            }
        }
    }

    /// Get the color of a pixel
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    /// Set the color of a pixel
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 3;
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    /// Cut out a region. Parts of the rectangle outside the buffer are
    /// clipped; a rectangle entirely outside is an error.
    pub fn crop(&self, clip: &ClipRect) -> SurfaceResult<MockFramebuffer> {
        let x0 = clip.x.max(0.0).floor() as u32;
        let y0 = clip.y.max(0.0).floor() as u32;
        let x1 = ((clip.x + clip.width).ceil().max(0.0) as u32).min(self.width);
        let y1 = ((clip.y + clip.height).ceil().max(0.0) as u32).min(self.height);

        if x0 >= x1 || y0 >= y1 {
            return Err(SurfaceError::Capture(format!(
                "Clip {:?} lies outside the {}x{} frame",
                clip, self.width, self.height
            )));
        }

        let mut out = MockFramebuffer::new(x1 - x0, y1 - y0);
        for y in y0..y1 {
            for x in x0..x1 {
                out.set_pixel(x - x0, y - y0, self.get_pixel(x, y));
            }
        }
        Ok(out)
    }

    /// Convert to an image buffer
    pub fn to_image(&self) -> SurfaceResult<RgbImage> {
        ImageBuffer::from_raw(self.width, self.height, self.buffer.clone())
            .ok_or_else(|| SurfaceError::Capture("Buffer size does not match dimensions".into()))
    }

    /// Encode the framebuffer as PNG bytes
    pub fn to_png(&self) -> SurfaceResult<Vec<u8>> {
        let img = self.to_image()?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .map_err(|e| SurfaceError::Capture(format!("Failed to encode PNG: {}", e)))?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_framebuffer_new() {
        let fb = MockFramebuffer::new(100, 50);
        assert_eq!(fb.width(), 100);
        assert_eq!(fb.height(), 50);
        assert_eq!(fb.get_pixel(0, 0), [0, 0, 0]);
        assert_eq!(fb.get_pixel(99, 49), [0, 0, 0]);
    }

    #[test]
    fn test_mock_framebuffer_draw_rect() {
        let mut fb = MockFramebuffer::new(20, 20);
        fb.draw_rect(5, 5, 10, 10, [255, 0, 0]);

        assert_eq!(fb.get_pixel(4, 4), [0, 0, 0]);
        assert_eq!(fb.get_pixel(5, 5), [255, 0, 0]);
        assert_eq!(fb.get_pixel(14, 14), [255, 0, 0]);
        assert_eq!(fb.get_pixel(15, 15), [0, 0, 0]);
    }

    #[test]
    fn test_mock_framebuffer_draw_text() {
        let mut fb = MockFramebuffer::new(80, 16);
        fb.draw_text(0, 0, "Hi", [255, 255, 255], [0, 0, 0]);

        let has_white = (0..8).any(|y| (0..8).any(|x| fb.get_pixel(x, y) == [255, 255, 255]));
        assert!(has_white, "Character 'H' should have some foreground pixels");
    }

    #[test]
    fn test_crop_copies_region() {
        let mut fb = MockFramebuffer::with_color(40, 40, [10, 10, 10]);
        fb.draw_rect(10, 10, 5, 5, [200, 0, 0]);

        let cropped = fb.crop(&ClipRect::new(10.0, 10.0, 5.0, 5.0)).unwrap();
        assert_eq!(cropped.width(), 5);
        assert_eq!(cropped.height(), 5);
        assert_eq!(cropped.get_pixel(0, 0), [200, 0, 0]);
        assert_eq!(cropped.get_pixel(4, 4), [200, 0, 0]);
    }

    #[test]
    fn test_crop_clips_to_frame() {
        let fb = MockFramebuffer::new(30, 30);
        let cropped = fb.crop(&ClipRect::new(20.0, 20.0, 50.0, 50.0)).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (10, 10));

        assert!(fb.crop(&ClipRect::new(40.0, 0.0, 10.0, 10.0)).is_err());
    }

    #[test]
    fn test_png_roundtrip_keeps_pixels() {
        let mut fb = MockFramebuffer::new(32, 32);
        fb.fill([100, 150, 200]);
        fb.draw_rect(8, 8, 16, 16, [255, 0, 0]);

        let png = fb.to_png().unwrap();
        assert_eq!(&png[0..4], &[0x89, 0x50, 0x4E, 0x47]);
        let back = MockFramebuffer::from_png_bytes(&png).unwrap();
        assert_eq!(back.get_pixel(0, 0), [100, 150, 200]);
        assert_eq!(back.get_pixel(10, 10), [255, 0, 0]);
    }
}
