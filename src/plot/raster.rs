//! Raster backend over an RGB pixel canvas
//!
//! Pixels of the plot area are inverse sampled through the frame; text is
//! shaped and rasterised with `cosmic-text` and composited as alpha masks
//! so axis labels can be rotated. Saving goes through the `image` crate,
//! which picks the encoder from the file extension.

use std::path::Path;

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, SwashCache};
use image::RgbImage;
use log::trace;

use crate::error::Result;
use crate::settings::{CbarLocation, Color};
use crate::utils::{f, ScientificNotation};

use super::colormap::Norm;
use super::Frame;

const MARGIN_LEFT: u32 = 90;
const MARGIN_RIGHT: u32 = 40;
const MARGIN_TOP: u32 = 56;
const MARGIN_BOTTOM: u32 = 76;
const CBAR_GAP: u32 = 14;
const CBAR_LABEL_SPACE: u32 = 72;

/// Draw the frame onto a canvas of the given size and save it
pub fn render(frame: &Frame, size: [u32; 2], path: &Path) -> Result<()> {
    let mut canvas = Canvas::new(size[0], size[1], frame.background);
    let mut text = TextPainter::new();

    let (plot, cbar) = layout(frame, size);
    trace!("Plot area: {plot:?}, colorbar: {cbar:?}");

    draw_field(frame, &mut canvas, plot);
    canvas.stroke_rect(plot, frame.text_color.into());
    draw_axis_ticks(frame, &mut canvas, &mut text, plot);

    if let (Some(bar), Some(rect)) = (&frame.colorbar, cbar) {
        draw_colorbar(frame, &mut canvas, &mut text, rect, bar.location);
    }

    if let Some(title) = &frame.title {
        let (w, _) = text.measure(title, frame.title_font_size);
        let x = plot.x + plot.w.saturating_sub(w) / 2;
        text.draw(&mut canvas, title, frame.title_font_size, x as i32, 8, frame.text_color.into());
    }

    let (w, _) = text.measure(&frame.x_label, frame.label_font_size);
    text.draw(
        &mut canvas,
        &frame.x_label,
        frame.label_font_size,
        (plot.x + plot.w.saturating_sub(w) / 2) as i32,
        (plot.y + plot.h + 36) as i32,
        frame.text_color.into(),
    );

    let (w, _) = text.measure(&frame.y_label, frame.label_font_size);
    text.draw_rotated(
        &mut canvas,
        &frame.y_label,
        frame.label_font_size,
        12,
        (plot.y + plot.h / 2 + w / 2) as i32,
        frame.text_color.into(),
    );

    for (i, line) in frame.annotations.iter().enumerate() {
        text.draw(
            &mut canvas,
            line,
            frame.label_font_size,
            plot.x as i32,
            (plot.y + plot.h + 52 + i as u32 * 20) as i32,
            frame.text_color.into(),
        );
    }

    canvas.save(path)
}

/// Plot and colorbar rectangles inside the margins
///
/// The plot keeps the data aspect ratio, centered in the remaining space.
/// Shared with the SVG backend so both produce the same composition.
pub(crate) fn layout(frame: &Frame, size: [u32; 2]) -> (Rect, Option<Rect>) {
    let mut avail = Rect {
        x: MARGIN_LEFT,
        y: MARGIN_TOP,
        w: size[0].saturating_sub(MARGIN_LEFT + MARGIN_RIGHT).max(1),
        h: size[1].saturating_sub(MARGIN_TOP + MARGIN_BOTTOM).max(1),
    };

    let cbar = frame.colorbar.as_ref().map(|bar| {
        let reserve = |span: u32| (span as f64 * bar.thickness).round().max(4.0) as u32;
        match bar.location {
            CbarLocation::Right => {
                let t = reserve(avail.w);
                let taken = t + CBAR_GAP + CBAR_LABEL_SPACE;
                avail.w = avail.w.saturating_sub(taken).max(1);
                Rect { x: avail.x + avail.w + CBAR_GAP, y: avail.y, w: t, h: avail.h }
            }
            CbarLocation::Left => {
                let t = reserve(avail.w);
                let taken = t + CBAR_GAP + CBAR_LABEL_SPACE;
                let rect = Rect { x: avail.x + CBAR_LABEL_SPACE, y: avail.y, w: t, h: avail.h };
                avail.x += taken;
                avail.w = avail.w.saturating_sub(taken).max(1);
                rect
            }
            CbarLocation::Top => {
                let t = reserve(avail.h);
                let taken = t + CBAR_GAP + 24;
                let rect = Rect { x: avail.x, y: avail.y, w: avail.w, h: t };
                avail.y += taken;
                avail.h = avail.h.saturating_sub(taken).max(1);
                rect
            }
            CbarLocation::Bottom => {
                let t = reserve(avail.h);
                let taken = t + CBAR_GAP + 24;
                avail.h = avail.h.saturating_sub(taken).max(1);
                Rect { x: avail.x, y: avail.y + avail.h + CBAR_GAP, w: avail.w, h: t }
            }
        }
    });

    // equal-aspect fit of the data ranges into the available space
    let x_span = (frame.x_range.1 - frame.x_range.0).abs().max(f64::EPSILON);
    let y_span = (frame.y_range.1 - frame.y_range.0).abs().max(f64::EPSILON);
    let scale = (avail.w as f64 / x_span).min(avail.h as f64 / y_span);
    let w = (x_span * scale).round().max(1.0) as u32;
    let h = (y_span * scale).round().max(1.0) as u32;
    let plot = Rect {
        x: avail.x + (avail.w - w.min(avail.w)) / 2,
        y: avail.y + (avail.h - h.min(avail.h)) / 2,
        w: w.min(avail.w),
        h: h.min(avail.h),
    };

    // side colorbars track the plot height after the aspect fit
    let cbar = cbar.map(|mut rect| {
        if !frame.colorbar.as_ref().is_some_and(|b| b.location.is_horizontal()) {
            rect.y = plot.y;
            rect.h = plot.h;
        } else {
            rect.x = plot.x;
            rect.w = plot.w;
        }
        rect
    });

    (plot, cbar)
}

fn draw_field(frame: &Frame, canvas: &mut Canvas, plot: Rect) {
    let (x0, x1) = frame.x_range;
    let (y0, y1) = frame.y_range;
    for py in 0..plot.h {
        let y = y1 - (py as f64 + 0.5) / plot.h as f64 * (y1 - y0);
        for px in 0..plot.w {
            let x = x0 + (px as f64 + 0.5) / plot.w as f64 * (x1 - x0);
            if let Some(rgb) = frame.color_at(x, y) {
                canvas.set(plot.x + px, plot.y + py, rgb);
            }
        }
    }
}

fn draw_axis_ticks(frame: &Frame, canvas: &mut Canvas, text: &mut TextPainter, plot: Rect) {
    let color = frame.text_color.into();
    let size = frame.label_font_size * 0.85;

    for (value, px) in [(frame.x_range.0, 0), (frame.x_range.1, plot.w)] {
        let label = tick_label(value);
        let (w, _) = text.measure(&label, size);
        let x = (plot.x + px) as i32 - w as i32 / 2;
        text.draw(canvas, &label, size, x, (plot.y + plot.h + 6) as i32, color);
    }
    for (value, py) in [(frame.y_range.0, plot.h), (frame.y_range.1, 0)] {
        let label = tick_label(value);
        let (w, h) = text.measure(&label, size);
        let x = plot.x as i32 - w as i32 - 8;
        text.draw(canvas, &label, size, x, (plot.y + py) as i32 - h as i32 / 2, color);
    }
}

fn draw_colorbar(
    frame: &Frame,
    canvas: &mut Canvas,
    text: &mut TextPainter,
    rect: Rect,
    location: CbarLocation,
) {
    if location.is_horizontal() {
        for px in 0..rect.w {
            let t = px as f64 / (rect.w - 1).max(1) as f64;
            let rgb = frame.cmap.sample(t);
            for py in 0..rect.h {
                canvas.set(rect.x + px, rect.y + py, rgb);
            }
        }
    } else {
        for py in 0..rect.h {
            let t = 1.0 - py as f64 / (rect.h - 1).max(1) as f64;
            let rgb = frame.cmap.sample(t);
            for px in 0..rect.w {
                canvas.set(rect.x + px, rect.y + py, rgb);
            }
        }
    }
    canvas.stroke_rect(rect, frame.text_color.into());

    let color = frame.text_color.into();
    let size = frame.label_font_size * 0.85;
    let (min, max) = frame.norm.domain();
    let mid = match frame.norm {
        Norm::Log { min, max } => 10f64.powf((min.log10() + max.log10()) / 2.0),
        Norm::Linear { min, max } => (min + max) / 2.0,
    };

    for (value, t) in [(min, 0.0), (mid, 0.5), (max, 1.0)] {
        let label = tick_label(value);
        let (w, h) = text.measure(&label, size);
        let (x, y) = if location.is_horizontal() {
            let px = rect.x as f64 + t * rect.w as f64;
            let y = match location {
                CbarLocation::Top => rect.y as i32 - h as i32 - 4,
                _ => (rect.y + rect.h + 4) as i32,
            };
            (px as i32 - w as i32 / 2, y)
        } else {
            let py = rect.y as f64 + (1.0 - t) * rect.h as f64;
            let x = match location {
                CbarLocation::Left => rect.x as i32 - w as i32 - 6,
                _ => (rect.x + rect.w + 6) as i32,
            };
            (x, py as i32 - h as i32 / 2)
        };
        text.draw(canvas, &label, size, x, y, color);
    }
}

/// Compact tick label: plain for moderate magnitudes, scientific otherwise
pub(crate) fn tick_label(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 {
        "0".to_string()
    } else if (1.0e-3..1.0e4).contains(&magnitude) {
        let text = f!("{value:.3}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        value.sci(0, 2)
    }
}

/// A plain RGB8 canvas
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

/// A pixel rectangle, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&[background.r, background.g, background.b]);
        }
        Self { width, height, pixels }
    }

    pub fn set(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = ((y * self.width + x) * 3) as usize;
        self.pixels[i..i + 3].copy_from_slice(&rgb);
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * self.width + x) * 3) as usize;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Alpha-blend a color over the existing pixel
    pub fn blend(&mut self, x: i32, y: i32, rgb: [u8; 3], alpha: u8) {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return;
        }
        let a = alpha as u32;
        let i = ((y as u32 * self.width + x as u32) * 3) as usize;
        for c in 0..3 {
            let old = self.pixels[i + c] as u32;
            self.pixels[i + c] = ((rgb[c] as u32 * a + old * (255 - a)) / 255) as u8;
        }
    }

    pub fn stroke_rect(&mut self, rect: Rect, rgb: [u8; 3]) {
        for px in 0..rect.w {
            self.set(rect.x + px, rect.y, rgb);
            self.set(rect.x + px, rect.y + rect.h.saturating_sub(1), rgb);
        }
        for py in 0..rect.h {
            self.set(rect.x, rect.y + py, rgb);
            self.set(rect.x + rect.w.saturating_sub(1), rect.y + py, rgb);
        }
    }

    /// Encode and save, format chosen from the file extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let image = RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .expect("pixel buffer length matches the canvas dimensions");
        image.save(path)?;
        Ok(())
    }
}

impl From<Color> for [u8; 3] {
    fn from(color: Color) -> Self {
        [color.r, color.g, color.b]
    }
}

/// Shapes text with cosmic-text and composites it as alpha masks
pub struct TextPainter {
    fonts: FontSystem,
    cache: SwashCache,
}

struct Mask {
    w: u32,
    h: u32,
    alpha: Vec<u8>,
}

impl TextPainter {
    pub fn new() -> Self {
        Self {
            fonts: FontSystem::new(),
            cache: SwashCache::new(),
        }
    }

    /// Rendered size of a single line of text
    pub fn measure(&mut self, text: &str, size: f32) -> (u32, u32) {
        let mask = self.mask(text, size);
        (mask.w, mask.h)
    }

    /// Draw text with its top-left corner at `(x, y)`
    pub fn draw(&mut self, canvas: &mut Canvas, text: &str, size: f32, x: i32, y: i32, rgb: [u8; 3]) {
        let mask = self.mask(text, size);
        for my in 0..mask.h {
            for mx in 0..mask.w {
                let alpha = mask.alpha[(my * mask.w + mx) as usize];
                if alpha > 0 {
                    canvas.blend(x + mx as i32, y + my as i32, rgb, alpha);
                }
            }
        }
    }

    /// Draw text rotated 90 degrees counter-clockwise, reading bottom-up;
    /// `(x, y)` is the top-left of the rotated block
    pub fn draw_rotated(
        &mut self,
        canvas: &mut Canvas,
        text: &str,
        size: f32,
        x: i32,
        y: i32,
        rgb: [u8; 3],
    ) {
        let mask = self.mask(text, size);
        for my in 0..mask.h {
            for mx in 0..mask.w {
                let alpha = mask.alpha[(my * mask.w + mx) as usize];
                if alpha > 0 {
                    canvas.blend(x + my as i32, y - mx as i32, rgb, alpha);
                }
            }
        }
    }

    fn mask(&mut self, text: &str, size: f32) -> Mask {
        let line_height = size * 1.3;
        let mut buffer = Buffer::new(&mut self.fonts, Metrics::new(size, line_height));
        buffer.set_size(&mut self.fonts, None, None);
        buffer.set_text(
            &mut self.fonts,
            text,
            Attrs::new().family(Family::SansSerif),
            Shaping::Advanced,
        );
        buffer.shape_until_scroll(&mut self.fonts, false);

        let width = buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0f32, f32::max)
            .ceil()
            .max(1.0) as u32;
        let lines = buffer.layout_runs().count().max(1) as u32;
        let height = (lines as f32 * line_height).ceil().max(1.0) as u32;

        let mut mask = Mask {
            w: width,
            h: height,
            alpha: vec![0u8; (width * height) as usize],
        };
        buffer.draw(
            &mut self.fonts,
            &mut self.cache,
            cosmic_text::Color::rgb(255, 255, 255),
            |gx, gy, gw, gh, color| {
                let alpha = color.a();
                if alpha == 0 {
                    return;
                }
                for dy in 0..gh {
                    for dx in 0..gw {
                        let (px, py) = (gx + dx as i32, gy + dy as i32);
                        if px < 0 || py < 0 || px as u32 >= mask.w || py as u32 >= mask.h {
                            continue;
                        }
                        let i = (py as u32 * mask.w + px as u32) as usize;
                        mask.alpha[i] = mask.alpha[i].max(alpha);
                    }
                }
            },
        );
        mask
    }
}

impl Default for TextPainter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_starts_as_background() {
        let canvas = Canvas::new(4, 3, Color::rgb(10, 20, 30));
        assert_eq!(canvas.get(0, 0), [10, 20, 30]);
        assert_eq!(canvas.get(3, 2), [10, 20, 30]);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut canvas = Canvas::new(2, 2, Color::WHITE);
        canvas.set(5, 5, [0, 0, 0]);
        canvas.blend(-1, 0, [0, 0, 0], 255);
        assert_eq!(canvas.get(0, 0), [255, 255, 255]);
    }

    #[test]
    fn blend_mixes_towards_the_color() {
        let mut canvas = Canvas::new(1, 1, Color::WHITE);
        canvas.blend(0, 0, [0, 0, 0], 255);
        assert_eq!(canvas.get(0, 0), [0, 0, 0]);

        let mut canvas = Canvas::new(1, 1, Color::WHITE);
        canvas.blend(0, 0, [0, 0, 0], 128);
        let [r, _, _] = canvas.get(0, 0);
        assert!(r > 100 && r < 150);
    }

    #[test]
    fn stroke_leaves_the_interior_untouched() {
        let mut canvas = Canvas::new(5, 5, Color::WHITE);
        canvas.stroke_rect(Rect { x: 0, y: 0, w: 5, h: 5 }, [0, 0, 0]);
        assert_eq!(canvas.get(0, 0), [0, 0, 0]);
        assert_eq!(canvas.get(4, 4), [0, 0, 0]);
        assert_eq!(canvas.get(2, 2), [255, 255, 255]);
    }

    #[test]
    fn tick_labels_are_compact() {
        assert_eq!(tick_label(0.0), "0");
        assert_eq!(tick_label(1.5), "1.5");
        assert_eq!(tick_label(-2.0), "-2");
        // large magnitudes switch to scientific notation
        assert!(tick_label(1.0e7).contains('e'));
    }
}
