//! SVG backend generating the markup directly
//!
//! Cells of the polar mesh become filled quadrilaterals clipped to the
//! plot area, the colorbar is a `linearGradient` strip, and all text is
//! plain `<text>` markup. Layout comes from the raster backend so both
//! produce the same composition.

use std::fmt::Write;
use std::path::Path;

use crate::error::Result;
use crate::settings::{CbarLocation, Color};
use crate::transform::pol2cart;
use crate::utils::f;

use super::colormap::Norm;
use super::raster::{layout, Rect};
use super::Frame;

/// Generate the SVG document and write it out
pub fn render(frame: &Frame, size: [u32; 2], path: &Path) -> Result<()> {
    std::fs::write(path, document(frame, size))?;
    Ok(())
}

/// Build the full SVG document as a string
pub fn document(frame: &Frame, size: [u32; 2]) -> String {
    let (plot, cbar) = layout(frame, size);
    let mut svg = String::with_capacity(1 << 16);

    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = size[0],
        h = size[1]
    );
    svg.push('\n');

    let _ = writeln!(
        svg,
        r#"<rect width="{}" height="{}" fill="{}"/>"#,
        size[0],
        size[1],
        hex(frame.background)
    );

    let _ = writeln!(
        svg,
        r#"<clipPath id="plot-area"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath>"#,
        plot.x, plot.y, plot.w, plot.h
    );

    push_cells(frame, &mut svg, plot);

    let stroke = hex(frame.text_color);
    let _ = writeln!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{stroke}"/>"#,
        plot.x, plot.y, plot.w, plot.h
    );

    if let (Some(bar), Some(rect)) = (&frame.colorbar, cbar) {
        push_colorbar(frame, &mut svg, rect, bar.location);
    }

    push_text(frame, &mut svg, plot);
    svg.push_str("</svg>\n");
    svg
}

/// One filled quad per mesh cell, flat colored by its corner value
fn push_cells(frame: &Frame, svg: &mut String, plot: Rect) {
    let rho = frame.grid.rho();
    let phi = frame.grid.phi();
    let to_px = projector(frame, plot);

    let _ = writeln!(svg, r#"<g clip-path="url(#plot-area)" stroke="none">"#);
    for i in 0..rho.len().saturating_sub(1) {
        for j in 0..phi.len().saturating_sub(1) {
            let corners = [
                pol2cart(rho[i], phi[j]),
                pol2cart(rho[i + 1], phi[j]),
                pol2cart(rho[i + 1], phi[j + 1]),
                pol2cart(rho[i], phi[j + 1]),
            ];
            if outside_ranges(frame, &corners) {
                continue;
            }

            let value = frame.field[[i, j]];
            let [r, g, b] = frame.cmap.sample(frame.norm.apply(value));
            let mut points = String::new();
            for (x, y) in corners {
                let (px, py) = to_px(x, y);
                let _ = write!(points, "{px:.1},{py:.1} ");
            }
            let _ = writeln!(
                svg,
                r##"<polygon points="{}" fill="#{r:02x}{g:02x}{b:02x}"/>"##,
                points.trim_end()
            );
        }
    }
    let _ = writeln!(svg, "</g>");
}

fn push_colorbar(frame: &Frame, svg: &mut String, rect: Rect, location: CbarLocation) {
    let (x2, y2) = if location.is_horizontal() { (1, 0) } else { (0, 0) };
    let _ = writeln!(
        svg,
        r#"<linearGradient id="cbar" x1="0" y1="{y1}" x2="{x2}" y2="{y2}">"#,
        // vertical bars run max-at-top, so the gradient starts at the bottom
        y1 = if location.is_horizontal() { 0 } else { 1 },
    );
    for step in 0..=10 {
        let t = step as f64 / 10.0;
        let [r, g, b] = frame.cmap.sample(t);
        let _ = writeln!(
            svg,
            r##"<stop offset="{:.0}%" stop-color="#{r:02x}{g:02x}{b:02x}"/>"##,
            t * 100.0
        );
    }
    let _ = writeln!(svg, "</linearGradient>");
    let _ = writeln!(
        svg,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="url(#cbar)" stroke="{}"/>"#,
        rect.x,
        rect.y,
        rect.w,
        rect.h,
        hex(frame.text_color)
    );

    let (min, max) = frame.norm.domain();
    let mid = match frame.norm {
        Norm::Log { min, max } => 10f64.powf((min.log10() + max.log10()) / 2.0),
        Norm::Linear { min, max } => (min + max) / 2.0,
    };
    let size = frame.label_font_size * 0.85;
    for (value, t) in [(min, 0.0), (mid, 0.5), (max, 1.0)] {
        let (x, y, anchor) = if location.is_horizontal() {
            let x = rect.x as f64 + t * rect.w as f64;
            let y = match location {
                CbarLocation::Top => rect.y as f64 - 6.0,
                _ => (rect.y + rect.h) as f64 + size as f64 + 4.0,
            };
            (x, y, "middle")
        } else {
            let y = rect.y as f64 + (1.0 - t) * rect.h as f64 + size as f64 / 2.0;
            match location {
                CbarLocation::Left => (rect.x as f64 - 6.0, y, "end"),
                _ => ((rect.x + rect.w) as f64 + 6.0, y, "start"),
            }
        };
        let _ = writeln!(
            svg,
            r#"<text x="{x:.1}" y="{y:.1}" font-size="{size}" text-anchor="{anchor}" fill="{}">{}</text>"#,
            hex(frame.text_color),
            escape(&super::raster::tick_label(value))
        );
    }
}

fn push_text(frame: &Frame, svg: &mut String, plot: Rect) {
    let fill = hex(frame.text_color);
    let center_x = plot.x + plot.w / 2;

    if let Some(title) = &frame.title {
        let _ = writeln!(
            svg,
            r#"<text x="{center_x}" y="{}" font-size="{}" text-anchor="middle" fill="{fill}">{}</text>"#,
            plot.y.saturating_sub(16),
            frame.title_font_size,
            escape(title)
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{center_x}" y="{}" font-size="{}" text-anchor="middle" fill="{fill}">{}</text>"#,
        plot.y + plot.h + 48,
        frame.label_font_size,
        escape(&frame.x_label)
    );

    let y_mid = plot.y + plot.h / 2;
    let _ = writeln!(
        svg,
        r#"<text x="24" y="{y_mid}" font-size="{}" text-anchor="middle" fill="{fill}" transform="rotate(-90 24 {y_mid})">{}</text>"#,
        frame.label_font_size,
        escape(&frame.y_label)
    );

    for (i, line) in frame.annotations.iter().enumerate() {
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{}" font-size="{}" fill="{fill}">{}</text>"#,
            plot.x,
            plot.y + plot.h + 66 + i as u32 * 20,
            frame.label_font_size,
            escape(line)
        );
    }
}

/// Closure mapping data coordinates to pixel coordinates
fn projector(frame: &Frame, plot: Rect) -> impl Fn(f64, f64) -> (f64, f64) {
    let (x0, x1) = frame.x_range;
    let (y0, y1) = frame.y_range;
    let (px, py, pw, ph) = (plot.x as f64, plot.y as f64, plot.w as f64, plot.h as f64);
    move |x, y| {
        (
            px + (x - x0) / (x1 - x0) * pw,
            py + (y1 - y) / (y1 - y0) * ph,
        )
    }
}

/// Cheap bounding-box rejection of cells fully outside the axis ranges
fn outside_ranges(frame: &Frame, corners: &[(f64, f64); 4]) -> bool {
    let all = |p: &dyn Fn(f64, f64) -> bool| corners.iter().all(|&(x, y)| p(x, y));
    all(&|x, _| x < frame.x_range.0)
        || all(&|x, _| x > frame.x_range.1)
        || all(&|_, y| y < frame.y_range.0)
        || all(&|_, y| y > frame.y_range.1)
}

fn hex(color: Color) -> String {
    f!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
