//! Pseudocolor rendering of a resolved frame
//!
//! The backends draw by inverse sampling: every point of the plot area
//! maps through the axis ranges to Cartesian data coordinates, back to
//! polar, and into a nearest-cell (or bilinear, with `smooth_zones`)
//! lookup of the field. [`Frame`] packages the field, the polar sampling
//! and all resolved presentation settings; `raster` writes
//! png/jpeg/gif/tiff through the `image` crate and `svg` generates the
//! markup directly.

pub mod colormap;
pub mod raster;
pub mod svg;

use std::path::{Path, PathBuf};

use log::debug;
use ndarray::Array2;

use crate::error::{Error, Result};
use crate::settings::{CbarLocation, CbarScale, Color, ImageFormat, Settings};
use crate::transform::{cart2pol, meshgrid, PolarGrid};
use crate::utils::{f, title_case};
use crate::varname::VarNames;

use colormap::{ColorMap, Norm};

/// Colorbar placement resolved from the settings
#[derive(Debug, Clone, Copy)]
pub struct ColorBar {
    pub location: CbarLocation,
    /// Thickness as a fraction of the plot area
    pub thickness: f64,
}

/// Everything a backend needs to draw one frame
pub struct Frame<'a> {
    pub field: &'a Array2<f64>,
    pub grid: &'a PolarGrid,
    pub cmap: ColorMap,
    pub norm: Norm,
    pub title: Option<String>,
    pub x_label: String,
    pub y_label: String,
    /// Time annotations drawn under the plot area
    pub annotations: Vec<String>,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub smooth: bool,
    pub background: Color,
    pub text_color: Color,
    pub colorbar: Option<ColorBar>,
    pub title_font_size: f32,
    pub label_font_size: f32,
}

impl<'a> Frame<'a> {
    /// Resolve settings, data extents and time values into a drawable frame
    ///
    /// `time` is the frame time in seconds; `since_bounce` marks it as a
    /// bounce-relative value from a subtraction function rather than an
    /// absolute frame time.
    pub fn new(
        field: &'a Array2<f64>,
        grid: &'a PolarGrid,
        settings: &Settings,
        time: Option<f64>,
        since_bounce: bool,
    ) -> Result<Self> {
        let cmap = ColorMap::by_name(&settings.cmap).ok_or_else(|| Error::ConfigValidation {
            option: "cmap".to_string(),
            reason: f!("'{}' is not a recognised colormap name", settings.cmap),
        })?;

        let (x_range, y_range) = axis_ranges(grid, settings);
        debug!("Axis ranges: x {x_range:?}, y {y_range:?}");

        let log_scale = settings.cbar_scale == CbarScale::Log;
        let (data_min, data_max) = field_extremes(field, log_scale);
        let norm = Norm::new(
            log_scale,
            settings.cbar_domain[0].value_or(data_min),
            settings.cbar_domain[1].value_or(data_max),
        );
        debug!("Colorbar domain: {:?}", norm.domain());

        let mut annotations = Vec::new();
        if let Some(seconds) = time {
            let value = settings.time_format.scale(seconds);
            let suffix = settings.time_format.suffix();
            if since_bounce && settings.bounce_time_enabled {
                annotations.push(f!("t - t_bounce = {value:.3} {suffix}"));
            }
            if !since_bounce && settings.elapsed_time_enabled {
                annotations.push(f!("t = {value:.3} {suffix}"));
            }
        }

        let colorbar = settings.cbar_enabled.then(|| ColorBar {
            location: settings.cbar_location,
            thickness: settings.cbar_width.value_or(5.0) / 100.0,
        });

        Ok(Self {
            field,
            grid,
            cmap,
            norm,
            title: settings.title_enabled.then(|| settings.title.clone()),
            x_label: settings.x_range_label.clone(),
            y_label: settings.y_range_label.clone(),
            annotations,
            x_range,
            y_range,
            smooth: settings.smooth_zones,
            background: settings.background_color,
            text_color: settings.text_color,
            colorbar,
            title_font_size: settings.title_font_size.value_or(18) as f32,
            label_font_size: settings.label_font_size.value_or(14) as f32,
        })
    }

    /// Field value at a Cartesian data position, None outside the mesh
    pub fn sample(&self, x: f64, y: f64) -> Option<f64> {
        let (rho, phi) = cart2pol(x, y);
        if self.smooth {
            let (u, v) = self.grid.fractional(rho, phi)?;
            Some(self.bilinear(u, v))
        } else {
            let (i, j) = self.grid.nearest(rho, phi)?;
            Some(self.field[[i, j]])
        }
    }

    /// RGB color at a Cartesian data position, None outside the mesh
    pub fn color_at(&self, x: f64, y: f64) -> Option<[u8; 3]> {
        let value = self.sample(x, y)?;
        Some(self.cmap.sample(self.norm.apply(value)))
    }

    fn bilinear(&self, u: f64, v: f64) -> f64 {
        let (rows, cols) = self.field.dim();
        let i0 = (u.floor() as usize).min(rows - 1);
        let j0 = (v.floor() as usize).min(cols - 1);
        let i1 = (i0 + 1).min(rows - 1);
        let j1 = (j0 + 1).min(cols - 1);
        let (s, t) = (u - i0 as f64, v - j0 as f64);

        let top = self.field[[i0, j0]] * (1.0 - t) + self.field[[i0, j1]] * t;
        let bottom = self.field[[i1, j0]] * (1.0 - t) + self.field[[i1, j1]] * t;
        top * (1.0 - s) + bottom * s
    }
}

/// Auto axis ranges scale the full Cartesian extent by the zoom factor;
/// explicit range entries override per value
fn axis_ranges(grid: &PolarGrid, settings: &Settings) -> ((f64, f64), (f64, f64)) {
    let (x, y) = meshgrid(grid.rho(), grid.phi());
    let extent = |values: &Array2<f64>| {
        values.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    };
    let (x_min, x_max) = extent(&x);
    let (y_min, y_max) = extent(&y);

    let zoom = settings.zoom_value.value_or(1.0 / 90.0);
    let x_range = (
        settings.x_range_km[0].value_or(x_min * zoom),
        settings.x_range_km[1].value_or(x_max * zoom),
    );
    let y_range = (
        settings.y_range_km[0].value_or(y_min),
        settings.y_range_km[1].value_or(y_max * zoom),
    );
    (x_range, y_range)
}

/// Data extremes for the auto colorbar domain
///
/// A log normalisation ignores non-positive values when picking the
/// minimum so the domain stays usable.
fn field_extremes(field: &Array2<f64>, log_scale: bool) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in field {
        if log_scale && v <= 0.0 {
            continue;
        }
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    (min, max)
}

/// Output image path: `<DisplayVariable>_<frameStem>.<format>`
pub fn output_name(names: &VarNames, input: &Path, format: ImageFormat) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    PathBuf::from(f!(
        "{}_{stem}.{}",
        title_case(&names.display_variable),
        format.extension()
    ))
}

/// Draw the frame and save it in the requested format
pub fn render(frame: &Frame, size: [u32; 2], format: ImageFormat, path: &Path) -> Result<()> {
    match format {
        ImageFormat::Svg => svg::render(frame, size, path),
        _ => raster::render(frame, size, path),
    }
}
