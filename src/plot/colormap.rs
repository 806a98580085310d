//! Colormap tables and value normalisation
//!
//! The default map is the VisIt "hot desaturated" table; a handful of
//! standard maps are also available by name, and any map name with an
//! `_r` suffix is the reversed version. Maps are piecewise-linear anchor
//! tables sampled at a normalised position in `[0, 1]`.

/// A named piecewise-linear colormap
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap {
    name: &'static str,
    anchors: Vec<(f64, [f64; 3])>,
    reversed: bool,
}

/// Anchor positions and RGB values of the VisIt hot desaturated map
const HOT_DESATURATED: &[(f64, [f64; 3])] = &[
    (0.000, [0.263, 0.263, 0.831]),
    (0.143, [0.000, 0.000, 0.357]),
    (0.286, [0.000, 1.000, 1.000]),
    (0.429, [0.000, 0.498, 0.000]),
    (0.571, [1.000, 1.000, 0.000]),
    (0.714, [1.000, 0.376, 0.000]),
    (0.857, [0.420, 0.000, 0.000]),
    (1.000, [0.878, 0.298, 0.294]),
];

const VIRIDIS: &[(f64, [f64; 3])] = &[
    (0.00, [0.267, 0.005, 0.329]),
    (0.25, [0.231, 0.322, 0.545]),
    (0.50, [0.128, 0.567, 0.551]),
    (0.75, [0.369, 0.789, 0.383]),
    (1.00, [0.993, 0.906, 0.144]),
];

const JET: &[(f64, [f64; 3])] = &[
    (0.000, [0.0, 0.0, 0.5]),
    (0.125, [0.0, 0.0, 1.0]),
    (0.375, [0.0, 1.0, 1.0]),
    (0.625, [1.0, 1.0, 0.0]),
    (0.875, [1.0, 0.0, 0.0]),
    (1.000, [0.5, 0.0, 0.0]),
];

const HOT: &[(f64, [f64; 3])] = &[
    (0.000, [0.0, 0.0, 0.0]),
    (0.365, [1.0, 0.0, 0.0]),
    (0.746, [1.0, 1.0, 0.0]),
    (1.000, [1.0, 1.0, 1.0]),
];

const GRAY: &[(f64, [f64; 3])] = &[(0.0, [0.0, 0.0, 0.0]), (1.0, [1.0, 1.0, 1.0])];

const TABLES: &[(&str, &[(f64, [f64; 3])])] = &[
    ("hot_desaturated", HOT_DESATURATED),
    ("viridis", VIRIDIS),
    ("jet", JET),
    ("hot", HOT),
    ("gray", GRAY),
];

impl ColorMap {
    /// Look a colormap up by name, honouring the `_r` reversal suffix
    pub fn by_name(name: &str) -> Option<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let (name, anchors) = TABLES.iter().find(|(n, _)| *n == base)?;
        Some(Self {
            name,
            anchors: anchors.to_vec(),
            reversed,
        })
    }

    /// Whether a name (with optional `_r` suffix) resolves to a table
    pub fn is_known(name: &str) -> bool {
        Self::by_name(name).is_some()
    }

    pub fn name(&self) -> &str {
        self.name
    }

    /// Sample the map at `t`, clamped to `[0, 1]`
    pub fn sample(&self, t: f64) -> [u8; 3] {
        let t = if self.reversed { 1.0 - t } else { t };
        let t = t.clamp(0.0, 1.0);

        let mut upper = 1;
        while upper < self.anchors.len() - 1 && self.anchors[upper].0 < t {
            upper += 1;
        }
        let (p0, c0) = self.anchors[upper - 1];
        let (p1, c1) = self.anchors[upper];

        let blend = if p1 > p0 { ((t - p0) / (p1 - p0)).clamp(0.0, 1.0) } else { 0.0 };
        let mut rgb = [0u8; 3];
        for (out, (a, b)) in rgb.iter_mut().zip(c0.iter().zip(c1.iter())) {
            *out = ((a + (b - a) * blend) * 255.0).round() as u8;
        }
        rgb
    }
}

/// Value normalisation onto `[0, 1]` for colormap sampling
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Norm {
    Linear { min: f64, max: f64 },
    Log { min: f64, max: f64 },
}

impl Norm {
    /// Build a normalisation over the given domain
    ///
    /// A log normalisation over a non-positive minimum clamps the lower
    /// bound to a tiny positive value rather than producing NaN.
    pub fn new(log_scale: bool, min: f64, max: f64) -> Self {
        if log_scale {
            let min = if min > 0.0 { min } else { f64::MIN_POSITIVE };
            let max = if max > min { max } else { min * 10.0 };
            Norm::Log { min, max }
        } else {
            Norm::Linear { min, max }
        }
    }

    /// Map a value into `[0, 1]`, clamped at the domain edges
    pub fn apply(&self, value: f64) -> f64 {
        let t = match *self {
            Norm::Linear { min, max } => {
                if max > min {
                    (value - min) / (max - min)
                } else {
                    0.5
                }
            }
            Norm::Log { min, max } => {
                let value = value.max(min);
                (value.log10() - min.log10()) / (max.log10() - min.log10())
            }
        };
        t.clamp(0.0, 1.0)
    }

    pub fn domain(&self) -> (f64, f64) {
        match *self {
            Norm::Linear { min, max } | Norm::Log { min, max } => (min, max),
        }
    }
}
