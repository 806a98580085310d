//! Polar/Cartesian transforms and the sampling probe
//!
//! The grids are sampled on a polar mesh (radius x angle); the plot lives
//! in Cartesian coordinates. Conversions are the standard identities, and
//! [`PolarGrid`] maps a Cartesian position back to the nearest index pair
//! in the original sampling so the renderer can look field values up
//! pixel by pixel.

use ndarray::Array2;

/// Polar to Cartesian, `(x, y) = (rho cos phi, rho sin phi)`
pub fn pol2cart(rho: f64, phi: f64) -> (f64, f64) {
    (rho * phi.cos(), rho * phi.sin())
}

/// Cartesian to polar, `(rho, phi) = (hypot(x, y), atan2(y, x))`
pub fn cart2pol(x: f64, y: f64) -> (f64, f64) {
    (x.hypot(y), y.atan2(x))
}

/// Cartesian mesh arrays from the two 1D polar coordinate arrays
///
/// Both outputs are shaped `(rho.len(), phi.len())`, matching the field.
pub fn meshgrid(rho: &[f64], phi: &[f64]) -> (Array2<f64>, Array2<f64>) {
    let shape = (rho.len(), phi.len());
    let x = Array2::from_shape_fn(shape, |(i, j)| rho[i] * phi[j].cos());
    let y = Array2::from_shape_fn(shape, |(i, j)| rho[i] * phi[j].sin());
    (x, y)
}

/// The original polar sampling, kept for inverse lookups
///
/// Coordinate arrays are expected ascending, as stored.
#[derive(Debug, Clone)]
pub struct PolarGrid {
    rho: Vec<f64>,
    phi: Vec<f64>,
}

impl PolarGrid {
    pub fn new(rho: Vec<f64>, phi: Vec<f64>) -> Self {
        Self { rho, phi }
    }

    pub fn rho(&self) -> &[f64] {
        &self.rho
    }

    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    /// Nearest (rho, phi) index pair, None outside the sampled domain
    pub fn nearest(&self, rho: f64, phi: f64) -> Option<(usize, usize)> {
        Some((nearest_index(&self.rho, rho)?, nearest_index(&self.phi, phi)?))
    }

    /// Continuous (rho, phi) index pair for interpolated lookups
    pub fn fractional(&self, rho: f64, phi: f64) -> Option<(f64, f64)> {
        Some((
            fractional_index(&self.rho, rho)?,
            fractional_index(&self.phi, phi)?,
        ))
    }

    /// The interactive probe: Cartesian position to nearest sample indices
    pub fn probe(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (rho, phi) = cart2pol(x, y);
        self.nearest(rho, phi)
    }
}

/// Index of the closest entry in an ascending array, None out of range
fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    let (first, last) = (*values.first()?, *values.last()?);
    if target < first || target > last {
        return None;
    }
    let upper = values.partition_point(|&v| v < target);
    if upper == 0 {
        return Some(0);
    }
    if upper == values.len() {
        return Some(values.len() - 1);
    }
    let lower = upper - 1;
    if target - values[lower] <= values[upper] - target {
        Some(lower)
    } else {
        Some(upper)
    }
}

/// Continuous index into an ascending array, None out of range
fn fractional_index(values: &[f64], target: f64) -> Option<f64> {
    let (first, last) = (*values.first()?, *values.last()?);
    if target < first || target > last {
        return None;
    }
    let upper = values.partition_point(|&v| v < target);
    if upper == 0 {
        return Some(0.0);
    }
    if upper == values.len() {
        return Some((values.len() - 1) as f64);
    }
    let lower = upper - 1;
    let span = values[upper] - values[lower];
    if span <= 0.0 {
        return Some(lower as f64);
    }
    Some(lower as f64 + (target - values[lower]) / span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TOLERANCE: f64 = 1e-12;

    #[rstest]
    #[case(1.0, 0.0)]
    #[case(2.5, 1.2)]
    #[case(0.0, 0.0)]
    #[case(1e8, -2.9)]
    fn polar_round_trip(#[case] rho: f64, #[case] phi: f64) {
        let (x, y) = pol2cart(rho, phi);
        let (rho_back, phi_back) = cart2pol(x, y);
        assert!((rho - rho_back).abs() < TOLERANCE * rho.max(1.0));
        if rho > 0.0 {
            assert!((phi - phi_back).abs() < TOLERANCE);
        }
    }

    #[test]
    fn meshgrid_matches_field_shape() {
        let rho = [1.0, 2.0, 3.0];
        let phi = [0.0, std::f64::consts::FRAC_PI_2];
        let (x, y) = meshgrid(&rho, &phi);
        assert_eq!(x.dim(), (3, 2));
        assert!((x[[2, 0]] - 3.0).abs() < TOLERANCE);
        assert!(x[[2, 1]].abs() < TOLERANCE);
        assert!((y[[2, 1]] - 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn nearest_picks_the_closer_sample() {
        let values = [0.0, 1.0, 2.0, 4.0];
        assert_eq!(nearest_index(&values, 0.4), Some(0));
        assert_eq!(nearest_index(&values, 0.6), Some(1));
        assert_eq!(nearest_index(&values, 2.9), Some(2));
        assert_eq!(nearest_index(&values, 4.0), Some(3));
        assert_eq!(nearest_index(&values, -0.1), None);
        assert_eq!(nearest_index(&values, 4.1), None);
    }

    #[test]
    fn probe_is_none_outside_the_domain() {
        let grid = PolarGrid::new(vec![1.0, 2.0, 3.0], vec![0.0, 1.0, 2.0]);
        // inside: rho = sqrt(2), phi = pi/4
        assert_eq!(grid.probe(1.0, 1.0), Some((0, 1)));
        // rho below the innermost sample
        assert_eq!(grid.probe(0.1, 0.1), None);
        // negative angle, outside [0, 2]
        assert_eq!(grid.probe(1.0, -1.0), None);
    }

    #[test]
    fn fractional_interpolates_between_samples() {
        let values = [0.0, 2.0, 4.0];
        assert_eq!(fractional_index(&values, 1.0), Some(0.5));
        assert_eq!(fractional_index(&values, 3.0), Some(1.5));
        assert_eq!(fractional_index(&values, 4.0), Some(2.0));
        assert_eq!(fractional_index(&values, 5.0), None);
    }
}
