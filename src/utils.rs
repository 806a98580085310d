//! Common helpers used throughout the crate

/// Convenient shorthand for the format! macro
pub use std::format as f;

/// Scientific notation formatting for axis and colorbar labels
pub trait ScientificNotation {
    /// Format as `1.23e4` style scientific notation
    ///
    /// - `width` - minimum width of the formatted string
    /// - `precision` - number of decimal places in the mantissa
    fn sci(&self, width: usize, precision: usize) -> String;
}

impl ScientificNotation for f64 {
    fn sci(&self, width: usize, precision: usize) -> String {
        f!("{:>width$.precision$e}", self)
    }
}

/// Title-case a name the way display variables are shown
///
/// Only the first character is raised, the rest are lowered. e.g. `he3`
/// becomes `He3`, `ENTROPY` becomes `Entropy`.
pub fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Human-readable ordinal for error messages, e.g. "1st", "2nd", "4th"
pub fn ordinal(index: usize) -> String {
    match index {
        0 => "1st".to_string(),
        1 => "2nd".to_string(),
        2 => "3rd".to_string(),
        n => f!("{}th", n + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_case_variants() {
        assert_eq!(title_case("he3"), "He3");
        assert_eq!(title_case("ENTROPY"), "Entropy");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn ordinals() {
        assert_eq!(ordinal(0), "1st");
        assert_eq!(ordinal(1), "2nd");
        assert_eq!(ordinal(2), "3rd");
        assert_eq!(ordinal(3), "4th");
        assert_eq!(ordinal(10), "11th");
    }

    #[test]
    fn sci_formatting() {
        assert_eq!(12500.0.sci(0, 2), "1.25e4");
    }
}
