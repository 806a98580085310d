//! Resolution of user-supplied variable paths into grid/variable names
//!
//! A `variable` setting like `path/to/field` splits into a grid name
//! (`path/to`) and a variable name (`field`). Abundance species get a
//! shorthand: `abundance/he3` and `abundance/he/3` both resolve to the
//! `He3` attribute under the `Abundance/He` grid, displayed as plain
//! `Abundance`.
//!
//! This is pure string work with no I/O.

use crate::utils::{f, title_case};

/// A resolved (grid, variable) pair plus the names shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarNames {
    /// The variable string exactly as the user supplied it
    pub raw: String,
    /// Grid name as it appears in the XDMF tree
    pub grid: String,
    /// Attribute name as it appears in the XDMF tree
    pub variable: String,
    /// Variable name used for titles and output file names
    pub display_variable: String,
    /// Grid name used for titles
    pub display_grid: String,
}

/// Resolve a raw `variable` setting into grid and variable names
pub fn resolve(raw: &str) -> VarNames {
    if let Some(names) = abundance_shorthand(raw) {
        return names;
    }

    let mut segments = raw.split('/').collect::<Vec<&str>>();
    let variable = segments.pop().unwrap_or_default().to_string();
    let grid = segments.join("/");

    VarNames {
        raw: raw.to_string(),
        display_variable: variable.clone(),
        display_grid: grid.clone(),
        grid,
        variable,
    }
}

/// Strict match for the abundance shorthand
///
/// The pattern is `abundance/<1-2 ascii letters><digits>`, case-insensitive,
/// with an optional `/` between the element and the mass number. Anything
/// containing "abundance" that does not match exactly is NOT shorthand.
fn abundance_shorthand(raw: &str) -> Option<VarNames> {
    let lower = raw.to_lowercase();
    let rest = lower.strip_prefix("abundance/")?;

    let letters = rest
        .chars()
        .take_while(|c| c.is_ascii_lowercase())
        .collect::<String>();
    if letters.is_empty() || letters.len() > 2 {
        return None;
    }

    let tail = &rest[letters.len()..];
    let digits = tail.strip_prefix('/').unwrap_or(tail);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let element = title_case(&letters);
    let variable = f!("{element}{digits}");

    Some(VarNames {
        raw: raw.to_string(),
        grid: f!("Abundance/{element}"),
        display_variable: variable.clone(),
        variable,
        display_grid: "Abundance".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("abundance/he3")]
    #[case("abundance/he/3")]
    #[case("Abundance/He3")]
    fn abundance_shorthand_forms(#[case] raw: &str) {
        let names = resolve(raw);
        assert_eq!(names.variable, "He3");
        assert_eq!(names.grid, "Abundance/He");
        assert_eq!(names.display_grid, "Abundance");
        assert_eq!(names.display_variable, "He3");
    }

    #[test]
    fn single_letter_element() {
        let names = resolve("abundance/h1");
        assert_eq!(names.variable, "H1");
        assert_eq!(names.grid, "Abundance/H");
    }

    #[rstest]
    #[case("abundance_report")]
    #[case("abundance/he")]
    #[case("abundance/xyz3")]
    #[case("abundance/he3x")]
    fn not_shorthand(#[case] raw: &str) {
        let names = resolve(raw);
        assert_ne!(names.display_grid, "Abundance");
    }

    #[test]
    fn general_path_split() {
        let names = resolve("path/to/field");
        assert_eq!(names.grid, "path/to");
        assert_eq!(names.variable, "field");
        assert_eq!(names.display_grid, "path/to");
        assert_eq!(names.display_variable, "field");
    }

    #[test]
    fn bare_variable_has_empty_grid() {
        let names = resolve("entropy");
        assert_eq!(names.grid, "");
        assert_eq!(names.variable, "entropy");
    }
}
