//! Plot settings parsed from the plaintext settings file
//!
//! The settings file is line-oriented: one option per line as
//! `-option value...`, with blank lines ignored and lines starting `//`
//! treated as comments. Values follow shell-like quoting rules so labels
//! may contain spaces.
//!
//! ```text
//! // plot.config
//! -variable "abundance/he3"
//! -cmap viridis
//! -cbar_scale log
//! -title "\Variable at bounce"
//! ```
//!
//! Every option is validated against its type on read. Any failure is a
//! [Error::ConfigValidation](crate::error::Error) naming the option and
//! the offending token, raised before any frame is processed. The parsed
//! [Settings] value is immutable for the rest of the run apart from
//! placeholder substitution into the three text fields.

use std::fmt;
use std::path::Path;

use log::warn;
use nom::branch::alt;
use nom::bytes::complete::{is_not, take};
use nom::character::complete::{char as nom_char, multispace0};
use nom::combinator::map;
use nom::multi::{fold_many0, fold_many1, many0};
use nom::sequence::{delimited, preceded};
use nom::IResult;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::{f, title_case};
use crate::varname::VarNames;

/// A value that may be given explicitly or left as `auto`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum AutoOr<T> {
    Auto,
    Value(T),
}

impl<T: Copy> AutoOr<T> {
    /// The explicit value, or `default` when set to auto
    pub fn value_or(self, default: T) -> T {
        match self {
            AutoOr::Auto => default,
            AutoOr::Value(v) => v,
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, AutoOr::Auto)
    }
}

/// An RGB color parsed from a name or `#rrggbb` hex spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a color name or hex spec
    ///
    /// Accepts a small table of common names plus `#rgb`/`#rrggbb`.
    pub fn parse(value: &str) -> Option<Color> {
        let named = match value.to_lowercase().as_str() {
            "white" => Color::rgb(255, 255, 255),
            "black" => Color::rgb(0, 0, 0),
            "red" => Color::rgb(255, 0, 0),
            "green" => Color::rgb(0, 128, 0),
            "blue" => Color::rgb(0, 0, 255),
            "cyan" => Color::rgb(0, 255, 255),
            "magenta" => Color::rgb(255, 0, 255),
            "yellow" => Color::rgb(255, 255, 0),
            "orange" => Color::rgb(255, 165, 0),
            "purple" => Color::rgb(128, 0, 128),
            "brown" => Color::rgb(165, 42, 42),
            "pink" => Color::rgb(255, 192, 203),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            "lightgray" | "lightgrey" => Color::rgb(211, 211, 211),
            "darkgray" | "darkgrey" => Color::rgb(64, 64, 64),
            "navy" => Color::rgb(0, 0, 128),
            hex => return Color::parse_hex(hex),
        };
        Some(named)
    }

    fn parse_hex(value: &str) -> Option<Color> {
        let digits = value.strip_prefix('#')?;
        match digits.len() {
            3 => {
                let mut c = digits.chars().map(|d| d.to_digit(16));
                let (r, g, b) = (c.next()??, c.next()??, c.next()??);
                Some(Color::rgb((r * 17) as u8, (g * 17) as u8, (b * 17) as u8))
            }
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Color::rgb(r, g, b))
            }
            _ => None,
        }
    }
}

/// Linear or logarithmic colorbar normalisation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CbarScale {
    Lin,
    Log,
}

/// Which side of the plot the colorbar sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CbarLocation {
    Left,
    Right,
    Top,
    Bottom,
}

impl CbarLocation {
    pub fn is_horizontal(self) -> bool {
        matches!(self, CbarLocation::Top | CbarLocation::Bottom)
    }
}

/// Time unit used for the elapsed/bounce time annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeFormat {
    Seconds,
    Milliseconds,
}

impl TimeFormat {
    /// Scale a time in seconds into this unit
    pub fn scale(self, seconds: f64) -> f64 {
        match self {
            TimeFormat::Seconds => seconds,
            TimeFormat::Milliseconds => seconds * 1.0e3,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            TimeFormat::Seconds => "s",
            TimeFormat::Milliseconds => "ms",
        }
    }
}

/// Output image format
///
/// `pdf`, `ps` and `eps` are recognised names from the original settings
/// grammar but are rejected at validation since no backend writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageFormat {
    Png,
    Svg,
    Jpeg,
    Gif,
    Tiff,
}

impl ImageFormat {
    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Gif => "gif",
            ImageFormat::Tiff => "tiff",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// The full set of plot options, constructed once per run
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// The attribute to plot, e.g. `Entropy` or `abundance/he3` (required)
    pub variable: String,
    /// Colormap name
    pub cmap: String,
    pub background_color: Color,
    pub text_color: Color,
    pub cbar_scale: CbarScale,
    pub cbar_domain: [AutoOr<f64>; 2],
    pub cbar_enabled: bool,
    pub cbar_location: CbarLocation,
    /// Colorbar thickness as a percentage of the plot area
    pub cbar_width: AutoOr<f64>,
    pub title: String,
    pub title_enabled: bool,
    pub title_font: Option<String>,
    pub title_font_size: AutoOr<u32>,
    pub label_font_size: AutoOr<u32>,
    pub smooth_zones: bool,
    pub image_format: ImageFormat,
    pub image_size: [u32; 2],
    pub x_range_km: [AutoOr<f64>; 2],
    pub y_range_km: [AutoOr<f64>; 2],
    pub x_range_label: String,
    pub y_range_label: String,
    pub time_format: TimeFormat,
    pub bounce_time_enabled: bool,
    pub elapsed_time_enabled: bool,
    /// Fraction of the full coordinate range shown when axis ranges are auto
    pub zoom_value: AutoOr<f64>,
    pub var_unit: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variable: String::new(),
            cmap: "hot_desaturated".to_string(),
            background_color: Color::WHITE,
            text_color: Color::BLACK,
            cbar_scale: CbarScale::Lin,
            cbar_domain: [AutoOr::Auto, AutoOr::Auto],
            cbar_enabled: true,
            cbar_location: CbarLocation::Right,
            cbar_width: AutoOr::Value(5.0),
            title: "AttributeName".to_string(),
            title_enabled: true,
            title_font: None,
            title_font_size: AutoOr::Auto,
            label_font_size: AutoOr::Auto,
            smooth_zones: false,
            image_format: ImageFormat::Png,
            image_size: [1280, 710],
            x_range_km: [AutoOr::Auto, AutoOr::Auto],
            y_range_km: [AutoOr::Auto, AutoOr::Auto],
            x_range_label: "X ($10^3$ km)".to_string(),
            y_range_label: "Y ($10^3$ km)".to_string(),
            time_format: TimeFormat::Seconds,
            bounce_time_enabled: true,
            elapsed_time_enabled: true,
            zoom_value: AutoOr::Auto,
            var_unit: "auto".to_string(),
        }
    }
}

impl Settings {
    /// Read and validate a settings file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse_text(&text)
    }

    /// Parse and validate settings file content
    ///
    /// The required `variable` option must appear; every other option
    /// falls back to its documented default.
    pub fn parse_text(text: &str) -> Result<Self> {
        let mut settings = Settings::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let tokens = tokenize(line)?;
            let Some((first, values)) = tokens.split_first() else {
                continue;
            };
            let option = first.strip_prefix('-').unwrap_or(first);
            settings.apply(option, values)?;
        }

        if settings.variable.is_empty() {
            return Err(Error::ConfigValidation {
                option: "variable".to_string(),
                reason: "required option was not specified".to_string(),
            });
        }

        Ok(settings)
    }

    fn apply(&mut self, option: &str, values: &[String]) -> Result<()> {
        match option {
            "variable" => self.variable = single(option, values)?.to_string(),
            "cmap" => {
                let name = single(option, values)?;
                if !crate::plot::colormap::ColorMap::is_known(name) {
                    return Err(invalid(option, name, "not a recognised colormap name"));
                }
                self.cmap = name.to_string();
            }
            "background_color" => self.background_color = color(option, single(option, values)?)?,
            "text_color" => self.text_color = color(option, single(option, values)?)?,
            "cbar_scale" => {
                self.cbar_scale = match single(option, values)? {
                    "lin" => CbarScale::Lin,
                    "log" => CbarScale::Log,
                    other => return Err(invalid(option, other, "expected one of {lin, log}")),
                }
            }
            "cbar_domain" => self.cbar_domain = float_pair(option, values)?,
            "cbar_enabled" => self.cbar_enabled = boolean(option, single(option, values)?)?,
            "cbar_location" => {
                self.cbar_location = match single(option, values)? {
                    "left" => CbarLocation::Left,
                    "right" => CbarLocation::Right,
                    "top" => CbarLocation::Top,
                    "bottom" => CbarLocation::Bottom,
                    other => {
                        return Err(invalid(option, other, "expected one of {left, right, top, bottom}"))
                    }
                }
            }
            "cbar_width" => self.cbar_width = float(option, single(option, values)?)?,
            "title" => self.title = single(option, values)?.to_string(),
            "title_enabled" => self.title_enabled = boolean(option, single(option, values)?)?,
            "title_font" => self.title_font = Some(single(option, values)?.to_string()),
            "title_font_size" => self.title_font_size = integer(option, single(option, values)?)?,
            "label_font_size" => self.label_font_size = integer(option, single(option, values)?)?,
            "smooth_zones" => self.smooth_zones = boolean(option, single(option, values)?)?,
            "image_format" => self.image_format = image_format(option, single(option, values)?)?,
            "image_size" => {
                let [w, h] = int_pair(option, values)?;
                self.image_size = [w, h];
            }
            "x_range_km" => self.x_range_km = float_pair(option, values)?,
            "y_range_km" => self.y_range_km = float_pair(option, values)?,
            "x_range_label" => self.x_range_label = single(option, values)?.to_string(),
            "y_range_label" => self.y_range_label = single(option, values)?.to_string(),
            "time_format" => {
                self.time_format = match single(option, values)? {
                    "seconds" | "s" => TimeFormat::Seconds,
                    "ms" | "milliseconds" => TimeFormat::Milliseconds,
                    other => {
                        return Err(invalid(option, other, "expected one of {seconds, s, ms, milliseconds}"))
                    }
                }
            }
            "bounce_time_enabled" => self.bounce_time_enabled = boolean(option, single(option, values)?)?,
            "elapsed_time_enabled" => {
                self.elapsed_time_enabled = boolean(option, single(option, values)?)?
            }
            "zoom_value" => self.zoom_value = float(option, single(option, values)?)?,
            "var_unit" => self.var_unit = single(option, values)?.to_string(),
            unknown => {
                return Err(Error::ConfigValidation {
                    option: unknown.to_string(),
                    reason: "unrecognised option name".to_string(),
                })
            }
        }
        Ok(())
    }

    /// Substitute display-name placeholders into title and axis labels
    ///
    /// `\variable` takes the lowercased name, `\Variable` the title-cased
    /// name, `\var` the name as resolved, `\grid` the display grid, and
    /// `\path` the full `grid/variable` path. Replacement order keeps
    /// `\var` from clobbering `\variable`.
    pub fn substitute_placeholders(&mut self, names: &VarNames) {
        for field in [&mut self.title, &mut self.x_range_label, &mut self.y_range_label] {
            let text = field
                .replace(r"\variable", &names.display_variable.to_lowercase())
                .replace(r"\Variable", &title_case(&names.display_variable))
                .replace(r"\var", &names.display_variable)
                .replace(r"\grid", &names.display_grid)
                .replace(
                    r"\path",
                    &f!("{}/{}", names.display_grid, names.display_variable),
                );
            *field = text;
        }
    }

    /// The settings grammar, printed for `--settings help`
    pub fn grammar_help() -> String {
        let mut out = String::from("Options for the plaintext settings file\n\n");
        out += "One option per line as '-option value...'. Blank lines are\n";
        out += "ignored and lines starting with '//' are comments. Values\n";
        out += "follow shell-like quoting rules.\n\n";
        for (name, spec, help) in OPTION_GRAMMAR {
            out += &f!("  -{name} {spec}\n");
            out += &textwrap::fill(
                help,
                textwrap::Options::new(70)
                    .initial_indent("      ")
                    .subsequent_indent("      "),
            );
            out += "\n";
        }
        out
    }
}

/// Option name, value spec, and help line for the grammar printout
const OPTION_GRAMMAR: &[(&str, &str, &str)] = &[
    ("variable", "<name>", "The attribute to plot, e.g. 'Entropy' or 'abundance/he3'. Must match an XDMF attribute tag. Required."),
    ("cmap", "{{hot_desaturated}, viridis, ...}", "Colormap for the pseudocolor field. Append '_r' to reverse any map."),
    ("background_color", "{{white}, color}", "Background color name or #rrggbb spec."),
    ("text_color", "{{black}, color}", "Color for text and annotations."),
    ("cbar_scale", "{{lin}, log}", "Linear or log scale colormap normalisation."),
    ("cbar_domain", "{{auto}, min} {{auto}, max}", "Domain of the colorbar. 'auto' takes the data extremes."),
    ("cbar_enabled", "{{true}, false}", "Enable or disable the colorbar."),
    ("cbar_location", "{left, {right}, top, bottom}", "Which side of the plot the colorbar sits on."),
    ("cbar_width", "{float}", "Colorbar thickness as a percentage of the plot area. Default 5.0."),
    ("title", "{{AttributeName}, str}", "Plot title. Supports \\var, \\variable, \\Variable, \\grid and \\path placeholders."),
    ("title_enabled", "{{true}, false}", "Enable or disable the title."),
    ("title_font", "<str>", "Font family for the title."),
    ("title_font_size", "{int, auto}", "Font size for the title."),
    ("label_font_size", "{int, auto}", "Font size for the axis labels."),
    ("smooth_zones", "{true, {false}}", "Bilinear zone smoothing instead of flat zones."),
    ("image_format", "{{png}, svg, jpeg, gif, tiff}", "Output image format. pdf/ps/eps are recognised but unsupported by this build."),
    ("image_size", "<width> <height>", "Output image size in pixels. Default 1280 710."),
    ("x_range_km", "{{auto}, min} {{auto}, max}", "Range of the x axis in km."),
    ("y_range_km", "{{auto}, min} {{auto}, max}", "Range of the y axis in km."),
    ("x_range_label", "<str>", "Text below the x axis. Placeholders as for title."),
    ("y_range_label", "<str>", "Text left of the y axis. Placeholders as for title."),
    ("time_format", "{{seconds}, s, ms, milliseconds}", "Unit for the elapsed and bounce time annotations."),
    ("bounce_time_enabled", "{{true}, false}", "Show the 'time since bounce' annotation when available."),
    ("elapsed_time_enabled", "{{true}, false}", "Show the elapsed time annotation."),
    ("zoom_value", "{float, auto}", "Fraction of the full coordinate range shown when an axis range is auto. Default 1/90."),
    ("var_unit", "{{auto}, str}", "Unit label for the plotted variable."),
];

/// Tokenize one settings line with shell-like quoting
///
/// Double quotes group words, backslash escapes the next character.
/// Adjacent quoted and bare fragments concatenate into one token.
fn tokenize(line: &str) -> Result<Vec<String>> {
    fn escaped(i: &str) -> IResult<&str, &str> {
        preceded(nom_char('\\'), take(1usize))(i)
    }

    fn quoted(i: &str) -> IResult<&str, String> {
        delimited(
            nom_char('"'),
            fold_many0(
                alt((escaped, is_not("\\\""))),
                String::new,
                |mut text, piece| {
                    text.push_str(piece);
                    text
                },
            ),
            nom_char('"'),
        )(i)
    }

    fn bare(i: &str) -> IResult<&str, &str> {
        is_not(" \t\r\n\"\\")(i)
    }

    fn token(i: &str) -> IResult<&str, String> {
        fold_many1(
            alt((quoted, map(escaped, str::to_string), map(bare, str::to_string))),
            String::new,
            |mut text, piece| {
                text.push_str(&piece);
                text
            },
        )(i)
    }

    let (rest, tokens) = many0(preceded(multispace0, token))(line)
        .map_err(|_: nom::Err<nom::error::Error<&str>>| Error::ConfigValidation {
            option: line.to_string(),
            reason: "malformed line".to_string(),
        })?;

    let rest = rest.trim_start();
    if !rest.is_empty() {
        // a token parse only stalls on a dangling quote or backslash
        let reason = if rest.starts_with('"') {
            "unterminated quote"
        } else {
            "trailing backslash"
        };
        return Err(Error::ConfigValidation {
            option: line.to_string(),
            reason: reason.to_string(),
        });
    }
    Ok(tokens)
}

fn invalid(option: &str, value: &str, reason: &str) -> Error {
    Error::ConfigValidation {
        option: option.to_string(),
        reason: f!("'{value}' {reason}"),
    }
}

fn single<'a>(option: &str, values: &'a [String]) -> Result<&'a str> {
    match values {
        [v] => Ok(v.as_str()),
        _ => Err(Error::ConfigValidation {
            option: option.to_string(),
            reason: f!("expected exactly 1 value, found {}", values.len()),
        }),
    }
}

fn boolean(option: &str, value: &str) -> Result<bool> {
    match value.to_uppercase().as_str() {
        "TRUE" | "ENABLE" | "1" => Ok(true),
        "FALSE" | "DISABLE" | "0" => Ok(false),
        _ => Err(invalid(option, value, "is an invalid boolean value")),
    }
}

fn float(option: &str, value: &str) -> Result<AutoOr<f64>> {
    if value == "auto" {
        return Ok(AutoOr::Auto);
    }
    value
        .parse::<f64>()
        .map(AutoOr::Value)
        .map_err(|_| invalid(option, value, "is an invalid float value"))
}

fn integer(option: &str, value: &str) -> Result<AutoOr<u32>> {
    if value == "auto" {
        return Ok(AutoOr::Auto);
    }
    value
        .parse::<u32>()
        .map(AutoOr::Value)
        .map_err(|_| invalid(option, value, "is an invalid int value"))
}

fn color(option: &str, value: &str) -> Result<Color> {
    Color::parse(value).ok_or_else(|| invalid(option, value, "is an invalid color value"))
}

fn float_pair(option: &str, values: &[String]) -> Result<[AutoOr<f64>; 2]> {
    match values {
        [a, b] => Ok([float(option, a)?, float(option, b)?]),
        _ => Err(Error::ConfigValidation {
            option: option.to_string(),
            reason: f!("expected exactly 2 values, found {}", values.len()),
        }),
    }
}

fn int_pair(option: &str, values: &[String]) -> Result<[u32; 2]> {
    match values {
        [a, b] => {
            let parse = |v: &str| {
                v.parse::<u32>()
                    .map_err(|_| invalid(option, v, "is an invalid int value"))
            };
            Ok([parse(a)?, parse(b)?])
        }
        _ => Err(Error::ConfigValidation {
            option: option.to_string(),
            reason: f!("expected exactly 2 values, found {}", values.len()),
        }),
    }
}

fn image_format(option: &str, value: &str) -> Result<ImageFormat> {
    match value {
        "png" => Ok(ImageFormat::Png),
        "svg" => Ok(ImageFormat::Svg),
        "jpeg" => Ok(ImageFormat::Jpeg),
        "gif" => Ok(ImageFormat::Gif),
        "tiff" => Ok(ImageFormat::Tiff),
        "pdf" | "ps" | "eps" => {
            warn!("'{value}' is a recognised format name but has no backend");
            Err(invalid(option, value, "is not supported by this build"))
        }
        _ => Err(invalid(
            option,
            value,
            "expected one of {png, svg, jpeg, gif, tiff}",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn comment_lines_are_skipped() {
        let settings = Settings::parse_text(
            "// a comment line\n-variable entropy\n-cmap viridis\n",
        )
        .unwrap();
        assert_eq!(settings.cmap, "viridis");
        assert_eq!(settings.variable, "entropy");
        // everything else keeps its default
        let defaults = Settings::default();
        assert_eq!(settings.image_size, defaults.image_size);
        assert_eq!(settings.cbar_scale, defaults.cbar_scale);
        assert_eq!(settings.title, defaults.title);
    }

    #[test]
    fn missing_variable_is_fatal() {
        let result = Settings::parse_text("-cmap viridis\n");
        assert!(matches!(
            result,
            Err(Error::ConfigValidation { option, .. }) if option == "variable"
        ));
    }

    #[test]
    fn bad_cbar_scale_is_fatal() {
        let result = Settings::parse_text("-variable entropy\n-cbar_scale banana\n");
        assert!(matches!(
            result,
            Err(Error::ConfigValidation { option, .. }) if option == "cbar_scale"
        ));
    }

    #[test]
    fn unknown_option_is_fatal() {
        let result = Settings::parse_text("-variable entropy\n-nonsense 1\n");
        assert!(result.is_err());
    }

    #[rstest]
    #[case("TRUE", true)]
    #[case("true", true)]
    #[case("Enable", true)]
    #[case("1", true)]
    #[case("FALSE", false)]
    #[case("disable", false)]
    #[case("0", false)]
    fn boolean_spellings(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(boolean("opt", value).unwrap(), expected);
    }

    #[test]
    fn boolean_rejects_other_words() {
        assert!(boolean("opt", "yes").is_err());
    }

    #[test]
    fn floats_accept_auto() {
        assert_eq!(float("opt", "auto").unwrap(), AutoOr::Auto);
        assert_eq!(float("opt", "1.5").unwrap(), AutoOr::Value(1.5));
        assert!(float("opt", "one").is_err());
    }

    #[test]
    fn tokenizer_handles_quotes_and_escapes() {
        let tokens = tokenize(r#"-title "X ($10^3$ km)" plain esc\ aped"#).unwrap();
        assert_eq!(
            tokens,
            vec!["-title", "X ($10^3$ km)", "plain", "esc aped"]
        );
    }

    #[test]
    fn tokenizer_rejects_unterminated_quote() {
        assert!(tokenize(r#"-title "open"#).is_err());
    }

    #[test]
    fn tokenizer_rejects_trailing_backslash() {
        let error = tokenize(r#"-title oops\"#).unwrap_err();
        assert!(matches!(
            error,
            Error::ConfigValidation { reason, .. } if reason == "trailing backslash"
        ));
    }

    #[test]
    fn tokenizer_joins_adjacent_fragments() {
        let tokens = tokenize(r#"-title pre"mid dle"post"#).unwrap();
        assert_eq!(tokens, vec!["-title", "premid dlepost"]);
    }

    #[test]
    fn tokenizer_keeps_empty_quoted_values() {
        let tokens = tokenize(r#"-title """#).unwrap();
        assert_eq!(tokens, vec!["-title", ""]);
    }

    #[test]
    fn color_parsing() {
        assert_eq!(Color::parse("white"), Some(Color::WHITE));
        assert_eq!(Color::parse("#ff0000"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse("banana"), None);
    }

    #[test]
    fn unsupported_vector_formats_fail_validation() {
        let result = Settings::parse_text("-variable entropy\n-image_format pdf\n");
        assert!(matches!(
            result,
            Err(Error::ConfigValidation { option, .. }) if option == "image_format"
        ));
    }

    #[test]
    fn placeholder_substitution() {
        let names = crate::varname::resolve("abundance/he3");
        let mut settings = Settings::default();
        settings.title = r"\var and \variable and \Variable".to_string();
        settings.x_range_label = r"\grid".to_string();
        settings.y_range_label = r"\path".to_string();
        settings.substitute_placeholders(&names);
        assert_eq!(settings.title, "He3 and he3 and He3");
        assert_eq!(settings.x_range_label, "Abundance");
        assert_eq!(settings.y_range_label, "Abundance/He3");
    }

    #[test]
    fn var_does_not_clobber_variable() {
        let names = crate::varname::resolve("Density");
        let mut settings = Settings::default();
        settings.title = r"\variable \var".to_string();
        settings.substitute_placeholders(&names);
        assert_eq!(settings.title, "density Density");
    }
}
