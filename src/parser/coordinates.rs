//! Coordinate text parsing and formatting.
//!
//! Coordinates arrive as free text: typed into the route form one pair per
//! line, or stored on hikers as localized labels such as
//! `"43.285000° с.ш., 42.518000° в.д."`. The parser strips a configurable
//! table of unit and hemisphere suffixes, splits on runs of commas and
//! whitespace, and accepts exactly two numeric tokens.
//!
//! Parsing never fails loudly: malformed pairs are `None` and malformed lines
//! are dropped from paths.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::{ParserConfig, UnitSuffix};
use crate::models::{Path, Point};

/// Plain decimal number: optional sign, digits, optional fraction.
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)$").expect("number pattern is valid")
});

/// A numeric token collected while scanning, with its hemisphere sign.
#[derive(Debug, Default)]
struct RawToken {
    text: String,
    negate: bool,
}

/// Parses coordinate text into points using a table of unit suffixes.
#[derive(Debug, Clone)]
pub struct CoordinateParser {
    /// Suffixes sorted longest first so that "° с.ш." wins over "°".
    suffixes: Vec<UnitSuffix>,
}

impl Default for CoordinateParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

impl CoordinateParser {
    /// Creates a parser from the configured suffix table.
    #[must_use]
    pub fn new(config: &ParserConfig) -> Self {
        let mut suffixes: Vec<UnitSuffix> = config
            .unit_suffixes
            .iter()
            .filter(|s| !s.token.is_empty())
            .cloned()
            .collect();
        suffixes.sort_by(|a, b| b.token.chars().count().cmp(&a.token.chars().count()));
        Self { suffixes }
    }

    /// Parses a single `"lat, lon"` pair.
    ///
    /// Returns `None` for anything other than exactly two in-range numbers.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailwatch::parser::coordinates::CoordinateParser;
    ///
    /// let parser = CoordinateParser::default();
    /// let p = parser.parse_pair("43.285, 42.518").unwrap();
    /// assert_eq!((p.lat, p.lon), (43.285, 42.518));
    /// assert!(parser.parse_pair("not coords").is_none());
    /// ```
    #[must_use]
    pub fn parse_pair(&self, text: &str) -> Option<Point> {
        let tokens = self.tokenize(text)?;
        if tokens.len() != 2 {
            return None;
        }

        let lat = Self::token_value(&tokens[0])?;
        let lon = Self::token_value(&tokens[1])?;
        Point::new(lat, lon)
    }

    /// Parses one pair per line, silently dropping lines that don't parse.
    #[must_use]
    pub fn parse_path(&self, text: &str) -> Path {
        text.lines()
            .filter_map(|line| self.parse_pair(line))
            .collect()
    }

    /// Splits text into numeric tokens, consuming suffixes as separators.
    ///
    /// Returns `None` if a suffix has no preceding number.
    fn tokenize(&self, text: &str) -> Option<Vec<RawToken>> {
        let mut tokens: Vec<RawToken> = Vec::new();
        let mut current = RawToken::default();
        let mut rest = text.trim();

        while let Some(ch) = rest.chars().next() {
            if let Some(suffix) = self.match_suffix(rest) {
                if !current.text.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                let last = tokens.last_mut()?;
                if suffix.negate {
                    last.negate = true;
                }
                rest = &rest[suffix.token.len()..];
                continue;
            }

            if ch == ',' || ch.is_whitespace() {
                if !current.text.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            } else {
                current.text.push(ch);
            }
            rest = &rest[ch.len_utf8()..];
        }

        if !current.text.is_empty() {
            tokens.push(current);
        }
        Some(tokens)
    }

    /// Finds the longest suffix at the start of `rest`.
    ///
    /// Purely alphabetic suffixes ("N", "E") only match at a token boundary so
    /// they are never carved out of a word.
    fn match_suffix(&self, rest: &str) -> Option<&UnitSuffix> {
        self.suffixes.iter().find(|suffix| {
            if !rest.starts_with(suffix.token.as_str()) {
                return false;
            }
            if !suffix.token.chars().all(char::is_alphabetic) {
                return true;
            }
            rest[suffix.token.len()..]
                .chars()
                .next()
                .is_none_or(|next| next == ',' || next.is_whitespace())
        })
    }

    fn token_value(token: &RawToken) -> Option<f64> {
        if !NUMBER_RE.is_match(&token.text) {
            return None;
        }
        let value: f64 = token.text.parse().ok()?;
        Some(if token.negate { -value.abs() } else { value })
    }
}

/// Parses a pair with the default suffix table.
#[must_use]
pub fn parse_pair(text: &str) -> Option<Point> {
    CoordinateParser::default().parse_pair(text)
}

/// Parses a multi-line path with the default suffix table.
#[must_use]
pub fn parse_path(text: &str) -> Path {
    CoordinateParser::default().parse_path(text)
}

/// Formats a point as `"lat lon"` with six decimals, the form-field encoding.
#[must_use]
pub fn format_pair(point: Point) -> String {
    format!("{:.6} {:.6}", point.lat, point.lon)
}

/// Formats a path as one [`format_pair`] line per point.
#[must_use]
pub fn format_path(path: &[Point]) -> String {
    path.iter()
        .map(|p| format_pair(*p))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats a point with hemisphere letters, e.g. `"43.2850° N, 42.5180° E"`.
#[must_use]
pub fn format_coords_label(point: Point, precision: usize) -> String {
    let ns = if point.lat < 0.0 { 'S' } else { 'N' };
    let ew = if point.lon < 0.0 { 'W' } else { 'E' };
    format!(
        "{:.prec$}° {}, {:.prec$}° {}",
        point.lat.abs(),
        ns,
        point.lon.abs(),
        ew,
        prec = precision
    )
}
