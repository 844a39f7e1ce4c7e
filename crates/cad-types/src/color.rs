use serde::{Deserialize, Serialize};

/// Display color with four channels in the 0–1 range.
///
/// Display-only: color never affects geometry. Alpha defaults to 1 when
/// omitted from serialized input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

/// Errors from parsing a hexadecimal color string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("hex color must have 3 or 6 digits, got {len}: {input:?}")]
    BadLength { input: String, len: usize },

    #[error("invalid hex digit in color {input:?}")]
    BadDigit { input: String },
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from three channels.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Parse `#rrggbb`, `rrggbb`, `#rgb` or `rgb` (case-insensitive).
    ///
    /// Three-digit shorthand is expanded (`f0a` → `ff00aa`) before the
    /// digits are split into byte pairs. Alpha is always 1.
    pub fn from_hex(input: &str) -> Result<Self, ColorParseError> {
        let digits = input.trim().trim_start_matches('#');
        let expanded: String = match digits.chars().count() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            len => {
                return Err(ColorParseError::BadLength {
                    input: input.to_string(),
                    len,
                })
            }
        };

        let channel = |range: std::ops::Range<usize>| -> Result<f64, ColorParseError> {
            expanded
                .get(range)
                .filter(|pair| pair.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .map(|byte| f64::from(byte) / 255.0)
                .ok_or_else(|| ColorParseError::BadDigit {
                    input: input.to_string(),
                })
        };

        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl std::str::FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[f64; 4]> for Rgba {
    fn from(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

impl From<[f64; 3]> for Rgba {
    fn from(c: [f64; 3]) -> Self {
        Self::rgb(c[0], c[1], c[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn six_digit_hex() {
        let c = Rgba::from_hex("#1f4fa3").unwrap();
        assert_relative_eq!(c.r, 31.0 / 255.0);
        assert_relative_eq!(c.g, 79.0 / 255.0);
        assert_relative_eq!(c.b, 163.0 / 255.0);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn shorthand_expands_before_splitting() {
        assert_eq!(Rgba::from_hex("#f0a").unwrap(), Rgba::from_hex("ff00aa").unwrap());
        assert_eq!(Rgba::from_hex("FFF").unwrap(), Rgba::rgb(1.0, 1.0, 1.0));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            Rgba::from_hex("#12345"),
            Err(ColorParseError::BadLength { len: 5, .. })
        ));
        assert!(matches!(
            Rgba::from_hex("#zz0000"),
            Err(ColorParseError::BadDigit { .. })
        ));
        assert!(Rgba::from_hex("").is_err());
    }

    #[test]
    fn alpha_defaults_to_one_when_deserialized() {
        let c: Rgba = serde_json::from_str(r#"{"r":1.0,"g":0.0,"b":0.0}"#).unwrap();
        assert_eq!(c, Rgba::rgb(1.0, 0.0, 0.0));
    }
}
