use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 8-bit sRGB color with straight (non-premultiplied) alpha. Serialized as
/// its hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba(pub [u8; 4]);

/// Errors from parsing a CSS-style hex color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color: {0:?}")]
pub struct ParseColorError(pub String);

impl Rgba {
    pub const WHITE: Self = Self([255, 255, 255, 255]);
    pub const BLACK: Self = Self([0, 0, 0, 255]);
    pub const TRANSPARENT: Self = Self([0, 0, 0, 0]);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, 255])
    }

    pub fn r(self) -> u8 {
        self.0[0]
    }

    pub fn g(self) -> u8 {
        self.0[1]
    }

    pub fn b(self) -> u8 {
        self.0[2]
    }

    pub fn a(self) -> u8 {
        self.0[3]
    }

    pub fn is_opaque(self) -> bool {
        self.0[3] == 255
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. The leading `#` is optional.
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let err = || ParseColorError(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return Err(err());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
        match hex.len() {
            3 => {
                let mut out = [0u8, 0, 0, 255];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(err)? as u8;
                    out[i] = v * 17;
                }
                Ok(Self(out))
            }
            6 => Ok(Self([byte(0)?, byte(2)?, byte(4)?, 255])),
            8 => Ok(Self([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
            _ => Err(err()),
        }
    }

    /// `#rrggbb`, with an alpha byte appended only when not opaque.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.0;
        if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// Components scaled to `0.0..=1.0` without any gamma conversion.
    pub fn to_f32(self) -> [f32; 4] {
        self.0.map(|c| c as f32 / 255.0)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Rgba {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Rgba {
    type Error = ParseColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_hex(&s)
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_six_digit() {
        assert_eq!(Rgba::from_hex("#ff8000").unwrap(), Rgba::rgb(255, 128, 0));
        assert_eq!(Rgba::from_hex("FFFFFF").unwrap(), Rgba::WHITE);
    }

    #[test]
    fn parse_short_and_alpha() {
        assert_eq!(Rgba::from_hex("#fff").unwrap(), Rgba::WHITE);
        assert_eq!(Rgba::from_hex("#f00").unwrap(), Rgba::rgb(255, 0, 0));
        assert_eq!(
            Rgba::from_hex("#00000080").unwrap(),
            Rgba([0, 0, 0, 0x80])
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Rgba::from_hex("#12345").is_err());
        assert!(Rgba::from_hex("#gggggg").is_err());
        assert!(Rgba::from_hex("").is_err());
        assert!(Rgba::from_hex("#ééé").is_err());
    }

    #[test]
    fn hex_display() {
        assert_eq!(Rgba::rgb(1, 2, 255).to_string(), "#0102ff");
        assert_eq!(Rgba::TRANSPARENT.to_hex(), "#00000000");
        let parsed: Rgba = "#0102ff".parse().unwrap();
        assert_eq!(parsed, Rgba::rgb(1, 2, 255));
    }

    #[test]
    fn serializes_as_hex_string() {
        let value = serde_yaml::to_value(Rgba::rgb(1, 2, 255)).unwrap();
        assert_eq!(value, serde_yaml::Value::String("#0102ff".into()));
        let back: Rgba = serde_yaml::from_str("'#00000080'").unwrap();
        assert_eq!(back, Rgba([0, 0, 0, 0x80]));
        assert!(serde_yaml::from_str::<Rgba>("'#12'").is_err());
        assert!(serde_yaml::from_str::<Rgba>("[1, 2, 3, 4]").is_err());
    }

    #[test]
    fn default_is_opaque_white() {
        assert!(Rgba::default().is_opaque());
        assert_eq!(Rgba::default().to_f32(), [1.0; 4]);
    }
}
