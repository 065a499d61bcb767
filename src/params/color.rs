use std::fmt;
use std::str::FromStr;

/// 8-bit sRGB color as edited in the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),
    #[error("color must have 3 or 6 hex digits: {0:?}")]
    BadLength(String),
    #[error("invalid hex digit in color: {0:?}")]
    BadDigit(String),
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_array(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }

    pub const fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Parses `#rrggbb` or the short `#rgb` form.
    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let digits = value
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(value.to_string()))?;
        if !digits.is_ascii() {
            return Err(ColorParseError::BadDigit(value.to_string()));
        }
        let bad_digit = |_| ColorParseError::BadDigit(value.to_string());
        match digits.len() {
            6 => Ok(Self::new(
                u8::from_str_radix(&digits[0..2], 16).map_err(bad_digit)?,
                u8::from_str_radix(&digits[2..4], 16).map_err(bad_digit)?,
                u8::from_str_radix(&digits[4..6], 16).map_err(bad_digit)?,
            )),
            3 => {
                let mut channels = [0u8; 3];
                for (channel, digit) in channels.iter_mut().zip(digits.chars()) {
                    let nibble = digit
                        .to_digit(16)
                        .ok_or_else(|| ColorParseError::BadDigit(value.to_string()))?
                        as u8;
                    *channel = nibble * 0x11;
                }
                Ok(Self::from_array(channels))
            }
            _ => Err(ColorParseError::BadLength(value.to_string())),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels scaled to 0..=1 without any transfer function.
    pub fn to_srgb_f32(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Channels converted to linear light for shading.
    pub fn to_linear(self) -> [f32; 3] {
        let [r, g, b] = self.to_srgb_f32();
        [srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b)]
    }
}

fn srgb_to_linear(value: f32) -> f32 {
    if value <= 0.04045 {
        value / 12.92
    } else {
        ((value + 0.055) / 1.055).powf(2.4)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl serde::Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgb {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Rgb::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{ColorParseError, Rgb};

    #[test]
    fn parses_long_and_short_hex() {
        assert_eq!(Rgb::from_hex("#a7a7a7").unwrap(), Rgb::new(0xa7, 0xa7, 0xa7));
        assert_eq!(Rgb::from_hex("#F0f0F0").unwrap(), Rgb::new(0xf0, 0xf0, 0xf0));
        assert_eq!(Rgb::from_hex("#fa0").unwrap(), Rgb::new(0xff, 0xaa, 0x00));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(matches!(
            Rgb::from_hex("404040"),
            Err(ColorParseError::MissingHash(_))
        ));
        assert!(matches!(
            Rgb::from_hex("#4040"),
            Err(ColorParseError::BadLength(_))
        ));
        assert!(matches!(
            Rgb::from_hex("#zz0000"),
            Err(ColorParseError::BadDigit(_))
        ));
        assert!(Rgb::from_hex("#ééé").is_err());
    }

    #[test]
    fn hex_formatting_is_lowercase_six_digits() {
        assert_eq!(Rgb::new(0x40, 0x40, 0x40).to_hex(), "#404040");
        assert_eq!(Rgb::WHITE.to_string(), "#ffffff");
    }

    #[test]
    fn linear_conversion_keeps_endpoints() {
        assert_eq!(Rgb::BLACK.to_linear(), [0.0, 0.0, 0.0]);
        let white = Rgb::WHITE.to_linear();
        assert!(white.iter().all(|value| (value - 1.0).abs() < 1e-6));
        let mid = Rgb::new(0x80, 0x80, 0x80).to_linear()[0];
        assert!(mid > 0.2 && mid < 0.23);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, "\"#010203\"");
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(1, 2, 3));
        assert!(serde_json::from_str::<Rgb>("\"red\"").is_err());
    }
}
