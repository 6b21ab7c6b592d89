//! Hex color parsing for the `set_rgb` command.
//!
//! Components stay in the raw 0–255 range the bulb expects; they are packed
//! as `0xRRGGBB` on the wire.

use crate::error::{Result, YeelightError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Red, green and blue byte components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Pack into the 24-bit `0xRRGGBB` value used by `set_rgb` and the `rgb` property
    pub fn packed(&self) -> u32 {
        (u32::from(self.red) << 16) | (u32::from(self.green) << 8) | u32::from(self.blue)
    }

    /// Unpack a 24-bit `0xRRGGBB` value. Bits above 24 are ignored.
    pub fn from_packed(value: u32) -> Self {
        Self {
            red: ((value >> 16) & 0xFF) as u8,
            green: ((value >> 8) & 0xFF) as u8,
            blue: (value & 0xFF) as u8,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

impl FromStr for Rgb {
    type Err = YeelightError;

    fn from_str(s: &str) -> Result<Self> {
        parse_color(s)
    }
}

/// Parse a `#RRGGBB` or `RRGGBB` string
///
/// # Example
///
/// ```
/// use yeelight_lan::{parse_color, Rgb};
///
/// assert_eq!(parse_color("#FF8000").unwrap(), Rgb::new(255, 128, 0));
/// assert!(parse_color("#FFF").is_err());
/// ```
pub fn parse_color(text: &str) -> Result<Rgb> {
    let hex = text.strip_prefix('#').unwrap_or(text);

    // Byte length check is safe once every byte is known to be ASCII
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(YeelightError::InvalidColor(format!(
            "{text:?} (expected 6 hex digits, optionally prefixed with '#')"
        )));
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| YeelightError::InvalidColor(text.to_string()))
    };

    Ok(Rgb {
        red: component(0..2)?,
        green: component(2..4)?,
        blue: component(4..6)?,
    })
}
