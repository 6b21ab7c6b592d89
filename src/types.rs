use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

/// Shortest smooth transition the bulb accepts
pub const MIN_SMOOTH_DURATION: Duration = Duration::from_millis(30);

/// Power state parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Power {
    On,
    Off,
}

impl Power {
    pub fn as_str(&self) -> &'static str {
        match self {
            Power::On => "on",
            Power::Off => "off",
        }
    }
}

impl From<bool> for Power {
    fn from(on: bool) -> Self {
        if on {
            Power::On
        } else {
            Power::Off
        }
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a state change is applied: at once, or faded over a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Sudden,
    Smooth(Duration),
}

impl Transition {
    /// Smooth transition over `millis` milliseconds
    pub fn smooth_millis(millis: u64) -> Self {
        Transition::Smooth(Duration::from_millis(millis))
    }

    /// The `effect` and `duration` parameters that trail most control methods
    pub(crate) fn params(&self) -> [Value; 2] {
        match self {
            // Duration is ignored by the bulb for sudden changes
            Transition::Sudden => [json!("sudden"), json!(0)],
            Transition::Smooth(duration) => {
                let millis = (*duration).max(MIN_SMOOTH_DURATION).as_millis() as u64;
                [json!("smooth"), json!(millis)]
            }
        }
    }
}

impl Default for Transition {
    fn default() -> Self {
        Transition::Smooth(Duration::from_millis(500))
    }
}

/// Meaning of the integer `color_mode` property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    Rgb,
    ColorTemperature,
    Hsv,
}

impl ColorMode {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ColorMode::Rgb),
            2 => Some(ColorMode::ColorTemperature),
            3 => Some(ColorMode::Hsv),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            ColorMode::Rgb => 1,
            ColorMode::ColorTemperature => 2,
            ColorMode::Hsv => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooth_transition_is_clamped_to_minimum() {
        let [effect, duration] = Transition::smooth_millis(5).params();
        assert_eq!(effect, json!("smooth"));
        assert_eq!(duration, json!(30));

        let [_, duration] = Transition::smooth_millis(1500).params();
        assert_eq!(duration, json!(1500));
    }

    #[test]
    fn sudden_transition_params() {
        assert_eq!(Transition::Sudden.params(), [json!("sudden"), json!(0)]);
    }

    #[test]
    fn color_mode_codes() {
        for mode in [ColorMode::Rgb, ColorMode::ColorTemperature, ColorMode::Hsv] {
            assert_eq!(ColorMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(ColorMode::from_code(0), None);
    }
}
