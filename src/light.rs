use crate::channel::CommandChannel;
use crate::color::Rgb;
use crate::error::{Result, YeelightError};
use crate::protocol::{Method, Request};
use crate::types::{ColorMode, Power, Transition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Properties read back by [`Light::refresh`], in reply order
pub const REFRESH_PROPERTIES: [&str; 7] =
    ["power", "bright", "ct", "rgb", "hue", "sat", "color_mode"];

/// Color temperature range accepted by `set_ct_abx`, in Kelvin
pub const COLOR_TEMPERATURE_RANGE: std::ops::RangeInclusive<u32> = 1700..=6500;

/// A discovered bulb: identity, capabilities and last known state
///
/// Records are produced by [`Discovery`](crate::Discovery). Fields that the
/// advertisement left out, or that failed to parse, hold their zero value and
/// are listed by [`Light::defaulted`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    /// `host:port` of the bulb's control socket
    pub address: String,
    pub id: String,
    pub model: String,
    pub name: String,
    pub firmware_version: u32,

    /// Method names the bulb advertises support for
    pub capabilities: Vec<String>,

    pub power: String,
    /// Brightness in percent, 0-100
    pub brightness: u8,
    /// Raw `color_mode` code, see [`Light::mode`]
    pub color_mode: u8,
    /// Color temperature in Kelvin
    pub color_temperature: u32,
    /// Packed `0xRRGGBB`
    pub rgb: u32,
    pub hue: u16,
    pub saturation: u8,

    /// Header/property names whose value was missing or unparseable
    #[serde(default)]
    pub defaulted: BTreeSet<String>,
}

impl Light {
    /// True if `key` was absent or unparseable when this record was last filled
    pub fn is_defaulted(&self, key: &str) -> bool {
        self.defaulted.contains(key)
    }

    /// Check the advertised capabilities for `method`
    pub fn supports(&self, method: Method) -> bool {
        self.capabilities.iter().any(|c| c == method.as_str())
    }

    pub fn is_on(&self) -> bool {
        self.power == "on"
    }

    pub fn color(&self) -> Rgb {
        Rgb::from_packed(self.rgb)
    }

    pub fn mode(&self) -> Option<ColorMode> {
        ColorMode::from_code(self.color_mode)
    }

    /// Parse `raw` into a numeric field, recording `key` as defaulted on failure
    pub(crate) fn parse_field<T>(&mut self, key: &str, raw: Option<&str>) -> T
    where
        T: FromStr + Default,
    {
        match raw.map(str::trim).and_then(|v| v.parse().ok()) {
            Some(value) => {
                self.defaulted.remove(key);
                value
            }
            None => {
                self.defaulted.insert(key.to_string());
                T::default()
            }
        }
    }

    /// Record a text field, marking it defaulted when absent or blank
    pub(crate) fn text_field(&mut self, key: &str, raw: Option<&str>) -> String {
        match raw.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => {
                self.defaulted.remove(key);
                value.to_string()
            }
            None => {
                self.defaulted.insert(key.to_string());
                String::new()
            }
        }
    }

    async fn control(&self, channel: &CommandChannel, request: Request) -> Result<()> {
        tracing::debug!("{} -> {} {:?}", self.address, request.method, request.params);
        channel.send(&self.address, request).await?.into_ack()
    }

    // ========== Power ==========

    /// Switch the bulb on or off
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use yeelight_lan::{CommandChannel, Discovery, Power, Transition};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let channel = CommandChannel::new();
    /// for light in Discovery::new().discover().await {
    ///     light.set_power(&channel, Power::On, Transition::smooth_millis(500)).await?;
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn set_power(
        &self,
        channel: &CommandChannel,
        power: Power,
        transition: Transition,
    ) -> Result<()> {
        let request = Request::new(Method::SetPower)
            .param(power.as_str())
            .params(transition.params());
        self.control(channel, request).await
    }

    pub async fn power_on(&self, channel: &CommandChannel, transition: Transition) -> Result<()> {
        self.set_power(channel, Power::On, transition).await
    }

    pub async fn power_off(&self, channel: &CommandChannel, transition: Transition) -> Result<()> {
        self.set_power(channel, Power::Off, transition).await
    }

    pub async fn toggle(&self, channel: &CommandChannel) -> Result<()> {
        self.control(channel, Request::new(Method::Toggle)).await
    }

    // ========== Brightness & Color ==========

    /// Set brightness in percent (0-100)
    pub async fn set_brightness(
        &self,
        channel: &CommandChannel,
        level: u8,
        transition: Transition,
    ) -> Result<()> {
        if level > 100 {
            return Err(YeelightError::InvalidArgument(format!(
                "brightness {level} is outside 0-100"
            )));
        }
        let request = Request::new(Method::SetBright)
            .param(level)
            .params(transition.params());
        self.control(channel, request).await
    }

    /// Set an RGB color from its byte components
    pub async fn set_rgb(
        &self,
        channel: &CommandChannel,
        red: u8,
        green: u8,
        blue: u8,
        transition: Transition,
    ) -> Result<()> {
        self.set_color(channel, Rgb::new(red, green, blue), transition)
            .await
    }

    pub async fn set_color(
        &self,
        channel: &CommandChannel,
        color: Rgb,
        transition: Transition,
    ) -> Result<()> {
        let request = Request::new(Method::SetRgb)
            .param(color.packed())
            .params(transition.params());
        self.control(channel, request).await
    }

    /// Set white color temperature in Kelvin (1700-6500)
    pub async fn set_color_temperature(
        &self,
        channel: &CommandChannel,
        kelvin: u32,
        transition: Transition,
    ) -> Result<()> {
        if !COLOR_TEMPERATURE_RANGE.contains(&kelvin) {
            return Err(YeelightError::InvalidArgument(format!(
                "color temperature {kelvin}K is outside {}-{}K",
                COLOR_TEMPERATURE_RANGE.start(),
                COLOR_TEMPERATURE_RANGE.end()
            )));
        }
        let request = Request::new(Method::SetCtAbx)
            .param(kelvin)
            .params(transition.params());
        self.control(channel, request).await
    }

    /// Set hue (0-359) and saturation (0-100)
    pub async fn set_hsv(
        &self,
        channel: &CommandChannel,
        hue: u16,
        saturation: u8,
        transition: Transition,
    ) -> Result<()> {
        if hue > 359 || saturation > 100 {
            return Err(YeelightError::InvalidArgument(format!(
                "hue {hue} / saturation {saturation} outside 0-359 / 0-100"
            )));
        }
        let request = Request::new(Method::SetHsv)
            .param(hue)
            .param(saturation)
            .params(transition.params());
        self.control(channel, request).await
    }

    /// Store a name on the bulb. The local record is left as is until the
    /// next discovery pass.
    pub async fn set_name(&self, channel: &CommandChannel, name: &str) -> Result<()> {
        self.control(channel, Request::new(Method::SetName).param(name))
            .await
    }

    // ========== State ==========

    /// Re-read power, brightness and color state from the bulb
    ///
    /// The record is only touched once a complete seven-value reply has been
    /// received; on any error it is left exactly as it was.
    pub async fn refresh(&mut self, channel: &CommandChannel) -> Result<()> {
        let request = Request::new(Method::GetProp).params(REFRESH_PROPERTIES);
        let values = channel
            .send(&self.address, request)
            .await?
            .into_properties(REFRESH_PROPERTIES.len())?;

        let [power, bright, ct, rgb, hue, sat, color_mode]: [String; 7] =
            values.try_into().map_err(|values: Vec<String>| {
                YeelightError::InvalidResponse(format!(
                    "expected {} properties, got {}",
                    REFRESH_PROPERTIES.len(),
                    values.len()
                ))
            })?;

        // Unsupported properties come back as "" and are recorded as defaulted
        self.power = self.text_field("power", Some(power.as_str()));
        self.brightness = self.parse_field("bright", Some(bright.as_str()));
        self.color_temperature = self.parse_field("ct", Some(ct.as_str()));
        self.rgb = self.parse_field("rgb", Some(rgb.as_str()));
        self.hue = self.parse_field("hue", Some(hue.as_str()));
        self.saturation = self.parse_field("sat", Some(sat.as_str()));
        self.color_mode = self.parse_field("color_mode", Some(color_mode.as_str()));

        tracing::debug!("Refreshed {}: {:?}", self.address, self);
        Ok(())
    }
}
