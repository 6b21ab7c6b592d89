use crate::channel::CommandChannel;
use crate::color::parse_color;
use crate::discovery::Discovery;
use crate::error::Result;
use crate::light::Light;
use crate::types::Transition;

/// Entry point for controlling bulbs on the local network
///
/// The `YeelightClient` pairs a [`Discovery`] with a [`CommandChannel`] so a
/// caller only has to hold one value: discover lights, then pass them back
/// in to control them.
///
/// # Example
///
/// ```no_run
/// use yeelight_lan::{Transition, YeelightClient};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = YeelightClient::new();
///     for mut light in client.discover().await {
///         light.power_on(client.channel(), Transition::Sudden).await?;
///         client.set_color_hex(&light, "#FF8000", Transition::smooth_millis(500)).await?;
///         light.refresh(client.channel()).await?;
///         println!("{} is {} at {}%", light.name, light.power, light.brightness);
///     }
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct YeelightClient {
    discovery: Discovery,
    channel: CommandChannel,
}

impl YeelightClient {
    /// Create a client with default discovery and channel settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client from explicitly configured parts
    pub fn with_parts(discovery: Discovery, channel: CommandChannel) -> Self {
        Self { discovery, channel }
    }

    /// Run one discovery pass
    pub async fn discover(&self) -> Vec<Light> {
        self.discovery.discover().await
    }

    pub fn channel(&self) -> &CommandChannel {
        &self.channel
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// Set the light's color from a `#RRGGBB` string
    ///
    /// Malformed colors are rejected before anything is sent.
    pub async fn set_color_hex(
        &self,
        light: &Light,
        color: &str,
        transition: Transition,
    ) -> Result<()> {
        let rgb = parse_color(color)?;
        light.set_color(&self.channel, rgb, transition).await
    }
}
