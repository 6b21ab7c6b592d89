//! Rust library for discovering and controlling Yeelight bulbs on the LAN
//!
//! This library provides an async API for finding Yeelight-family bulbs on
//! the local network and sending them control commands. It supports:
//!
//! - Discovery via the SSDP-style multicast search on `239.255.255.250:1982`
//! - Power, toggle, brightness, RGB, HSV and color temperature control
//! - Reading back the current state of a bulb
//! - Hex color parsing for RGB commands
//!
//! # Quick Start
//!
//! ```no_run
//! use yeelight_lan::{CommandChannel, Discovery, Transition};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lights = Discovery::new().discover().await;
//!     let channel = CommandChannel::new();
//!
//!     if let Some(light) = lights.first() {
//!         println!("Found {} at {}", light.name, light.address);
//!
//!         light.power_on(&channel, Transition::smooth_millis(500)).await?;
//!         light.set_brightness(&channel, 60, Transition::smooth_millis(500)).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Direct Connection
//!
//! If you know the address of a bulb, you can skip discovery:
//!
//! ```no_run
//! use yeelight_lan::{CommandChannel, Light};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut light = Light {
//!         address: "192.168.1.100:55443".to_string(),
//!         ..Light::default()
//!     };
//!     light.refresh(&CommandChannel::new()).await?;
//!     println!("Power: {}", light.power);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Discovery**: multicast search and reply collection
//! - **Light**: discovered bulb record and its control operations
//! - **Channel**: one TCP connection per command, bounded by a deadline
//! - **Protocol**: JSON line request/response structures
//! - **Color**: hex color parsing and RGB packing

mod channel;
mod client;
mod color;
mod discovery;
mod error;
mod light;
mod protocol;
mod types;

// Public exports
pub use channel::{CommandChannel, IdGenerator, REQUEST_TIMEOUT};
pub use client::YeelightClient;
pub use color::{parse_color, Rgb};
pub use discovery::{
    parse_advertisement, Discovery, DiscoveryConfig, DISCOVERY_TIMEOUT, MULTICAST_ADDR,
};
pub use error::{Result, YeelightError};
pub use light::{Light, COLOR_TEMPERATURE_RANGE, REFRESH_PROPERTIES};
pub use protocol::{Arity, ErrorPayload, Method, Outcome, Payload, Request, Response};
pub use types::{ColorMode, Power, Transition, MIN_SMOOTH_DURATION};
