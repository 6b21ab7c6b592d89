//! Discover bulbs and optionally toggle them.
//!
//! ```text
//! cargo run --example discover            # list bulbs
//! cargo run --example discover -- toggle  # list and toggle every bulb
//! ```

use yeelight_lan::YeelightClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let toggle = std::env::args().nth(1).as_deref() == Some("toggle");
    let client = YeelightClient::new();

    let lights = client.discover().await;
    if lights.is_empty() {
        println!("No lights found");
        return Ok(());
    }

    for mut light in lights {
        println!(
            "{:<22} {:<20} {:<10} fw {:<4} {}",
            light.address, light.id, light.model, light.firmware_version, light.name
        );
        println!("    supports: {}", light.capabilities.join(" "));

        if toggle {
            if let Err(e) = light.toggle(client.channel()).await {
                eprintln!("    toggle failed: {e}");
                continue;
            }
        }

        match light.refresh(client.channel()).await {
            Ok(()) => println!(
                "    power {} brightness {}% ct {}K color {} mode {:?}",
                light.power,
                light.brightness,
                light.color_temperature,
                light.color(),
                light.mode()
            ),
            Err(e) => eprintln!("    refresh failed: {e}"),
        }
    }

    Ok(())
}
