use crate::light::Light;
use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{timeout_at, Instant};

/// Multicast group and port the bulbs listen on for searches
pub const MULTICAST_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1982));

/// How long replies are collected after the search is sent
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(3);

const SEARCH_MESSAGE: &str = "M-SEARCH * HTTP/1.1\r\n\
                              HOST: 239.255.255.250:1982\r\n\
                              MAN: \"ssdp:discover\"\r\n\
                              ST: wifi_bulb\r\n";

/// Replies are small header blocks, anything past this is dropped
const MAX_DATAGRAM: usize = 2048;

/// Discovery settings
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Where the search message is sent
    pub target: SocketAddr,
    /// Local address of the search socket
    pub bind: SocketAddr,
    /// Collection window
    pub timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            target: MULTICAST_ADDR,
            bind: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
            timeout: DISCOVERY_TIMEOUT,
        }
    }
}

impl DiscoveryConfig {
    pub fn with_target(mut self, target: SocketAddr) -> Self {
        self.target = target;
        self
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Searching,
    Collecting,
    Done,
}

/// Multicast discovery of bulbs on the local network
///
/// Each call to [`discover`](Discovery::discover) sends one search and
/// returns fresh records; nothing is remembered between passes.
///
/// # Example
///
/// ```no_run
/// use yeelight_lan::Discovery;
///
/// #[tokio::main]
/// async fn main() {
///     for light in Discovery::new().discover().await {
///         println!("Found {} ({}) at {}", light.name, light.model, light.address);
///     }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    config: DiscoveryConfig,
}

impl Discovery {
    /// Create a Discovery with the default multicast target and a 3 second window
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Search the network and return one record per replying address
    ///
    /// Runs for the configured window and never longer. If the search socket
    /// cannot be opened, no lights are returned.
    pub async fn discover(&self) -> Vec<Light> {
        let mut phase = Phase::Idle;
        let replies = match self.collect(&mut phase).await {
            Ok(replies) => replies,
            Err(e) => {
                tracing::error!("Discovery socket error: {}", e);
                return Vec::new();
            }
        };
        transition(&mut phase, Phase::Done);

        tracing::info!("Discovery found {} light(s)", replies.len());

        replies
            .into_iter()
            .map(|(source, payload)| {
                let light = parse_advertisement(&payload);
                if light.address.is_empty() {
                    tracing::warn!("Reply from {} has no usable location", source);
                }
                light
            })
            .collect()
    }

    /// Send the search and gather replies keyed by source address
    async fn collect(&self, phase: &mut Phase) -> std::io::Result<BTreeMap<SocketAddr, String>> {
        let socket = Arc::new(UdpSocket::bind(self.config.bind).await?);
        let target = self.config.target;

        transition(phase, Phase::Searching);
        tracing::info!("Searching for lights via {}", target);

        // Deadline is fixed before the search goes out
        let deadline = Instant::now() + self.config.timeout;

        let sender_socket = socket.clone();
        let sender = tokio::spawn(async move {
            if let Err(e) = sender_socket.send_to(SEARCH_MESSAGE.as_bytes(), target).await {
                tracing::error!("Failed to send search to {}: {}", target, e);
            }
        });
        transition(phase, Phase::Collecting);

        let mut replies = BTreeMap::new();
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            match timeout_at(deadline, socket.recv_from(&mut buf)).await {
                Ok(Ok((len, source))) => {
                    let payload = String::from_utf8_lossy(&buf[..len]).into_owned();
                    tracing::debug!("Reply from {}: {:?}", source, payload);
                    if replies.insert(source, payload).is_some() {
                        tracing::debug!("Duplicate reply from {}, keeping latest", source);
                    }
                }
                Ok(Err(e)) => {
                    tracing::debug!("Discovery read stopped: {}", e);
                    break;
                }
                Err(_) => break,
            }
        }

        // The send has long finished unless it was stuck; don't leave it behind
        sender.abort();
        Ok(replies)
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    tracing::debug!("Discovery {:?} -> {:?}", phase, next);
    *phase = next;
}

/// Header block of a discovery reply, keys lowercased
struct Headers(Vec<(String, String)>);

impl Headers {
    /// Skip the status line, then read `key: value` lines up to the first blank line
    fn parse(payload: &str) -> Self {
        let headers = payload
            .lines()
            .skip(1)
            .map(|line| line.trim_end_matches('\r'))
            .take_while(|line| !line.trim().is_empty())
            .filter_map(|line| {
                let (key, value) = line.split_once(':')?;
                Some((key.trim().to_ascii_lowercase(), value.trim().to_string()))
            })
            .collect();
        Headers(headers)
    }

    /// First value for `key`
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Extract `host:port` from a `yeelight://host:port` location URL
fn location_address(location: &str) -> Option<String> {
    let rest = location
        .split_once("://")
        .map_or(location, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next()?;
    let authority = authority.rsplit('@').next()?;
    if authority.is_empty() {
        None
    } else {
        Some(authority.to_string())
    }
}

/// Build a record from one discovery reply
///
/// Every field is decoded on its own; missing or malformed headers leave
/// that field at zero and mark it in [`Light::defaulted`].
pub fn parse_advertisement(payload: &str) -> Light {
    let headers = Headers::parse(payload);
    let mut light = Light::default();

    light.address = match headers.get("location").and_then(location_address) {
        Some(address) => address,
        None => {
            light.defaulted.insert("location".to_string());
            String::new()
        }
    };

    light.id = light.text_field("id", headers.get("id"));
    light.model = light.text_field("model", headers.get("model"));
    light.name = light.text_field("name", headers.get("name"));
    light.firmware_version = light.parse_field("fw_ver", headers.get("fw_ver"));
    light.capabilities = match headers.get("support") {
        Some(support) => support.split_whitespace().map(str::to_string).collect(),
        None => {
            light.defaulted.insert("support".to_string());
            Vec::new()
        }
    };
    light.power = light.text_field("power", headers.get("power"));
    light.brightness = light.parse_field("bright", headers.get("bright"));
    light.color_mode = light.parse_field("color_mode", headers.get("color_mode"));
    light.color_temperature = light.parse_field("ct", headers.get("ct"));
    light.rgb = light.parse_field("rgb", headers.get("rgb"));
    light.hue = light.parse_field("hue", headers.get("hue"));
    light.saturation = light.parse_field("sat", headers.get("sat"));

    light
}
