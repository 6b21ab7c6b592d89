use crate::error::{Result, YeelightError};
use crate::protocol::{Request, Response};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Deadline for one full connect/write/read round trip
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Replies longer than this are cut off and fail to decode
const MAX_REPLY_LEN: u64 = 16 * 1024;

/// Largest correlation id, ids stay within 31 bits
const MAX_ID: u32 = 0x7FFF_FFFF;

/// Source of correlation ids for requests that don't carry one
///
/// Seeded once when created; ids are random, non-zero and fit in 31 bits.
pub struct IdGenerator {
    rng: Mutex<StdRng>,
}

impl IdGenerator {
    /// Generator seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic generator, for reproducible id sequences
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn next_id(&self) -> u32 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(1..=MAX_ID)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Per-call command transport
///
/// Every [`send`](CommandChannel::send) opens its own TCP connection, writes
/// one request line, reads one reply line and drops the connection. Nothing
/// is kept between calls apart from the id generator, so one channel can be
/// shared between tasks talking to different bulbs.
pub struct CommandChannel {
    ids: IdGenerator,
    timeout: Duration,
}

impl CommandChannel {
    /// Create a channel with an entropy-seeded id generator and the default deadline
    pub fn new() -> Self {
        Self {
            ids: IdGenerator::from_entropy(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Set the round-trip deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use the given id generator
    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a request to `address` (`host:port`) and wait for the reply
    ///
    /// The reply is returned as decoded even when it carries a device error
    /// payload; use [`Response::into_ack`] or [`Response::into_properties`]
    /// to turn that into an error. The reply id is not checked against the
    /// request id since only one exchange is ever in flight per connection.
    pub async fn send(&self, address: &str, mut request: Request) -> Result<Response> {
        request.validate()?;
        if address.is_empty() {
            return Err(YeelightError::NoAddress);
        }
        if request.id.is_none() {
            request.id = Some(self.ids.next_id());
        }
        let line = request.encode()?;

        match timeout(self.timeout, Self::exchange(address, &line, &request)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    "{} to {} timed out after {:?}",
                    request.method,
                    address,
                    self.timeout
                );
                Err(YeelightError::Timeout)
            }
        }
    }

    async fn exchange(address: &str, line: &str, request: &Request) -> Result<Response> {
        let mut stream = TcpStream::connect(address)
            .await
            .map_err(|source| YeelightError::Connect {
                address: address.to_string(),
                source,
            })?;

        tracing::debug!("Sending to {}: {}", address, line.trim_end());
        stream
            .write_all(line.as_bytes())
            .await
            .map_err(YeelightError::Write)?;

        let mut reader = BufReader::new(stream).take(MAX_REPLY_LEN);
        let mut raw = Vec::new();
        let read = reader
            .read_until(b'\n', &mut raw)
            .await
            .map_err(YeelightError::Read)?;

        if read == 0 {
            return Err(YeelightError::ConnectionClosed);
        }
        if !raw.ends_with(b"\n") {
            if read as u64 >= MAX_REPLY_LEN {
                return Err(YeelightError::InvalidResponse(format!(
                    "reply exceeds {MAX_REPLY_LEN} bytes"
                )));
            }
            return Err(YeelightError::ConnectionClosed);
        }

        // Undecodable bytes are a malformed reply
        let reply = String::from_utf8(raw).map_err(|e| {
            YeelightError::InvalidResponse(format!("reply is not valid UTF-8: {e}"))
        })?;

        tracing::debug!("Received from {}: {}", address, reply.trim_end());

        let response = Response::decode(&reply, request)?;
        if request.id != Some(response.id) {
            tracing::debug!(
                "Reply id {} does not match request id {:?}",
                response.id,
                request.id
            );
        }
        Ok(response)
    }
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new()
    }
}
