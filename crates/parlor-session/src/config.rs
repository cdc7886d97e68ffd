use std::time::Duration;

/// Tunables for a [`PeerSession`](crate::PeerSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Address the host listens on. Port `0` picks a free port.
    pub bind_addr: String,

    /// How long a guest waits for the TCP/WebSocket connection to open.
    pub connect_timeout: Duration,

    /// How long either side waits for the hello/welcome exchange.
    pub handshake_timeout: Duration,

    /// Capacity of the session event channel.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            connect_timeout: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(5),
            event_capacity: 256,
        }
    }
}
