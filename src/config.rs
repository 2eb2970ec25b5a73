//! Runtime-configurable tuning parameters for ringlet.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `RINGLET_`) or by constructing a custom `RingletConfig`.

use std::time::Duration;

/// Tuning parameters for collective operations and transports.
#[derive(Debug, Clone)]
pub struct RingletConfig {
    /// Timeout for individual send/recv operations within collectives.
    pub collective_timeout: Duration,

    /// Largest frame a transport will accept from a peer.
    pub max_frame_bytes: usize,

    /// Depth of the per-(peer, tag) receive channels.
    pub channel_depth: usize,
}

impl Default for RingletConfig {
    fn default() -> Self {
        Self {
            collective_timeout: Duration::from_secs(30),
            max_frame_bytes: 256 * 1024 * 1024, // 256 MiB
            channel_depth: 64,
        }
    }
}

impl RingletConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `RINGLET_COLLECTIVE_TIMEOUT_SECS`
    /// - `RINGLET_MAX_FRAME_BYTES`
    /// - `RINGLET_CHANNEL_DEPTH`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("RINGLET_COLLECTIVE_TIMEOUT_SECS") {
            if let Ok(s) = v.parse::<u64>() {
                cfg.collective_timeout = Duration::from_secs(s);
            }
        }
        if let Ok(v) = std::env::var("RINGLET_MAX_FRAME_BYTES") {
            if let Ok(n) = v.parse::<usize>() {
                cfg.max_frame_bytes = n;
            }
        }
        if let Ok(v) = std::env::var("RINGLET_CHANNEL_DEPTH") {
            if let Ok(n) = v.parse::<usize>() {
                cfg.channel_depth = n;
            }
        }

        cfg
    }
}
