use crate::types::Addr;

pub type Result<T> = std::result::Result<T, RingletError>;

#[derive(Debug, thiserror::Error)]
pub enum RingletError {
    #[error("bin {bin} out of range: split requested {bin_count} bins")]
    BinOutOfRange { bin: u32, bin_count: u32 },

    #[error("operation requires a non-null group")]
    NullGroup,

    #[error("malformed ring descriptor: {reason}")]
    MalformedGroup { reason: String },

    #[error("{array} has {len} entries but the group has {group_size} members")]
    CountsMismatch {
        array: &'static str,
        len: usize,
        group_size: u32,
    },

    #[error("{buffer} too small: member {member} needs bytes up to offset {needed}, buffer holds {len}")]
    BufferTooSmall {
        buffer: &'static str,
        member: u32,
        needed: usize,
        len: usize,
    },

    #[error("message size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("scratch allocation failed: {0}")]
    Alloc(#[from] std::collections::TryReserveError),

    #[error("address {addr} not reachable through this transport")]
    UnknownPeer { addr: Addr },

    #[error("peer {addr} disconnected unexpectedly")]
    PeerDisconnected { addr: Addr },

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{operation} failed at address {addr}: {reason}")]
    CollectiveFailed {
        operation: &'static str,
        addr: Addr,
        reason: String,
    },
}

impl RingletError {
    /// Create a `Transport` error with just a message.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a `Transport` error with a message and a source error.
    pub fn transport_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for errors a process detects locally from its own arguments,
    /// before any message is sent.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::BinOutOfRange { .. }
                | Self::NullGroup
                | Self::MalformedGroup { .. }
                | Self::CountsMismatch { .. }
                | Self::BufferTooSmall { .. }
        )
    }
}
