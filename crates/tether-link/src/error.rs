use thiserror::Error;

/// Shared error taxonomy for the vehicle command layer.
///
/// Every variant is a local, synchronous, non-retryable condition surfaced to
/// the caller immediately; nothing here is recovered internally.
#[derive(Debug, Error)]
pub enum VehicleError {
    /// Hostname could not be resolved to a socket address.
    #[error("provided hostname {0:?} is invalid")]
    InvalidAddress(String),

    /// Port value above 65535 (0 stays legal as an ephemeral bind).
    #[error("provided port {0} is invalid")]
    InvalidPort(u32),

    /// Operation requires a bound transport; `listen` has not succeeded.
    #[error("must be listening on a port before awaiting a heartbeat")]
    NotListening,

    /// `listen` called on a link that is already past `NotListening`.
    #[error("link is already listening; refusing to re-bind")]
    AlreadyListening,

    /// Operation requires an established connection (heartbeat received).
    #[error("connection needs to be established first")]
    NotEstablished,

    /// A commander was constructed around a link that never established.
    #[error("provided connection hasn't been established")]
    ConnectionNotEstablished,

    /// Mode name absent from the vehicle-supplied mode mapping.
    #[error("mode {0:?} is not known to this vehicle")]
    UnknownMode(String),

    /// Long command built with a parameter count other than seven.
    #[error("long command requires seven parameters, got {0}")]
    MalformedCommand(usize),

    /// A deadline-bounded wait expired before the event arrived.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("mavlink read: {0}")]
    Read(#[from] mavlink::error::MessageReadError),

    #[error("mavlink write: {0}")]
    Write(#[from] mavlink::error::MessageWriteError),
}
