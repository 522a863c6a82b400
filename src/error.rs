use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// Sensor bus failure. Every variant is fatal to the operation that hit it;
/// no partial sample is ever returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    #[error("I2C controller configuration failed: {0}")]
    Configure(ErrorKind),
    #[error("I2C driver install failed: {0}")]
    Install(ErrorKind),
    #[error("I2C transaction failed: {0}")]
    Transaction(ErrorKind),
}

impl BusError {
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Self::Configure(kind) | Self::Install(kind) | Self::Transaction(kind) => kind,
        }
    }
}

/// Failure reported by the HTTP transport underneath the cloud client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    #[error("request setup rejected")]
    InvalidRequest,
    #[error("connection failed")]
    Connection,
    #[error("TLS handshake failed")]
    Tls,
    #[error("timed out")]
    Timeout,
    #[error("transport error code {0}")]
    Other(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CloudError {
    #[error("anonymous sign-in failed")]
    AuthFailed,
    #[error("client is not authenticated")]
    NotAuthenticated,
    #[error("request failed (status {status}, transport {transport_error:?})")]
    RequestFailed {
        status: u16,
        transport_error: Option<TransportError>,
    },
    #[error("empty response body")]
    EmptyResponse,
    #[error("response larger than the {capacity} byte buffer")]
    ResponseOverflow { capacity: usize },
}

/// Outcome of one telemetry cycle that did not reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleError {
    #[error("sensor read failed: {0}")]
    Sensor(#[from] BusError),
    #[error("payload encoding failed")]
    Payload,
    #[error("upload failed: {0}")]
    Cloud(#[from] CloudError),
}
