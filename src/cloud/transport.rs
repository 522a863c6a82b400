use crate::error::{CloudError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Method {
    Get,
    Post,
    Put,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    pub const fn carries_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

/// Receives one exchange's response as the transport delivers it.
///
/// The transport calls `on_connected` once when the connection is up, then
/// `on_chunk` for each piece of body data in arrival order, then
/// `on_finished` once the transfer completes. All calls happen inside
/// [`Transport::perform`], on the calling task.
pub trait ResponseSink {
    fn on_connected(&mut self);

    fn on_chunk(&mut self, chunk: &[u8]);

    fn on_finished(&mut self);
}

/// Transport outcome paired with the HTTP status of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Exchange {
    pub transport: Result<(), TransportError>,
    pub status: u16,
}

impl Exchange {
    pub const fn new(transport: Result<(), TransportError>, status: u16) -> Self {
        Self { transport, status }
    }

    /// An exchange that never reached the server.
    pub const fn failed(error: TransportError) -> Self {
        Self::new(Err(error), 0)
    }

    pub fn is_success(&self) -> bool {
        self.transport.is_ok() && self.status == 200
    }

    pub fn into_error(self) -> CloudError {
        CloudError::RequestFailed {
            status: self.status,
            transport_error: self.transport.err(),
        }
    }
}

/// Blocking HTTPS client the cloud client issues its requests through.
///
/// Request settings apply to the next `perform` only; an implementation
/// starts every request from a clean slate, so a request that never calls
/// `set_body` goes out without one.
pub trait Transport {
    fn set_url(&mut self, url: &str) -> Result<(), TransportError>;

    fn set_method(&mut self, method: Method) -> Result<(), TransportError>;

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError>;

    fn set_body(&mut self, body: &[u8]) -> Result<(), TransportError>;

    /// Runs the exchange to completion or timeout, streaming the response
    /// into `sink`.
    fn perform(&mut self, sink: &mut dyn ResponseSink) -> Exchange;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn set_url(&mut self, url: &str) -> Result<(), TransportError> {
        T::set_url(self, url)
    }

    fn set_method(&mut self, method: Method) -> Result<(), TransportError> {
        T::set_method(self, method)
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        T::set_header(self, name, value)
    }

    fn set_body(&mut self, body: &[u8]) -> Result<(), TransportError> {
        T::set_body(self, body)
    }

    fn perform(&mut self, sink: &mut dyn ResponseSink) -> Exchange {
        T::perform(self, sink)
    }
}
