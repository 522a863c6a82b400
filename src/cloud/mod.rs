pub mod buffer;
pub mod client;
pub mod transport;

pub use buffer::ResponseBuffer;
pub use client::{CloudClient, Credential, Host};
pub use transport::{Exchange, Method, ResponseSink, Transport};
