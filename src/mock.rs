//! Recording stand-ins for the bus, delay and transport used by unit tests.

use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

use crate::cloud::transport::{Exchange, Method, ResponseSink, Transport};
use crate::config::BusConfig;
use crate::drivers::bus::I2cBus;
use crate::error::TransportError;

/* ------------------------------------------------------------------------- */
/*  I2C                                                                      */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Configure(BusConfig),
    Install,
    Write {
        addr: u8,
        data: Vec<u8>,
    },
    WriteRead {
        addr: u8,
        write_data: Vec<u8>,
        read_len: usize,
    },
}

#[derive(Debug, Default)]
pub struct MockI2c {
    events: Vec<BusEvent>,
    read_data: VecDeque<u8>,
    configure_error: Option<ErrorKind>,
    install_error: Option<ErrorKind>,
    transaction_error: Option<ErrorKind>,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.events.clone()
    }

    /// Bytes handed out, in order, to subsequent reads.
    pub fn queue_read(&mut self, data: &[u8]) {
        self.read_data.extend(data.iter().copied());
    }

    pub fn fail_configure(&mut self, kind: ErrorKind) {
        self.configure_error = Some(kind);
    }

    pub fn fail_install(&mut self, kind: ErrorKind) {
        self.install_error = Some(kind);
    }

    pub fn fail_transactions(&mut self, kind: ErrorKind) {
        self.transaction_error = Some(kind);
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if let Some(kind) = self.transaction_error {
            return Err(kind);
        }

        let mut write_data = Vec::new();
        let mut read_len = 0;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => write_data.extend_from_slice(bytes),
                Operation::Read(buf) => {
                    for byte in buf.iter_mut() {
                        *byte = self.read_data.pop_front().unwrap_or(0);
                    }
                    read_len += buf.len();
                }
            }
        }

        self.events.push(if read_len == 0 {
            BusEvent::Write {
                addr: address,
                data: write_data,
            }
        } else {
            BusEvent::WriteRead {
                addr: address,
                write_data,
                read_len,
            }
        });
        Ok(())
    }
}

impl I2cBus for MockI2c {
    fn configure_controller(&mut self, config: &BusConfig) -> Result<(), Self::Error> {
        if let Some(kind) = self.configure_error {
            return Err(kind);
        }
        self.events.push(BusEvent::Configure(*config));
        Ok(())
    }

    fn install_driver(&mut self) -> Result<(), Self::Error> {
        if let Some(kind) = self.install_error {
            return Err(kind);
        }
        self.events.push(BusEvent::Install);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MockDelay {
    elapsed_ns: u64,
}

impl MockDelay {
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}

/* ------------------------------------------------------------------------- */
/*  Transport                                                                */
/* ------------------------------------------------------------------------- */

/// One request as the transport saw it when `perform` ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Recorded {
    fn empty() -> Self {
        Self {
            url: String::new(),
            method: Method::Get,
            headers: Vec::new(),
            body: None,
        }
    }
}

struct Scripted {
    transport: Result<(), TransportError>,
    status: u16,
    // None: the exchange completes without any sink callback
    chunks: Option<Vec<Vec<u8>>>,
}

/// Replays queued responses into the sink, one per `perform`.
pub struct ScriptedTransport {
    pending: Recorded,
    requests: Vec<Recorded>,
    responses: VecDeque<Scripted>,
    setup_error: Option<TransportError>,
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self {
            pending: Recorded::empty(),
            requests: Vec::new(),
            responses: VecDeque::new(),
            setup_error: None,
        }
    }
}

impl ScriptedTransport {
    pub fn respond(&mut self, status: u16, chunks: &[&[u8]]) {
        self.respond_with(Ok(()), status, chunks);
    }

    pub fn respond_with(
        &mut self,
        transport: Result<(), TransportError>,
        status: u16,
        chunks: &[&[u8]],
    ) {
        self.responses.push_back(Scripted {
            transport,
            status,
            chunks: Some(chunks.iter().map(|c| c.to_vec()).collect()),
        });
    }

    /// Reports `status` without ever connecting the sink.
    pub fn respond_silently(&mut self, status: u16) {
        self.responses.push_back(Scripted {
            transport: Ok(()),
            status,
            chunks: None,
        });
    }

    /// Makes every setter fail with `error`.
    pub fn reject_setup(&mut self, error: TransportError) {
        self.setup_error = Some(error);
    }

    pub fn requests(&self) -> &[Recorded] {
        &self.requests
    }

    fn check_setup(&self) -> Result<(), TransportError> {
        self.setup_error.map_or(Ok(()), Err)
    }
}

impl Transport for ScriptedTransport {
    fn set_url(&mut self, url: &str) -> Result<(), TransportError> {
        self.check_setup()?;
        self.pending.url = url.into();
        Ok(())
    }

    fn set_method(&mut self, method: Method) -> Result<(), TransportError> {
        self.check_setup()?;
        self.pending.method = method;
        Ok(())
    }

    fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        self.check_setup()?;
        self.pending.headers.push((name.into(), value.into()));
        Ok(())
    }

    fn set_body(&mut self, body: &[u8]) -> Result<(), TransportError> {
        self.check_setup()?;
        self.pending.body = Some(String::from_utf8_lossy(body).into_owned());
        Ok(())
    }

    fn perform(&mut self, sink: &mut dyn ResponseSink) -> Exchange {
        self.requests
            .push(core::mem::replace(&mut self.pending, Recorded::empty()));

        let Some(response) = self.responses.pop_front() else {
            return Exchange::failed(TransportError::Connection);
        };
        if let (Ok(()), Some(chunks)) = (&response.transport, &response.chunks) {
            sink.on_connected();
            for chunk in chunks {
                sink.on_chunk(chunk);
            }
            sink.on_finished();
        }
        Exchange::new(response.transport, response.status)
    }
}
