use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use mpu_telemetry::cloud::{Exchange, Method, ResponseSink, Transport};
use mpu_telemetry::config::BusConfig;
use mpu_telemetry::drivers::I2cBus;
use mpu_telemetry::error::TransportError;

/// Sensor whose every burst read returns the same register image.
pub struct FixedSensor {
    pub registers: [u8; 14],
    pub fail: Option<ErrorKind>,
    pub awake: bool,
}

impl FixedSensor {
    pub fn new(accel: [i16; 3], gyro: [i16; 3]) -> Self {
        let mut registers = [0u8; 14];
        for (i, w) in accel.iter().chain(&[0x0123]).chain(gyro.iter()).enumerate() {
            registers[2 * i..2 * i + 2].copy_from_slice(&w.to_be_bytes());
        }
        Self {
            registers,
            fail: None,
            awake: false,
        }
    }
}

impl ErrorType for FixedSensor {
    type Error = ErrorKind;
}

impl I2c for FixedSensor {
    fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if let Some(kind) = self.fail {
            return Err(kind);
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if **bytes == [0x6B, 0x00] {
                        self.awake = true;
                    }
                }
                Operation::Read(buf) => {
                    let n = buf.len().min(self.registers.len());
                    buf[..n].copy_from_slice(&self.registers[..n]);
                }
            }
        }
        Ok(())
    }
}

impl I2cBus for FixedSensor {
    fn configure_controller(&mut self, _config: &BusConfig) -> Result<(), ErrorKind> {
        Ok(())
    }

    fn install_driver(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub method: Option<Method>,
    pub body: Option<String>,
}

/// Replays `(status, body)` pairs in order; the body arrives in 7 byte
/// chunks to exercise accumulation.
#[derive(Default)]
pub struct FakeBackend {
    pub requests: Vec<Request>,
    responses: VecDeque<(u16, Vec<u8>)>,
    url: String,
    method: Option<Method>,
    body: Option<String>,
}

impl FakeBackend {
    pub fn reply(&mut self, status: u16, body: &str) -> &mut Self {
        self.responses.push_back((status, body.as_bytes().to_vec()));
        self
    }
}

impl Transport for FakeBackend {
    fn set_url(&mut self, url: &str) -> Result<(), TransportError> {
        self.url = url.to_owned();
        Ok(())
    }

    fn set_method(&mut self, method: Method) -> Result<(), TransportError> {
        self.method = Some(method);
        Ok(())
    }

    fn set_header(&mut self, _name: &str, _value: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn set_body(&mut self, body: &[u8]) -> Result<(), TransportError> {
        self.body = Some(String::from_utf8(body.to_vec()).map_err(|_| TransportError::InvalidRequest)?);
        Ok(())
    }

    fn perform(&mut self, sink: &mut dyn ResponseSink) -> Exchange {
        self.requests.push(Request {
            url: std::mem::take(&mut self.url),
            method: self.method.take(),
            body: self.body.take(),
        });

        let Some((status, body)) = self.responses.pop_front() else {
            return Exchange::failed(TransportError::Timeout);
        };
        sink.on_connected();
        for chunk in body.chunks(7) {
            sink.on_chunk(chunk);
        }
        sink.on_finished();
        Exchange::new(Ok(()), status)
    }
}
