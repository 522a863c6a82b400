#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod cloud;
pub mod config;
pub mod drivers;
pub mod error;
pub mod tasks;

#[cfg(test)]
mod mock;

pub use cloud::CloudClient;
pub use drivers::imu::{Mpu9250, PhysicalSample};
pub use error::{BusError, CloudError, CycleError};
pub use tasks::TelemetryAgent;
