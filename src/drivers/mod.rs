pub mod bus;
pub mod imu;

pub use bus::I2cBus;
pub use imu::{AxisMap, AxisMapping, Mpu9250, PhysicalSample, RawSample, Vector3};
