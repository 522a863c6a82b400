use defmt_or_log::{error, info};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::Error as _;
use serde::Serialize;

use super::bus::I2cBus;
use crate::config::{BusConfig, IMU_WAKE_SETTLE_MS};
use crate::error::BusError;

// MPU-9250 I2C address (AD0 low)
pub const MPU9250_ADDRESS: u8 = 0x68;

// MPU-9250 Register Addresses
const MPU9250_ACCEL_XOUT_H_ADDR: u8 = 0x3B;
const MPU9250_PWR_MGMT_1_ADDR: u8 = 0x6B;

// Clearing PWR_MGMT_1 drops the sleep bit
const PWR_MGMT_1_WAKE: u8 = 0x00;

/// ACCEL_XOUT_H..GYRO_ZOUT_L: accel xyz, temperature, gyro xyz.
pub const BURST_LEN: usize = 14;

// Sensitivity at the power-on full scale (±2 g, ±250 °/s)
pub const ACCEL_LSB_PER_G: f32 = 16384.0;
pub const GYRO_LSB_PER_DPS: f32 = 131.0;
pub const STANDARD_GRAVITY: f32 = 9.80665;
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

/* ------------------------------------------------------------------------- */
/*  Axis remapping                                                           */
/* ------------------------------------------------------------------------- */

/// Physical sensor axis a logical axis is sourced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl Axis {
    pub const fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    /// Negation saturates, so `i16::MIN` maps to `i16::MAX`.
    pub fn apply(self, value: i16) -> i16 {
        match self {
            Sign::Positive => value,
            Sign::Negative => value.saturating_neg(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMapping {
    pub source: Axis,
    pub sign: Sign,
}

impl AxisMapping {
    pub const fn new(source: Axis, sign: Sign) -> Self {
        Self { source, sign }
    }
}

/// Per logical axis (source axis, sign) table, shared by the accelerometer
/// and gyroscope triads. Sources need not form a permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMap([AxisMapping; 3]);

impl AxisMap {
    pub const IDENTITY: AxisMap = AxisMap([
        AxisMapping::new(Axis::X, Sign::Positive),
        AxisMapping::new(Axis::Y, Sign::Positive),
        AxisMapping::new(Axis::Z, Sign::Positive),
    ]);

    pub const fn new(mappings: [AxisMapping; 3]) -> Self {
        Self(mappings)
    }

    pub fn mappings(&self) -> &[AxisMapping; 3] {
        &self.0
    }

    /// `out[i] = sign[i] * triad[source[i]]`
    pub fn apply(&self, triad: [i16; 3]) -> [i16; 3] {
        core::array::from_fn(|i| {
            let mapping = self.0[i];
            mapping.sign.apply(triad[mapping.source.index()])
        })
    }
}

impl Default for AxisMap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/* ------------------------------------------------------------------------- */
/*  Samples                                                                  */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub accel: [i16; 3],
    pub gyro: [i16; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    fn from_counts(counts: [i16; 3], lsb_per_unit: f32, unit_to_si: f32) -> Self {
        let convert = |count: i16| count as f32 / lsb_per_unit * unit_to_si;
        Self {
            x: convert(counts[0]),
            y: convert(counts[1]),
            z: convert(counts[2]),
        }
    }
}

/// Accelerations in m/s², angular rates in rad/s, logical axis order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhysicalSample {
    pub accel: Vector3,
    pub gyro: Vector3,
}

impl RawSample {
    /// Decodes a burst starting at ACCEL_XOUT_H in sensor-native axis order.
    /// Bytes 6..8 hold the die temperature and are skipped.
    pub fn decode(buf: &[u8; BURST_LEN]) -> Self {
        let word = |at: usize| i16::from_be_bytes([buf[at], buf[at + 1]]);
        Self {
            accel: [word(0), word(2), word(4)],
            gyro: [word(8), word(10), word(12)],
        }
    }

    pub fn remap(&self, map: &AxisMap) -> Self {
        Self {
            accel: map.apply(self.accel),
            gyro: map.apply(self.gyro),
        }
    }

    /// LSB → g → m/s² and LSB → °/s → rad/s.
    pub fn to_si(&self) -> PhysicalSample {
        PhysicalSample {
            accel: Vector3::from_counts(self.accel, ACCEL_LSB_PER_G, STANDARD_GRAVITY),
            gyro: Vector3::from_counts(self.gyro, GYRO_LSB_PER_DPS, DEG_TO_RAD),
        }
    }
}

/* ------------------------------------------------------------------------- */
/*  Driver                                                                   */
/* ------------------------------------------------------------------------- */

pub struct Mpu9250<B> {
    bus: B,
    config: BusConfig,
    axis_map: AxisMap,
    addr: u8,
}

impl<B: I2cBus> Mpu9250<B> {
    /// Without an axis map the sensor frame is used as is.
    pub fn new(bus: B, config: BusConfig, axis_map: Option<AxisMap>) -> Self {
        Self {
            bus,
            config,
            axis_map: axis_map.unwrap_or_default(),
            addr: MPU9250_ADDRESS,
        }
    }

    /// Brings up the bus and wakes the sensor. Readings are valid once this
    /// returns.
    pub fn begin<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), BusError> {
        self.bus
            .configure_controller(&self.config)
            .map_err(|e| BusError::Configure(e.kind()))
            .inspect_err(|e| error!("I2C controller config failed: {}", e))?;

        self.bus
            .install_driver()
            .map_err(|e| BusError::Install(e.kind()))
            .inspect_err(|e| error!("I2C driver install failed: {}", e))?;

        self.write_register(MPU9250_PWR_MGMT_1_ADDR, PWR_MGMT_1_WAKE)
            .inspect_err(|e| error!("Failed to wake MPU9250: {}", e))?;

        delay.delay_ms(IMU_WAKE_SETTLE_MS);
        info!(
            "MPU9250 awake on port {} (SDA {}, SCL {}, {} Hz)",
            self.config.port, self.config.sda_pin, self.config.scl_pin, self.config.clock_hz
        );
        Ok(())
    }

    pub fn read_raw(&mut self) -> Result<RawSample, BusError> {
        let buf = self.read_registers::<BURST_LEN>(MPU9250_ACCEL_XOUT_H_ADDR)?;
        Ok(RawSample::decode(&buf).remap(&self.axis_map))
    }

    pub fn read_si(&mut self) -> Result<PhysicalSample, BusError> {
        Ok(self.read_raw()?.to_si())
    }

    pub fn axis_map(&self) -> &AxisMap {
        &self.axis_map
    }

    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        self.bus
            .write(self.addr, &[reg, value])
            .map_err(|e| BusError::Transaction(e.kind()))
    }

    fn read_registers<const N: usize>(&mut self, reg: u8) -> Result<[u8; N], BusError> {
        let mut buf = [0u8; N];
        self.bus
            .write_read(self.addr, &[reg], &mut buf)
            .map_err(|e| BusError::Transaction(e.kind()))?;
        Ok(buf)
    }
}
