use alloc::string::String;

use defmt_or_log::{debug, error, info, warn};
use embedded_hal::delay::DelayNs;
use serde::Serialize;

use crate::cloud::{CloudClient, Transport};
use crate::config::AgentConfig;
use crate::drivers::bus::I2cBus;
use crate::drivers::imu::{Mpu9250, PhysicalSample, Vector3};
use crate::error::CycleError;

/// Consecutive failures after which the failure streak is reported.
const FAILURE_ALERT_THRESHOLD: u32 = 50;
// Only every Nth failure of a streak is logged
const FAILURE_LOG_INTERVAL: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleStats {
    pub cycles: u32,
    pub sent: u32,
    pub read_failures: u32,
    pub send_failures: u32,
    pub consecutive_failures: u32,
}

// Published resolution: 0.01 m/s² and 0.001 rad/s
const ACCEL_SCALE: f64 = 100.0;
const GYRO_SCALE: f64 = 1000.0;

#[derive(Serialize)]
struct Triad {
    x: f64,
    y: f64,
    z: f64,
}

impl Triad {
    fn rounded(v: &Vector3, scale: f64) -> Self {
        Self {
            x: round_to(v.x, scale),
            y: round_to(v.y, scale),
            z: round_to(v.z, scale),
        }
    }
}

#[derive(Serialize)]
struct Payload {
    accel: Triad,
    gyro: Triad,
}

/// Rounds half away from zero to a resolution of `1 / scale`.
fn round_to(value: f32, scale: f64) -> f64 {
    let scaled = f64::from(value) * scale;
    let nearest = if scaled < 0.0 { scaled - 0.5 } else { scaled + 0.5 };
    (nearest as i64) as f64 / scale
}

/// `{"accel":{"x","y","z"},"gyro":{"x","y","z"}}`, accelerations to two
/// decimals and rates to three.
pub fn encode_payload(sample: &PhysicalSample) -> Result<String, CycleError> {
    let payload = Payload {
        accel: Triad::rounded(&sample.accel, ACCEL_SCALE),
        gyro: Triad::rounded(&sample.gyro, GYRO_SCALE),
    };
    serde_json::to_string(&payload).map_err(|_| CycleError::Payload)
}

/// Samples the IMU and relays each reading to the cloud.
///
/// Single owner of both the driver and the client; nothing here retries,
/// a failed cycle is counted and the next one starts fresh.
pub struct TelemetryAgent<'a, B, T> {
    imu: Mpu9250<B>,
    cloud: CloudClient<T>,
    config: AgentConfig<'a>,
    stats: CycleStats,
}

impl<'a, B: I2cBus, T: Transport> TelemetryAgent<'a, B, T> {
    pub fn new(imu: Mpu9250<B>, cloud: CloudClient<T>, config: AgentConfig<'a>) -> Self {
        Self {
            imu,
            cloud,
            config,
            stats: CycleStats::default(),
        }
    }

    /// Signs in, then wakes the sensor.
    pub fn start<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), CycleError> {
        self.cloud.sign_in_anonymously()?;
        self.imu.begin(delay).inspect_err(|_| error!("MPU init failed"))?;
        info!("Telemetry agent started, publishing to {}", self.config.path);
        Ok(())
    }

    /// Reads one sample and sends it. A failed read skips the upload.
    pub fn run_cycle(&mut self) -> Result<PhysicalSample, CycleError> {
        self.stats.cycles = self.stats.cycles.wrapping_add(1);
        let result = self.sample_and_send();

        match &result {
            Ok(_) => {
                if self.stats.consecutive_failures > 0 {
                    info!(
                        "Telemetry recovered after {} consecutive failures",
                        self.stats.consecutive_failures
                    );
                    self.stats.consecutive_failures = 0;
                }
                self.stats.sent = self.stats.sent.wrapping_add(1);
            }
            Err(e) => {
                let counter = match e {
                    CycleError::Sensor(_) => &mut self.stats.read_failures,
                    _ => &mut self.stats.send_failures,
                };
                *counter = counter.saturating_add(1);
                self.stats.consecutive_failures = self.stats.consecutive_failures.saturating_add(1);

                if self.stats.consecutive_failures % FAILURE_LOG_INTERVAL == 1 {
                    warn!("Telemetry cycle {} failed: {}", self.stats.cycles, e);
                }
                if self.stats.consecutive_failures == FAILURE_ALERT_THRESHOLD {
                    error!(
                        "{} consecutive telemetry failures",
                        FAILURE_ALERT_THRESHOLD
                    );
                }
            }
        }
        result
    }

    /// Runs cycles forever at the configured period.
    pub fn run<D: DelayNs>(&mut self, delay: &mut D) -> ! {
        info!(
            "Telemetry loop started - sampling at {}ms intervals",
            self.config.period_ms
        );
        loop {
            let _ = self.run_cycle();
            delay.delay_ms(self.config.period_ms);
        }
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn imu(&self) -> &Mpu9250<B> {
        &self.imu
    }

    pub fn cloud(&self) -> &CloudClient<T> {
        &self.cloud
    }

    pub fn into_parts(self) -> (Mpu9250<B>, CloudClient<T>) {
        (self.imu, self.cloud)
    }

    fn sample_and_send(&mut self) -> Result<PhysicalSample, CycleError> {
        let sample = self.imu.read_si()?;
        debug!(
            "Accel [m/s²]: X={} Y={} Z={} | Gyro [rad/s]: X={} Y={} Z={}",
            sample.accel.x,
            sample.accel.y,
            sample.accel.z,
            sample.gyro.x,
            sample.gyro.y,
            sample.gyro.z
        );

        let payload = encode_payload(&sample)?;
        self.cloud.send(self.config.path, &payload)?;
        Ok(sample)
    }
}
