// Centralize all configuration constants
pub const I2C_PORT: u8 = 0;
pub const I2C_SDA_PIN: u8 = 21;
pub const I2C_SCL_PIN: u8 = 22;
pub const I2C_FREQUENCY_HZ: u32 = 400_000;

// Oscillator settle time after clearing the sleep bit
pub const IMU_WAKE_SETTLE_MS: u32 = 100;

pub const TELEMETRY_PATH: &str = "test";
pub const TELEMETRY_PERIOD_MS: u32 = 1000;

// Cloud field bounds
pub const RESPONSE_BUFFER_SIZE: usize = 4096;
pub const MAX_API_KEY_LEN: usize = 64;
pub const MAX_HOST_LEN: usize = 64;
/// Normalized host plus its trailing separator.
pub const HOST_CAPACITY: usize = MAX_HOST_LEN + 1;
pub const CREDENTIAL_CAPACITY: usize = 1024;

/// I2C controller parameters for the sensor bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusConfig {
    pub port: u8,
    pub sda_pin: u8,
    pub scl_pin: u8,
    pub clock_hz: u32,
    pub pullups: bool,
}

impl BusConfig {
    pub const fn new(port: u8, sda_pin: u8, scl_pin: u8, clock_hz: u32) -> Self {
        Self {
            port,
            sda_pin,
            scl_pin,
            clock_hz,
            pullups: true,
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new(I2C_PORT, I2C_SDA_PIN, I2C_SCL_PIN, I2C_FREQUENCY_HZ)
    }
}

/// Cloud endpoint settings. Either field may be absent, in which case the
/// client it configures never leaves the unauthenticated state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloudConfig<'a> {
    pub api_key: Option<&'a str>,
    pub host: Option<&'a str>,
    pub response_capacity: usize,
}

impl<'a> CloudConfig<'a> {
    pub const fn new(api_key: &'a str, host: &'a str) -> Self {
        Self {
            api_key: Some(api_key),
            host: Some(host),
            response_capacity: RESPONSE_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig<'a> {
    pub path: &'a str,
    pub period_ms: u32,
}

impl Default for AgentConfig<'static> {
    fn default() -> Self {
        Self {
            path: TELEMETRY_PATH,
            period_ms: TELEMETRY_PERIOD_MS,
        }
    }
}
