use embedded_hal::i2c::I2c;

use crate::config::BusConfig;

/// I2C controller the sensor driver runs on.
///
/// Extends the embedded-hal transaction interface with the two bring-up
/// steps a platform bus needs before its first transfer: putting the port
/// in controller mode on the configured pins, and installing the driver.
/// One owner per bus instance; transactions are not reentrant.
pub trait I2cBus: I2c {
    fn configure_controller(&mut self, config: &BusConfig) -> Result<(), Self::Error>;

    fn install_driver(&mut self) -> Result<(), Self::Error>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    fn configure_controller(&mut self, config: &BusConfig) -> Result<(), Self::Error> {
        T::configure_controller(self, config)
    }

    fn install_driver(&mut self) -> Result<(), Self::Error> {
        T::install_driver(self)
    }
}
