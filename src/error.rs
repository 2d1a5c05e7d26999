use embedded_hal::i2c::I2c;
use sensirion_i2c::i2c;

/// Errors returned by the SPS30 driver.
///
/// The driver never retries: the first failing transfer ends the operation and
/// its error is handed back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum Error<E> {
    /// I2C bus error
    #[cfg_attr(feature = "thiserror", error("I2C bus error: {0:?}"))]
    I2c(E),
    /// A response word failed its CRC-8 check
    #[cfg_attr(feature = "thiserror", error("response CRC mismatch"))]
    Crc,
}

impl<I> From<i2c::Error<I>> for Error<I::Error>
where
    I: I2c,
{
    fn from(e: i2c::Error<I>) -> Self {
        match e {
            i2c::Error::I2cWrite(e) | i2c::Error::I2cRead(e) => Error::I2c(e),
            i2c::Error::Crc => Error::Crc,
        }
    }
}
