//! Platform agnostic driver for the Sensirion SPS30 particulate matter sensor,
//! built on the [`embedded-hal`](https://crates.io/crates/embedded-hal) 1.0
//! traits.
//!
//! The sensor must run in I2C mode: pin 4 (SEL) has to be pulled to ground,
//! otherwise the sensor starts in UART mode.
//!
//! ## Usage
//!
//! ```ignore
//! let mut sensor = Sps30::new(i2c, delay);
//! sensor.probe()?;
//! sensor.start_measurement()?;
//! loop {
//!     delay.delay_ms(MEASUREMENT_INTERVAL_MS);
//!     if sensor.read_data_ready()? {
//!         let m = sensor.read_measurement()?;
//!     }
//! }
//! ```
//!
//! ## Firmware versions
//!
//! [`sleep`](Sps30::sleep), [`wake_up`](Sps30::wake_up) and
//! [`read_device_status_register`](Sps30::read_device_status_register) need a
//! firmware of at least 2.0 (2.2 for the status register). The driver does not
//! check this; use [`FirmwareVersion`] to decide before calling them. Older
//! firmware answers these commands with a NACK, reported as [`Error::I2c`].
//!
//! ## Concurrency
//!
//! Every method takes `&mut self` and blocks until its transfers and delays
//! are done. Sharing one bus between threads or drivers requires a bus-level
//! lock around the driver, e.g. `embedded-hal-bus`.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod commands;
mod error;
mod types;

use embedded_hal::{delay::DelayNs, i2c::I2c};
use sensirion_i2c::{crc8, i2c};

use commands::{Command, START_MEASUREMENT_FLOAT_FORMAT, WRITE_DELAY_MS};
pub use error::Error;
use types::{be_u16, be_u32, MEASUREMENT_LEN};
pub use types::{DeviceStatus, FirmwareVersion, Measurement, SerialNumber, SERIAL_LEN};

/// Fixed I2C address of the SPS30.
pub const SPS30_I2C_ADDRESS: u8 = 0x69;

/// The sensor produces one measurement per second.
pub const MEASUREMENT_INTERVAL_MS: u32 = 1000;

/// Time to wait after [`Sps30::reset`] before talking to the sensor again.
pub const RESET_DELAY_MS: u32 = 50;

/// Conversion factor used by the days variants of the auto-cleaning interval.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Largest response: ten floats, i.e. 20 words with one CRC byte each.
const MAX_RX_BYTES: usize = 60;

/// Largest request: command plus two argument words with CRC.
const MAX_TX_BYTES: usize = 8;

/// SPS30 driver.
pub struct Sps30<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C, D, E> Sps30<I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    /// Creates a new driver. Nothing is sent to the sensor.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Sps30 { i2c, delay }
    }

    /// Releases the bus and the delay.
    pub fn destroy(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Version of this driver.
    pub fn driver_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    /// Checks that a sensor answers on the bus.
    ///
    /// Sends a wake-up first, whose result is ignored since firmware before 2.0
    /// and sensors that are already awake do not acknowledge it, then reads the
    /// serial number.
    pub fn probe(&mut self) -> Result<(), Error<E>> {
        if self.wake_up().is_err() {
            debug!("wake-up not acknowledged during probe");
        }
        self.serial_number()?;
        Ok(())
    }

    /// Reads the firmware version.
    pub fn read_firmware_version(&mut self) -> Result<FirmwareVersion, Error<E>> {
        let mut data = [0; 2];
        self.delayed_read_cmd(Command::ReadFirmwareVersion, &mut data)?;
        Ok(FirmwareVersion::from(be_u16(&data)))
    }

    /// Reads the serial number.
    pub fn serial_number(&mut self) -> Result<SerialNumber, Error<E>> {
        let mut data = [0; SERIAL_LEN];
        self.delayed_read_cmd(Command::ReadSerialNumber, &mut data)?;
        Ok(SerialNumber::from(data))
    }

    /// Starts measurement mode with float output.
    ///
    /// Waits 10 ms after the command. The first measurement is available about
    /// one second later.
    pub fn start_measurement(&mut self) -> Result<(), Error<E>> {
        self.write_command_with_data(Command::StartMeasurement, &[START_MEASUREMENT_FLOAT_FORMAT])
    }

    /// Stops measurement mode. Waits 10 ms after the command.
    pub fn stop_measurement(&mut self) -> Result<(), Error<E>> {
        self.write_command(Command::StopMeasurement)
    }

    /// Whether a measurement not yet read is available.
    pub fn read_data_ready(&mut self) -> Result<bool, Error<E>> {
        let mut data = [0; 2];
        self.delayed_read_cmd(Command::ReadDataReadyFlag, &mut data)?;
        Ok(be_u16(&data) == 1)
    }

    /// Reads the last measurement.
    ///
    /// All ten values come from one transfer; on error nothing is returned.
    pub fn read_measurement(&mut self) -> Result<Measurement, Error<E>> {
        let mut data = [0; MEASUREMENT_LEN];
        self.delayed_read_cmd(Command::ReadMeasuredValues, &mut data)?;
        Ok(Measurement::from(data))
    }

    /// Reads the fan auto-cleaning interval in seconds. Waits 10 ms between
    /// command and read.
    ///
    /// The sensor only reports a newly written interval after a reset or power
    /// cycle; until then the previous value is returned.
    pub fn fan_auto_cleaning_interval(&mut self) -> Result<u32, Error<E>> {
        let mut data = [0; 4];
        self.delayed_read_cmd(Command::AutoCleaningInterval, &mut data)?;
        Ok(be_u32(&data))
    }

    /// Sets the fan auto-cleaning interval in seconds, 0 disables it. Waits
    /// 15 ms after the command.
    pub fn set_fan_auto_cleaning_interval(&mut self, seconds: u32) -> Result<(), Error<E>> {
        let [hh, hl, lh, ll] = seconds.to_be_bytes();
        let words = [u16::from_be_bytes([hh, hl]), u16::from_be_bytes([lh, ll])];
        self.write_with_args(Command::AutoCleaningInterval.code(), &words)?;
        self.delay.delay_ms(WRITE_DELAY_MS);
        Ok(())
    }

    /// Fan auto-cleaning interval in whole days, truncated.
    ///
    /// Intervals of more than 255 days read as 255 rather than wrapping
    /// around like the vendor C driver does.
    pub fn fan_auto_cleaning_interval_days(&mut self) -> Result<u8, Error<E>> {
        let days = self.fan_auto_cleaning_interval()? / SECONDS_PER_DAY;
        Ok(u8::try_from(days).unwrap_or(u8::MAX))
    }

    /// Sets the fan auto-cleaning interval in days, 0 disables it.
    pub fn set_fan_auto_cleaning_interval_days(&mut self, days: u8) -> Result<(), Error<E>> {
        self.set_fan_auto_cleaning_interval(u32::from(days) * SECONDS_PER_DAY)
    }

    /// Starts a fan cleaning cycle right away. Waits 10 ms after the command.
    ///
    /// Only accepted while measuring.
    pub fn start_manual_fan_cleaning(&mut self) -> Result<(), Error<E>> {
        self.write_command(Command::StartFanCleaning)
    }

    /// Soft resets the sensor.
    ///
    /// Does not wait; wait [`RESET_DELAY_MS`] before the next command. SEL must
    /// stay grounded during the reset for the sensor to come back in I2C mode.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_command(Command::Reset)
    }

    /// Puts the sensor to sleep. Only accepted while idle. Waits 10 ms after
    /// the command.
    pub fn sleep(&mut self) -> Result<(), Error<E>> {
        self.write_command(Command::Sleep)
    }

    /// Wakes the sensor from sleep. Waits 10 ms after the command.
    ///
    /// The first wake-up command only activates the interface and is not
    /// acknowledged, so its result is discarded. The second one must follow
    /// within 100 ms and its result is returned.
    pub fn wake_up(&mut self) -> Result<(), Error<E>> {
        let (code, delay) = Command::WakeUp.as_tuple();
        if i2c::write_command_u16(&mut self.i2c, SPS30_I2C_ADDRESS, code).is_err() {
            trace!("first wake-up not acknowledged");
        }
        i2c::write_command_u16(&mut self.i2c, SPS30_I2C_ADDRESS, code).map_err(Error::I2c)?;
        self.delay.delay_ms(delay);
        Ok(())
    }

    /// Reads the device status register. Waits 10 ms between command and read.
    pub fn read_device_status_register(&mut self) -> Result<DeviceStatus, Error<E>> {
        let mut data = [0; 4];
        self.delayed_read_cmd(Command::ReadDeviceStatusRegister, &mut data)?;
        Ok(DeviceStatus::from_words(be_u16(&data), be_u16(&data[2..])))
    }

    /// Command for the sensor, then wait its processing time.
    fn write_command(&mut self, cmd: Command) -> Result<(), Error<E>> {
        let (code, delay) = cmd.as_tuple();
        trace!("write {:#x}", code);
        i2c::write_command_u16(&mut self.i2c, SPS30_I2C_ADDRESS, code).map_err(Error::I2c)?;
        if delay > 0 {
            self.delay.delay_ms(delay);
        }
        Ok(())
    }

    /// Command with argument words, then wait its processing time.
    fn write_command_with_data(&mut self, cmd: Command, args: &[u16]) -> Result<(), Error<E>> {
        let (code, delay) = cmd.as_tuple();
        self.write_with_args(code, args)?;
        self.delay.delay_ms(delay);
        Ok(())
    }

    /// Writes the command followed by each argument word and its CRC.
    fn write_with_args(&mut self, code: u16, args: &[u16]) -> Result<(), Error<E>> {
        let mut buf = [0; MAX_TX_BYTES];
        buf[..2].copy_from_slice(&code.to_be_bytes());
        let mut len = 2;
        for word in args {
            let bytes = word.to_be_bytes();
            buf[len..len + 2].copy_from_slice(&bytes);
            buf[len + 2] = crc8::calculate(&bytes);
            len += 3;
        }
        trace!("write {:#x} with {} argument words", code, args.len());
        self.i2c
            .write(SPS30_I2C_ADDRESS, &buf[..len])
            .map_err(Error::I2c)
    }

    /// Command, processing time, then read `data.len() / 2` words. Every word
    /// is CRC checked; only the data bytes end up in `data`.
    fn delayed_read_cmd(&mut self, cmd: Command, data: &mut [u8]) -> Result<(), Error<E>> {
        let (code, delay) = cmd.as_tuple();
        trace!("read {:#x}", code);
        i2c::write_command_u16(&mut self.i2c, SPS30_I2C_ADDRESS, code).map_err(Error::I2c)?;
        if delay > 0 {
            self.delay.delay_ms(delay);
        }

        let mut buf = [0; MAX_RX_BYTES];
        let raw = &mut buf[..data.len() / 2 * 3];
        if let Err(e) = i2c::read_words_with_crc(&mut self.i2c, SPS30_I2C_ADDRESS, raw) {
            let err: Error<E> = e.into();
            if matches!(err, Error::Crc) {
                warn!("crc mismatch in response to {:#x}", code);
            }
            return Err(err);
        }

        for (word, group) in data.chunks_exact_mut(2).zip(raw.chunks_exact(3)) {
            word.copy_from_slice(&group[..2]);
        }
        Ok(())
    }
}
