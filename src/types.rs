use core::str::Utf8Error;

/// Length of the serial number buffer, including the terminating NUL.
pub const SERIAL_LEN: usize = 32;

/// Number of data bytes in one measurement response (ten 4-byte floats).
pub(crate) const MEASUREMENT_LEN: usize = 40;

pub(crate) fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

pub(crate) fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Reinterprets a big-endian IEEE754 word pair as `f32`, independent of host
/// byte order.
pub(crate) fn be_f32(bytes: &[u8]) -> f32 {
    f32::from_bits(be_u32(bytes))
}

/// SPS30 measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Mass Concentration PM1.0 [μg/m³]
    pub mc_1p0: f32,
    /// Mass Concentration PM2.5 [μg/m³]
    pub mc_2p5: f32,
    /// Mass Concentration PM4.0 [μg/m³]
    pub mc_4p0: f32,
    /// Mass Concentration PM10 [μg/m³]
    pub mc_10p0: f32,
    /// Number Concentration PM0.5 [#/cm³]
    pub nc_0p5: f32,
    /// Number Concentration PM1.0 [#/cm³]
    pub nc_1p0: f32,
    /// Number Concentration PM2.5 [#/cm³]
    pub nc_2p5: f32,
    /// Number Concentration PM4.0 [#/cm³]
    pub nc_4p0: f32,
    /// Number Concentration PM10 [#/cm³]
    pub nc_10p0: f32,
    /// Typical Particle Size [μm]
    pub typical_particle_size: f32,
}

impl From<[u8; MEASUREMENT_LEN]> for Measurement {
    fn from(data: [u8; MEASUREMENT_LEN]) -> Self {
        let field = |index: usize| be_f32(&data[index * 4..]);
        Self {
            mc_1p0: field(0),
            mc_2p5: field(1),
            mc_4p0: field(2),
            mc_10p0: field(3),
            nc_0p5: field(4),
            nc_1p0: field(5),
            nc_2p5: field(6),
            nc_4p0: field(7),
            nc_10p0: field(8),
            typical_particle_size: field(9),
        }
    }
}

/// Firmware version as reported by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FirmwareVersion {
    /// High byte of the version word
    pub major: u8,
    /// Low byte of the version word
    pub minor: u8,
}

impl FirmwareVersion {
    /// Whether [`sleep`](crate::Sps30::sleep) and
    /// [`wake_up`](crate::Sps30::wake_up) are available.
    pub fn supports_sleep(&self) -> bool {
        *self >= Self { major: 2, minor: 0 }
    }

    /// Whether
    /// [`read_device_status_register`](crate::Sps30::read_device_status_register)
    /// is available.
    pub fn supports_device_status(&self) -> bool {
        *self >= Self { major: 2, minor: 2 }
    }
}

impl From<u16> for FirmwareVersion {
    fn from(word: u16) -> Self {
        let [major, minor] = word.to_be_bytes();
        Self { major, minor }
    }
}

/// Serial number of the sensor, an ASCII string of at most 31 characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialNumber([u8; SERIAL_LEN]);

impl SerialNumber {
    /// Bytes up to, not including, the first NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(SERIAL_LEN);
        &self.0[..end]
    }

    /// The serial number as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }

    /// The full buffer, always NUL terminated.
    pub fn raw(&self) -> &[u8; SERIAL_LEN] {
        &self.0
    }
}

impl From<[u8; SERIAL_LEN]> for SerialNumber {
    fn from(mut data: [u8; SERIAL_LEN]) -> Self {
        // Firmware is not guaranteed to terminate the string.
        data[SERIAL_LEN - 1] = 0;
        Self(data)
    }
}

/// Device status register. Bits are cleared by the sensor once the condition
/// is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus(u32);

impl DeviceStatus {
    /// Fan speed out of range.
    pub const FAN_SPEED_WARNING: u32 = 1 << 21;
    /// Laser current out of range.
    pub const LASER_ERROR: u32 = 1 << 5;
    /// Fan not turning.
    pub const FAN_ERROR: u32 = 1 << 4;

    /// Assembles the register from its high and low word.
    pub fn from_words(high: u16, low: u16) -> Self {
        Self((u32::from(high) << 16) | u32::from(low))
    }

    /// Raw register value.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Fan speed is too high or too low.
    pub fn fan_speed_warning(&self) -> bool {
        self.0 & Self::FAN_SPEED_WARNING != 0
    }

    /// Laser current is out of range.
    pub fn laser_error(&self) -> bool {
        self.0 & Self::LASER_ERROR != 0
    }

    /// Fan is switched on but not turning.
    pub fn fan_error(&self) -> bool {
        self.0 & Self::FAN_ERROR != 0
    }
}

impl From<u32> for DeviceStatus {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_floats_big_endian() {
        assert_eq!(be_f32(&[0x3f, 0x80, 0x00, 0x00]), 1.0);
        assert_eq!(be_f32(&[0x41, 0x20, 0x00, 0x00]), 10.0);
        assert_eq!(be_u32(&[0x00, 0x09, 0x3a, 0x80]), 604_800);
    }

    #[test]
    fn measurement_field_order() {
        let mut data = [0u8; MEASUREMENT_LEN];
        for (i, chunk) in data.chunks_exact_mut(4).enumerate() {
            chunk.copy_from_slice(&(i as f32 + 0.5).to_be_bytes());
        }
        let m = Measurement::from(data);
        assert_eq!(m.mc_1p0, 0.5);
        assert_eq!(m.mc_2p5, 1.5);
        assert_eq!(m.mc_4p0, 2.5);
        assert_eq!(m.mc_10p0, 3.5);
        assert_eq!(m.nc_0p5, 4.5);
        assert_eq!(m.nc_1p0, 5.5);
        assert_eq!(m.nc_2p5, 6.5);
        assert_eq!(m.nc_4p0, 7.5);
        assert_eq!(m.nc_10p0, 8.5);
        assert_eq!(m.typical_particle_size, 9.5);
    }

    #[test]
    fn measurement_is_bit_exact() {
        let mut data = [0u8; MEASUREMENT_LEN];
        data[..4].copy_from_slice(&[0x7f, 0xc0, 0x00, 0x01]);
        data[4..8].copy_from_slice(&[0x80, 0x00, 0x00, 0x00]);
        let m = Measurement::from(data);
        assert_eq!(m.mc_1p0.to_bits(), 0x7fc0_0001);
        assert_eq!(m.mc_2p5.to_bits(), 0x8000_0000);
    }

    #[test]
    fn firmware_version_from_word() {
        let version = FirmwareVersion::from(0x0102);
        assert_eq!(version, FirmwareVersion { major: 1, minor: 2 });
        assert!(!version.supports_sleep());

        let version = FirmwareVersion::from(0x0201);
        assert!(version.supports_sleep());
        assert!(!version.supports_device_status());
        assert!(FirmwareVersion::from(0x0202).supports_device_status());
        assert!(FirmwareVersion::from(0x0300).supports_device_status());
    }

    #[test]
    fn serial_number_is_terminated() {
        let serial = SerialNumber::from([b'A'; SERIAL_LEN]);
        assert_eq!(serial.raw()[SERIAL_LEN - 1], 0);
        assert_eq!(serial.as_bytes().len(), SERIAL_LEN - 1);

        let mut data = [0u8; SERIAL_LEN];
        data[..4].copy_from_slice(b"F00D");
        data[5] = b'X';
        let serial = SerialNumber::from(data);
        assert_eq!(serial.as_str(), Ok("F00D"));
    }

    #[test]
    fn device_status_bits() {
        let status = DeviceStatus::from_words(0x0000, 0x0030);
        assert_eq!(status.bits(), 0x0000_0030);
        assert!(status.fan_error());
        assert!(status.laser_error());
        assert!(!status.fan_speed_warning());

        let status = DeviceStatus::from_words(0x0020, 0x0000);
        assert!(status.fan_speed_warning());
        assert!(!status.fan_error());
    }
}
