//! Sensor configuration types and register descriptor tables
//!
//! Register traffic that the firmware performs at fixed points (bring-up,
//! sampling) is described by compile-time lists of [`RegisterWrite`] and
//! [`RegisterRead`] entries, applied in order by
//! [`Nmh1000Driver::configure`](crate::Nmh1000Driver::configure) and
//! [`Nmh1000Driver::read_data`](crate::Nmh1000Driver::read_data).

use crate::registers::{
    CONTROL_REG1, CONTROL_REG1_AUTO_MODE_MASK, CONTROL_REG1_AUTO_MODE_START, OUT_M_REG, USER_ODR,
    USER_ODR_ODR_MASK,
};

/// Output data rate (`USER_ODR.odr`)
///
/// Low-power (`Lp*`) rates duty-cycle the Hall front end; high-speed (`Hsp*`)
/// rates keep it biased. The multiplier is relative to the base sampling
/// period of the respective mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputDataRate {
    /// Low power, base rate
    #[default]
    Lp1x = 0x00,
    /// Low power, 2x base rate
    Lp2x = 0x01,
    /// Low power, 5x base rate
    Lp5x = 0x02,
    /// Low power, 10x base rate
    Lp10x = 0x03,
    /// High speed, base rate
    Hsp1x = 0x10,
    /// High speed, 2x base rate
    Hsp2x = 0x11,
    /// High speed, 5x base rate
    Hsp5x = 0x12,
    /// High speed, 10x base rate
    Hsp10x = 0x13,
}

impl OutputDataRate {
    /// Decode the `odr` field value
    #[must_use]
    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits & USER_ODR_ODR_MASK {
            0x00 => Some(Self::Lp1x),
            0x01 => Some(Self::Lp2x),
            0x02 => Some(Self::Lp5x),
            0x03 => Some(Self::Lp10x),
            0x10 => Some(Self::Hsp1x),
            0x11 => Some(Self::Hsp2x),
            0x12 => Some(Self::Hsp5x),
            0x13 => Some(Self::Hsp10x),
            _ => None,
        }
    }

    /// Raw `odr` field value
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Rate multiplier relative to the mode's base rate
    #[must_use]
    pub const fn multiplier(self) -> u8 {
        match self {
            Self::Lp1x | Self::Hsp1x => 1,
            Self::Lp2x | Self::Hsp2x => 2,
            Self::Lp5x | Self::Hsp5x => 5,
            Self::Lp10x | Self::Hsp10x => 10,
        }
    }

    /// Whether this rate runs the front end in high-speed mode
    #[must_use]
    pub const fn is_high_speed(self) -> bool {
        matches!(self, Self::Hsp1x | Self::Hsp2x | Self::Hsp5x | Self::Hsp10x)
    }
}

/// Measurement mode (`CONTROL_REG1`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// No measurements
    #[default]
    Standby,
    /// A single measurement, then back to standby
    OneShot,
    /// Autonomous measurements at the configured output data rate
    Auto,
}

/// One entry of a register write table
///
/// With a zero `mask` the value is written as-is. Otherwise only the masked
/// bits are replaced and the rest of the register is preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterWrite {
    /// Register address
    pub address: u8,
    /// Value to write
    pub value: u8,
    /// Bits of `value` to apply, `0` for a full overwrite
    pub mask: u8,
}

impl RegisterWrite {
    /// Full-register write
    #[must_use]
    pub const fn new(address: u8, value: u8) -> Self {
        Self {
            address,
            value,
            mask: 0,
        }
    }

    /// Write of only the bits in `mask`
    #[must_use]
    pub const fn masked(address: u8, value: u8, mask: u8) -> Self {
        Self {
            address,
            value,
            mask,
        }
    }

    /// Whether the write needs the current register contents
    #[must_use]
    pub const fn is_masked(&self) -> bool {
        self.mask != 0
    }

    /// Merge this write into the current register value
    #[must_use]
    pub const fn apply(&self, current: u8) -> u8 {
        if self.is_masked() {
            (current & !self.mask) | (self.value & self.mask)
        } else {
            self.value
        }
    }
}

/// One entry of a register read table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterRead {
    /// First register address
    pub address: u8,
    /// Number of consecutive bytes to read
    pub len: u8,
}

impl RegisterRead {
    /// Read `len` bytes starting at `address`
    #[must_use]
    pub const fn new(address: u8, len: u8) -> Self {
        Self { address, len }
    }

    /// Total bytes a table reads
    #[must_use]
    pub fn total_len(list: &[Self]) -> usize {
        list.iter().map(|entry| usize::from(entry.len)).sum()
    }
}

/// Size of one magnetic sample in bytes
pub const MAG_DATA_SIZE: u8 = 1;

/// Output data rate applied by [`NORMAL_MODE_CONFIG`]
pub const NORMAL_MODE_ODR: OutputDataRate = OutputDataRate::Hsp10x;

/// Register settings for normal mode: 10x high-speed rate, autonomous sampling
pub const NORMAL_MODE_CONFIG: &[RegisterWrite] = &[
    RegisterWrite::masked(USER_ODR, NORMAL_MODE_ODR as u8, USER_ODR_ODR_MASK),
    RegisterWrite::masked(
        CONTROL_REG1,
        CONTROL_REG1_AUTO_MODE_START,
        CONTROL_REG1_AUTO_MODE_MASK,
    ),
];

/// Magnetic output read in normal mode
pub const NORMAL_MODE_OUTPUT: &[RegisterRead] = &[RegisterRead::new(OUT_M_REG, MAG_DATA_SIZE)];
