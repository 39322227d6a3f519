#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod app;
pub mod config;
pub mod device;
pub mod host_io;
pub mod interface;
pub mod registers;

// Re-export main types
pub use app::{AppConfig, HostIoApp};
pub use config::{OperatingMode, OutputDataRate, RegisterRead, RegisterWrite};
pub use device::{Nmh1000Driver, SensorStatus, SwitchThresholds};
pub use host_io::{Access, HostAccessError, HostIoRegisters, HostLink, Variable, VARIABLES};
pub use interface::I2cInterface;

/// NMH1000 default 7-bit I2C address
pub const I2C_ADDRESS_DEFAULT: u8 = 0x60;

/// Expected value of `WHO_AM_I` register
pub const WHO_AM_I_VALUE: u8 = 0x40;

/// Highest valid register offset (`I2C_ADDR`)
pub const MAX_REGISTER: u8 = registers::I2C_ADDR;

/// Number of registers from `STATUS` through `I2C_ADDR`
pub const NUM_REGISTERS: usize = MAX_REGISTER as usize + 1;

/// Status code reported for a successful operation
pub const STATUS_OK: i32 = 0;

/// Driver errors
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Communication error with the device
    Bus(E),
    /// Register read failed on the bus
    Read(E),
    /// Register write failed on the bus
    Write(E),
    /// Invalid `WHO_AM_I` register value (contains the actual value read)
    InvalidDevice(u8),
    /// Register offset beyond `MAX_REGISTER` (contains the rejected offset)
    InvalidOffset(u8),
    /// Invalid configuration parameter
    InvalidConfig,
    /// Soft reset did not complete in time
    InitializationTimeout,
    /// Switch indicator pin could not be driven
    Indicator,
}

impl<E> Error<E> {
    /// Integer status code for this error
    ///
    /// Follows the sensor SDK convention used by evaluation host tools:
    /// `0` is success, invalid parameter `1`, init `3`, write `4`, read `5`.
    /// A register offset past `MAX_REGISTER` is an invalid parameter.
    #[must_use]
    pub const fn status_code(&self) -> i32 {
        match self {
            Self::InvalidConfig | Self::InvalidOffset(_) | Self::Indicator => 1,
            Self::InvalidDevice(_) | Self::InitializationTimeout => 3,
            Self::Write(_) => 4,
            Self::Bus(_) | Self::Read(_) => 5,
        }
    }
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Self::Bus(error)
    }
}
