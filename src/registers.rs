//! Register definitions for the NMH1000
//!
//! The NMH1000 exposes a flat, single-bank map of 8-bit registers. `STATUS`
//! is the first register and `I2C_ADDR` the last; every offset in between is
//! a valid single-byte target for host-driven reads and writes.
//!
//! ## Register Map
//! - **0x00-0x01**: Status and magnetic output (read-only)
//! - **0x02-0x06**: Control, output data rate and switch thresholds
//! - **0x07-0x08**: Identification (read-only)

device_driver::create_device!(
    device_name: Nmh1000,
    dsl: {
        config {
            type RegisterAddressType = u8;
            type DefaultByteOrder = LE;
        }

        /// STATUS - Measurement status (0x00)
        register Status {
            type Access = RO;
            const ADDRESS = 0x00;
            const SIZE_BITS = 8;

            /// New magnetic sample available in `OUT_M_REG`
            drdy: bool = 0,
            /// Current state of the on-chip switch comparator
            mag_switch: bool = 1,
            reserved_7_2: uint = 2..8,
        },

        /// OUT_M_REG - Magnetic output (0x01)
        register OutM {
            type Access = RO;
            const ADDRESS = 0x01;
            const SIZE_BITS = 8;

            /// Magnetic field magnitude, 8-bit unsigned
            m_out: uint = 0..8,
        },

        /// CONTROL_REG1 - Measurement control (0x02)
        register ControlReg1 {
            const ADDRESS = 0x02;
            const SIZE_BITS = 8;

            /// Trigger a single measurement
            one_shot: bool = 0,
            /// Start autonomous measurements at the `USER_ODR` rate
            auto_mode: bool = 1,
            reserved_6_2: uint = 2..7,
            /// Software reset, cleared by the device once reset completes
            sw_rst: bool = 7,
        },

        /// CONTROL_REG2 - Switch output control (0x03)
        register ControlReg2 {
            const ADDRESS = 0x03;
            const SIZE_BITS = 8;

            /// Invert the switch output polarity
            out_polarity: bool = 0,
            /// Drive the switch output pin
            out_enable: bool = 1,
            reserved_7_2: uint = 2..8,
        },

        /// USER_ODR - Output data rate (0x04)
        register UserOdr {
            const ADDRESS = 0x04;
            const SIZE_BITS = 8;

            /// Output data rate selection, see `OutputDataRate`
            odr: uint = 0..5,
            reserved_7_5: uint = 5..8,
        },

        /// USER_LO_THRS - Switch release threshold (0x05)
        register UserLoThrs {
            const ADDRESS = 0x05;
            const SIZE_BITS = 8;

            lo_thrs: uint = 0..8,
        },

        /// USER_HI_THRS - Switch operate threshold (0x06)
        register UserHiThrs {
            const ADDRESS = 0x06;
            const SIZE_BITS = 8;

            hi_thrs: uint = 0..8,
        },

        /// WHO_AM_I - Device ID (0x07)
        /// Expected value: 0x40
        register WhoAmI {
            type Access = RO;
            const ADDRESS = 0x07;
            const SIZE_BITS = 8;

            /// Device ID (should read 0x40)
            who_am_i: uint = 0..8,
        },

        /// I2C_ADDR - Programmed bus address (0x08)
        register I2cAddr {
            type Access = RO;
            const ADDRESS = 0x08;
            const SIZE_BITS = 8;

            /// 7-bit I2C device address
            address: uint = 0..7,
            reserved_7: uint = 7..8,
        }
    }
);

pub use Nmh1000 as RegisterDevice;

/// `STATUS` register address, first register of the map
pub const STATUS: u8 = 0x00;

/// `OUT_M_REG` register address
pub const OUT_M_REG: u8 = 0x01;

/// `CONTROL_REG1` register address
pub const CONTROL_REG1: u8 = 0x02;

/// `CONTROL_REG2` register address
pub const CONTROL_REG2: u8 = 0x03;

/// `USER_ODR` register address
pub const USER_ODR: u8 = 0x04;

/// `USER_LO_THRS` register address
pub const USER_LO_THRS: u8 = 0x05;

/// `USER_HI_THRS` register address
pub const USER_HI_THRS: u8 = 0x06;

/// `WHO_AM_I` register address
pub const WHO_AM_I: u8 = 0x07;

/// `I2C_ADDR` register address, last register of the map
pub const I2C_ADDR: u8 = 0x08;

/// `CONTROL_REG1.one_shot`
pub const CONTROL_REG1_ONE_SHOT_MASK: u8 = 0x01;

/// `CONTROL_REG1.auto_mode`
pub const CONTROL_REG1_AUTO_MODE_MASK: u8 = 0x02;

/// Value of `CONTROL_REG1.auto_mode` that starts autonomous measurements
pub const CONTROL_REG1_AUTO_MODE_START: u8 = 0x02;

/// `CONTROL_REG1.sw_rst`
pub const CONTROL_REG1_SW_RST_MASK: u8 = 0x80;

/// `USER_ODR.odr`
pub const USER_ODR_ODR_MASK: u8 = 0x1F;
