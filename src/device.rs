//! High-level driver API for the NMH1000
//!
//! This module provides the sensor driver used by the host-I/O application:
//! identity check, soft reset, table-driven configuration and reads, raw
//! single-register access for host tools, and typed accessors for the
//! control registers.

use crate::config::{
    OperatingMode, OutputDataRate, RegisterRead, RegisterWrite, NORMAL_MODE_OUTPUT,
};
use crate::registers::RegisterDevice;
use crate::{Error, MAX_REGISTER, WHO_AM_I_VALUE};

// Only import RegisterInterface when not using async feature
#[cfg(not(feature = "async"))]
use device_driver::RegisterInterface;

#[cfg(feature = "async")]
use device_driver::AsyncRegisterInterface;

/// Soft reset completes within this many milliseconds
const RESET_TIMEOUT_MS: u32 = 10;

/// Poll interval while waiting for soft reset
const RESET_POLL_INTERVAL_MS: u32 = 1;

/// Decoded `STATUS` register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorStatus {
    /// A new sample is waiting in `OUT_M_REG`
    pub data_ready: bool,
    /// The on-chip switch comparator is tripped
    pub switch_active: bool,
}

/// On-chip switch comparator thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchThresholds {
    /// Release threshold (`USER_LO_THRS`)
    pub low: u8,
    /// Operate threshold (`USER_HI_THRS`)
    pub high: u8,
}

impl SwitchThresholds {
    /// Check `low <= high`
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.low <= self.high
    }
}

/// Reject register offsets past the end of the map
///
/// # Errors
///
/// Returns [`Error::InvalidOffset`] if `offset > MAX_REGISTER`.
pub(crate) const fn check_offset<E>(offset: u8) -> Result<(), Error<E>> {
    if offset > MAX_REGISTER {
        Err(Error::InvalidOffset(offset))
    } else {
        Ok(())
    }
}

fn check_write_list<E>(list: &[RegisterWrite]) -> Result<(), Error<E>> {
    list.iter().try_for_each(|entry| check_offset(entry.address))
}

fn check_read_list<E>(list: &[RegisterRead], buffer_len: usize) -> Result<(), Error<E>> {
    for entry in list {
        check_offset::<E>(entry.address)?;
        let last = u16::from(entry.address) + u16::from(entry.len);
        if entry.len == 0 || last > u16::from(MAX_REGISTER) + 1 {
            return Err(Error::InvalidConfig);
        }
    }
    if RegisterRead::total_len(list) > buffer_len {
        return Err(Error::InvalidConfig);
    }
    Ok(())
}

const fn decode_mode(one_shot: bool, auto_mode: bool) -> OperatingMode {
    if auto_mode {
        OperatingMode::Auto
    } else if one_shot {
        OperatingMode::OneShot
    } else {
        OperatingMode::Standby
    }
}

/// Main driver for the NMH1000
pub struct Nmh1000Driver<I> {
    device: RegisterDevice<I>,
}

#[cfg(not(feature = "async"))]
impl<I> Nmh1000Driver<I>
where
    I: RegisterInterface<AddressType = u8>,
{
    /// Create a new NMH1000 driver instance
    ///
    /// This verifies the `WHO_AM_I` register but does not reset or configure
    /// the device.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The `WHO_AM_I` register contains an unexpected value
    pub fn new(interface: I) -> Result<Self, Error<I::Error>> {
        let mut driver = Self {
            device: RegisterDevice::new(interface),
        };

        let who_am_i = driver.read_who_am_i()?;
        if who_am_i != WHO_AM_I_VALUE {
            return Err(Error::InvalidDevice(who_am_i));
        }

        Ok(driver)
    }

    /// Soft-reset the device
    ///
    /// Sets `CONTROL_REG1.sw_rst` and polls until the device clears it. All
    /// registers return to their power-on values, so configuration has to be
    /// applied again afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the reset bit is still set
    /// after 10 ms.
    pub fn init<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal::delay::DelayNs,
    {
        self.device
            .control_reg_1()
            .write(|w| {
                w.set_sw_rst(true);
            })
            .map_err(Error::Write)?;

        for _ in 0..(RESET_TIMEOUT_MS / RESET_POLL_INTERVAL_MS) {
            delay.delay_ms(RESET_POLL_INTERVAL_MS);
            if self
                .device
                .control_reg_1()
                .read()
                .is_ok_and(|ctrl| !ctrl.sw_rst())
            {
                #[cfg(feature = "defmt")]
                defmt::debug!("NMH1000 soft reset complete");
                return Ok(());
            }
        }

        Err(Error::InitializationTimeout)
    }

    /// Read the `WHO_AM_I` register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_who_am_i(&mut self) -> Result<u8, Error<I::Error>> {
        Ok(self.device.who_am_i().read()?.who_am_i())
    }

    /// Read the bus address the device is programmed to answer on
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_device_address(&mut self) -> Result<u8, Error<I::Error>> {
        Ok(self.device.i_2_c_addr().read()?.address())
    }

    /// Apply a register write table
    ///
    /// Entries are applied in order. Masked entries read the register first
    /// and only replace the masked bits. The first failing transaction stops
    /// the table and is returned; earlier entries stay applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] before any bus traffic if an entry
    /// addresses a register past `I2C_ADDR`, otherwise [`Error::Read`] or
    /// [`Error::Write`] for the failing half of an entry.
    pub fn configure(&mut self, list: &[RegisterWrite]) -> Result<(), Error<I::Error>> {
        check_write_list::<I::Error>(list)?;

        for entry in list {
            let value = if entry.is_masked() {
                let mut current = [0u8];
                self.device
                    .interface
                    .read_register(entry.address, 8, &mut current)
                    .map_err(Error::Read)?;
                entry.apply(current[0])
            } else {
                entry.value
            };
            self.device
                .interface
                .write_register(entry.address, 8, &[value])
                .map_err(Error::Write)?;
        }

        Ok(())
    }

    /// Perform a register read table
    ///
    /// Each entry's bytes are appended to `buffer` in table order. Returns
    /// the number of bytes filled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] before any bus traffic if the table
    /// runs past the register map or does not fit in `buffer`, or
    /// [`Error::Read`].
    pub fn read_data(
        &mut self,
        list: &[RegisterRead],
        buffer: &mut [u8],
    ) -> Result<usize, Error<I::Error>> {
        check_read_list::<I::Error>(list, buffer.len())?;

        let mut filled = 0;
        for entry in list {
            let len = usize::from(entry.len);
            self.device
                .interface
                .read_register(
                    entry.address,
                    u32::from(entry.len) * 8,
                    &mut buffer[filled..filled + len],
                )
                .map_err(Error::Read)?;
            filled += len;
        }

        Ok(filled)
    }

    /// Read one register by offset
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] without touching the bus if `offset`
    /// is past `I2C_ADDR`, or [`Error::Read`].
    pub fn read_register(&mut self, offset: u8) -> Result<u8, Error<I::Error>> {
        check_offset::<I::Error>(offset)?;
        let mut value = [0u8];
        self.device
            .interface
            .read_register(offset, 8, &mut value)
            .map_err(Error::Read)?;
        Ok(value[0])
    }

    /// Write one register by offset
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] without touching the bus if `offset`
    /// is past `I2C_ADDR`, or [`Error::Write`].
    pub fn write_register(&mut self, offset: u8, value: u8) -> Result<(), Error<I::Error>> {
        check_offset::<I::Error>(offset)?;
        self.device
            .interface
            .write_register(offset, 8, &[value])
            .map_err(Error::Write)?;
        Ok(())
    }

    /// Read the latest magnetic sample (`OUT_M_REG`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_magnetic(&mut self) -> Result<u8, Error<I::Error>> {
        let mut sample = [0u8];
        self.read_data(NORMAL_MODE_OUTPUT, &mut sample)?;
        Ok(sample[0])
    }

    /// Read and decode the `STATUS` register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn read_status(&mut self) -> Result<SensorStatus, Error<I::Error>> {
        let status = self.device.status().read()?;
        Ok(SensorStatus {
            data_ready: status.drdy(),
            switch_active: status.mag_switch(),
        })
    }

    /// Set the output data rate
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_output_data_rate(&mut self, odr: OutputDataRate) -> Result<(), Error<I::Error>> {
        self.device.user_odr().modify(|w| {
            w.set_odr(odr.bits());
        })?;
        Ok(())
    }

    /// Read back the output data rate
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the register holds a reserved
    /// encoding, or a bus error.
    pub fn output_data_rate(&mut self) -> Result<OutputDataRate, Error<I::Error>> {
        let bits = self.device.user_odr().read()?.odr();
        OutputDataRate::from_bits(bits).ok_or(Error::InvalidConfig)
    }

    /// Select the measurement mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), Error<I::Error>> {
        self.device.control_reg_1().modify(|w| {
            w.set_one_shot(mode == OperatingMode::OneShot);
            w.set_auto_mode(mode == OperatingMode::Auto);
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!("NMH1000 mode set to {}", mode);

        Ok(())
    }

    /// Read back the measurement mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn operating_mode(&mut self) -> Result<OperatingMode, Error<I::Error>> {
        let ctrl = self.device.control_reg_1().read()?;
        Ok(decode_mode(ctrl.one_shot(), ctrl.auto_mode()))
    }

    /// Program the on-chip switch comparator thresholds
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `low > high`, or a bus error.
    pub fn set_switch_thresholds(
        &mut self,
        thresholds: SwitchThresholds,
    ) -> Result<(), Error<I::Error>> {
        if !thresholds.is_valid() {
            return Err(Error::InvalidConfig);
        }
        self.device.user_lo_thrs().write(|w| {
            w.set_lo_thrs(thresholds.low);
        })?;
        self.device.user_hi_thrs().write(|w| {
            w.set_hi_thrs(thresholds.high);
        })?;
        Ok(())
    }

    /// Read back the switch comparator thresholds
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub fn switch_thresholds(&mut self) -> Result<SwitchThresholds, Error<I::Error>> {
        let low = self.device.user_lo_thrs().read()?.lo_thrs();
        let high = self.device.user_hi_thrs().read()?.hi_thrs();
        Ok(SwitchThresholds { low, high })
    }
}

#[cfg(feature = "async")]
impl<I> Nmh1000Driver<I>
where
    I: AsyncRegisterInterface<AddressType = u8>,
{
    /// Create a new NMH1000 driver instance
    ///
    /// This verifies the `WHO_AM_I` register but does not reset or configure
    /// the device.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Communication with the device fails
    /// - The `WHO_AM_I` register contains an unexpected value
    pub async fn new(interface: I) -> Result<Self, Error<I::Error>> {
        let mut driver = Self {
            device: RegisterDevice::new(interface),
        };

        let who_am_i = driver.read_who_am_i().await?;
        if who_am_i != WHO_AM_I_VALUE {
            return Err(Error::InvalidDevice(who_am_i));
        }

        Ok(driver)
    }

    /// Soft-reset the device
    ///
    /// # Errors
    ///
    /// Returns an error if communication fails or the reset bit is still set
    /// after 10 ms.
    pub async fn init<D>(&mut self, delay: &mut D) -> Result<(), Error<I::Error>>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        self.device
            .control_reg_1()
            .write_async(|w| {
                w.set_sw_rst(true);
            })
            .await
            .map_err(Error::Write)?;

        for _ in 0..(RESET_TIMEOUT_MS / RESET_POLL_INTERVAL_MS) {
            delay.delay_ms(RESET_POLL_INTERVAL_MS).await;
            if self
                .device
                .control_reg_1()
                .read_async()
                .await
                .is_ok_and(|ctrl| !ctrl.sw_rst())
            {
                #[cfg(feature = "defmt")]
                defmt::debug!("NMH1000 soft reset complete");
                return Ok(());
            }
        }

        Err(Error::InitializationTimeout)
    }

    /// Read the `WHO_AM_I` register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_who_am_i(&mut self) -> Result<u8, Error<I::Error>> {
        Ok(self.device.who_am_i().read_async().await?.who_am_i())
    }

    /// Read the bus address the device is programmed to answer on
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_device_address(&mut self) -> Result<u8, Error<I::Error>> {
        Ok(self.device.i_2_c_addr().read_async().await?.address())
    }

    /// Apply a register write table
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] before any bus traffic if an entry
    /// addresses a register past `I2C_ADDR`, otherwise [`Error::Read`] or
    /// [`Error::Write`] for the failing half of an entry.
    pub async fn configure(&mut self, list: &[RegisterWrite]) -> Result<(), Error<I::Error>> {
        check_write_list::<I::Error>(list)?;

        for entry in list {
            let value = if entry.is_masked() {
                let mut current = [0u8];
                self.device
                    .interface
                    .read_register(entry.address, 8, &mut current)
                    .await
                    .map_err(Error::Read)?;
                entry.apply(current[0])
            } else {
                entry.value
            };
            self.device
                .interface
                .write_register(entry.address, 8, &[value])
                .await
                .map_err(Error::Write)?;
        }

        Ok(())
    }

    /// Perform a register read table
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] before any bus traffic if the table
    /// runs past the register map or does not fit in `buffer`, or
    /// [`Error::Read`].
    pub async fn read_data(
        &mut self,
        list: &[RegisterRead],
        buffer: &mut [u8],
    ) -> Result<usize, Error<I::Error>> {
        check_read_list::<I::Error>(list, buffer.len())?;

        let mut filled = 0;
        for entry in list {
            let len = usize::from(entry.len);
            self.device
                .interface
                .read_register(
                    entry.address,
                    u32::from(entry.len) * 8,
                    &mut buffer[filled..filled + len],
                )
                .await
                .map_err(Error::Read)?;
            filled += len;
        }

        Ok(filled)
    }

    /// Read one register by offset
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] without touching the bus if `offset`
    /// is past `I2C_ADDR`, or [`Error::Read`].
    pub async fn read_register(&mut self, offset: u8) -> Result<u8, Error<I::Error>> {
        check_offset::<I::Error>(offset)?;
        let mut value = [0u8];
        self.device
            .interface
            .read_register(offset, 8, &mut value)
            .await
            .map_err(Error::Read)?;
        Ok(value[0])
    }

    /// Write one register by offset
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] without touching the bus if `offset`
    /// is past `I2C_ADDR`, or [`Error::Write`].
    pub async fn write_register(&mut self, offset: u8, value: u8) -> Result<(), Error<I::Error>> {
        check_offset::<I::Error>(offset)?;
        self.device
            .interface
            .write_register(offset, 8, &[value])
            .await
            .map_err(Error::Write)?;
        Ok(())
    }

    /// Read the latest magnetic sample (`OUT_M_REG`)
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_magnetic(&mut self) -> Result<u8, Error<I::Error>> {
        let mut sample = [0u8];
        self.read_data(NORMAL_MODE_OUTPUT, &mut sample).await?;
        Ok(sample[0])
    }

    /// Read and decode the `STATUS` register
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn read_status(&mut self) -> Result<SensorStatus, Error<I::Error>> {
        let status = self.device.status().read_async().await?;
        Ok(SensorStatus {
            data_ready: status.drdy(),
            switch_active: status.mag_switch(),
        })
    }

    /// Set the output data rate
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_output_data_rate(
        &mut self,
        odr: OutputDataRate,
    ) -> Result<(), Error<I::Error>> {
        self.device
            .user_odr()
            .modify_async(|w| {
                w.set_odr(odr.bits());
            })
            .await?;
        Ok(())
    }

    /// Read back the output data rate
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the register holds a reserved
    /// encoding, or a bus error.
    pub async fn output_data_rate(&mut self) -> Result<OutputDataRate, Error<I::Error>> {
        let bits = self.device.user_odr().read_async().await?.odr();
        OutputDataRate::from_bits(bits).ok_or(Error::InvalidConfig)
    }

    /// Select the measurement mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), Error<I::Error>> {
        self.device
            .control_reg_1()
            .modify_async(|w| {
                w.set_one_shot(mode == OperatingMode::OneShot);
                w.set_auto_mode(mode == OperatingMode::Auto);
            })
            .await?;

        #[cfg(feature = "defmt")]
        defmt::debug!("NMH1000 mode set to {}", mode);

        Ok(())
    }

    /// Read back the measurement mode
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn operating_mode(&mut self) -> Result<OperatingMode, Error<I::Error>> {
        let ctrl = self.device.control_reg_1().read_async().await?;
        Ok(decode_mode(ctrl.one_shot(), ctrl.auto_mode()))
    }

    /// Program the on-chip switch comparator thresholds
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `low > high`, or a bus error.
    pub async fn set_switch_thresholds(
        &mut self,
        thresholds: SwitchThresholds,
    ) -> Result<(), Error<I::Error>> {
        if !thresholds.is_valid() {
            return Err(Error::InvalidConfig);
        }
        self.device
            .user_lo_thrs()
            .write_async(|w| {
                w.set_lo_thrs(thresholds.low);
            })
            .await?;
        self.device
            .user_hi_thrs()
            .write_async(|w| {
                w.set_hi_thrs(thresholds.high);
            })
            .await?;
        Ok(())
    }

    /// Read back the switch comparator thresholds
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the device fails.
    pub async fn switch_thresholds(&mut self) -> Result<SwitchThresholds, Error<I::Error>> {
        let low = self.device.user_lo_thrs().read_async().await?.lo_thrs();
        let high = self.device.user_hi_thrs().read_async().await?.hi_thrs();
        Ok(SwitchThresholds { low, high })
    }
}

impl<I> Nmh1000Driver<I> {
    /// Consume the driver and return the underlying interface
    pub fn release(self) -> I {
        self.device.interface
    }

    /// Get a reference to the underlying register device (for advanced usage)
    pub const fn device(&self) -> &RegisterDevice<I> {
        &self.device
    }
}
