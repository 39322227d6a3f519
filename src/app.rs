//! Host-I/O demo application
//!
//! [`HostIoApp`] is the firmware's main loop: it polls the host link, services
//! the register write / read / read-all triggers the host tool sets in
//! [`HostIoRegisters`], then samples the sensor and drives the switch
//! indicator from the configured threshold.
//!
//! Within one [`step`](HostIoApp::step) a pending write is always applied
//! before a pending read, and a read before a read-all, so a host that sets
//! several triggers at once reads back what it just wrote. The first failing
//! transaction ends the step; its trigger stays set and the error propagates
//! out of [`run`](HostIoApp::run).

use embedded_hal::digital::OutputPin;

use crate::config::{NORMAL_MODE_CONFIG, NORMAL_MODE_ODR};
use crate::device::Nmh1000Driver;
use crate::host_io::{HostIoRegisters, HostLink, TRIGGER_CLEAR};
use crate::registers::{I2C_ADDR, STATUS, USER_ODR};
use crate::{Error, NUM_REGISTERS};

#[cfg(not(feature = "async"))]
use device_driver::RegisterInterface;

#[cfg(feature = "async")]
use device_driver::AsyncRegisterInterface;

#[allow(clippy::cast_possible_truncation)]
const READALL_SIZE: u8 = NUM_REGISTERS as u8;

/// Threshold the demo starts with
pub const DEFAULT_THRESHOLD: u8 = 50;

/// Application settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AppConfig {
    /// Initial switch threshold, the host may change it at runtime
    pub threshold: u8,
    /// Indicator LED lights when its pin is driven low
    pub indicator_active_low: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            indicator_active_low: true,
        }
    }
}

/// Sensor, indicator and host variables of the demo
pub struct HostIoApp<I, P> {
    driver: Nmh1000Driver<I>,
    indicator: P,
    config: AppConfig,
    registers: HostIoRegisters,
}

impl<I, P> HostIoApp<I, P> {
    /// Assemble the application around an identified sensor
    ///
    /// Call `setup()` before the first step.
    pub fn new(driver: Nmh1000Driver<I>, indicator: P, config: AppConfig) -> Self {
        Self {
            driver,
            indicator,
            config,
            registers: HostIoRegisters::new(config.threshold),
        }
    }

    /// Host-visible variables
    pub const fn registers(&self) -> &HostIoRegisters {
        &self.registers
    }

    /// Host-visible variables, for links that write outside `poll`
    pub fn registers_mut(&mut self) -> &mut HostIoRegisters {
        &mut self.registers
    }

    /// Application settings
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The sensor driver
    pub fn driver_mut(&mut self) -> &mut Nmh1000Driver<I> {
        &mut self.driver
    }

    /// Tear down the application, returning the driver and indicator pin
    pub fn release(self) -> (Nmh1000Driver<I>, P) {
        (self.driver, self.indicator)
    }

    /// Record the outcome of a threshold comparison
    ///
    /// Returns whether the switch is active. Equal to the threshold is not
    /// above it.
    fn record_sample(&mut self, sample: u8) -> bool {
        self.registers.m_out = sample;
        let active = sample > self.registers.threshold;
        self.registers.mag_switch_flag = u8::from(active);
        active
    }

    fn finish_readall(&mut self) {
        self.registers.odr = self.registers.readall_value[usize::from(USER_ODR)];
        self.registers.readall_trigger = TRIGGER_CLEAR;
        self.registers.readall_size = READALL_SIZE;
    }
}

impl<I, P> HostIoApp<I, P>
where
    P: OutputPin,
{
    /// Drive the switch indicator, honouring its polarity
    fn set_indicator(&mut self, active: bool) -> Result<(), P::Error> {
        if active == self.config.indicator_active_low {
            self.indicator.set_low()
        } else {
            self.indicator.set_high()
        }
    }
}

#[cfg(not(feature = "async"))]
impl<I, P> HostIoApp<I, P>
where
    I: RegisterInterface<AddressType = u8>,
    P: OutputPin,
{
    /// Apply the normal-mode configuration and reset the indicator
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written or the
    /// indicator cannot be driven.
    pub fn setup(&mut self) -> Result<(), Error<I::Error>> {
        self.driver.configure(NORMAL_MODE_CONFIG)?;
        self.registers.odr = NORMAL_MODE_ODR.bits();
        self.set_indicator(false).map_err(|_| Error::Indicator)?;

        #[cfg(feature = "defmt")]
        defmt::info!("NMH1000 active, threshold {}", self.registers.threshold);

        Ok(())
    }

    /// Write one register on behalf of the host
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] without bus traffic for offsets past
    /// `I2C_ADDR`, [`Error::Write`] if the transaction fails.
    pub fn apply_register_write(&mut self, offset: u8, value: u8) -> Result<(), Error<I::Error>> {
        self.driver.write_register(offset, value)
    }

    /// Read one register on behalf of the host
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] without bus traffic for offsets past
    /// `I2C_ADDR`, [`Error::Read`] if the transaction fails.
    pub fn apply_register_read(&mut self, offset: u8) -> Result<u8, Error<I::Error>> {
        self.driver.read_register(offset)
    }

    /// Read every register from `STATUS` through `I2C_ADDR` into
    /// `readall_value`, one byte per transaction
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] for the first failing register; entries before
    /// it keep their new values.
    pub fn apply_register_readall(&mut self) -> Result<(), Error<I::Error>> {
        for offset in STATUS..=I2C_ADDR {
            self.registers.readall_value[usize::from(offset)] =
                self.driver.read_register(offset)?;
        }
        Ok(())
    }

    /// Service the write, read and read-all triggers, in that order
    ///
    /// # Errors
    ///
    /// Returns the first failure; the failing request's trigger stays set.
    pub fn service_host_requests(&mut self) -> Result<(), Error<I::Error>> {
        if self.registers.write_requested() {
            let (offset, value) = (self.registers.offset, self.registers.value);
            self.apply_register_write(offset, value)?;
            if offset == USER_ODR {
                self.registers.odr = value;
            }
            self.registers.trigger = TRIGGER_CLEAR;

            #[cfg(feature = "defmt")]
            defmt::debug!("host write 0x{:02x} <- 0x{:02x}", offset, value);
        }

        if self.registers.read_requested() {
            let offset = self.registers.read_offset;
            let value = self.apply_register_read(offset)?;
            self.registers.read_value = value;
            if offset == USER_ODR {
                self.registers.odr = value;
            }
            self.registers.read_trigger = TRIGGER_CLEAR;

            #[cfg(feature = "defmt")]
            defmt::debug!("host read 0x{:02x} -> 0x{:02x}", offset, value);
        }

        if self.registers.readall_requested() {
            self.apply_register_readall()?;
            self.finish_readall();

            #[cfg(feature = "defmt")]
            defmt::debug!("host read-all of {} registers", NUM_REGISTERS);
        }

        Ok(())
    }

    /// Sample the sensor, update `m_out` and the switch flag, drive the
    /// indicator
    ///
    /// # Errors
    ///
    /// Returns an error if the sample cannot be read or the indicator cannot
    /// be driven.
    pub fn update_output(&mut self) -> Result<(), Error<I::Error>> {
        let sample = self.driver.read_magnetic()?;
        let active = self.record_sample(sample);
        self.set_indicator(active).map_err(|_| Error::Indicator)
    }

    /// One loop iteration: poll the link, service requests, sample
    ///
    /// # Errors
    ///
    /// Returns the first failure of the iteration.
    pub fn step<L>(&mut self, link: &mut L) -> Result<(), Error<I::Error>>
    where
        L: HostLink + ?Sized,
    {
        link.poll(&mut self.registers);
        self.service_host_requests()?;
        self.update_output()
    }

    /// Run the loop until a step fails, returning that error
    pub fn run<L>(&mut self, link: &mut L) -> Error<I::Error>
    where
        L: HostLink + ?Sized,
    {
        loop {
            if let Err(error) = self.step(link) {
                #[cfg(feature = "defmt")]
                defmt::error!("control loop stopped, status {}", error.status_code());
                return error;
            }
        }
    }
}

#[cfg(feature = "async")]
impl<I, P> HostIoApp<I, P>
where
    I: AsyncRegisterInterface<AddressType = u8>,
    P: OutputPin,
{
    /// Apply the normal-mode configuration and reset the indicator
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written or the
    /// indicator cannot be driven.
    pub async fn setup(&mut self) -> Result<(), Error<I::Error>> {
        self.driver.configure(NORMAL_MODE_CONFIG).await?;
        self.registers.odr = NORMAL_MODE_ODR.bits();
        self.set_indicator(false).map_err(|_| Error::Indicator)?;

        #[cfg(feature = "defmt")]
        defmt::info!("NMH1000 active, threshold {}", self.registers.threshold);

        Ok(())
    }

    /// Write one register on behalf of the host
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] without bus traffic for offsets past
    /// `I2C_ADDR`, [`Error::Write`] if the transaction fails.
    pub async fn apply_register_write(
        &mut self,
        offset: u8,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        self.driver.write_register(offset, value).await
    }

    /// Read one register on behalf of the host
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOffset`] without bus traffic for offsets past
    /// `I2C_ADDR`, [`Error::Read`] if the transaction fails.
    pub async fn apply_register_read(&mut self, offset: u8) -> Result<u8, Error<I::Error>> {
        self.driver.read_register(offset).await
    }

    /// Read every register from `STATUS` through `I2C_ADDR` into
    /// `readall_value`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Read`] for the first failing register.
    pub async fn apply_register_readall(&mut self) -> Result<(), Error<I::Error>> {
        for offset in STATUS..=I2C_ADDR {
            self.registers.readall_value[usize::from(offset)] =
                self.driver.read_register(offset).await?;
        }
        Ok(())
    }

    /// Service the write, read and read-all triggers, in that order
    ///
    /// # Errors
    ///
    /// Returns the first failure; the failing request's trigger stays set.
    pub async fn service_host_requests(&mut self) -> Result<(), Error<I::Error>> {
        if self.registers.write_requested() {
            let (offset, value) = (self.registers.offset, self.registers.value);
            self.apply_register_write(offset, value).await?;
            if offset == USER_ODR {
                self.registers.odr = value;
            }
            self.registers.trigger = TRIGGER_CLEAR;
        }

        if self.registers.read_requested() {
            let offset = self.registers.read_offset;
            let value = self.apply_register_read(offset).await?;
            self.registers.read_value = value;
            if offset == USER_ODR {
                self.registers.odr = value;
            }
            self.registers.read_trigger = TRIGGER_CLEAR;
        }

        if self.registers.readall_requested() {
            self.apply_register_readall().await?;
            self.finish_readall();
        }

        Ok(())
    }

    /// Sample the sensor, update `m_out` and the switch flag, drive the
    /// indicator
    ///
    /// # Errors
    ///
    /// Returns an error if the sample cannot be read or the indicator cannot
    /// be driven.
    pub async fn update_output(&mut self) -> Result<(), Error<I::Error>> {
        let sample = self.driver.read_magnetic().await?;
        let active = self.record_sample(sample);
        self.set_indicator(active).map_err(|_| Error::Indicator)
    }

    /// One loop iteration: poll the link, service requests, sample
    ///
    /// # Errors
    ///
    /// Returns the first failure of the iteration.
    pub async fn step<L>(&mut self, link: &mut L) -> Result<(), Error<I::Error>>
    where
        L: HostLink + ?Sized,
    {
        link.poll(&mut self.registers);
        self.service_host_requests().await?;
        self.update_output().await
    }

    /// Run the loop until a step fails, returning that error
    pub async fn run<L>(&mut self, link: &mut L) -> Error<I::Error>
    where
        L: HostLink + ?Sized,
    {
        loop {
            if let Err(error) = self.step(link).await {
                #[cfg(feature = "defmt")]
                defmt::error!("control loop stopped, status {}", error.status_code());
                return error;
            }
        }
    }
}
