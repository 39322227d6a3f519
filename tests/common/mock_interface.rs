//! Mock interface implementation for testing the NMH1000 driver

#[cfg(feature = "async")]
use device_driver::AsyncRegisterInterface;
use device_driver::RegisterInterface;
use nmh1000::registers::{CONTROL_REG1, CONTROL_REG1_SW_RST_MASK, I2C_ADDR, OUT_M_REG, WHO_AM_I};
use nmh1000::{I2C_ADDRESS_DEFAULT, WHO_AM_I_VALUE};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Records operations performed on the mock interface
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Read register operation
    ReadRegister {
        /// Register address
        address: u8,
        /// Value that was returned
        value: u8,
    },
    /// Write register operation
    WriteRegister {
        /// Register address
        address: u8,
        /// Value that was written
        value: u8,
    },
}

/// Shared state for mock interface (uses interior mutability)
#[derive(Debug)]
struct MockState {
    /// Simulated register values
    registers: HashMap<u8, u8>,

    /// Operations log for verification
    operations: Vec<Operation>,

    /// Failure injection flags
    fail_next_read: bool,
    fail_next_write: bool,
    fail_read_at: Option<u8>,
    fail_write_at: Option<u8>,

    /// Leave `sw_rst` set after a reset request
    hold_reset: bool,

    /// Magnetic samples returned by successive `OUT_M_REG` reads
    mag_sequence: VecDeque<u8>,
}

impl MockState {
    fn new() -> Self {
        let mut state = Self {
            registers: HashMap::new(),
            operations: Vec::new(),
            fail_next_read: false,
            fail_next_write: false,
            fail_read_at: None,
            fail_write_at: None,
            hold_reset: false,
            mag_sequence: VecDeque::new(),
        };
        state.power_on();
        state
    }

    /// Power-on register values
    fn power_on(&mut self) {
        self.registers.clear();
        self.registers.insert(WHO_AM_I, WHO_AM_I_VALUE);
        self.registers.insert(I2C_ADDR, I2C_ADDRESS_DEFAULT);
    }

    fn get(&self, address: u8) -> u8 {
        self.registers.get(&address).copied().unwrap_or(0)
    }
}

/// Mock interface for testing
#[derive(Clone)]
pub struct MockInterface {
    state: Rc<RefCell<MockState>>,
}

impl MockInterface {
    /// Create a new mock interface with power-on register values
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(MockState::new())),
        }
    }

    /// Set a register value
    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers.insert(address, value);
    }

    /// Get a register value
    pub fn get_register(&self, address: u8) -> u8 {
        self.state.borrow().get(address)
    }

    /// Set WHO_AM_I register value
    pub fn set_who_am_i(&self, value: u8) {
        self.set_register(WHO_AM_I, value);
    }

    /// Set the magnetic output returned by `OUT_M_REG`
    pub fn set_mag_data(&self, value: u8) {
        self.set_register(OUT_M_REG, value);
    }

    /// Queue magnetic samples; each `OUT_M_REG` read consumes one
    ///
    /// Once the queue is empty the last sample keeps being returned.
    pub fn set_mag_sequence(&self, samples: &[u8]) {
        self.state.borrow_mut().mag_sequence = samples.iter().copied().collect();
    }

    /// Inject a read failure on the next read operation
    pub fn fail_next_read(&self) {
        self.state.borrow_mut().fail_next_read = true;
    }

    /// Inject a write failure on the next write operation
    pub fn fail_next_write(&self) {
        self.state.borrow_mut().fail_next_write = true;
    }

    /// Fail every read of `address` until cleared with `None`
    pub fn fail_read_at(&self, address: Option<u8>) {
        self.state.borrow_mut().fail_read_at = address;
    }

    /// Fail every write of `address` until cleared with `None`
    pub fn fail_write_at(&self, address: Option<u8>) {
        self.state.borrow_mut().fail_write_at = address;
    }

    /// Keep `sw_rst` set so soft reset never completes
    pub fn hold_reset(&self, enable: bool) {
        self.state.borrow_mut().hold_reset = enable;
    }

    /// Get the operations log
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().operations.clone()
    }

    /// Clear the operations log
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// Addresses read, in order
    pub fn reads(&self) -> Vec<u8> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::ReadRegister { address, .. } => Some(*address),
                Operation::WriteRegister { .. } => None,
            })
            .collect()
    }

    /// (address, value) pairs written, in order
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.state
            .borrow()
            .operations
            .iter()
            .filter_map(|op| match op {
                Operation::WriteRegister { address, value } => Some((*address, *value)),
                Operation::ReadRegister { .. } => None,
            })
            .collect()
    }
}

impl Default for MockInterface {
    fn default() -> Self {
        Self::new()
    }
}

/// Mock error type
#[derive(Debug, Clone, PartialEq)]
pub enum MockError {
    /// Simulated communication error
    Communication,
}

impl RegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    fn read_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        if state.fail_next_read {
            state.fail_next_read = false;
            return Err(MockError::Communication);
        }
        if state.fail_read_at == Some(address) {
            return Err(MockError::Communication);
        }

        if address == OUT_M_REG {
            if let Some(sample) = state.mag_sequence.pop_front() {
                state.registers.insert(OUT_M_REG, sample);
            }
        }

        for (i, byte) in read_data.iter_mut().enumerate() {
            let reg_addr = address.wrapping_add(i as u8);
            *byte = state.get(reg_addr);
            state.operations.push(Operation::ReadRegister {
                address: reg_addr,
                value: *byte,
            });
        }

        Ok(())
    }

    fn write_register(
        &mut self,
        address: Self::AddressType,
        _size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();

        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(MockError::Communication);
        }
        if state.fail_write_at == Some(address) {
            return Err(MockError::Communication);
        }

        for (i, &byte) in write_data.iter().enumerate() {
            let reg_addr = address.wrapping_add(i as u8);
            state.operations.push(Operation::WriteRegister {
                address: reg_addr,
                value: byte,
            });

            // Soft reset restores power-on values and clears itself
            if reg_addr == CONTROL_REG1 && byte & CONTROL_REG1_SW_RST_MASK != 0 {
                state.power_on();
                if state.hold_reset {
                    state.registers.insert(CONTROL_REG1, byte);
                }
                continue;
            }

            state.registers.insert(reg_addr, byte);
        }

        Ok(())
    }
}

#[cfg(feature = "async")]
impl AsyncRegisterInterface for MockInterface {
    type Error = MockError;
    type AddressType = u8;

    async fn read_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        read_data: &mut [u8],
    ) -> Result<(), Self::Error> {
        // Delegate to synchronous implementation
        RegisterInterface::read_register(self, address, size_bits, read_data)
    }

    async fn write_register(
        &mut self,
        address: Self::AddressType,
        size_bits: u32,
        write_data: &[u8],
    ) -> Result<(), Self::Error> {
        RegisterInterface::write_register(self, address, size_bits, write_data)
    }
}
