//! Host-visible register and flag variables
//!
//! A desktop host tool inspects and drives the demo by reading and writing
//! [`HostIoRegisters`] over a serial link. The link itself is an external
//! collaborator plugged in through [`HostLink`]; this module only defines the
//! variable layout, the named variable table the link resolves names against,
//! and bounds/access checked byte-level access.

use core::mem::{offset_of, size_of};

use bytemuck::{Pod, Zeroable};

use crate::NUM_REGISTERS;

/// Value of a trigger field that requests an operation
pub const TRIGGER_SET: u8 = 1;

/// Value of a trigger field once the request has been serviced
pub const TRIGGER_CLEAR: u8 = 0;

/// Register cache and control flags shared with the host tool
///
/// Every field is a single byte so the host can address it by byte offset.
/// Trigger fields are set to [`TRIGGER_SET`] by the host and cleared by the
/// firmware after the request completed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostIoRegisters {
    /// Latest magnetic sample
    pub m_out: u8,
    /// Cached `USER_ODR` value
    pub odr: u8,
    /// Register offset for a host write
    pub offset: u8,
    /// Value for a host write
    pub value: u8,
    /// Host write request
    pub trigger: u8,
    /// Register offset for a host read
    pub read_offset: u8,
    /// Result of a host read
    pub read_value: u8,
    /// Host read request
    pub read_trigger: u8,
    /// Result of a host read-all, indexed by register offset
    pub readall_value: [u8; NUM_REGISTERS],
    /// Number of valid entries in `readall_value`
    pub readall_size: u8,
    /// Host read-all request
    pub readall_trigger: u8,
    /// Switch threshold applied to `m_out`
    pub threshold: u8,
    /// `1` while `m_out` is above `threshold`
    pub mag_switch_flag: u8,
}

impl HostIoRegisters {
    /// Size of the variable block in bytes
    pub const SIZE: usize = size_of::<Self>();

    /// All-zero variables with the given switch threshold
    #[must_use]
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            ..Self::zeroed()
        }
    }

    /// Byte view of the variable block, in host address order
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    /// Copy `buf.len()` bytes starting at `offset` into `buf`
    ///
    /// # Errors
    ///
    /// Returns [`HostAccessError::OutOfBounds`] if the range leaves the block.
    pub fn read_bytes(&self, offset: usize, buf: &mut [u8]) -> Result<(), HostAccessError> {
        let bytes = self.as_bytes();
        let range = checked_range(offset, buf.len())?;
        buf.copy_from_slice(&bytes[range]);
        Ok(())
    }

    /// Write `data` starting at `offset`
    ///
    /// Nothing is written unless every touched byte belongs to a read-write
    /// variable.
    ///
    /// # Errors
    ///
    /// Returns [`HostAccessError::OutOfBounds`] if the range leaves the
    /// block, [`HostAccessError::ReadOnly`] if it touches a firmware-owned
    /// variable.
    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), HostAccessError> {
        let range = checked_range(offset, data.len())?;
        if VARIABLES
            .iter()
            .filter(|var| var.access == Access::ReadOnly)
            .any(|var| var.overlaps(range.start, range.end))
        {
            return Err(HostAccessError::ReadOnly);
        }
        bytemuck::bytes_of_mut(self)[range].copy_from_slice(data);
        Ok(())
    }

    /// Read a named variable into `buf`, returning the bytes copied
    ///
    /// # Errors
    ///
    /// Returns [`HostAccessError::UnknownVariable`] for names not in
    /// [`VARIABLES`], [`HostAccessError::OutOfBounds`] if `buf` is shorter
    /// than the variable.
    pub fn read_variable(&self, name: &str, buf: &mut [u8]) -> Result<usize, HostAccessError> {
        let var = variable(name).ok_or(HostAccessError::UnknownVariable)?;
        let dst = buf
            .get_mut(..var.len)
            .ok_or(HostAccessError::OutOfBounds)?;
        self.read_bytes(var.offset, dst)?;
        Ok(var.len)
    }

    /// Write a named variable from `data`
    ///
    /// `data` may be shorter than the variable; the leading bytes are written.
    ///
    /// # Errors
    ///
    /// Returns [`HostAccessError::UnknownVariable`] for unknown names,
    /// [`HostAccessError::OutOfBounds`] if `data` is longer than the variable,
    /// [`HostAccessError::ReadOnly`] for firmware-owned variables.
    pub fn write_variable(&mut self, name: &str, data: &[u8]) -> Result<(), HostAccessError> {
        let var = variable(name).ok_or(HostAccessError::UnknownVariable)?;
        if data.len() > var.len {
            return Err(HostAccessError::OutOfBounds);
        }
        self.write_bytes(var.offset, data)
    }

    /// Whether the host requested a register write
    #[must_use]
    pub const fn write_requested(&self) -> bool {
        self.trigger == TRIGGER_SET
    }

    /// Whether the host requested a register read
    #[must_use]
    pub const fn read_requested(&self) -> bool {
        self.read_trigger == TRIGGER_SET
    }

    /// Whether the host requested a read of every register
    #[must_use]
    pub const fn readall_requested(&self) -> bool {
        self.readall_trigger == TRIGGER_SET
    }
}

impl Default for HostIoRegisters {
    fn default() -> Self {
        Self::zeroed()
    }
}

fn checked_range(offset: usize, len: usize) -> Result<core::ops::Range<usize>, HostAccessError> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= HostIoRegisters::SIZE)
        .ok_or(HostAccessError::OutOfBounds)?;
    Ok(offset..end)
}

/// Who may write a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    /// Written by the firmware only
    ReadOnly,
    /// Written by the host tool
    ReadWrite,
}

/// One named entry of the host variable table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Variable {
    /// Name the host tool uses
    pub name: &'static str,
    /// Byte offset inside [`HostIoRegisters`]
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
    /// Host write permission
    pub access: Access,
}

impl Variable {
    const fn new(name: &'static str, offset: usize, len: usize, access: Access) -> Self {
        Self {
            name,
            offset,
            len,
            access,
        }
    }

    /// Whether this variable shares a byte with `start..end`
    #[must_use]
    pub const fn overlaps(&self, start: usize, end: usize) -> bool {
        start < self.offset + self.len && self.offset < end
    }
}

/// Host variable table, in address order
pub const VARIABLES: &[Variable] = &[
    Variable::new("registers.m_out", offset_of!(HostIoRegisters, m_out), 1, Access::ReadOnly),
    Variable::new("registers.odr", offset_of!(HostIoRegisters, odr), 1, Access::ReadOnly),
    Variable::new("registers.offset", offset_of!(HostIoRegisters, offset), 1, Access::ReadWrite),
    Variable::new("registers.value", offset_of!(HostIoRegisters, value), 1, Access::ReadWrite),
    Variable::new("registers.trigger", offset_of!(HostIoRegisters, trigger), 1, Access::ReadWrite),
    Variable::new(
        "registers.read_offset",
        offset_of!(HostIoRegisters, read_offset),
        1,
        Access::ReadWrite,
    ),
    Variable::new(
        "registers.read_value",
        offset_of!(HostIoRegisters, read_value),
        1,
        Access::ReadOnly,
    ),
    Variable::new(
        "registers.read_trigger",
        offset_of!(HostIoRegisters, read_trigger),
        1,
        Access::ReadWrite,
    ),
    Variable::new(
        "registers.readall_value",
        offset_of!(HostIoRegisters, readall_value),
        NUM_REGISTERS,
        Access::ReadOnly,
    ),
    Variable::new(
        "registers.readall_size",
        offset_of!(HostIoRegisters, readall_size),
        1,
        Access::ReadOnly,
    ),
    Variable::new(
        "registers.readall_trigger",
        offset_of!(HostIoRegisters, readall_trigger),
        1,
        Access::ReadWrite,
    ),
    Variable::new(
        "registers.threshold",
        offset_of!(HostIoRegisters, threshold),
        1,
        Access::ReadWrite,
    ),
    Variable::new(
        "registers.mag_switch_flag",
        offset_of!(HostIoRegisters, mag_switch_flag),
        1,
        Access::ReadOnly,
    ),
];

/// Look up a host variable by name
#[must_use]
pub fn variable(name: &str) -> Option<&'static Variable> {
    VARIABLES.iter().find(|var| var.name == name)
}

/// Host access errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostAccessError {
    /// Access range leaves the variable block or the variable
    OutOfBounds,
    /// Write touches a firmware-owned variable
    ReadOnly,
    /// No variable of that name
    UnknownVariable,
}

/// Serial link to the host tool
///
/// The application calls [`poll`](HostLink::poll) once per loop iteration.
/// Implementations exchange pending host requests with `registers` there;
/// interrupt-driven links buffer their framing in the ISR and only touch the
/// variables from `poll`.
pub trait HostLink {
    /// Service pending host traffic against the shared variables
    fn poll(&mut self, registers: &mut HostIoRegisters);
}

impl<T: HostLink + ?Sized> HostLink for &mut T {
    fn poll(&mut self, registers: &mut HostIoRegisters) {
        T::poll(self, registers);
    }
}
