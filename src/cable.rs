//! Byte channels to JTAG bridge hardware live here.  A bridge must implement the `Cable` trait,
//! which is nothing more than the raw FIFO primitives the chip exposes; everything JTAG-specific
//! is built on top of it by `Transport` and `JtagSM`.
use alloc::string::String;

use crate::error::Result;

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "std")]
pub mod usbblaster;

pub trait Cable {
    /// Write `data` to the chip in one bulk transfer and return how many bytes it accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;
    /// Read up to `buf.len()` bytes, blocking until they arrive or the transfer times out.
    /// Returns the number of bytes placed in `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;
    /// Discard anything queued towards the chip but not yet sent.
    fn purge_tx(&mut self) -> Result<()>;
    /// Discard anything received from the chip but not yet read.
    fn purge_rx(&mut self) -> Result<()>;
}

impl<C: Cable + ?Sized> Cable for &mut C {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn purge_tx(&mut self) -> Result<()> {
        (**self).purge_tx()
    }

    fn purge_rx(&mut self) -> Result<()> {
        (**self).purge_rx()
    }
}

/// What the enumeration layer reports about an attached bridge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub description: String,
    pub serial_number: String,
}

/// How to pick one bridge out of the attached devices.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    Description(String),
    SerialNumber(String),
}

impl Default for Selector {
    fn default() -> Self {
        Selector::Description(String::from("USB-Blaster"))
    }
}

impl Selector {
    pub fn matches(&self, info: &DeviceInfo) -> bool {
        match self {
            Selector::Description(d) => info.description == *d,
            Selector::SerialNumber(s) => info.serial_number == *s,
        }
    }
}
