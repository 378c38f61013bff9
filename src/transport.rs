//! Buffered command writes and bounded reads over a `Cable`.
use alloc::vec;
use alloc::vec::Vec;

use crate::cable::Cable;
use crate::error::{Error, Result};
use crate::pattern::READ_UNIT_SIZE;

pub struct Transport<C> {
    cable: C,
}

impl<C: Cable> Transport<C> {
    pub fn new(cable: C) -> Self {
        Self { cable }
    }

    pub fn cable(&mut self) -> &mut C {
        &mut self.cable
    }

    pub fn into_inner(self) -> C {
        self.cable
    }

    /// Send `words` little-endian in a single bulk write.
    pub fn write_words(&mut self, words: &[u16]) -> Result<()> {
        let buf: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.write_bytes(&buf)
    }

    /// Send `data` in a single bulk write.  Writing nothing succeeds without touching the chip.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        log::trace!("tx {:02x?}", data);
        let written = self.cable.write(data)?;
        if written != data.len() {
            return Err(Error::ShortWrite {
                expected: data.len(),
                actual: written,
            });
        }
        Ok(())
    }

    /// Read exactly `len` bytes.  `len` may not exceed what one USB packet carries.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        if len > READ_UNIT_SIZE {
            return Err(Error::ReadTooLarge {
                requested: len,
                max: READ_UNIT_SIZE,
            });
        }

        let mut buf = vec![0; len];
        let read = self.cable.read(&mut buf)?;
        if read != len {
            return Err(Error::ShortRead {
                expected: len,
                actual: read,
            });
        }
        log::trace!("rx {:02x?}", buf);
        Ok(buf)
    }

    pub fn clear_write_buffer(&mut self) -> Result<()> {
        self.cable.purge_tx()
    }

    pub fn clear_read_buffer(&mut self) -> Result<()> {
        self.cable.purge_rx()
    }
}
