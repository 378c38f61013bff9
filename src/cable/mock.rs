//! Recording cable for unit tests.
use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::cable::Cable;
use crate::error::{Error, Result};

#[derive(Default)]
pub struct MockCable {
    /// Every bulk write, in order.
    pub writes: Vec<Vec<u8>>,
    /// Bytes handed out by `read`.
    pub rx: VecDeque<u8>,
    pub purges: usize,
    /// Fail the write with this index, once.
    pub fail_write: Option<usize>,
}

impl MockCable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_rx(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// All bytes written so far, concatenated.
    pub fn written(&self) -> Vec<u8> {
        self.writes.concat()
    }
}

impl Cable for MockCable {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.fail_write == Some(self.writes.len()) {
            self.fail_write = None;
            return Err(Error::Disconnected);
        }
        self.writes.push(data.to_vec());
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.rx.len());
        for (dst, src) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn purge_tx(&mut self) -> Result<()> {
        self.purges += 1;
        Ok(())
    }

    // Scripted responses survive a purge; they stand for data the chip has yet to send.
    fn purge_rx(&mut self) -> Result<()> {
        self.purges += 1;
        Ok(())
    }
}
