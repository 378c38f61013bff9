//! This provides the TAP controller on top of a `Transport`.  `JtagSM` knows the fixed TMS
//! sequences that move a USB-Blaster link between the states the protocol uses, and tracks the
//! state of the TAP as it clocks them out.  Every operation checks that it is issued from the
//! state it was written for, so a sequence error is reported instead of shifting garbage.
use alloc::vec::Vec;

use crate::cable::Cable;
use crate::error::{Error, Result};
use crate::pattern::{self, L, OFF, TMS, TMS_H};
use crate::transport::Transport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JtagState {
    Reset = 0,
    Idle = 1,
    SelectDR = 2,
    CaptureDR = 3,
    ShiftDR = 4,
    Exit1DR = 5,
    PauseDR = 6,
    Exit2DR = 7,
    UpdateDR = 8,
    SelectIR = 9,
    CaptureIR = 10,
    ShiftIR = 11,
    Exit1IR = 12,
    PauseIR = 13,
    Exit2IR = 14,
    UpdateIR = 15,
}

use JtagState::*;

// Successor for TMS = 0 and TMS = 1, indexed by state.
const EDGES: [[JtagState; 2]; 16] = [
    [Idle, Reset],         // Reset
    [Idle, SelectDR],      // Idle
    [CaptureDR, SelectIR], // SelectDR
    [ShiftDR, Exit1DR],    // CaptureDR
    [ShiftDR, Exit1DR],    // ShiftDR
    [PauseDR, UpdateDR],   // Exit1DR
    [PauseDR, Exit2DR],    // PauseDR
    [ShiftDR, UpdateDR],   // Exit2DR
    [Idle, SelectDR],      // UpdateDR
    [CaptureIR, Reset],    // SelectIR
    [ShiftIR, Exit1IR],    // CaptureIR
    [ShiftIR, Exit1IR],    // ShiftIR
    [PauseIR, UpdateIR],   // Exit1IR
    [PauseIR, Exit2IR],    // PauseIR
    [ShiftIR, UpdateIR],   // Exit2IR
    [Idle, SelectDR],      // UpdateIR
];

impl JtagState {
    /// The state the TAP enters on a TCK rising edge with TMS at `tms`.
    pub fn next(self, tms: bool) -> JtagState {
        EDGES[self as usize][tms as usize]
    }
}

pub struct JtagSM<C> {
    transport: Transport<C>,
    // None once a failed transfer leaves the TAP somewhere unknown
    state: Option<JtagState>,
}

impl<C: Cable> JtagSM<C> {
    /// Create a TAP controller on `cable` and drive the TAP to Test-Logic-Reset, so the state
    /// is known no matter what the link was doing before.
    pub fn new(cable: C) -> Result<Self> {
        let mut sm = Self {
            transport: Transport::new(cable),
            state: None,
        };
        sm.move_to_test_logic_reset()?;
        Ok(sm)
    }

    pub fn state(&self) -> Option<JtagState> {
        self.state
    }

    pub fn transport(&mut self) -> &mut Transport<C> {
        &mut self.transport
    }

    /// Park the link and hand back the cable.
    pub fn close(mut self) -> Result<C> {
        if self.state == Some(ShiftDR) {
            self.device_close()?;
        }
        Ok(self.transport.into_inner())
    }

    fn require(&self, operation: &'static str, expected: JtagState) -> Result<()> {
        if self.state != Some(expected) {
            return Err(Error::IllegalState {
                operation,
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }

    // Runs a transfer; on failure the TAP may have taken any number of the clocks.
    fn guard<T>(&mut self, f: impl FnOnce(&mut Transport<C>) -> Result<T>) -> Result<T> {
        let ret = f(&mut self.transport);
        if let Err(e) = &ret {
            if self.state.is_some() {
                log::warn!("TAP state lost after transfer error: {}", e);
            }
            self.state = None;
        }
        ret
    }

    /// Clock out pattern words for `operation`, which must take the TAP to `to`.  The walk
    /// through the edge table is checked before anything is sent.
    fn clock(&mut self, operation: &'static str, words: &[u16], to: JtagState) -> Result<()> {
        let landing = self
            .state
            .map(|s| words.iter().fold(s, |s, w| s.next(pattern::tms_level(*w))));
        if landing != Some(to) {
            return Err(Error::WrongSuccessor {
                operation,
                expected: to,
                actual: landing,
            });
        }
        self.guard(|t| t.write_words(words))?;
        self.state = Some(to);
        Ok(())
    }

    /// Five clocks with TMS high reach Test-Logic-Reset from any state.
    pub fn move_to_test_logic_reset(&mut self) -> Result<()> {
        self.guard(|t| t.write_words(&[TMS, TMS, TMS, TMS, TMS]))?;
        self.state = Some(Reset);
        Ok(())
    }

    /// Go through Test-Logic-Reset to Run-Test/Idle.  Valid from any state.
    pub fn move_to_idle(&mut self) -> Result<()> {
        self.guard(|t| t.write_words(&[TMS, TMS, TMS, TMS, TMS, L]))?;
        self.state = Some(Idle);
        Ok(())
    }

    pub fn move_idle_to_shift_ir(&mut self) -> Result<()> {
        self.require("move_idle_to_shift_ir", Idle)?;
        self.clock("move_idle_to_shift_ir", &[TMS, TMS, L, L], ShiftIR)
    }

    /// Shift `data` into the instruction register.  The trailing idle clock shifts one more
    /// zero, which together with the first clock out of Shift-IR fills a 10-bit IR.
    pub fn write_shift_ir(&mut self, data: u8) -> Result<()> {
        self.require("write_shift_ir", ShiftIR)?;
        log::trace!("IR <- {:#04x}", data);
        // The opcode word is not a clock pattern and TMS stays low throughout.
        self.guard(|t| t.write_words(&[pattern::write_word(data), L]))
    }

    pub fn move_shift_ir_to_shift_dr(&mut self) -> Result<()> {
        self.require("move_shift_ir_to_shift_dr", ShiftIR)?;
        self.clock("move_shift_ir_to_shift_dr", &[TMS, TMS, TMS, L, L], ShiftDR)
    }

    /// Shift one byte into the data register, staying in Shift-DR.
    pub fn write_shift_dr(&mut self, data: u8) -> Result<()> {
        self.write_shift_dr_bytes(&[data])
    }

    /// Shift `data` into the data register in order, staying in Shift-DR.
    pub fn write_shift_dr_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.require("write_shift_dr", ShiftDR)?;
        let buf = pattern::write_bytes(data);
        self.guard(|t| t.write_bytes(&buf))
    }

    /// Shift in one full transfer unit (63 bytes) from the data register.
    pub fn read_shift_dr(&mut self) -> Result<Vec<u8>> {
        self.read_shift_dr_len(pattern::READ_UNIT_SIZE)
    }

    /// Shift in `len` bytes, at most one transfer unit, from the data register.
    pub fn read_shift_dr_len(&mut self, len: usize) -> Result<Vec<u8>> {
        self.require("read_shift_dr", ShiftDR)?;
        if len == 0 || len > pattern::READ_UNIT_SIZE {
            return Err(Error::ReadTooLarge {
                requested: len,
                max: pattern::READ_UNIT_SIZE,
            });
        }

        let cmd = pattern::read_command(len);
        self.guard(|t| {
            t.write_bytes(&cmd)?;
            t.read_bytes(len)
        })
    }

    /// Leave Shift-DR for Shift-IR without passing through Run-Test/Idle.
    pub fn move_shift_dr_to_shift_ir(&mut self) -> Result<()> {
        self.require("move_shift_dr_to_shift_ir", ShiftDR)?;
        self.clock("move_shift_dr_to_shift_ir", &[TMS_H, TMS, TMS, TMS, L, L], ShiftIR)
    }

    /// Finish the data scan and park the link with the activity LED off.  This leaves the TAP
    /// in Run-Test/Idle; the device handle stays open.
    pub fn device_close(&mut self) -> Result<()> {
        self.require("device_close", ShiftDR)?;
        self.clock("device_close", &[TMS_H, TMS, OFF], Idle)
    }
}
