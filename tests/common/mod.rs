//! A bit-level stand-in for a USB-Blaster with an FPGA behind it.
//!
//! The byte stream is decoded the way the bridge's CPLD does it, every TCK rising edge runs
//! the IEEE 1149.1 state machine, and the instruction register selects one of IDCODE,
//! USERCODE, PULSE_NCONFIG or the virtual JTAG hub.  The hub has a register file per target,
//! a counter on the access tester, and a read pipeline that puts stale words at the start of
//! every read stream.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use vjtag_bridge::cable::Cable;
use vjtag_bridge::error::{Error, Result};

pub const IDCODE_VALUE: u32 = 0x02b0_50dd;
pub const USERCODE_VALUE: u32 = 0x04b5_6019;
pub const STALE_WORD: u32 = 0xcdcd_cdcd;

const IR_LEN: u32 = 10;
const ACCESS_TEST: u8 = 0x00;
const LAST_TARGET: u8 = 0x0b;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tap {
    Reset,
    Idle,
    SelectDr,
    CaptureDr,
    ShiftDr,
    Exit1Dr,
    PauseDr,
    Exit2Dr,
    UpdateDr,
    SelectIr,
    CaptureIr,
    ShiftIr,
    Exit1Ir,
    PauseIr,
    Exit2Ir,
    UpdateIr,
}

impl Tap {
    fn next(self, tms: bool) -> Tap {
        use Tap::*;
        match (self, tms) {
            (Reset, false) => Idle,
            (Reset, true) => Reset,
            (Idle, false) => Idle,
            (Idle, true) => SelectDr,
            (SelectDr, false) => CaptureDr,
            (SelectDr, true) => SelectIr,
            (CaptureDr, false) | (ShiftDr, false) | (Exit2Dr, false) => ShiftDr,
            (CaptureDr, true) | (ShiftDr, true) => Exit1Dr,
            (Exit1Dr, false) | (PauseDr, false) => PauseDr,
            (Exit1Dr, true) | (Exit2Dr, true) => UpdateDr,
            (PauseDr, true) => Exit2Dr,
            (UpdateDr, false) | (UpdateIr, false) => Idle,
            (UpdateDr, true) | (UpdateIr, true) => SelectDr,
            (SelectIr, false) => CaptureIr,
            (SelectIr, true) => Reset,
            (CaptureIr, false) | (ShiftIr, false) | (Exit2Ir, false) => ShiftIr,
            (CaptureIr, true) | (ShiftIr, true) => Exit1Ir,
            (Exit1Ir, false) | (PauseIr, false) => PauseIr,
            (Exit1Ir, true) | (Exit2Ir, true) => UpdateIr,
            (PauseIr, true) => Exit2Ir,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct VirReg {
    offset: u32,
    is_write: bool,
    target: u8,
}

pub struct FpgaSim {
    tap: Tap,
    ir_shift: u32,
    ir: u32,
    dr_shift: u64,
    dr_bits: u32,

    vir: VirReg,
    /// Per-target prefetch depth in words.
    prefetch: HashMap<u8, usize>,
    memory: HashMap<(u8, u32), u32>,
    counter_seed: u32,
    write_word: u32,

    // bridge decoding
    pins: u8,
    shift_bytes: usize,
    shift_read: bool,
    rx: VecDeque<u8>,

    pub reconfigurations: usize,
    pub parked: bool,
    pub purges: usize,
    pub fail_next_write: bool,
}

impl FpgaSim {
    /// The access tester answers after two words, the memory buses after three.
    pub fn new() -> Self {
        let mut prefetch = HashMap::new();
        for target in 0..=LAST_TARGET {
            prefetch.insert(target, 3);
        }
        prefetch.insert(ACCESS_TEST, 2);

        Self {
            tap: Tap::Reset,
            ir_shift: 0,
            ir: 0b00_0000_0110,
            dr_shift: 0,
            dr_bits: 0,
            vir: VirReg::default(),
            prefetch,
            memory: HashMap::new(),
            counter_seed: 0,
            write_word: 0,
            pins: 0,
            shift_bytes: 0,
            shift_read: false,
            rx: VecDeque::new(),
            reconfigurations: 0,
            parked: false,
            purges: 0,
            fail_next_write: false,
        }
    }

    pub fn with_prefetch(mut self, target: u8, words: usize) -> Self {
        self.prefetch.insert(target, words);
        self
    }

    pub fn peek(&self, target: u8, addr: u32) -> u32 {
        self.memory.get(&(target, addr)).copied().unwrap_or(0)
    }

    /// The word at position `index` of a read stream for the current VIR.
    fn read_word(&self, index: usize) -> u32 {
        let target = self.vir.target;
        if target > LAST_TARGET {
            return u32::from_le_bytes([0xaa, 0x99, 0x55, 0x66]);
        }

        let depth = self.prefetch[&target];
        if index < depth {
            return STALE_WORD;
        }
        let addr = self.vir.offset + (index - depth) as u32;
        if target == ACCESS_TEST {
            self.counter_seed.wrapping_add(addr)
        } else {
            self.peek(target, addr)
        }
    }

    fn capture_dr(&mut self) {
        self.dr_bits = 0;
        self.dr_shift = match self.ir {
            0b00_0000_0110 => IDCODE_VALUE as u64,
            0b00_0000_0111 => USERCODE_VALUE as u64,
            _ => 0,
        };
    }

    fn update_dr(&mut self) {
        // The hub latches the first 24 bits shifted; anything after is ignored.
        if self.ir == 0x0e && self.dr_bits >= 24 {
            let v = self.dr_shift as u32;
            self.vir = VirReg {
                target: (v & 0x7f) as u8,
                is_write: v & 0x80 != 0,
                offset: (v >> 8) & 0xffff,
            };
        }
    }

    /// One bit through the data register; returns TDO.
    fn shift_dr(&mut self, tdi: bool) -> bool {
        let n = self.dr_bits;
        self.dr_bits += 1;

        match self.ir {
            0b00_0000_0110 | 0b00_0000_0111 => {
                let tdo = self.dr_shift & 1 != 0;
                self.dr_shift = (self.dr_shift >> 1) | (tdi as u64) << 31;
                tdo
            }
            0x0e => {
                if n < 24 {
                    self.dr_shift |= (tdi as u64) << n;
                }
                false
            }
            0x0c if self.vir.is_write => {
                let bit = n % 32;
                if bit == 0 {
                    self.write_word = 0;
                }
                self.write_word |= (tdi as u32) << bit;
                if bit == 31 {
                    let addr = self.vir.offset + n / 32;
                    if self.vir.target == ACCESS_TEST {
                        self.counter_seed = self.write_word;
                    } else if self.vir.target <= LAST_TARGET {
                        self.memory.insert((self.vir.target, addr), self.write_word);
                    }
                }
                false
            }
            0x0c => (self.read_word((n / 32) as usize) >> (n % 32)) & 1 != 0,
            // BYPASS
            _ => {
                let tdo = self.dr_shift & 1 != 0;
                self.dr_shift = tdi as u64;
                tdo
            }
        }
    }

    fn clock(&mut self, tms: bool, tdi: bool) -> bool {
        let mut tdo = false;
        match self.tap {
            Tap::ShiftIr => {
                tdo = self.ir_shift & 1 != 0;
                self.ir_shift = (self.ir_shift >> 1) | (tdi as u32) << (IR_LEN - 1);
            }
            Tap::ShiftDr => tdo = self.shift_dr(tdi),
            _ => (),
        }

        self.tap = self.tap.next(tms);
        match self.tap {
            Tap::Reset => self.ir = 0b00_0000_0110,
            Tap::CaptureIr => self.ir_shift = 0b01,
            Tap::UpdateIr => {
                self.ir = self.ir_shift;
                if self.ir == 0b00_0000_0001 {
                    self.reconfigurations += 1;
                }
            }
            Tap::CaptureDr => self.capture_dr(),
            Tap::UpdateDr => self.update_dr(),
            _ => (),
        }
        tdo
    }

    fn byte(&mut self, b: u8) {
        if self.shift_bytes > 0 {
            self.shift_bytes -= 1;
            let mut out = 0u8;
            for bit in 0..8 {
                if self.clock(false, (b >> bit) & 1 != 0) {
                    out |= 1 << bit;
                }
            }
            if self.shift_read {
                self.rx.push_back(out);
            }
        } else if b & 0x80 != 0 {
            self.shift_bytes = (b & 0x3f) as usize;
            self.shift_read = b & 0x40 != 0;
        } else {
            let rising = self.pins & 1 == 0 && b & 1 != 0;
            self.pins = b;
            self.parked = b & 0x20 == 0;
            if rising {
                self.clock(b & 0x02 != 0, b & 0x10 != 0);
            }
        }
    }
}

impl Cable for FpgaSim {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(Error::Disconnected);
        }
        for b in data {
            self.byte(*b);
        }
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

    fn purge_rx(&mut self) -> Result<()> {
        self.purges += 1;
        self.rx.clear();
        Ok(())
    }
}
