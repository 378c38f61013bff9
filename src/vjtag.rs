//! Addressed register access through the FPGA's virtual JTAG hub.
//!
//! The design behind the TAP exposes two user instructions.  Shifting three bytes through
//! `USER1` loads the virtual instruction register (VIR), which picks an access target, a word
//! offset inside it and the direction.  Afterwards `USER0` selects the virtual data register
//! (VDR): 32-bit words shifted in are written to the target starting at the offset, and words
//! shifted out are read from it.
//!
//! Reads go through a pipeline in the target's debug bus, so every read stream starts with a
//! few stale words before the requested data.  How many depends on the bus, and is configured
//! per target in [PrefetchTable].
//!
//! # Example
//! ```no_run
//! use vjtag_bridge::cable::Selector;
//! use vjtag_bridge::cable::usbblaster::UsbBlaster;
//! use vjtag_bridge::config::{BridgeConfig, LinkConfig};
//! use vjtag_bridge::statemachine::JtagSM;
//! use vjtag_bridge::vjtag::{Target, VirtualJtag};
//!
//! let cable = UsbBlaster::open(&Selector::default(), &LinkConfig::default())?;
//! let mut vjtag = VirtualJtag::new(JtagSM::new(cable)?, BridgeConfig::default());
//! vjtag.write_to_target(Target::CartSave, 0, &[0x89ab_cde0, 0x89ab_cde4])?;
//! let words = vjtag.read_from_target(Target::CartSave, 0, 2)?;
//! assert_eq!(words, [0x89ab_cde0, 0x89ab_cde4]);
//! # Ok::<(), vjtag_bridge::error::Error>(())
//! ```
use alloc::collections::BTreeMap;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::cable::Cable;
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::pattern::READ_UNIT_SIZE;
use crate::statemachine::JtagSM;

/// Selects the virtual data register.
pub const USER0: u8 = 0x0c;
/// Selects the virtual instruction register.
pub const USER1: u8 = 0x0e;

/// Target code no bus answers to.
pub const INVALID_TARGET_CODE: u8 = 0x7f;
/// What the hub streams back for an undefined target.
pub const INVALID_TARGET_PATTERN: [u8; 4] = [0xaa, 0x99, 0x55, 0x66];
/// Single-byte filler older hub revisions return for an undefined target.
pub const LEGACY_INVALID_TARGET_BYTE: u8 = 0xa5;

/// Whether `data` is the hub's answer for an undefined target rather than bus data.
pub fn is_invalid_target_response(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    let pattern = data
        .iter()
        .zip(INVALID_TARGET_PATTERN.iter().cycle())
        .all(|(a, b)| a == b);
    pattern || data.iter().all(|x| *x == LEGACY_INVALID_TARGET_BYTE)
}

/// Buses reachable through the hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    AccessTest,
    FrameBuffer,
    CartCommon,
    CartPrg,
    CartSave,
    CartChr,
    CpuBusMaster,
    PpuBusMaster,
    Cpu,
    Ppu,
    Apu,
    Audio,
}

impl Target {
    pub const ALL: [Target; 12] = [
        Target::AccessTest,
        Target::FrameBuffer,
        Target::CartCommon,
        Target::CartPrg,
        Target::CartSave,
        Target::CartChr,
        Target::CpuBusMaster,
        Target::PpuBusMaster,
        Target::Cpu,
        Target::Ppu,
        Target::Apu,
        Target::Audio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Target::AccessTest => "access-test",
            Target::FrameBuffer => "frame-buffer",
            Target::CartCommon => "cart-common",
            Target::CartPrg => "cart-prg",
            Target::CartSave => "cart-save",
            Target::CartChr => "cart-chr",
            Target::CpuBusMaster => "cpu-bus-master",
            Target::PpuBusMaster => "ppu-bus-master",
            Target::Cpu => "cpu",
            Target::Ppu => "ppu",
            Target::Apu => "apu",
            Target::Audio => "audio",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Target::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| Error::UnknownTarget(s.to_string()))
    }
}

/// Maps targets to the 7-bit codes one revision of the FPGA design uses for them.
///
/// Codes are looked up here rather than taken from the enum, so a design revision that
/// reorders or drops buses only needs a new table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetTable {
    revision: &'static str,
    codes: &'static [(Target, u8)],
}

impl TargetTable {
    pub const V1: TargetTable = TargetTable {
        revision: "v1",
        codes: &[
            (Target::AccessTest, 0x00),
            (Target::FrameBuffer, 0x01),
            (Target::CartCommon, 0x02),
            (Target::CartPrg, 0x03),
            (Target::CartSave, 0x04),
            (Target::CartChr, 0x05),
            (Target::CpuBusMaster, 0x06),
            (Target::PpuBusMaster, 0x07),
            (Target::Cpu, 0x08),
            (Target::Ppu, 0x09),
            (Target::Apu, 0x0a),
            (Target::Audio, 0x0b),
        ],
    };

    pub const fn new(revision: &'static str, codes: &'static [(Target, u8)]) -> Self {
        Self { revision, codes }
    }

    pub fn revision(&self) -> &'static str {
        self.revision
    }

    /// The wire code for `target`, or `None` if this revision has no such bus.
    pub fn code(&self, target: Target) -> Option<u8> {
        self.codes.iter().find(|(t, _)| *t == target).map(|(_, c)| *c)
    }

    pub fn target(&self, code: u8) -> Option<Target> {
        self.codes.iter().find(|(_, c)| *c == code).map(|(t, _)| *t)
    }
}

impl Default for TargetTable {
    fn default() -> Self {
        TargetTable::V1
    }
}

/// Stale words each target returns at the start of a read stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrefetchTable {
    depth: BTreeMap<Target, usize>,
    default: usize,
}

impl PrefetchTable {
    /// A table giving every target the same depth.
    pub fn uniform(words: usize) -> Self {
        Self {
            depth: BTreeMap::new(),
            default: words,
        }
    }

    pub fn set(&mut self, target: Target, words: usize) {
        self.depth.insert(target, words);
    }

    pub fn depth(&self, target: Target) -> usize {
        self.depth.get(&target).copied().unwrap_or(self.default)
    }
}

impl Default for PrefetchTable {
    /// The access tester answers after two words, the memory buses after three.
    fn default() -> Self {
        let mut table = PrefetchTable::uniform(3);
        table.set(Target::AccessTest, 2);
        table
    }
}

/// Contents of the virtual instruction register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vir {
    pub offset: u16,
    pub is_write: bool,
    /// 7-bit target code.
    pub target: u8,
}

impl Vir {
    /// Fails if `target` does not fit the 7-bit selector.
    pub fn new(offset: u16, is_write: bool, target: u8) -> Result<Self> {
        if target > 0x7f {
            return Err(Error::TargetCodeOutOfRange(target));
        }
        Ok(Self {
            offset,
            is_write,
            target,
        })
    }

    /// `[offset[15:8], offset[7:0], is_write << 7 | target]`
    pub fn to_bytes(self) -> [u8; 3] {
        let [hi, lo] = self.offset.to_be_bytes();
        [hi, lo, (self.is_write as u8) << 7 | self.target]
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self {
            offset: u16::from_be_bytes([bytes[0], bytes[1]]),
            is_write: bytes[2] & 0x80 != 0,
            target: bytes[2] & 0x7f,
        }
    }

    /// The register bytes in the order they are shifted into the data register.
    pub fn shift_bytes(self) -> [u8; 3] {
        let mut bytes = self.to_bytes();
        bytes.reverse();
        bytes
    }
}

/// Read `size` bytes from Shift-DR using full transfer units.
///
/// A size that is not a multiple of the unit finishes with one more read.  With
/// `remove_surplus` that read is cut down to the bytes still wanted, so the register is only
/// clocked as far as was asked for; without it the whole unit is shifted and returned.
pub fn read_shift_dr<C: Cable>(
    sm: &mut JtagSM<C>,
    size: usize,
    remove_surplus: bool,
) -> Result<Vec<u8>> {
    let mut dst = Vec::with_capacity(size + READ_UNIT_SIZE);
    for _ in 0..size / READ_UNIT_SIZE {
        dst.extend(sm.read_shift_dr()?);
    }

    let rest = size % READ_UNIT_SIZE;
    if rest != 0 {
        if remove_surplus {
            dst.extend(sm.read_shift_dr_len(rest)?);
        } else {
            dst.extend(sm.read_shift_dr()?);
        }
    }
    Ok(dst)
}

pub struct VirtualJtag<C> {
    sm: JtagSM<C>,
    config: BridgeConfig,
}

impl<C: Cable> VirtualJtag<C> {
    pub fn new(sm: JtagSM<C>, config: BridgeConfig) -> Self {
        Self { sm, config }
    }

    pub fn sm(&mut self) -> &mut JtagSM<C> {
        &mut self.sm
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn into_inner(self) -> JtagSM<C> {
        self.sm
    }

    /// Chunked read from the data register; see [read_shift_dr].
    pub fn read_shift_dr(&mut self, size: usize, remove_surplus: bool) -> Result<Vec<u8>> {
        read_shift_dr(&mut self.sm, size, remove_surplus)
    }

    fn code(&self, target: Target) -> Result<u8> {
        self.config
            .targets
            .code(target)
            .ok_or_else(|| Error::UnknownTarget(target.to_string()))
    }

    /// Load `vir` and select the data register.  Starts from any TAP state and leaves the TAP
    /// in Shift-DR with `USER0` active.
    pub fn write_vir(&mut self, vir: Vir) -> Result<()> {
        log::debug!("VIR <- {:?}", vir);
        self.sm.move_to_idle()?;
        self.sm.move_idle_to_shift_ir()?;

        self.sm.write_shift_ir(USER1)?;
        self.sm.move_shift_ir_to_shift_dr()?;
        self.sm.write_shift_dr_bytes(&vir.shift_bytes())?;
        self.sm.move_shift_dr_to_shift_ir()?;

        self.sm.write_shift_ir(USER0)?;
        self.sm.move_shift_ir_to_shift_dr()
    }

    /// Write `words` to `target` starting at word `offset`.  Leaves the TAP in Shift-IR.
    pub fn write_to_target(&mut self, target: Target, offset: u16, words: &[u32]) -> Result<()> {
        let code = self.code(target)?;
        log::debug!("write {} words to {} @ {:#06x}", words.len(), target, offset);

        self.write_vir(Vir::new(offset, true, code)?)?;
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        self.sm.write_shift_dr_bytes(&data)?;
        self.sm.move_shift_dr_to_shift_ir()
    }

    /// Read `count` words from `target` starting at word `offset`.  Leaves the TAP in Shift-IR.
    pub fn read_from_target(&mut self, target: Target, offset: u16, count: usize) -> Result<Vec<u32>> {
        let unit = self.config.read_unit_bytes;
        if unit == 0 || unit % 4 != 0 {
            return Err(Error::InvalidReadUnit(unit));
        }
        let code = self.code(target)?;
        let prefetch = self.config.prefetch.depth(target);
        log::debug!(
            "read {} words from {} @ {:#06x}, discarding {}",
            count,
            target,
            offset,
            prefetch
        );

        self.write_vir(Vir::new(offset, false, code)?)?;
        let mut words = Vec::with_capacity(count + prefetch);
        while words.len() < count + prefetch {
            let raw = read_shift_dr(&mut self.sm, unit, true)?;
            words.extend(
                raw.chunks_exact(4)
                    .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]])),
            );
        }
        self.sm.move_shift_dr_to_shift_ir()?;

        Ok(words.into_iter().skip(prefetch).take(count).collect())
    }

    /// Read `size` raw bytes after selecting target code `code` for reading, without any
    /// prefetch handling.  Any 7-bit code is accepted, so this is how the hub's answer for an
    /// undefined target can be observed.  Wider codes fail with `TargetCodeOutOfRange`.
    pub fn read_raw(&mut self, code: u8, offset: u16, size: usize) -> Result<Vec<u8>> {
        self.write_vir(Vir::new(offset, false, code)?)?;
        let data = read_shift_dr(&mut self.sm, size, true)?;
        self.sm.move_shift_dr_to_shift_ir()?;
        Ok(data)
    }
}
