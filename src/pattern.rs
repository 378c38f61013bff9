//! Command words understood by USB-Blaster style bridges.
//!
//! In bit-bang mode every byte sets the pins directly:
//!
//! | bit | pin  |
//! |-----|------|
//! | 0   | TCK  |
//! | 1   | TMS  |
//! | 2   | nCE  |
//! | 3   | nCS  |
//! | 4   | TDI  |
//! | 5   | LED  |
//! | 6   | read |
//!
//! A 16-bit clock pattern is two such bytes, little-endian: the low byte drives TCK low and the
//! high byte drives it high, so each pattern word is exactly one TCK rising edge.
//!
//! A byte with bit 7 set switches to byte-shift mode for the next `byte & 0x3f` bytes, which
//! are clocked out LSB first on TDI with TMS held low.  Bit 6 additionally samples TDO for each
//! shifted byte and queues it for reading.

/// TCK pulse with TMS and TDI low.
pub const L: u16 = 0x2d2c;
/// TCK pulse with TDI high.
pub const H: u16 = L | 0x1010;
/// TCK pulse with TMS high.
pub const TMS: u16 = L | 0x0202;
/// TCK pulse with both TMS and TDI high.
pub const TMS_H: u16 = TMS | H;
/// TCK pulse with TMS low and the activity LED off.  Parks the link.
pub const OFF: u16 = 0x0d0c;

/// Shift out the single byte that follows.
pub const WRITE: u8 = 0x81;
/// Shift in; or with the number of bytes to capture.
pub const READ: u8 = 0xc0;

/// Largest byte count a single read command can carry.  The D2XX driver hands back at most
/// this much per USB packet once the status bytes are stripped.
pub const READ_UNIT_SIZE: usize = 63;

const TMS_BIT: u16 = 0x0002;

/// The TMS level a clock pattern word presents on its rising edge.
pub fn tms_level(word: u16) -> bool {
    word & (TMS_BIT << 8) != 0
}

/// One `WRITE` command word carrying `data`, as used while in Shift-IR.
pub fn write_word(data: u8) -> u16 {
    WRITE as u16 | (data as u16) << 8
}

/// `WRITE`, byte pairs for every byte of `data`, as used while in Shift-DR.
pub fn write_bytes(data: &[u8]) -> alloc::vec::Vec<u8> {
    data.iter().flat_map(|x| [WRITE, *x]).collect()
}

/// A read command for `len` bytes followed by the `len` dummy bytes that clock them.
///
/// The dummy payload is the byte sequence of a `READ | len` word followed by idle patterns, so
/// a full 63 byte read is the word `READ | 63` and 31 `L` words.
pub fn read_command(len: usize) -> alloc::vec::Vec<u8> {
    assert!(len > 0 && len <= READ_UNIT_SIZE);

    let mut buf = alloc::vec![READ | len as u8, 0x00];
    buf.extend(L.to_le_bytes().iter().cycle().take(len - 1));
    buf
}
