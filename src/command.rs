//! The fixed-instruction commands every device on the link understands.  Each one is a
//! complete transaction: it starts from any TAP state and leaves the link parked.
use crate::cable::Cable;
use crate::error::Result;
use crate::statemachine::JtagSM;
use crate::vjtag::read_shift_dr;

pub const IDCODE: u8 = 0b0000_0110;
pub const USERCODE: u8 = 0b0000_0111;
pub const PULSE_NCONFIG: u8 = 0b0000_0001;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Idcode {
    pub version: u8,
    pub part_number: u16,
    pub maker_id: u16,
    pub raw: u32,
}

impl From<u32> for Idcode {
    fn from(raw: u32) -> Self {
        Self {
            version: ((raw >> 28) & 0xf) as u8,
            part_number: ((raw >> 12) & 0xffff) as u16,
            maker_id: ((raw >> 1) & 0x7ff) as u16,
            raw,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Usercode {
    pub raw: u32,
}

/// Load `ir`, enter Shift-DR and read one 32-bit register value.
fn read_u32<C: Cable>(sm: &mut JtagSM<C>, ir: u8) -> Result<u32> {
    let t = sm.transport();
    t.clear_write_buffer()?;
    t.clear_read_buffer()?;

    sm.move_to_idle()?;
    sm.move_idle_to_shift_ir()?;
    sm.write_shift_ir(ir)?;
    sm.move_shift_ir_to_shift_dr()?;
    let data = read_shift_dr(sm, 4, true)?;
    sm.device_close()?;

    Ok(u32::from_le_bytes([data[0], data[1], data[2], data[3]]))
}

impl Idcode {
    pub fn read<C: Cable>(sm: &mut JtagSM<C>) -> Result<Self> {
        let idcode = Idcode::from(read_u32(sm, IDCODE)?);
        log::debug!("{:x?}", idcode);
        Ok(idcode)
    }
}

impl Usercode {
    pub fn read<C: Cable>(sm: &mut JtagSM<C>) -> Result<Self> {
        let raw = read_u32(sm, USERCODE)?;
        log::debug!("USERCODE {:#010x}", raw);
        Ok(Usercode { raw })
    }
}

/// Pulse nCONFIG, making the FPGA reload its configuration.  Nothing is shifted through the
/// data register; loading the instruction is the whole effect.
pub fn pulse_nconfig<C: Cable>(sm: &mut JtagSM<C>) -> Result<()> {
    log::info!("pulsing nCONFIG");
    sm.move_to_idle()?;
    sm.move_idle_to_shift_ir()?;
    sm.write_shift_ir(PULSE_NCONFIG)?;
    sm.move_shift_ir_to_shift_dr()?;
    sm.device_close()
}
