//! This crate drives a JTAG Test Access Port through a USB-Blaster style bridge (an FTDI FIFO
//! chip behind a small CPLD), and on top of that talks to registers inside an FPGA design
//! through its virtual JTAG hub.
//!
//! At the lowest level is the `Cable` trait, which is nothing more than the bulk read and write
//! primitives of the bridge chip.  `Transport` turns those into exact-length command writes and
//! bounded reads.
//!
//! The next level is `JtagSM`, the TAP controller.  It knows the clock patterns that move the
//! TAP between the states this protocol uses, follows the TAP through every clock it sends, and
//! refuses operations issued from the wrong state.  The `command` module uses it for the
//! standard IDCODE, USERCODE and PULSE_NCONFIG instructions.
//!
//! `VirtualJtag` layers the FPGA's addressed register protocol on the two user instructions:
//! select a target bus and offset through the virtual instruction register, then stream 32-bit
//! words through the virtual data register.
//!
//! # Example
//! ```no_run
//! use vjtag_bridge::cable::Selector;
//! use vjtag_bridge::cable::usbblaster::UsbBlaster;
//! use vjtag_bridge::command::Idcode;
//! use vjtag_bridge::config::LinkConfig;
//! use vjtag_bridge::statemachine::JtagSM;
//!
//! let cable = UsbBlaster::open(&Selector::default(), &LinkConfig::default())?;
//! let mut jtag = JtagSM::new(cable)?;
//! let idcode = Idcode::read(&mut jtag)?;
//! println!("part {:#06x}", idcode.part_number);
//! jtag.close()?.close()?;
//! # Ok::<(), vjtag_bridge::error::Error>(())
//! ```

#![no_std]

#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

pub mod cable;
pub mod command;
pub mod config;
pub mod error;
pub mod pattern;
pub mod statemachine;
pub mod transport;
pub mod vjtag;
