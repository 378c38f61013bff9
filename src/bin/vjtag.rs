//! # vjtag
//!
//! Command line access to an FPGA behind a USB-Blaster: identify the device, trigger
//! reconfiguration and read or write registers through the virtual JTAG hub.
use std::error::Error;

use clap::{Parser, Subcommand};
use clap_num::maybe_hex;
use env_logger::Env;
use vjtag_bridge::cable::usbblaster::{self, UsbBlaster};
use vjtag_bridge::cable::Selector;
use vjtag_bridge::command::{self, Idcode, Usercode};
use vjtag_bridge::config::{BridgeConfig, LinkConfig};
use vjtag_bridge::statemachine::JtagSM;
use vjtag_bridge::vjtag::{self, Target, VirtualJtag};

#[derive(Subcommand, Clone)]
enum Command {
    /// List attached bridges
    List,
    /// Read and decode IDCODE
    Idcode,
    /// Read USERCODE
    Usercode,
    /// Make the FPGA reload its configuration
    PulseNconfig,
    /// Read words from an access target
    Read {
        target: Target,
        #[arg(value_parser = maybe_hex::<u16>)]
        offset: u16,
        count: usize,
        #[arg(short, long, help = "Override the prefetch depth of the target, in words")]
        prefetch: Option<usize>,
    },
    /// Write words to an access target
    Write {
        target: Target,
        #[arg(value_parser = maybe_hex::<u16>)]
        offset: u16,
        #[arg(value_parser = maybe_hex::<u32>, required = true)]
        words: Vec<u32>,
    },
    /// Read raw bytes for a target code, e.g. 0x7f to see the invalid-target pattern
    Probe {
        #[arg(value_parser = maybe_hex::<u8>)]
        code: u8,
        #[arg(short, long, default_value = "16")]
        size: usize,
    },
}

#[derive(Parser)]
#[command(about = "JTAG and virtual JTAG access through a USB-Blaster", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "USB-Blaster", conflicts_with = "serial")]
    description: String,

    #[arg(short, long)]
    serial: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Command::List = args.command {
        for d in usbblaster::list_devices()? {
            println!("{:<32} {}", d.description, d.serial_number);
        }
        return Ok(());
    }

    let selector = match args.serial {
        Some(s) => Selector::SerialNumber(s),
        None => Selector::Description(args.description),
    };
    let cable = UsbBlaster::open(&selector, &LinkConfig::default())?;
    let mut jtag = JtagSM::new(cable)?;

    match args.command {
        Command::List => unreachable!(),
        Command::Idcode => {
            let id = Idcode::read(&mut jtag)?;
            println!(
                "IDCODE {:#010x}: version {:#x}, part {:#06x}, maker {:#05x}",
                id.raw, id.version, id.part_number, id.maker_id
            );
        }
        Command::Usercode => {
            println!("USERCODE {:#010x}", Usercode::read(&mut jtag)?.raw);
        }
        Command::PulseNconfig => command::pulse_nconfig(&mut jtag)?,
        Command::Read {
            target,
            offset,
            count,
            prefetch,
        } => {
            let mut config = BridgeConfig::default();
            if let Some(depth) = prefetch {
                config.prefetch.set(target, depth);
            }
            let mut bridge = VirtualJtag::new(jtag, config);
            let words = bridge.read_from_target(target, offset, count)?;
            for (i, chunk) in words.chunks(4).enumerate() {
                let line: Vec<String> = chunk.iter().map(|w| format!("{:08x}", w)).collect();
                println!("{:04x}: {}", offset as usize + i * 4, line.join(" "));
            }
            jtag = bridge.into_inner();
        }
        Command::Write {
            target,
            offset,
            words,
        } => {
            let mut bridge = VirtualJtag::new(jtag, BridgeConfig::default());
            bridge.write_to_target(target, offset, &words)?;
            log::info!("wrote {} words to {}", words.len(), target);
            jtag = bridge.into_inner();
        }
        Command::Probe { code, size } => {
            let mut bridge = VirtualJtag::new(jtag, BridgeConfig::default());
            let data = bridge.read_raw(code, 0, size)?;
            println!("{:02x?}", data);
            if vjtag::is_invalid_target_response(&data) {
                println!("target code {:#04x} is not defined by the design", code);
            }
            jtag = bridge.into_inner();
        }
    }

    jtag.close()?.close()?;
    Ok(())
}
