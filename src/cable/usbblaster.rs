//! Implement the `Cable` trait for Altera USB Blaster and clones (FT245 in synchronous FIFO
//! mode behind a CPLD) through the D2XX driver.
use crate::cable::{Cable, DeviceInfo, Selector};
use crate::config::LinkConfig;
use crate::error::{Error, Result};

use std::vec::Vec;

use libftd2xx::{Ftdi, FtdiCommon};

pub struct UsbBlaster {
    ft: Ftdi,
}

/// List every bridge the driver can see.
pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    #[cfg(windows)]
    libftd2xx::rescan()?;
    let devices = libftd2xx::list_devices()?;
    log::debug!("{} FTDI devices attached", devices.len());

    Ok(devices
        .into_iter()
        .map(|d| DeviceInfo {
            description: d.description,
            serial_number: d.serial_number,
        })
        .collect())
}

impl UsbBlaster {
    /// Open the bridge chosen by `selector` and configure it for JTAG use.
    pub fn open(selector: &Selector, config: &LinkConfig) -> Result<Self> {
        #[cfg(not(windows))]
        if let Some((vid, pid)) = config.vid_pid {
            libftd2xx::set_vid_pid(vid, pid)?;
        }

        if !list_devices()?.iter().any(|d| selector.matches(d)) {
            log::error!("no bridge matches {:?}", selector);
            return Err(Error::DeviceNotFound);
        }

        let mut ft = match selector {
            Selector::Description(d) => Ftdi::with_description(d)?,
            Selector::SerialNumber(s) => Ftdi::with_serial_number(s)?,
        };

        ft.reset()?;
        ft.set_latency_timer(config.latency)?;
        if let Some(baud) = config.baud_rate {
            ft.set_baud_rate(baud)?;
        }
        ft.set_timeouts(config.read_timeout, config.write_timeout)?;
        ft.purge_all()?;
        log::info!("opened bridge {:?}", selector);

        Ok(Self { ft })
    }

    /// Release the device handle.  The TAP should be parked with `JtagSM::close` first.
    pub fn close(mut self) -> Result<()> {
        self.ft.close()?;
        log::info!("closed bridge");
        Ok(())
    }
}

impl Cable for UsbBlaster {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.ft.write(data)?)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.ft.read(buf)?)
    }

    fn purge_tx(&mut self) -> Result<()> {
        Ok(self.ft.purge_tx()?)
    }

    fn purge_rx(&mut self) -> Result<()> {
        Ok(self.ft.purge_rx()?)
    }
}
