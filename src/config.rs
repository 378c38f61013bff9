//! Tunables for opening the bridge and for the virtual JTAG layer.
use core::time::Duration;

use crate::vjtag::{PrefetchTable, Target, TargetTable};

/// Parameters applied to the bridge chip when it is opened.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// USB latency timer.  16 ms is the chip default; some bridges accept less.
    pub latency: Duration,
    /// FT245 application notes give 3 MB/s as the ceiling, about 1 MB/s is achieved in practice.
    pub baud_rate: Option<u32>,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// VID/PID pair registered with the driver before enumerating.  Needed for bridges that do
    /// not use FTDI's own IDs.
    pub vid_pid: Option<(u16, u16)>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(16),
            baud_rate: Some(3_000_000),
            read_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(1),
            vid_pid: Some((0x09fb, 0x6001)),
        }
    }
}

/// Parameters of the virtual JTAG register protocol.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub targets: TargetTable,
    pub prefetch: PrefetchTable,
    /// Bytes fetched per chunked read while streaming words out of a target.  A positive
    /// multiple of 4.
    pub read_unit_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            targets: TargetTable::default(),
            prefetch: PrefetchTable::default(),
            read_unit_bytes: 32,
        }
    }
}

/// Builder for [LinkConfig] and [BridgeConfig]
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use vjtag_bridge::config::Builder;
/// use vjtag_bridge::vjtag::Target;
///
/// let (link, bridge) = Builder::new()
///     .latency(Duration::from_millis(2))
///     .prefetch(Target::FrameBuffer, 6)
///     .build();
/// assert_eq!(link.latency, Duration::from_millis(2));
/// assert_eq!(bridge.prefetch.depth(Target::FrameBuffer), 6);
/// ```
#[derive(Default)]
pub struct Builder {
    link: LinkConfig,
    bridge: BridgeConfig,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.link.latency = latency;
        self
    }

    pub fn baud_rate(mut self, baud_rate: Option<u32>) -> Self {
        self.link.baud_rate = baud_rate;
        self
    }

    /// Set the read and write timeouts of the USB transfers
    pub fn timeouts(mut self, read: Duration, write: Duration) -> Self {
        self.link.read_timeout = read;
        self.link.write_timeout = write;
        self
    }

    pub fn vid_pid(mut self, vid_pid: Option<(u16, u16)>) -> Self {
        self.link.vid_pid = vid_pid;
        self
    }

    /// Use a different revision of the target selector table
    pub fn targets(mut self, targets: TargetTable) -> Self {
        self.bridge.targets = targets;
        self
    }

    /// Set the number of stale words `target` returns ahead of real data
    pub fn prefetch(mut self, target: Target, words: usize) -> Self {
        self.bridge.prefetch.set(target, words);
        self
    }

    /// Must be a positive multiple of 4; reads through a bridge with any other unit fail with
    /// `InvalidReadUnit`.
    pub fn read_unit_bytes(mut self, bytes: usize) -> Self {
        self.bridge.read_unit_bytes = bytes;
        self
    }

    pub fn build(self) -> (LinkConfig, BridgeConfig) {
        (self.link, self.bridge)
    }

    pub fn build_link(self) -> LinkConfig {
        self.link
    }

    pub fn build_bridge(self) -> BridgeConfig {
        self.bridge
    }
}
