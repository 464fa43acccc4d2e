//! Device name filter for diskstats.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default pattern for devices that are skipped: ram disks, loop and floppy
/// devices, and partitions of sd/hd/vd/xvd and NVMe disks.
pub const DEFAULT_IGNORED_DEVICES: &str = r"^(ram|loop|fd|(h|s|v|xv)d[a-z]|nvme\d+n\d+p)\d+$";

static DEFAULT_IGNORED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DEFAULT_IGNORED_DEVICES).expect("default ignored devices pattern is valid")
});

/// Compiled exclusion pattern.
#[derive(Debug, Clone)]
pub struct DeviceFilter {
    ignored: Regex,
}

impl DeviceFilter {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            ignored: Regex::new(pattern)?,
        })
    }

    /// True if no metrics should be produced for `device`.
    pub fn is_ignored(&self, device: &str) -> bool {
        self.ignored.is_match(device)
    }

    pub fn pattern(&self) -> &str {
        self.ignored.as_str()
    }
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            ignored: DEFAULT_IGNORED_REGEX.clone(),
        }
    }
}
