use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::Indicator;

const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// Drives one GPIO line through the Linux sysfs interface.
pub struct SysfsGpio {
    pin: u32,
    value_path: PathBuf,
    name: String,
}

impl SysfsGpio {
    /// Export `pin` (BCM numbering) and configure it as an output, initially off.
    pub fn open(pin: u32) -> Result<Self> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), pin)
    }

    pub fn open_at(root: &Path, pin: u32) -> Result<Self> {
        let line_dir = root.join(format!("gpio{}", pin));
        if !line_dir.exists() {
            debug!("Exporting GPIO {}", pin);
            std::fs::write(root.join("export"), pin.to_string())
                .with_context(|| format!("Failed to export GPIO {}", pin))?;
        }
        std::fs::write(line_dir.join("direction"), "out")
            .with_context(|| format!("Failed to set GPIO {} as output", pin))?;

        let gpio = SysfsGpio {
            pin,
            value_path: line_dir.join("value"),
            name: format!("GPIO {}", pin),
        };
        gpio.set(false)?;
        Ok(gpio)
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }
}

impl Indicator for SysfsGpio {
    fn set(&self, on: bool) -> Result<()> {
        std::fs::write(&self.value_path, if on { "1" } else { "0" })
            .with_context(|| format!("Failed to write {}", self.value_path.display()))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::temp_path;

    #[test]
    fn test_open_configures_exported_line() {
        let root = temp_path("gpio-exported");
        std::fs::create_dir_all(root.join("gpio18")).unwrap();

        let gpio = SysfsGpio::open_at(&root, 18).unwrap();
        assert_eq!(gpio.pin(), 18);
        assert_eq!(gpio.name(), "GPIO 18");
        assert_eq!(std::fs::read_to_string(root.join("gpio18/direction")).unwrap(), "out");
        assert_eq!(std::fs::read_to_string(root.join("gpio18/value")).unwrap(), "0");

        gpio.set(true).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("gpio18/value")).unwrap(), "1");
        gpio.set(false).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("gpio18/value")).unwrap(), "0");

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn test_open_fails_without_sysfs() {
        let root = temp_path("gpio-missing");
        assert!(SysfsGpio::open_at(&root, 18).is_err());
    }
}
