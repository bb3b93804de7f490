pub mod gpio;

pub use gpio::SysfsGpio;

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

/// A single on/off output (the goal light).
pub trait Indicator: Send + Sync {
    fn set(&self, on: bool) -> Result<()>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Blink pattern played once per detected goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashPattern {
    pub repetitions: u32,
    pub on: Duration,
    pub off: Duration,
}

impl Default for FlashPattern {
    fn default() -> Self {
        FlashPattern {
            repetitions: 5,
            on: Duration::from_millis(500),
            off: Duration::from_millis(500),
        }
    }
}

/// Play `pattern` on `indicator`, blocking the caller until it completes.
/// Driver errors are logged; the pattern carries on regardless.
pub async fn flash(indicator: &dyn Indicator, pattern: &FlashPattern) {
    for _ in 0..pattern.repetitions {
        if let Err(e) = indicator.set(true) {
            warn!("Failed to switch {} on: {}", indicator.name(), e);
        }
        tokio::time::sleep(pattern.on).await;
        if let Err(e) = indicator.set(false) {
            warn!("Failed to switch {} off: {}", indicator.name(), e);
        }
        tokio::time::sleep(pattern.off).await;
    }
}

/// Indicator for `--dry-run`: logs instead of touching hardware.
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn set(&self, on: bool) -> Result<()> {
        info!("Light {}", if on { "ON" } else { "OFF" });
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
