use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{GpioError, Result};

/// Root of the legacy sysfs GPIO interface.
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Output level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn as_u8(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

/// Something that can be driven high or low.
pub trait OutputPin {
    fn set_level(&mut self, level: Level) -> Result<()>;
}

/// Sysfs GPIO controller. Every operation is a single blocking write.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    root: PathBuf,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SysfsGpio {
    /// Controller rooted at `/sys/class/gpio`.
    pub fn new() -> Self {
        Self::with_root(DEFAULT_GPIO_ROOT)
    }

    /// Controller rooted elsewhere (chroots, tests).
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pin_dir(&self, pin: u32) -> PathBuf {
        self.root.join(format!("gpio{pin}"))
    }

    /// True if `gpio<pin>` is present under the root.
    pub fn is_exported(&self, pin: u32) -> bool {
        self.pin_dir(pin).exists()
    }

    /// Export `pin`. Already exported pins are left alone.
    pub fn export(&self, pin: u32) -> Result<()> {
        if self.is_exported(pin) {
            debug!(pin, "gpio already exported");
            return Ok(());
        }
        std::fs::write(self.root.join("export"), pin.to_string())
            .map_err(|source| GpioError::Export { pin, source })?;
        debug!(pin, "gpio exported");
        Ok(())
    }

    pub fn unexport(&self, pin: u32) -> Result<()> {
        std::fs::write(self.root.join("unexport"), pin.to_string())
            .map_err(|source| GpioError::Unexport { pin, source })?;
        debug!(pin, "gpio unexported");
        Ok(())
    }

    pub fn set_direction(&self, pin: u32, direction: Direction) -> Result<()> {
        std::fs::write(self.pin_dir(pin).join("direction"), direction.as_str()).map_err(
            |source| GpioError::Direction {
                pin,
                direction: direction.as_str(),
                source,
            },
        )
    }

    pub fn set_value(&self, pin: u32, level: Level) -> Result<()> {
        let value = level.as_u8();
        std::fs::write(self.pin_dir(pin).join("value"), value.to_string())
            .map_err(|source| GpioError::Value { pin, value, source })
    }

    /// Handle for driving one pin.
    pub fn pin(&self, pin: u32) -> SysfsPin {
        SysfsPin {
            gpio: self.clone(),
            pin,
        }
    }
}

/// One sysfs pin used as an output.
#[derive(Debug, Clone)]
pub struct SysfsPin {
    gpio: SysfsGpio,
    pin: u32,
}

impl SysfsPin {
    pub fn number(&self) -> u32 {
        self.pin
    }
}

impl OutputPin for SysfsPin {
    fn set_level(&mut self, level: Level) -> Result<()> {
        self.gpio.set_value(self.pin, level)
    }
}

/// Exports a pin as an output for as long as the guard lives.
///
/// The pin is unexported on drop; a failure there is logged, not raised.
#[derive(Debug)]
pub struct GpioGuard {
    gpio: SysfsGpio,
    pin: u32,
}

impl GpioGuard {
    pub fn output(gpio: SysfsGpio, pin: u32) -> Result<Self> {
        gpio.export(pin)?;
        let guard = Self { gpio, pin };
        guard.gpio.set_direction(pin, Direction::Out)?;
        Ok(guard)
    }

    pub fn pin(&self) -> SysfsPin {
        self.gpio.pin(self.pin)
    }
}

impl Drop for GpioGuard {
    fn drop(&mut self) {
        if let Err(err) = self.gpio.unexport(self.pin) {
            warn!(pin = self.pin, error = %err, "gpio cleanup failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fake sysfs tree: `export` creates `gpio<N>/{direction,value}` the way
    /// the kernel would, but only when the test asks for it.
    fn fake_root(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "micomlink-gpio-{}-{}-{}",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    fn kernel_export(root: &Path, pin: u32) {
        std::fs::create_dir_all(root.join(format!("gpio{pin}"))).unwrap();
    }

    #[test]
    fn export_writes_pin_number() {
        let root = fake_root("export");
        let gpio = SysfsGpio::with_root(&root);

        assert!(!gpio.is_exported(89));
        gpio.export(89).unwrap();
        assert_eq!(std::fs::read_to_string(root.join("export")).unwrap(), "89");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn export_skips_already_exported_pin() {
        let root = fake_root("exported");
        kernel_export(&root, 89);
        let gpio = SysfsGpio::with_root(&root);

        gpio.export(89).unwrap();
        assert!(!root.join("export").exists());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn direction_and_value_are_written() {
        let root = fake_root("attrs");
        kernel_export(&root, 12);
        let gpio = SysfsGpio::with_root(&root);

        gpio.set_direction(12, Direction::Out).unwrap();
        gpio.set_value(12, Level::High).unwrap();

        let pin_dir = root.join("gpio12");
        assert_eq!(std::fs::read_to_string(pin_dir.join("direction")).unwrap(), "out");
        assert_eq!(std::fs::read_to_string(pin_dir.join("value")).unwrap(), "1");

        let mut pin = gpio.pin(12);
        pin.set_level(Level::Low).unwrap();
        assert_eq!(std::fs::read_to_string(pin_dir.join("value")).unwrap(), "0");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn unexported_pin_value_write_fails() {
        let root = fake_root("missing");
        let gpio = SysfsGpio::with_root(&root);

        let err = gpio.set_value(7, Level::High).unwrap_err();
        assert!(matches!(err, GpioError::Value { pin: 7, value: 1, .. }));
        assert!(err.io_source().is_some());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn guard_sets_output_and_unexports_on_drop() {
        let root = fake_root("guard");
        kernel_export(&root, 89);
        let gpio = SysfsGpio::with_root(&root);

        {
            let guard = GpioGuard::output(gpio, 89).unwrap();
            assert_eq!(guard.pin().number(), 89);
            assert_eq!(
                std::fs::read_to_string(root.join("gpio89/direction")).unwrap(),
                "out"
            );
        }

        assert_eq!(std::fs::read_to_string(root.join("unexport")).unwrap(), "89");
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_root_reports_export_error() {
        let gpio = SysfsGpio::with_root("/nonexistent/micomlink/gpio");
        let err = gpio.export(3).unwrap_err();
        assert!(matches!(err, GpioError::Export { pin: 3, .. }));
    }
}
