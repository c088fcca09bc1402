//! Board configuration
//!
//! A board file describes one device under test: which host tools drive
//! it, where its partitions are mounted and how long it needs to settle.
//! Board files are RON or TOML:
//!
//! ```ron
//! (
//!     name: "nexus",
//!     control_command: "fastboot -s 0149BD7E0200E00F",
//!     shell_command: "adb -s 0149BD7E0200E00F",
//!     partitions: {
//!         "system_partition": "/system",
//!         "data_partition": "/data",
//!     },
//!     scratch_dir: "/var/lib/lavactl/nexus",
//! )
//! ```
//!
//! Configuration is read once and never mutated during a run.

mod database;

pub use database::BoardDatabase;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_control_command() -> String {
    "fastboot".to_string()
}

fn default_shell_command() -> String {
    "adb".to_string()
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("lavactl")
}

/// Immutable per-device configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    /// Board name used for lookup in the database
    pub name: String,
    /// Invocation prefix of the image-level control tool (flash, boot, reboot)
    #[serde(default = "default_control_command")]
    pub control_command: String,
    /// Invocation prefix of the device shell tool
    #[serde(default = "default_shell_command")]
    pub shell_command: String,
    /// Partition identifier to device mount point
    #[serde(default)]
    pub partitions: BTreeMap<String, String>,
    /// Host directory for staged images and partition mirrors
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,
    /// Shell prompt override; the deployment's prompt is used when unset
    #[serde(default)]
    pub tester_ps1: Option<String>,
    /// Settle delays and timeouts
    #[serde(default)]
    pub timing: Timing,
    /// Accessory modules wired to this board
    #[serde(default)]
    pub lmp: LmpConfig,
}

/// Settle delays and timeouts, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Wait after asking the running OS to reboot
    pub reboot_settle: u64,
    /// Wait for the bootloader to come up before sending it commands
    pub bootloader_settle: u64,
    /// Expect timeout for interactive shell sessions
    pub session_timeout: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            reboot_settle: 10,
            bootloader_settle: 10,
            session_timeout: 60,
        }
    }
}

impl Timing {
    /// Reboot settle delay
    pub fn reboot_settle(&self) -> Duration {
        Duration::from_secs(self.reboot_settle)
    }

    /// Bootloader settle delay
    pub fn bootloader_settle(&self) -> Duration {
        Duration::from_secs(self.bootloader_settle)
    }

    /// Interactive session timeout
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout)
    }
}

/// Accessory module (LMP) wiring for a board
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LmpConfig {
    /// Host helper invoked as `<command> <serial> <mode> <option>`
    pub command: Option<String>,
    /// Default module serial per module type (`usb`, `hdmi`, `sata`, `eth`, `lsgpio`)
    pub defaults: BTreeMap<String, String>,
    /// Serials of individually named modules
    pub modules: BTreeMap<String, String>,
}

impl LmpConfig {
    /// Resolve the serial of a module
    ///
    /// A named module takes precedence; otherwise the default serial for
    /// the module type is used.
    pub fn module_serial(&self, kind: &str, module_name: Option<&str>) -> Option<&str> {
        if let Some(name) = module_name {
            if let Some(serial) = self.modules.get(name) {
                return Some(serial);
            }
            log::debug!("No module named {}, using default {} serial", name, kind);
        }
        self.defaults.get(kind).map(String::as_str)
    }
}

impl BoardConfig {
    /// Create a board with default tools and no partitions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            control_command: default_control_command(),
            shell_command: default_shell_command(),
            partitions: BTreeMap::new(),
            scratch_dir: default_scratch_dir(),
            tester_ps1: None,
            timing: Timing::default(),
            lmp: LmpConfig::default(),
        }
    }

    /// Map a partition to a mount point
    pub fn with_partition(mut self, partition: impl Into<String>, mount_point: impl Into<String>) -> Self {
        self.partitions.insert(partition.into(), mount_point.into());
        self
    }

    /// Set the scratch directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Parse a board from RON
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let board: Self = ron::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        board.validate()?;
        Ok(board)
    }

    /// Parse a board from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let board: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        board.validate()?;
        Ok(board)
    }

    /// Load a board file, choosing the format from its extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("ron") => Self::from_ron_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => Err(Error::Config(format!(
                "unsupported board file format: {}",
                path.display()
            ))),
        }
    }

    /// Check the invariants the lifecycle relies on
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Config("board name is empty".into()));
        }
        if self.control_command.trim().is_empty() {
            return Err(Error::Config(format!("{}: control_command is empty", self.name)));
        }
        if self.shell_command.trim().is_empty() {
            return Err(Error::Config(format!("{}: shell_command is empty", self.name)));
        }

        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for (partition, mount_point) in &self.partitions {
            if !mount_point.starts_with('/') {
                return Err(Error::Config(format!(
                    "{}: mount point {:?} of partition {} is not absolute",
                    self.name, mount_point, partition
                )));
            }
            if let Some(other) = seen.insert(mount_point, partition) {
                return Err(Error::Config(format!(
                    "{}: partitions {} and {} share mount point {}",
                    self.name, other, partition, mount_point
                )));
            }
        }

        Ok(())
    }

    /// Resolve a partition identifier to its mount point
    pub fn mount_point(&self, partition: &str) -> Result<&str> {
        self.partitions
            .get(partition)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownPartition(partition.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXUS_RON: &str = r#"
(
    name: "nexus",
    control_command: "fastboot -s 0149BD7E",
    shell_command: "adb -s 0149BD7E",
    partitions: {
        "system_partition": "/system",
        "data_partition": "/data",
    },
    scratch_dir: "/tmp/lavactl-nexus",
    timing: (bootloader_settle: 15),
    lmp: (
        command: Some("lmp-ctl"),
        defaults: { "lsgpio": "000000000001" },
        modules: { "audio-left": "000000000007" },
    ),
)
"#;

    #[test]
    fn test_parse_ron() {
        let board = BoardConfig::from_ron_str(NEXUS_RON).unwrap();
        assert_eq!(board.name, "nexus");
        assert_eq!(board.control_command, "fastboot -s 0149BD7E");
        assert_eq!(board.mount_point("system_partition").unwrap(), "/system");
        assert_eq!(board.scratch_dir, PathBuf::from("/tmp/lavactl-nexus"));
        assert_eq!(board.timing.bootloader_settle, 15);
        assert_eq!(board.timing.reboot_settle, 10);
        assert_eq!(board.timing.session_timeout(), Duration::from_secs(60));
        assert!(board.tester_ps1.is_none());
    }

    #[test]
    fn test_parse_toml_defaults() {
        let toml = r#"
name = "panda"

[partitions]
system_partition = "/system"
"#;
        let board = BoardConfig::from_toml_str(toml).unwrap();
        assert_eq!(board.control_command, "fastboot");
        assert_eq!(board.shell_command, "adb");
        assert_eq!(board.timing, Timing::default());
        assert!(board.lmp.command.is_none());
    }

    #[test]
    fn test_unknown_partition() {
        let board = BoardConfig::new("nexus").with_partition("system_partition", "/system");
        match board.mount_point("boot_partition") {
            Err(Error::UnknownPartition(p)) => assert_eq!(p, "boot_partition"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_shared_mount_point() {
        let board = BoardConfig::new("nexus")
            .with_partition("a", "/system")
            .with_partition("b", "/system");
        assert!(matches!(board.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_relative_mount_point() {
        let board = BoardConfig::new("nexus").with_partition("a", "system");
        assert!(matches!(board.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_empty_tool() {
        let mut board = BoardConfig::new("nexus");
        board.shell_command = "  ".into();
        assert!(board.validate().is_err());
    }

    #[test]
    fn test_module_serial_lookup() {
        let board = BoardConfig::from_ron_str(NEXUS_RON).unwrap();
        let lmp = &board.lmp;
        assert_eq!(lmp.module_serial("lsgpio", Some("audio-left")), Some("000000000007"));
        assert_eq!(lmp.module_serial("lsgpio", Some("missing")), Some("000000000001"));
        assert_eq!(lmp.module_serial("lsgpio", None), Some("000000000001"));
        assert_eq!(lmp.module_serial("hdmi", None), None);
    }
}
