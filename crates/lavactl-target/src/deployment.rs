//! Deployment data
//!
//! What a successful deploy leaves behind for the next power-on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Shell prompt set on Android deployments
pub const ANDROID_TESTER_PS1: &str = "root@linaro# ";

/// Record of the last successful image deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentData {
    boot_image: PathBuf,
    tester_ps1: String,
    values: BTreeMap<String, String>,
}

impl DeploymentData {
    /// Deployment of an Android image set booted from `boot_image`
    pub fn android(boot_image: impl Into<PathBuf>) -> Self {
        Self {
            boot_image: boot_image.into(),
            tester_ps1: ANDROID_TESTER_PS1.to_string(),
            values: BTreeMap::new(),
        }
    }

    /// Staged boot image to hand to the bootloader
    pub fn boot_image(&self) -> &Path {
        &self.boot_image
    }

    /// Prompt the device shell is told to print
    pub fn tester_ps1(&self) -> &str {
        &self.tester_ps1
    }

    /// Extra deployment value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Record an extra deployment value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}
