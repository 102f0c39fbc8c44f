//! Compute device selection for locally executed models.
//!
//! The configured [`Device`] may be `auto`; it is resolved exactly once at
//! startup into a [`ResolvedDevice`] that stages receive as a plain value.

use serde::{Deserialize, Serialize};
use std::process::Command;
use tracing::{debug, info, warn};

/// Configured device preference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Use CUDA when an NVIDIA GPU is visible, CPU otherwise.
    #[default]
    Auto,
    Cpu,
    Cuda,
}

/// A concrete device after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedDevice {
    Cpu,
    Cuda,
}

impl Device {
    /// Resolve the preference. Only `Cpu` skips the hardware probe.
    pub fn resolve(self) -> ResolvedDevice {
        self.resolve_with(detect_nvidia_gpu)
    }

    /// Resolve with an injected probe.
    ///
    /// `Cuda` without a visible GPU falls back to `Cpu` with a warning.
    pub fn resolve_with<F>(self, probe: F) -> ResolvedDevice
    where
        F: FnOnce() -> Option<String>,
    {
        match self {
            Device::Cpu => ResolvedDevice::Cpu,
            Device::Cuda => match probe() {
                Some(name) => {
                    info!("Using GPU: {}", name);
                    ResolvedDevice::Cuda
                }
                None => {
                    warn!("cuda requested but no NVIDIA GPU detected, falling back to cpu");
                    ResolvedDevice::Cpu
                }
            },
            Device::Auto => match probe() {
                Some(name) => {
                    info!("Detected GPU: {}", name);
                    ResolvedDevice::Cuda
                }
                None => {
                    info!("No GPU detected, running local models on CPU");
                    ResolvedDevice::Cpu
                }
            },
        }
    }
}

impl std::str::FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Device::Auto),
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda),
            _ => Err(format!("Unknown device: {}", s)),
        }
    }
}

impl ResolvedDevice {
    /// Value passed to `--device` of the whisper CLI.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolvedDevice::Cpu => "cpu",
            ResolvedDevice::Cuda => "cuda",
        }
    }

    /// Half precision only pays off on the accelerator.
    pub fn supports_fp16(&self) -> bool {
        matches!(self, ResolvedDevice::Cuda)
    }
}

impl std::fmt::Display for ResolvedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query `nvidia-smi` for the first GPU name.
pub fn detect_nvidia_gpu() -> Option<String> {
    let output = Command::new("nvidia-smi")
        .arg("--query-gpu=name")
        .arg("--format=csv,noheader")
        .output()
        .ok()?;

    if !output.status.success() {
        debug!("nvidia-smi exited with {}", output.status);
        return None;
    }

    let name = String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
