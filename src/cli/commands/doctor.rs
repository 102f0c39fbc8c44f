//! Doctor command - verify system requirements and configuration.

use crate::cli::output::format_bytes;
use crate::cli::Output;
use crate::config::{detect_nvidia_gpu, Device, Settings, TranscriptionProvider};
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Print a titled group of checks and add them to `all`.
fn report(title: &str, group: Vec<CheckResult>, all: &mut Vec<CheckResult>) {
    println!("{}", style(title).bold());
    for check in &group {
        check.print();
    }
    println!();
    all.extend(group);
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Omslag Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    report("Compute", vec![check_device(settings.general.device, detect_nvidia_gpu())], &mut checks);
    report("Transcription", vec![check_transcription_backend(settings)], &mut checks);
    report("API Configuration", vec![check_openai_api_key()], &mut checks);
    report("Directories", check_directories(settings), &mut checks);
    report("Configuration", vec![check_config_file(config_path)], &mut checks);

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Omslag.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Omslag is ready to use.");
    }

    Ok(())
}

/// Report which device locally executed models will run on.
fn check_device(device: Device, gpu: Option<String>) -> CheckResult {
    match (device, gpu) {
        (Device::Cpu, _) => CheckResult::ok("Device", "cpu (forced by configuration)"),
        (_, Some(name)) => CheckResult::ok("Device", &format!("cuda ({})", name)),
        (Device::Cuda, None) => CheckResult::warning(
            "Device",
            "cuda requested but no NVIDIA GPU detected, falling back to cpu",
            "Check that nvidia-smi works, or set general.device = \"cpu\"",
        ),
        (Device::Auto, None) => CheckResult::ok("Device", "cpu (no NVIDIA GPU detected)"),
    }
}

fn check_transcription_backend(settings: &Settings) -> CheckResult {
    match settings.transcription.provider {
        TranscriptionProvider::OpenAI => CheckResult::ok(
            "Whisper",
            &format!("OpenAI API ({})", settings.transcription.model),
        ),
        TranscriptionProvider::Local => check_tool(
            &settings.transcription.local_command,
            "Install with: pip install openai-whisper",
        ),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--help").output() {
        Ok(output) if output.status.success() => CheckResult::ok(name, "installed"),
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, "not found", hint)
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key)))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Keep the first 7 and last 4 characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 11 {
        return "...".to_string();
    }
    let head: String = chars[..7].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check data, scratch and output directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = vec![check_directory("Data directory", &settings.data_dir())];

    let temp_dir = settings.temp_dir();
    results.push(match writable(&temp_dir) {
        Ok(()) => CheckResult::ok("Scratch directory", &temp_dir.display().to_string()),
        Err(e) => CheckResult::error(
            "Scratch directory",
            &format!("{} is not writable: {}", temp_dir.display(), e),
            "Set general.temp_dir to a writable directory",
        ),
    });

    let output_dir = settings.output_dir();
    let mut output_check = check_directory("Cover directory", &output_dir);
    if output_check.status == CheckStatus::Ok {
        let size = directory_size(&output_dir);
        output_check.message = format!("{} ({})", output_dir.display(), format_bytes(size));
    }
    results.push(output_check);

    results
}

fn check_directory(name: &str, path: &Path) -> CheckResult {
    if path.exists() {
        CheckResult::ok(name, &path.display().to_string())
    } else {
        CheckResult::warning(
            name,
            &format!("{} (will be created)", path.display()),
            "Directory will be created on first use",
        )
    }
}

/// Create the directory if needed and probe it with a throwaway file.
fn writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    tempfile::NamedTempFile::new_in(dir).map(drop)
}

fn directory_size(dir: &Path) -> u64 {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.metadata().ok())
                .filter(|m| m.is_file())
                .map(|m| m.len())
                .sum()
        })
        .unwrap_or(0)
}

/// Check if the config file in use exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: omslag config edit",
        )
    }
}
