//! CLI module for Omslag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Omslag - Video to Cover Image
///
/// Transcribes a video, summarizes what it is about and renders a stylized
/// cover image from that summary.
/// The name "Omslag" is the Norwegian word for "cover."
#[derive(Parser, Debug)]
#[command(name = "omslag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check system requirements and configuration
    Doctor,

    /// Generate a cover image for a local video file
    Generate {
        /// Path to the video file
        video: String,

        /// Visual style of the cover (e.g. "watercolor")
        #[arg(short, long, default_value = "")]
        style: String,

        /// Dominant color of the cover (e.g. "blue")
        #[arg(long, default_value = "")]
        color: String,

        /// Copy the cover to this path as well
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Transcribe a video or audio file
    Transcribe {
        /// Path to the media file
        input: String,

        /// Lowercase the transcript and strip punctuation
        #[arg(long)]
        normalize: bool,

        /// Write the transcript to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Summarize a transcript text file
    Summarize {
        /// Path to the transcript
        input: String,
    },

    /// Start HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "summarization.max_input_chars")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "omslag", "-vv", "generate", "talk.mp4", "--style", "watercolor", "--color", "blue",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Generate {
                video,
                style,
                color,
                output,
            } => {
                assert_eq!(video, "talk.mp4");
                assert_eq!(style, "watercolor");
                assert_eq!(color, "blue");
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_style_defaults_to_empty() {
        let cli = Cli::try_parse_from(["omslag", "generate", "talk.mp4"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Generate { ref style, ref color, .. } if style.is_empty() && color.is_empty()
        ));
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from([
            "omslag",
            "config",
            "set",
            "summarization.max_input_chars",
            "2048",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config { action: ConfigAction::Set { .. } }
        ));
    }
}
