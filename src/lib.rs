//! Omslag - Video to Cover Image
//!
//! Turns an uploaded video into a stylized cover image.
//!
//! The name "Omslag" is the Norwegian word for "cover."
//!
//! # Overview
//!
//! Every request runs the same three model stages in order:
//! - Transcribe the video's speech with Whisper
//! - Summarize the transcript into a short, visual description
//! - Render that description, plus a style and a color, into one image
//!
//! Intermediate files live only for the duration of a request.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration, prompts and device selection
//! - `scratch` - Per-request temporary files
//! - `transcription` - Speech-to-text
//! - `summarization` - Transcript condensation
//! - `imaging` - Text-to-image generation
//! - `orchestrator` - Pipeline coordination
//! - `cli` - Command line interface and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use omslag::config::Settings;
//! use omslag::orchestrator::{Orchestrator, StylePreferences};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let video = std::fs::read("talk.mp4")?;
//!     let style = StylePreferences::new("watercolor", "blue");
//!     let cover = orchestrator.process(&video, "talk.mp4", &style).await?;
//!     println!("Cover written to {}", cover.path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod imaging;
pub mod openai;
pub mod orchestrator;
pub mod scratch;
pub mod summarization;
pub mod transcription;

pub use error::{ErrorKind, OmslagError, PipelineError, Result, Stage};
