//! Configuration module for Omslag.
//!
//! Handles loading application settings, prompt templates and device selection.

mod device;
mod prompts;
mod settings;

pub use device::{detect_nvidia_gpu, Device, ResolvedDevice};
pub use prompts::{Prompts, SummarizationPrompts};
pub use settings::{
    GeneralSettings, ImageSettings, PipelineSettings, PromptSettings, ServerSettings, Settings,
    SummarizationSettings, TranscriptionProvider, TranscriptionSettings,
};
