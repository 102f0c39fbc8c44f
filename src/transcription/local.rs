//! Local transcription through the `whisper` command line tool.

use super::{source_id, Transcriber, Transcript};
use crate::config::ResolvedDevice;
use crate::error::{OmslagError, Result, Stage};
use crate::scratch::require_file;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Transcriber that shells out to a locally installed Whisper.
pub struct LocalWhisperTranscriber {
    command: String,
    model: String,
    device: ResolvedDevice,
    language: Option<String>,
}

impl LocalWhisperTranscriber {
    /// Create a transcriber running `command` with the given model size on `device`.
    pub fn with_config(
        command: &str,
        model: &str,
        device: ResolvedDevice,
        language: Option<&str>,
    ) -> Self {
        Self {
            command: command.to_string(),
            model: model.to_string(),
            device,
            language: language.map(|s| s.to_string()),
        }
    }

    pub fn device(&self) -> ResolvedDevice {
        self.device
    }
}

#[async_trait]
impl Transcriber for LocalWhisperTranscriber {
    #[instrument(skip(self), fields(path = %path.display(), model = %self.model, device = %self.device))]
    async fn transcribe(&self, path: &Path) -> Result<Transcript> {
        require_file(path)?;

        // whisper writes <stem>.txt into the output directory
        let output_dir = tempfile::tempdir()?;

        let mut command = Command::new(&self.command);
        command
            .arg(path)
            .arg("--model").arg(&self.model)
            .arg("--device").arg(self.device.as_str())
            .arg("--fp16").arg(if self.device.supports_fp16() { "True" } else { "False" })
            .arg("--output_format").arg("txt")
            .arg("--output_dir").arg(output_dir.path())
            .arg("--verbose").arg("False");

        if let Some(lang) = &self.language {
            command.arg("--language").arg(lang);
        }

        debug!("Running {}", self.command);

        // A dropped future (stage timeout) must not leave whisper running
        let result = command
            .kill_on_drop(true)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(OmslagError::ToolNotFound(self.command.clone()));
            }
            Err(e) => {
                return Err(OmslagError::inference(
                    Stage::Transcription,
                    format!("{} execution failed: {}", self.command, e),
                ));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OmslagError::inference(
                Stage::Transcription,
                format!("{} failed: {}", self.command, stderr.trim()),
            ));
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("audio");
        let text_path = output_dir.path().join(format!("{}.txt", stem));

        let text = tokio::fs::read_to_string(&text_path).await.map_err(|e| {
            OmslagError::inference(
                Stage::Transcription,
                format!("{} produced no transcript: {}", self.command, e),
            )
        })?;

        if text.trim().is_empty() {
            return Err(OmslagError::inference(
                Stage::Transcription,
                "model returned an empty transcript",
            ));
        }

        debug!("Transcribed {} characters", text.len());
        Ok(Transcript::new(text, source_id(path)))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Duration;

    /// Write a stand-in for the whisper CLI that logs its arguments.
    fn fake_whisper(dir: &Path, transcript: &str, exit_code: i32) -> (PathBuf, PathBuf) {
        let script = dir.join("fake-whisper");
        let args_log = dir.join("args.log");
        let body = format!(
            r#"#!/bin/sh
echo "$@" > "{log}"
input="$1"
shift
while [ $# -gt 0 ]; do
  if [ "$1" = "--output_dir" ]; then out="$2"; fi
  shift
done
stem=$(basename "$input")
stem="${{stem%.*}}"
printf '%s' "{text}" > "$out/$stem.txt"
echo "decoder exploded" >&2
exit {code}
"#,
            log = args_log.display(),
            text = transcript,
            code = exit_code,
        );
        std::fs::write(&script, body).unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        (script, args_log)
    }

    #[tokio::test]
    async fn test_runs_cli_on_resolved_device() {
        let dir = tempfile::tempdir().unwrap();
        let (script, args_log) = fake_whisper(dir.path(), " Hello there.", 0);
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"fake video").unwrap();

        let transcriber = LocalWhisperTranscriber::with_config(
            script.to_str().unwrap(),
            "base",
            ResolvedDevice::Cpu,
            Some("en"),
        );
        assert_eq!(transcriber.device(), ResolvedDevice::Cpu);
        let transcript = transcriber.transcribe(&video).await.unwrap();

        // Returned verbatim, leading space included
        assert_eq!(transcript.text, " Hello there.");
        assert_eq!(transcript.source_id.as_deref(), Some("clip"));

        let args = std::fs::read_to_string(args_log).unwrap();
        assert!(args.contains("--model base"));
        assert!(args.contains("--device cpu"));
        assert!(args.contains("--fp16 False"));
        assert!(args.contains("--language en"));
    }

    #[tokio::test]
    async fn test_cli_failure_is_inference_failure() {
        let dir = tempfile::tempdir().unwrap();
        let (script, _) = fake_whisper(dir.path(), "ignored", 3);
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"fake video").unwrap();

        let transcriber = LocalWhisperTranscriber::with_config(
            script.to_str().unwrap(),
            "base",
            ResolvedDevice::Cuda,
            None,
        );
        let err = transcriber.transcribe(&video).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InferenceFailure);
        assert!(err.to_string().contains("decoder exploded"));
    }

    #[tokio::test]
    async fn test_timed_out_run_kills_whisper() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-whisper");
        let marker = dir.path().join("finished");
        std::fs::write(
            &script,
            format!("#!/bin/sh\nsleep 1\ntouch \"{}\"\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"fake video").unwrap();

        let transcriber = LocalWhisperTranscriber::with_config(
            script.to_str().unwrap(),
            "base",
            ResolvedDevice::Cpu,
            None,
        );
        let result =
            tokio::time::timeout(Duration::from_millis(100), transcriber.transcribe(&video)).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!marker.exists(), "whisper kept running after the timeout");
    }

    #[tokio::test]
    async fn test_missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let transcriber =
            LocalWhisperTranscriber::with_config("whisper", "base", ResolvedDevice::Cpu, None);

        let err = transcriber
            .transcribe(&dir.path().join("nope.mp4"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"fake video").unwrap();

        let transcriber = LocalWhisperTranscriber::with_config(
            "omslag-no-such-whisper",
            "base",
            ResolvedDevice::Cpu,
            None,
        );
        let err = transcriber.transcribe(&video).await.unwrap_err();
        assert!(matches!(err, OmslagError::ToolNotFound(_)));
    }
}
