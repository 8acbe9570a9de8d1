//! Native platform TTS engine

use crate::config::SpeechConfig;
use crate::engines::TtsEngine;
use crate::error::SpeechError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

const MAX_TEXT_LEN: usize = 100_000;

/// Speaks through the platform's command-line synthesizer.
pub struct NativeTtsEngine {
    program: &'static str,
    available: bool,
    rate: u32,
    volume: f32,
    pitch: f32,
    voice: Option<String>,
    language: String,
}

#[cfg(target_os = "macos")]
const PROGRAM: &str = "say";
#[cfg(target_os = "macos")]
const PROBE_ARGS: &[&str] = &["-v", "?"];

#[cfg(not(target_os = "macos"))]
const PROGRAM: &str = "espeak-ng";
#[cfg(not(target_os = "macos"))]
const PROBE_ARGS: &[&str] = &["--version"];

impl NativeTtsEngine {
    pub fn from_config(config: &SpeechConfig) -> Self {
        let available = std::process::Command::new(PROGRAM)
            .args(PROBE_ARGS)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok();
        if !available {
            warn!("{} not found", PROGRAM);
        }
        Self {
            program: PROGRAM,
            available,
            rate: config.rate,
            volume: config.volume,
            pitch: config.pitch,
            voice: config.voice.name.clone(),
            language: config.voice.language.clone(),
        }
    }

    pub fn program(&self) -> &str {
        self.program
    }

    /// Command-line arguments that speak `text`
    pub fn args(&self, text: &str) -> Vec<String> {
        if self.program == "say" {
            let mut args = vec!["-r".to_string(), self.rate.to_string()];
            if let Some(ref voice) = self.voice {
                args.push("-v".to_string());
                args.push(voice.clone());
            }
            args.push(text.to_string());
            return args;
        }

        // espeak-ng amplitude is 0-200 with 100 normal, pitch 0-99 with 50 normal
        let amplitude = ((self.volume * 200.0).round() as u32).min(200);
        let pitch = ((50.0 + self.pitch * 49.0).round().max(0.0) as u32).min(99);
        let voice = self
            .voice
            .clone()
            .unwrap_or_else(|| self.language.to_lowercase());
        vec![
            "-s".to_string(),
            self.rate.to_string(),
            "-a".to_string(),
            amplitude.to_string(),
            "-p".to_string(),
            pitch.to_string(),
            "-v".to_string(),
            voice,
            text.to_string(),
        ]
    }
}

/// Strips control and shell metacharacters and leading dashes that would read as options.
pub fn sanitize(text: &str) -> Result<String, SpeechError> {
    if text.len() > MAX_TEXT_LEN {
        return Err(SpeechError::Engine("Text too long (max 100KB)".to_string()));
    }
    let sanitized: String = text
        .chars()
        .filter(|c| {
            !c.is_control() && !matches!(c, ';' | '|' | '&' | '$' | '`' | '(' | ')' | '<' | '>')
        })
        .collect();
    let sanitized = sanitized.trim().trim_start_matches('-').trim_start().to_string();
    if sanitized.is_empty() {
        return Err(SpeechError::Engine("Text is empty after sanitization".to_string()));
    }
    Ok(sanitized)
}

#[async_trait]
impl TtsEngine for NativeTtsEngine {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if !self.available {
            return Err(SpeechError::Engine(format!("{} not available", self.program)));
        }
        let text = sanitize(text)?;
        debug!("{} speaking {:?}", self.program, text);

        let output = Command::new(self.program)
            .args(self.args(&text))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(SpeechError::Engine(format!(
                "{} failed: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &str {
        "native"
    }
}
