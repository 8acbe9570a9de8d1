//! Engine that writes announcements to the log

use crate::engines::TtsEngine;
use crate::error::SpeechError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::info;

/// Number of recent announcements kept by [`LoggingEngine`]
pub const HISTORY_LEN: usize = 32;

/// Logs every announcement and remembers the most recent ones.
#[derive(Debug, Default)]
pub struct LoggingEngine {
    recent: Mutex<VecDeque<String>>,
}

impl LoggingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last [`HISTORY_LEN`] announcements, oldest first
    pub fn spoken(&self) -> Vec<String> {
        self.recent.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl TtsEngine for LoggingEngine {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        info!("Announce: {}", text);
        let mut recent = self.recent.lock();
        if recent.len() == HISTORY_LEN {
            recent.pop_front();
        }
        recent.push_back(text.to_string());
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "logging"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_engine_records() {
        let engine = LoggingEngine::new();
        tokio_test::block_on(async {
            engine.speak("left").await.unwrap();
            engine.speak("straight").await.unwrap();
        });
        assert_eq!(engine.spoken(), vec!["left", "straight"]);
        assert_eq!(engine.name(), "logging");
    }

    #[test]
    fn test_history_keeps_only_recent() {
        let engine = LoggingEngine::new();
        tokio_test::block_on(async {
            for i in 0..HISTORY_LEN + 10 {
                engine.speak(&format!("word{}", i)).await.unwrap();
            }
        });
        let spoken = engine.spoken();
        assert_eq!(spoken.len(), HISTORY_LEN);
        assert_eq!(spoken[0], "word10");
        assert_eq!(spoken[HISTORY_LEN - 1], format!("word{}", HISTORY_LEN + 9));
    }
}
