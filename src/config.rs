use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    InvalidChunking { size: usize, overlap: usize },
    #[error("{name} must be at least 1")]
    ZeroParameter { name: &'static str },
    #[error("failed to load tokenizer: {0}")]
    Tokenizer(String),
}

/// Retrieval and generation parameters for one session.
///
/// Every field has a stated default and can be overridden through the
/// environment (`STUDYMATE_*`). Chunking parameters are validated up front:
/// an overlap that reaches the window size would loop forever producing
/// duplicate chunks, so the whole config is rejected before any document
/// is touched.
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Tokens per chunk window.
    pub chunk_size: usize,
    /// Tokens shared between consecutive windows of the same document.
    pub chunk_overlap: usize,
    /// Chunks retrieved per question.
    pub qa_top_k: usize,
    /// Chunks retrieved per quiz request.
    pub quiz_top_k: usize,
    pub qa_temperature: f32,
    pub quiz_temperature: f32,
    /// Questions per generated quiz unless the caller asks for another count.
    pub quiz_question_count: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 16,
            qa_top_k: 5,
            quiz_top_k: 10,
            qa_temperature: 0.0,
            quiz_temperature: 0.3,
            quiz_question_count: 5,
        }
    }
}

impl RagConfig {
    /// Build a config from `STUDYMATE_*` environment variables, falling back
    /// to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            chunk_size: env_usize("STUDYMATE_CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: env_usize("STUDYMATE_CHUNK_OVERLAP", defaults.chunk_overlap),
            qa_top_k: env_usize("STUDYMATE_QA_TOP_K", defaults.qa_top_k),
            quiz_top_k: env_usize("STUDYMATE_QUIZ_TOP_K", defaults.quiz_top_k),
            qa_temperature: env_f32("STUDYMATE_QA_TEMPERATURE", defaults.qa_temperature),
            quiz_temperature: env_f32("STUDYMATE_QUIZ_TEMPERATURE", defaults.quiz_temperature),
            quiz_question_count: env_usize(
                "STUDYMATE_QUIZ_QUESTIONS",
                defaults.quiz_question_count,
            ),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroParameter { name: "chunk_size" });
        }
        if self.qa_top_k == 0 {
            return Err(ConfigError::ZeroParameter { name: "qa_top_k" });
        }
        if self.quiz_top_k == 0 {
            return Err(ConfigError::ZeroParameter { name: "quiz_top_k" });
        }
        if self.quiz_question_count == 0 {
            return Err(ConfigError::ZeroParameter {
                name: "quiz_question_count",
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidChunking {
                size: self.chunk_size,
                overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(RagConfig::default().validate().is_ok());
    }

    #[test]
    fn overlap_must_stay_below_chunk_size() {
        let config = RagConfig {
            chunk_size: 16,
            chunk_overlap: 16,
            ..RagConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChunking { size: 16, overlap: 16 })
        ));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let config = RagConfig {
            qa_top_k: 0,
            ..RagConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
