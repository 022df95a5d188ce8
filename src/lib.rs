pub mod api;
pub mod commands;
pub mod config;
pub mod ingestion;
pub mod providers;
pub mod quiz;
pub mod rag;
pub mod session;

// Re-export commonly used items
pub use config::RagConfig;
pub use quiz::parser::{parse_quiz, QuizQuestion};
pub use rag::pipeline::{AnswerPipeline, QuizPipeline};
pub use session::Session;
