pub mod groq;
pub mod openai;
pub mod retry;
pub mod traits;

pub use groq::GroqProvider;
pub use openai::{OpenAIEmbeddings, OpenAIProvider};
pub use retry::with_retry;
pub use traits::{CompletionProvider, EmbeddingProvider};
