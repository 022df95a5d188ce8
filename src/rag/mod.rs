pub mod chunker;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod retriever;

pub use chunker::{Chunk, Chunker};
pub use index::{InMemoryVectorIndex, IndexedEntry, VectorIndex};
pub use pipeline::{AnswerPipeline, QuizPipeline};
pub use prompt::{PromptBuilder, PromptPair};
pub use retriever::{RetrievalResult, Retriever};
