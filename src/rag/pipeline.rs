use std::sync::Arc;

use crate::config::RagConfig;
use crate::providers::retry::with_retry;
use crate::providers::traits::{CompletionProvider, EmbeddingProvider};
use crate::rag::index::VectorIndex;
use crate::rag::prompt::PromptBuilder;
use crate::rag::retriever::Retriever;

/// Fixed retrieval query used when a quiz is requested without a topic.
pub const GENERIC_QUIZ_QUERY: &str = "main concepts key points important information";

/// Displayed chunk text is capped for citation previews. Presentation only.
const CITATION_PREVIEW_CHARS: usize = 160;

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub text: String,
    pub context: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Citation {
    pub source_id: String,
    pub page_number: Option<u32>,
    pub preview: String,
}

#[derive(Debug, Clone)]
pub struct CitedAnswer {
    pub text: String,
    pub context: Vec<String>,
    pub citations: Vec<Citation>,
}

/// Retriever → PromptBuilder → Generator for plain Q&A and citations mode.
///
/// Generator and retrieval failures are caught here and written into the
/// answer text; the pipeline never propagates a fault or leaves a turn
/// half-finished.
pub struct AnswerPipeline {
    retriever: Retriever,
    prompts: PromptBuilder,
    generator: Arc<dyn CompletionProvider>,
    config: RagConfig,
}

impl AnswerPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn CompletionProvider>,
        config: RagConfig,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder),
            prompts: PromptBuilder,
            generator,
            config,
        }
    }

    pub async fn answer(&self, index: &dyn VectorIndex, question: &str) -> AnswerOutcome {
        let context = match self
            .retriever
            .retrieve(index, question, self.config.qa_top_k)
            .await
        {
            Ok(context) => context,
            Err(e) => {
                return AnswerOutcome {
                    text: format!("❌ Error: {}", e),
                    context: Vec::new(),
                }
            }
        };

        let text = self.generate_qa_answer(&context, question).await;
        AnswerOutcome { text, context }
    }

    pub async fn answer_with_citations(
        &self,
        index: &dyn VectorIndex,
        question: &str,
    ) -> CitedAnswer {
        let retrieved = match self
            .retriever
            .retrieve_with_metadata(index, question, self.config.qa_top_k)
            .await
        {
            Ok(retrieved) => retrieved,
            Err(e) => {
                return CitedAnswer {
                    text: format!("❌ Error: {}", e),
                    context: Vec::new(),
                    citations: Vec::new(),
                }
            }
        };

        let context = retrieved.context_texts();
        let text = self.generate_qa_answer(&context, question).await;
        let citations = retrieved
            .hits
            .iter()
            .map(|hit| Citation {
                source_id: hit.source_id.clone(),
                page_number: hit.page_number,
                preview: preview(&hit.text),
            })
            .collect();

        CitedAnswer {
            text,
            context,
            citations,
        }
    }

    async fn generate_qa_answer(&self, context: &[String], question: &str) -> String {
        let prompt = self.prompts.build_qa_prompt(context, question);
        let completion = with_retry("completion", || {
            self.generator.complete(
                &prompt.system_message,
                &prompt.user_message,
                self.config.qa_temperature,
            )
        })
        .await;

        match completion {
            Ok(text) => text.trim().to_string(),
            Err(e) => format!("❌ Error: {}", e),
        }
    }
}

/// Retriever → PromptBuilder (quiz template) → Generator; returns raw quiz
/// text for `quiz::parser` to structure. Temperature is deliberately higher
/// than QA mode for lexical variety.
pub struct QuizPipeline {
    retriever: Retriever,
    prompts: PromptBuilder,
    generator: Arc<dyn CompletionProvider>,
    config: RagConfig,
}

impl QuizPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn CompletionProvider>,
        config: RagConfig,
    ) -> Self {
        Self {
            retriever: Retriever::new(embedder),
            prompts: PromptBuilder,
            generator,
            config,
        }
    }

    pub async fn generate_quiz(
        &self,
        index: &dyn VectorIndex,
        topic: &str,
        num_questions: usize,
    ) -> String {
        let query = if topic.trim().is_empty() {
            GENERIC_QUIZ_QUERY
        } else {
            topic
        };

        let context = match self
            .retriever
            .retrieve(index, query, self.config.quiz_top_k)
            .await
        {
            Ok(context) => context,
            Err(e) => return format!("❌ Error: {}", e),
        };

        let prompt = self.prompts.build_quiz_prompt(&context, num_questions);
        let completion = with_retry("quiz completion", || {
            self.generator.complete(
                &prompt.system_message,
                &prompt.user_message,
                self.config.quiz_temperature,
            )
        })
        .await;

        match completion {
            Ok(text) => text.trim().to_string(),
            Err(e) => format!("❌ Error: {}", e),
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= CITATION_PREVIEW_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(CITATION_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}
