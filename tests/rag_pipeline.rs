//! End-to-end pipeline tests with stub providers: ingest real temp files,
//! retrieve over the in-memory index, and exercise the answer/quiz flows
//! without touching a network.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tempfile::NamedTempFile;

use studymate::config::RagConfig;
use studymate::ingestion::Ingestor;
use studymate::providers::traits::{CompletionProvider, EmbeddingProvider};
use studymate::rag::index::VectorIndex;
use studymate::rag::pipeline::{AnswerPipeline, QuizPipeline, GENERIC_QUIZ_QUERY};
use studymate::session::{ChatMode, ChatTurn, Session};
use studymate::parse_quiz;

/// Deterministic bag-of-words embedding: each lowercase word hashes into a
/// fixed bucket. Shared vocabulary between a chunk and a question gives them
/// a higher cosine score, which is all retrieval needs here.
#[derive(Clone)]
struct BagOfWordsEmbedder {
    queries: Arc<Mutex<Vec<String>>>,
}

impl BagOfWordsEmbedder {
    fn new() -> Self {
        Self {
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.queries.lock().unwrap().push(text.to_string());
        let mut vector = vec![0.0f32; 64];
        for word in text.to_lowercase().split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric());
            if word.is_empty() {
                continue;
            }
            let bucket = word
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize))
                % 64;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn model_name(&self) -> String {
        "bag-of-words-stub".to_string()
    }

    fn clone_box(&self) -> Box<dyn EmbeddingProvider> {
        Box::new(self.clone())
    }
}

#[derive(Clone)]
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(anyhow!("embedding service unavailable"))
    }

    fn model_name(&self) -> String {
        "failing-stub".to_string()
    }

    fn clone_box(&self) -> Box<dyn EmbeddingProvider> {
        Box::new(self.clone())
    }
}

/// Echoes the retrieved context back so a test can assert what the prompt
/// actually carried.
#[derive(Clone)]
struct EchoGenerator {
    reply: String,
}

#[async_trait]
impl CompletionProvider for EchoGenerator {
    async fn complete(
        &self,
        _system_message: &str,
        user_message: &str,
        _temperature: f32,
    ) -> Result<String> {
        if user_message.contains("Paris") {
            Ok(self.reply.clone())
        } else {
            Ok("I don't know".to_string())
        }
    }

    async fn model_info(&self) -> Result<String> {
        Ok("echo-stub".to_string())
    }

    fn clone_box(&self) -> Box<dyn CompletionProvider> {
        Box::new(self.clone())
    }
}

#[derive(Clone)]
struct FailingGenerator;

#[async_trait]
impl CompletionProvider for FailingGenerator {
    async fn complete(
        &self,
        _system_message: &str,
        _user_message: &str,
        _temperature: f32,
    ) -> Result<String> {
        Err(anyhow!("model overloaded"))
    }

    async fn model_info(&self) -> Result<String> {
        Ok("failing-stub".to_string())
    }

    fn clone_box(&self) -> Box<dyn CompletionProvider> {
        Box::new(self.clone())
    }
}

/// Returns a fixed two-question quiz regardless of input.
#[derive(Clone)]
struct CannedQuizGenerator;

#[async_trait]
impl CompletionProvider for CannedQuizGenerator {
    async fn complete(
        &self,
        _system_message: &str,
        _user_message: &str,
        _temperature: f32,
    ) -> Result<String> {
        Ok("Question 1: What is the capital of France?\n\
            A) Berlin\n\
            B) Paris\n\
            C) Madrid\n\
            D) Rome\n\
            Correct Answer: B\n\
            Explanation: Paris has been the capital since 987.\n\
            \n\
            Question 2: Which river runs through Paris?\n\
            A) The Seine\n\
            B) The Thames\n\
            C) The Danube\n\
            D) The Rhine\n\
            Correct Answer: A\n\
            Explanation: The Seine bisects the city.\n"
            .to_string())
    }

    async fn model_info(&self) -> Result<String> {
        Ok("canned-quiz-stub".to_string())
    }

    fn clone_box(&self) -> Box<dyn CompletionProvider> {
        Box::new(self.clone())
    }
}

fn write_temp_doc(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn test_config() -> RagConfig {
    RagConfig::default()
}

#[tokio::test]
async fn ingest_then_answer_grounded_question() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let config = test_config();

    let doc = write_temp_doc(
        "The capital of France is Paris. \
         The Alps form the highest mountain range in western Europe. \
         Rust is a systems programming language.",
    );

    let ingestor = Ingestor::new(embedder.clone(), &config).unwrap();
    let (index, report) = ingestor
        .build_index(&[doc.path().to_string_lossy().to_string()])
        .await
        .unwrap();

    assert_eq!(report.documents, 1);
    assert_eq!(report.pages, 1);
    assert!(report.chunks >= 1);
    assert!(report.failures.is_empty());
    assert!(!index.is_empty());

    let pipeline = AnswerPipeline::new(
        embedder,
        Arc::new(EchoGenerator {
            reply: "The capital of France is Paris.".to_string(),
        }),
        config,
    );

    let outcome = pipeline
        .answer(&index, "What is the capital of France?")
        .await;

    assert!(outcome.text.contains("Paris"));
    assert!(!outcome.context.is_empty());
    assert!(outcome.context.iter().any(|c| c.contains("Paris")));
}

#[tokio::test]
async fn citations_carry_source_and_preview() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let config = test_config();

    let doc = write_temp_doc("The capital of France is Paris.");
    let path = doc.path().to_string_lossy().to_string();

    let ingestor = Ingestor::new(embedder.clone(), &config).unwrap();
    let (index, _) = ingestor.build_index(&[path.clone()]).await.unwrap();

    let pipeline = AnswerPipeline::new(
        embedder,
        Arc::new(EchoGenerator {
            reply: "Paris.".to_string(),
        }),
        config,
    );

    let cited = pipeline
        .answer_with_citations(&index, "capital of France?")
        .await;

    assert!(!cited.citations.is_empty());
    let citation = &cited.citations[0];
    let file_name = std::path::Path::new(&path)
        .file_name()
        .unwrap()
        .to_string_lossy();
    assert_eq!(citation.source_id, file_name);
    assert!(citation.preview.contains("Paris"));
}

#[tokio::test]
async fn generation_failure_becomes_error_answer() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let config = test_config();

    let doc = write_temp_doc("The capital of France is Paris.");
    let ingestor = Ingestor::new(embedder.clone(), &config).unwrap();
    let (index, _) = ingestor
        .build_index(&[doc.path().to_string_lossy().to_string()])
        .await
        .unwrap();

    let pipeline = AnswerPipeline::new(embedder, Arc::new(FailingGenerator), config);
    let outcome = pipeline.answer(&index, "capital of France?").await;

    // The fault is folded into the answer text; the turn is still complete.
    assert!(outcome.text.starts_with("❌ Error:"));
    assert!(!outcome.context.is_empty());

    let mut session = Session::default();
    session.record_turn(ChatTurn::new(
        "capital of France?".to_string(),
        outcome.text.clone(),
        outcome.context,
        ChatMode::Qa,
    ));
    assert_eq!(session.history.len(), 1);
    assert!(session.history[0].answer.starts_with("❌ Error:"));
}

#[tokio::test]
async fn embedding_failure_surfaces_as_error_answer() {
    let config = test_config();

    // Build a valid index first, then swap in a broken embedder for queries.
    let good = Arc::new(BagOfWordsEmbedder::new());
    let doc = write_temp_doc("The capital of France is Paris.");
    let ingestor = Ingestor::new(good, &config).unwrap();
    let (index, _) = ingestor
        .build_index(&[doc.path().to_string_lossy().to_string()])
        .await
        .unwrap();

    let pipeline = AnswerPipeline::new(
        Arc::new(FailingEmbedder),
        Arc::new(EchoGenerator {
            reply: "unreachable".to_string(),
        }),
        config,
    );
    let outcome = pipeline.answer(&index, "capital of France?").await;

    assert!(outcome.text.starts_with("❌ Error:"));
    assert!(outcome.context.is_empty());
}

#[tokio::test]
async fn blank_quiz_topic_uses_generic_query() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let config = test_config();

    let doc = write_temp_doc("The capital of France is Paris.");
    let ingestor = Ingestor::new(embedder.clone(), &config).unwrap();
    let (index, _) = ingestor
        .build_index(&[doc.path().to_string_lossy().to_string()])
        .await
        .unwrap();

    let pipeline = QuizPipeline::new(embedder.clone(), Arc::new(CannedQuizGenerator), config);
    let raw = pipeline.generate_quiz(&index, "  ", 2).await;

    let queries = embedder.queries.lock().unwrap();
    assert!(queries.iter().any(|q| q == GENERIC_QUIZ_QUERY));

    let questions = parse_quiz(&raw);
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].correct_letter, 'B');
    assert_eq!(questions[1].options.len(), 4);
    assert!(questions[1].options[0].text.contains("Seine"));
}

#[tokio::test]
async fn reset_clears_loaded_session() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let config = test_config();

    let doc = write_temp_doc("The capital of France is Paris.");
    let ingestor = Ingestor::new(embedder, &config).unwrap();
    let (index, report) = ingestor
        .build_index(&[doc.path().to_string_lossy().to_string()])
        .await
        .unwrap();

    let mut session = Session::default();
    session.load(Box::new(index), report.pages, report.chunks);
    session.record_turn(ChatTurn::new(
        "q".to_string(),
        "a".to_string(),
        Vec::new(),
        ChatMode::Qa,
    ));
    session.mode = ChatMode::Quiz;
    assert!(session.index.is_some());

    session.reset();

    assert!(session.index.is_none());
    assert!(session.history.is_empty());
    assert_eq!(session.mode, ChatMode::Qa);
    assert_eq!(session.page_count, 0);
    assert_eq!(session.chunk_count, 0);
}

#[tokio::test]
async fn unreadable_document_is_skipped_not_fatal() {
    let embedder = Arc::new(BagOfWordsEmbedder::new());
    let config = test_config();

    let good = write_temp_doc("The capital of France is Paris.");
    let ingestor = Ingestor::new(embedder, &config).unwrap();
    let (index, report) = ingestor
        .build_index(&[
            "/nonexistent/missing.txt".to_string(),
            good.path().to_string_lossy().to_string(),
        ])
        .await
        .unwrap();

    assert_eq!(report.documents, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(!index.is_empty());
}
