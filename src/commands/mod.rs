use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::ingestion::Ingestor;
use crate::providers::traits::{CompletionProvider, EmbeddingProvider};
use crate::quiz::parser::parse_quiz;
use crate::rag::index::VectorIndex;
use crate::rag::pipeline::{AnswerPipeline, QuizPipeline};
use crate::session::{ChatMode, ChatTurn, Session};

mod system;

pub struct CommandHandler {
    session: Session,
    ingestor: Ingestor,
    answer_pipeline: AnswerPipeline,
    quiz_pipeline: QuizPipeline,
    config: RagConfig,
}

impl CommandHandler {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn CompletionProvider>,
        config: RagConfig,
    ) -> Result<Self, String> {
        let ingestor = Ingestor::new(embedder.clone(), &config)
            .map_err(|e| format!("Failed to initialize ingestor: {}", e))?;

        Ok(Self {
            session: Session::default(),
            ingestor,
            answer_pipeline: AnswerPipeline::new(embedder.clone(), generator.clone(), config.clone()),
            quiz_pipeline: QuizPipeline::new(embedder, generator, config.clone()),
            config,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn handle_command(&mut self, input: &str) -> Result<(), String> {
        if input.is_empty() {
            return Ok(());
        }

        let input = input.trim();

        // Single-word commands first
        match input.to_lowercase().as_str() {
            "help" | "exit" | "quit" => return system::handle_command(input),
            "reset" => return self.reset_session(),
            "history" => return self.show_history(),
            "stats" => return self.show_stats(),
            _ => {}
        }

        let (command, rest) = match input.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (input, ""),
        };

        match command.to_lowercase().as_str() {
            "load" => self.load_documents(rest).await,
            "ask" => self.ask(rest, ChatMode::Qa).await,
            "cite" => self.ask(rest, ChatMode::QaCitations).await,
            "quiz" => self.quiz(rest).await,
            "mode" => self.switch_mode(rest),
            // Free text routes through the active mode, like typing into
            // the question box.
            _ => match self.session.mode {
                ChatMode::Qa => self.ask(input, ChatMode::Qa).await,
                ChatMode::QaCitations => self.ask(input, ChatMode::QaCitations).await,
                ChatMode::Quiz => self.quiz(input).await,
            },
        }
    }

    async fn load_documents(&mut self, rest: &str) -> Result<(), String> {
        let paths: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
        if paths.is_empty() {
            return Err("Usage: load <file.pdf|file.txt> [more files...]".to_string());
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .map_err(|e| e.to_string())?,
        );
        pb.set_message(format!("📚 Processing {} file(s)...", paths.len()));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));

        let result = self.ingestor.build_index(&paths).await;
        pb.finish_and_clear();

        let (index, report) = result.map_err(|e| format!("Failed to ingest documents: {}", e))?;

        for failure in &report.failures {
            println!("{}", format!("⚠️  Skipped: {}", failure).yellow());
        }

        if index.is_empty() {
            return Err("No text could be extracted from the given files.".to_string());
        }

        self.session
            .load(Box::new(index), report.pages, report.chunks);
        println!(
            "{}",
            format!(
                "✅ {} pages loaded | {} chunks created (in memory)",
                report.pages, report.chunks
            )
            .green()
        );
        Ok(())
    }

    async fn ask(&mut self, question: &str, kind: ChatMode) -> Result<(), String> {
        if question.is_empty() {
            return Err("Usage: ask <question>".to_string());
        }
        let index = self
            .session
            .index
            .as_deref()
            .ok_or("📂 No documents loaded. Use 'load <file>' first.")?;

        let (answer, context) = match kind {
            ChatMode::QaCitations => {
                let cited = self
                    .answer_pipeline
                    .answer_with_citations(index, question)
                    .await;
                println!("\n💬 {}", cited.text.bright_green());
                if !cited.citations.is_empty() {
                    println!("\n📑 Sources:");
                    for citation in &cited.citations {
                        let page = citation
                            .page_number
                            .map(|p| format!(", p.{}", p))
                            .unwrap_or_default();
                        println!(
                            "  • {}{} — {}",
                            citation.source_id.bright_yellow(),
                            page,
                            citation.preview.dimmed()
                        );
                    }
                }
                (cited.text, cited.context)
            }
            _ => {
                let outcome = self.answer_pipeline.answer(index, question).await;
                println!("\n💬 {}", outcome.text.bright_green());
                (outcome.text, outcome.context)
            }
        };

        self.session
            .record_turn(ChatTurn::new(question.to_string(), answer, context, kind));
        Ok(())
    }

    async fn quiz(&mut self, rest: &str) -> Result<(), String> {
        let index = self
            .session
            .index
            .as_deref()
            .ok_or("📂 No documents loaded. Use 'load <file>' first.")?;

        // "quiz", "quiz <topic>", "quiz <n>", "quiz <n> <topic>"
        let mut parts = rest.split_whitespace().peekable();
        let count = match parts.peek().and_then(|p| p.parse::<usize>().ok()) {
            Some(n) if n >= 1 => {
                parts.next();
                n
            }
            _ => self.config.quiz_question_count,
        };
        let topic = parts.collect::<Vec<_>>().join(" ");

        println!("📝 Generating a {}-question quiz...", count);
        let raw = self.quiz_pipeline.generate_quiz(index, &topic, count).await;
        let questions = parse_quiz(&raw);

        if questions.is_empty() {
            // Defined fallback: show whatever the model produced.
            println!("\n{}", raw);
        } else {
            for (i, question) in questions.iter().enumerate() {
                println!(
                    "\n{}",
                    format!("Question {}: {}", i + 1, question.question_text).bright_yellow()
                );
                for option in &question.options {
                    if question.is_correct(option.letter) {
                        println!("  {} ✅", format!("{}) {}", option.letter, option.text).green());
                    } else {
                        println!("  {}) {}", option.letter, option.text);
                    }
                }
                if !question.explanation.is_empty() {
                    println!("  {}", format!("💡 {}", question.explanation).dimmed());
                }
            }
        }

        self.session.record_turn(ChatTurn::new(
            if topic.is_empty() {
                format!("quiz ({} questions)", count)
            } else {
                format!("quiz on {} ({} questions)", topic, count)
            },
            raw,
            Vec::new(),
            ChatMode::Quiz,
        ));
        Ok(())
    }

    fn switch_mode(&mut self, rest: &str) -> Result<(), String> {
        self.session.mode = match rest.to_lowercase().as_str() {
            "qa" => ChatMode::Qa,
            "cite" | "citations" => ChatMode::QaCitations,
            "quiz" => ChatMode::Quiz,
            other => return Err(format!("Unknown mode: {} (qa | cite | quiz)", other)),
        };
        println!("🔀 Mode set to {:?}", self.session.mode);
        Ok(())
    }

    fn reset_session(&mut self) -> Result<(), String> {
        self.session.reset();
        println!("{}", "🔄 Session reset! Load new documents to start.".green());
        Ok(())
    }

    fn show_history(&self) -> Result<(), String> {
        if self.session.history.is_empty() {
            println!("💬 No conversation yet.");
            return Ok(());
        }
        println!("\n💬 Conversation History (newest first):");
        for turn in self.session.history.iter().rev() {
            println!("{}", format!("Q: {}", turn.question).bright_yellow());
            println!("{}\n", format!("A: {}", turn.answer).white());
        }
        Ok(())
    }

    fn show_stats(&self) -> Result<(), String> {
        if self.session.is_loaded() {
            println!(
                "📄 Session active: {} pages | {} chunks | {} turns | mode {:?}",
                self.session.page_count,
                self.session.chunk_count,
                self.session.history.len(),
                self.session.mode
            );
        } else {
            println!("📂 No documents loaded - use 'load <file>' to start.");
        }
        Ok(())
    }
}
