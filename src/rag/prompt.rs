/// System message fixing the grounding contract for Q&A.
///
/// This wording is a tested invariant: the assistant answers only from the
/// supplied context and falls back to the "I don't know" sentinel otherwise.
/// It must stay identical across modes.
pub const QA_SYSTEM_MESSAGE: &str = "You are a helpful AI assistant.\n\
User input will have the context required to answer user questions.\n\
The context will begin with: ###Context.\n\
Only answer using the context provided; if not found, say \"I don't know\".";

/// System message for quiz generation.
///
/// The layout it mandates is a contract with `quiz::parser`, not cosmetics:
/// any change here must be mirrored in the parser and vice versa.
pub const QUIZ_SYSTEM_MESSAGE: &str = "You are a helpful AI assistant that creates \
multiple-choice quizzes.\n\
Write questions using only the context provided after ###Context.\n\
Format every question exactly like this:\n\
Question 1: <question text>\n\
A) <first option>\n\
B) <second option>\n\
C) <third option>\n\
D) <fourth option>\n\
Correct Answer: <letter>\n\
Explanation: <one or two sentences>";

/// A system/user message pair. Built per request, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system_message: String,
    pub user_message: String,
}

/// Assembles grounded prompts from retrieved context.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join context chunks in rank order with ". " and attach the question.
    /// Empty context still produces a well-formed pair; the grounding
    /// instruction then makes the model answer "I don't know".
    pub fn build_qa_prompt(&self, context: &[String], question: &str) -> PromptPair {
        PromptPair {
            system_message: QA_SYSTEM_MESSAGE.to_string(),
            user_message: format!(
                "###Context\n{}\n\n###Question\n{}",
                context.join(". "),
                question
            ),
        }
    }

    pub fn build_quiz_prompt(&self, context: &[String], question_count: usize) -> PromptPair {
        PromptPair {
            system_message: QUIZ_SYSTEM_MESSAGE.to_string(),
            user_message: format!(
                "###Context\n{}\n\nGenerate {} multiple-choice questions from the context above.",
                context.join(". "),
                question_count
            ),
        }
    }
}
