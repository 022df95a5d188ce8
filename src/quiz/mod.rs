pub mod parser;

pub use parser::{parse_quiz, QuizOption, QuizQuestion};
