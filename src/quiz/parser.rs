//! Line-oriented recognizer for model-generated quiz text.
//!
//! The generator is asked for a fixed layout (see `rag::prompt`), but model
//! output only loosely follows it, so this is a tolerant two-pass scanner
//! rather than a grammar: pass one segments the text into per-question spans
//! using one of two heading styles, pass two walks each span's lines with a
//! small state machine. Parsing never fails; unusable input yields an empty
//! list and the caller falls back to showing the raw text.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Style A: "Question 3:" headings, case-insensitive, tolerating
    /// markdown emphasis and `.`/`)` in place of the colon.
    static ref QUESTION_HEADING: Regex =
        Regex::new(r"(?mi)^[ \t>]*[*#]*[ \t]*question[ \t]+\d+[ \t]*[:.)]+[*]*").unwrap();
    /// Style B fallback: plain "3." / "3)" numbered lines.
    static ref NUMBERED_HEADING: Regex = Regex::new(r"(?m)^[ \t]*\d+[.)][ \t]+").unwrap();
    /// Option lines: "A) text", "b. text", with optional emphasis.
    static ref OPTION_LINE: Regex = Regex::new(r"^(?i)\**([a-d])[.)][ \t]*(.*?)\**$").unwrap();
    /// Trailing answer letter on a "Correct Answer" line. The letter must
    /// stand alone at the end; "B) Paris" does not count.
    static ref CORRECT_LETTER: Regex = Regex::new(r"(?i)(?:^|[^a-z0-9])([a-d])[^a-z0-9]*$").unwrap();
    /// "Explanation: ..." label, stripped before storing the remainder.
    static ref EXPLANATION_LABEL: Regex = Regex::new(r"^(?i)\**explanation\**[ \t]*[:\-]?[ \t]*").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizOption {
    pub letter: char,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question_text: String,
    /// Encountered order, which is not guaranteed to be A, B, C, D when the
    /// source text is malformed.
    pub options: Vec<QuizOption>,
    pub correct_letter: char,
    pub explanation: String,
}

impl QuizQuestion {
    /// Whether `letter` names the correct option. Case-insensitive: the
    /// option line's letter and the recorded answer may disagree in case.
    pub fn is_correct(&self, letter: char) -> bool {
        letter.eq_ignore_ascii_case(&self.correct_letter)
    }
}

/// Scanner states for one question span.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SpanState {
    /// Waiting for the first non-empty line, which is the question text.
    SeekQuestionText,
    /// Collecting options, the correct-answer line and the explanation.
    InQuestionBody,
}

/// Parse raw quiz text into structured questions. Never fails: spans that
/// are missing a question, options or a correct letter are silently dropped,
/// and text with no recognizable headings yields an empty vec.
pub fn parse_quiz(raw: &str) -> Vec<QuizQuestion> {
    split_spans(raw).into_iter().filter_map(parse_span).collect()
}

/// Segment into per-question spans. The two heading styles are tried in
/// priority order and the first style producing any match wins; they are
/// never merged, to avoid double-counting a heading that matches both.
fn split_spans(raw: &str) -> Vec<&str> {
    for heading in [&*QUESTION_HEADING, &*NUMBERED_HEADING] {
        let matches: Vec<_> = heading.find_iter(raw).collect();
        if matches.is_empty() {
            continue;
        }
        // Each span runs from the end of its heading to the start of the
        // next heading (or end of text). Text before the first heading is
        // preamble and ignored.
        return matches
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let end = matches
                    .get(i + 1)
                    .map(|next| next.start())
                    .unwrap_or(raw.len());
                &raw[m.end()..end]
            })
            .collect();
    }
    Vec::new()
}

fn parse_span(span: &str) -> Option<QuizQuestion> {
    let mut state = SpanState::SeekQuestionText;
    let mut question_text = String::new();
    let mut options: Vec<QuizOption> = Vec::new();
    let mut correct_letter: Option<char> = None;
    let mut explanation = String::new();

    for line in span.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match state {
            SpanState::SeekQuestionText => {
                question_text = strip_emphasis(line).to_string();
                state = SpanState::InQuestionBody;
            }
            SpanState::InQuestionBody => {
                if let Some(caps) = OPTION_LINE.captures(line) {
                    let letter = caps[1].chars().next()?.to_ascii_uppercase();
                    options.push(QuizOption {
                        letter,
                        text: caps[2].trim().to_string(),
                    });
                } else if is_correct_answer_line(line) {
                    // Unset stays unset when no trailing letter is found.
                    correct_letter = CORRECT_LETTER
                        .captures(line)
                        .and_then(|caps| caps[1].chars().next())
                        .map(|c| c.to_ascii_uppercase());
                } else if let Some(m) = EXPLANATION_LABEL.find(line) {
                    explanation = strip_emphasis(&line[m.end()..]).to_string();
                }
                // Anything else is model chatter between fields; skip it.
            }
        }
    }

    // A span is a question only when all required fields are present.
    if question_text.is_empty() || options.is_empty() {
        return None;
    }
    correct_letter.map(|correct_letter| QuizQuestion {
        question_text,
        options,
        correct_letter,
        explanation,
    })
}

fn is_correct_answer_line(line: &str) -> bool {
    line.trim_start_matches(['*', '#', '>', '-', ' '])
        .to_lowercase()
        .starts_with("correct answer")
}

fn strip_emphasis(text: &str) -> &str {
    text.trim_matches(['*', ' ', '\t'])
}
