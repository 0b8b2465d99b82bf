//! Text chat assistant: a fuzzy-matched Q&A bank and a session assistant.
//!
//! ## Why token-set matching?
//!
//! Users type questions in their own words and word order ("name your what
//! is" still means "what is your name"). Token-set scoring compares the
//! *sets* of words, so reordering and extra filler words cost little while
//! unrelated questions still score low.
//!
//! Similarity between the rebuilt strings is Indel similarity: twice the
//! longest common subsequence over the combined length, scaled to 0–100.
//! Unlike Levenshtein, a substitution costs a deletion plus an insertion, so
//! a query that is a prefix of a question keeps a high score.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Minimum token-set score (0–100) for a bank entry to be used.
pub const MATCH_THRESHOLD: f64 = 40.0;

pub const NO_DATA_REPLY: &str = "I don't have any data to answer your question. Please try again.";
pub const REPHRASE_REPLY: &str = "Could you please rephrase your question?";
pub const END_SESSION_REPLY: &str =
    "Okay, ending our voice session now. If you need anything else, just start me again.";

/// Phrases that end a session when found anywhere in a message.
pub const STOP_KEYWORDS: [&str; 4] = ["stop", "bye", "thank you", "thanks, bye"];

const QUESTION_COLUMNS: [&str; 3] = ["Question", "question", "Q"];
const ANSWER_COLUMNS: [&str; 3] = ["Answer", "answer", "A"];

/// One question and its canned answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

impl QaPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Read-only question bank shared by every request.
#[derive(Debug, Clone, Default)]
pub struct QaBank {
    pairs: Vec<QaPair>,
}

impl QaBank {
    pub fn new(pairs: Vec<QaPair>) -> Self {
        Self { pairs }
    }

    /// Load pairs from a CSV file, falling back to [`QaBank::sample`] when
    /// the file is missing, unreadable, or yields no usable rows.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.is_file() {
            warn!("Q&A file not found at {}; using sample data", path.display());
            return Self::sample();
        }
        match read_pairs(path) {
            Ok(pairs) if !pairs.is_empty() => {
                info!("Loaded {} Q&A pairs from {}", pairs.len(), path.display());
                Self { pairs }
            }
            Ok(_) => {
                warn!("No Q&A rows in {}; using sample data", path.display());
                Self::sample()
            }
            Err(e) => {
                warn!("Error loading {}: {}; using sample data", path.display(), e);
                Self::sample()
            }
        }
    }

    /// Load from `path` when given, else the sample bank.
    pub fn load_or_sample(path: Option<&Path>) -> Self {
        match path {
            Some(p) => Self::load(p),
            None => Self::sample(),
        }
    }

    /// The built-in demonstration bank.
    pub fn sample() -> Self {
        let pairs = vec![
            QaPair::new(
                "Hello, how are you?",
                "I am doing well, thank you for asking! How can I help you today?",
            ),
            QaPair::new(
                "What is your name?",
                "I am an offline voice assistant chatbot designed to help answer your questions.",
            ),
            QaPair::new(
                "How can I use this chatbot?",
                "You can either click the microphone button to speak your question or type it in the text box. I will respond with both text and voice.",
            ),
            QaPair::new(
                "Tell me a joke",
                "Why don't scientists trust atoms? Because they make up everything!",
            ),
            QaPair::new(
                "What is artificial intelligence?",
                "Artificial Intelligence (AI) is the simulation of human intelligence processes by machines, especially computer systems. These processes include learning, reasoning, and self-correction.",
            ),
            QaPair::new(
                "Can you help me?",
                "Of course! I am here to help. Please ask me any questions you have.",
            ),
        ];
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[QaPair] {
        &self.pairs
    }

    /// Answer `question` with the best-scoring entry, or a fixed fallback.
    pub fn best_answer(&self, question: &str) -> String {
        if self.pairs.is_empty() {
            return NO_DATA_REPLY.to_string();
        }
        if question.trim().is_empty() {
            return REPHRASE_REPLY.to_string();
        }

        let query = question.to_lowercase();
        let mut best: Option<(&QaPair, f64)> = None;
        for pair in &self.pairs {
            let score = token_set_ratio(&query, &pair.question.to_lowercase());
            // Strictly greater: the first entry wins ties.
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((pair, score));
            }
        }

        match best {
            Some((pair, score)) if score >= MATCH_THRESHOLD => pair.answer.clone(),
            _ => format!(
                "I'm not sure how to answer that question about '{}'. Could you rephrase it or ask something else?",
                question
            ),
        }
    }
}

fn read_pairs(path: &Path) -> Result<Vec<QaPair>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim_start_matches('\u{feff}').to_string())
        .collect();

    let column = |names: &[&str]| -> Vec<usize> {
        names
            .iter()
            .filter_map(|n| headers.iter().position(|h| h == n))
            .collect()
    };
    let q_cols = column(&QUESTION_COLUMNS);
    let a_cols = column(&ANSWER_COLUMNS);

    let mut pairs = Vec::new();
    for record in reader.byte_records() {
        let record = record?;
        let pick = |cols: &[usize]| -> String {
            cols.iter()
                .filter_map(|&i| record.get(i))
                .map(|v| String::from_utf8_lossy(v).trim().to_string())
                .find(|v| !v.is_empty())
                .unwrap_or_default()
        };
        let (question, answer) = (pick(&q_cols), pick(&a_cols));
        if !question.is_empty() && !answer.is_empty() {
            pairs.push(QaPair { question, answer });
        }
    }
    Ok(pairs)
}

/// Token-set similarity on a 0–100 scale.
///
/// Both inputs are split on whitespace into word sets. The shared words and
/// each side's leftovers are sorted and rebuilt into strings, and the best
/// pairwise similarity among them is returned. A set that is a subset of the
/// other scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let left: BTreeSet<&str> = a.split_whitespace().collect();
    let right: BTreeSet<&str> = b.split_whitespace().collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = left.intersection(&right).copied().collect();
    let only_left: Vec<&str> = left.difference(&right).copied().collect();
    let only_right: Vec<&str> = right.difference(&left).copied().collect();

    if !common.is_empty() && (only_left.is_empty() || only_right.is_empty()) {
        return 100.0;
    }

    let base = common.join(" ");
    let with = |rest: &[&str]| -> String {
        match (base.is_empty(), rest.is_empty()) {
            (true, _) => rest.join(" "),
            (false, true) => base.clone(),
            (false, false) => format!("{} {}", base, rest.join(" ")),
        }
    };
    let combined_left = with(&only_left);
    let combined_right = with(&only_right);

    let mut best = ratio(&combined_left, &combined_right);
    if !base.is_empty() {
        best = best
            .max(ratio(&base, &combined_left))
            .max(ratio(&base, &combined_right));
    }
    best
}

/// Indel similarity of two strings on a 0–100 scale. Two empty strings are
/// identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Length of the longest common subsequence, one DP row at a time.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            cur[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Reply from the session assistant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    #[serde(default)]
    pub end_session: bool,
}

/// Who is talking to the session assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Customer,
    Employee,
}

impl UserType {
    /// `"employee"` selects the internal assistant; anything else is a customer.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("employee") => Self::Employee,
            _ => Self::Customer,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Self::Employee => "[Internal assistant] ",
            Self::Customer => "[Customer assistant] ",
        }
    }
}

/// Echo `message` back, or end the session when it contains a stop keyword.
pub fn session_reply(message: &str, user_type: UserType) -> ChatReply {
    let lower = message.to_lowercase();
    if STOP_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return ChatReply {
            reply: END_SESSION_REPLY.to_string(),
            end_session: true,
        };
    }
    ChatReply {
        reply: format!("{}You said: {}", user_type.prefix(), message),
        end_session: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn identical_and_reordered_questions_score_100() {
        assert_eq!(token_set_ratio("what is your name", "what is your name"), 100.0);
        assert_eq!(token_set_ratio("your name is what", "what is your name"), 100.0);
        assert_eq!(token_set_ratio("name", "what is your name"), 100.0);
    }

    #[test]
    fn unrelated_questions_score_low() {
        let score = token_set_ratio("xylophone zebra", "what is your name?");
        assert!(score < MATCH_THRESHOLD, "score {score}");
        assert_eq!(token_set_ratio("", "anything"), 0.0);
    }

    #[test]
    fn best_answer_matches_sample_bank() {
        let bank = QaBank::sample();
        assert_eq!(bank.len(), 6);
        let reply = bank.best_answer("What is your name?");
        assert!(reply.starts_with("I am an offline voice assistant"));
        let joke = bank.best_answer("tell me a joke please");
        assert!(joke.contains("atoms"));
    }

    #[test]
    fn indel_ratio_counts_common_subsequence() {
        assert_eq!(ratio("", ""), 100.0);
        assert_eq!(ratio("abc", ""), 0.0);
        // lcs("jokes", "joke") = 4 -> 8/9
        assert!((ratio("jokes", "joke") - 800.0 / 9.0).abs() < 1e-9);
        // one substitution costs two edits
        assert_eq!(ratio("cat", "cut"), 200.0 * 2.0 / 6.0);
    }

    #[test]
    fn short_queries_clear_the_threshold() {
        let bank = QaBank::sample();
        let score = token_set_ratio("jokes", "tell me a joke");
        assert!(score > MATCH_THRESHOLD && score < 43.0, "score {score}");
        assert!(bank.best_answer("jokes").contains("atoms"));
        assert!(bank.best_answer("using chatbot").contains("microphone"));
        assert!(bank
            .best_answer("your identity")
            .starts_with("I am an offline voice assistant"));
    }

    #[test]
    fn best_answer_fallbacks() {
        assert_eq!(QaBank::default().best_answer("hi"), NO_DATA_REPLY);
        assert_eq!(QaBank::sample().best_answer("   "), REPHRASE_REPLY);
        assert_eq!(
            QaBank::sample().best_answer("qqqq zzzz"),
            "I'm not sure how to answer that question about 'qqqq zzzz'. Could you rephrase it or ask something else?"
        );
    }

    #[test]
    fn ties_keep_first_entry() {
        let bank = QaBank::new(vec![
            QaPair::new("opening hours", "first"),
            QaPair::new("opening hours", "second"),
        ]);
        assert_eq!(bank.best_answer("opening hours"), "first");
    }

    #[test]
    fn load_accepts_alternate_columns_and_skips_blanks() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "Q,A").unwrap();
        writeln!(f, " Where are you? , In the cloud ").unwrap();
        writeln!(f, "Empty answer,").unwrap();
        writeln!(f, "\"Quoted, question\",Yes").unwrap();
        f.flush().unwrap();

        let bank = QaBank::load(f.path());
        assert_eq!(
            bank.pairs(),
            &[
                QaPair::new("Where are you?", "In the cloud"),
                QaPair::new("Quoted, question", "Yes"),
            ]
        );
    }

    #[test]
    fn load_falls_back_to_sample() {
        assert_eq!(QaBank::load("/definitely/not/here.csv").len(), 6);

        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, "Question,Answer").unwrap();
        f.flush().unwrap();
        assert_eq!(QaBank::load(f.path()).len(), 6);
    }

    #[test]
    fn session_stop_keywords_end_session() {
        for msg in ["Please STOP", "ok bye", "Thank you!", "thanks, bye"] {
            let r = session_reply(msg, UserType::Customer);
            assert!(r.end_session, "{msg}");
            assert_eq!(r.reply, END_SESSION_REPLY);
        }
    }

    #[test]
    fn session_echo_uses_user_type_prefix() {
        let r = session_reply("hello", UserType::parse(Some("employee")));
        assert_eq!(r.reply, "[Internal assistant] You said: hello");
        assert!(!r.end_session);

        let r = session_reply("hello", UserType::parse(None));
        assert_eq!(r.reply, "[Customer assistant] You said: hello");
        assert_eq!(UserType::parse(Some("admin")), UserType::Customer);
    }
}
