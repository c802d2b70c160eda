//! Classify store error text into client-facing constraint messages.

use regex::Regex;
use std::sync::OnceLock;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    Unique(Vec<String>),
    MissingArgument(String),
}

impl Violation {
    pub fn message(&self) -> String {
        match self {
            Violation::Unique(fields) => format!("{} already taken", fields.join(", ")),
            Violation::MissingArgument(arg) => format!("{} is missing", arg),
        }
    }
}

fn unique_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Unique constraint failed on the fields: \(([^)]+)\)").expect("valid regex"))
}

fn missing_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Argument `([^`]+)` is missing").expect("valid regex"))
}

/// `None` for anything that is not a uniqueness or missing-argument failure.
pub fn classify(text: &str) -> Option<Violation> {
    if let Some(c) = unique_re().captures(text) {
        let fields = c[1]
            .split(',')
            .map(|f| f.trim().trim_matches('`').to_string())
            .filter(|f| !f.is_empty())
            .collect();
        return Some(Violation::Unique(fields));
    }
    missing_re()
        .captures(text)
        .map(|c| Violation::MissingArgument(c[1].to_string()))
}
