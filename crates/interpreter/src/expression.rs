//! Lexical classification of attribute literals.
//!
//! This is the only place that inspects expression delimiters. Every literal is
//! classified once, before any setter factory sees it.

/// What an attribute literal denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionKind {
    /// Plain text, coerced to the property's declared type.
    Literal,
    /// `${...}`: evaluated once when the object is built.
    LoadTime,
    /// `#{...}` anywhere in the text: installed as a live binding.
    RunTime,
}

impl ExpressionKind {
    /// Classifies `text`. Load-time wins when both forms match.
    pub fn classify(text: &str) -> ExpressionKind {
        if is_load_time(text) {
            ExpressionKind::LoadTime
        } else if is_run_time(text) {
            ExpressionKind::RunTime
        } else {
            ExpressionKind::Literal
        }
    }

    pub fn is_expression(&self) -> bool {
        !matches!(self, ExpressionKind::Literal)
    }
}

fn is_load_time(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() >= 3 && trimmed.starts_with("${") && trimmed.ends_with('}')
}

fn is_run_time(text: &str) -> bool {
    match text.find("#{") {
        Some(start) => text[start + 2..].contains('}'),
        None => false,
    }
}
