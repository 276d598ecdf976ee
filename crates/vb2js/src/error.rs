use thiserror::Error;

/// Error raised when the translator cannot make sense of its input.
///
/// The line number is 1-based and `-1` when the failure has no useful
/// position (e.g. a tokenizer error detached from the line buffer).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{}", render(.message, .line_number, .line))]
pub struct ParseError {
    message: String,
    line_number: i32,
    line: Option<String>,
}

fn render(message: &str, line_number: &i32, line: &Option<String>) -> String {
    let mut rendered = message.to_string();
    if *line_number != -1 {
        rendered.push_str(&format!(" at line {line_number}"));
    }
    if let Some(line) = line {
        rendered.push_str(&format!(" ({line})"));
    }
    rendered
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line_number: -1,
            line: None,
        }
    }

    pub(crate) fn with_location(
        message: impl Into<String>,
        line_number: i32,
        line: Option<String>,
    ) -> Self {
        Self {
            message: message.into(),
            line_number,
            line,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// 1-based line number in the (rewritten) input, or -1 when unknown.
    pub fn line_number(&self) -> i32 {
        self.line_number
    }

    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }
}
