pub mod commands;
pub mod fields;
pub mod tokenizer;

use crate::command::Command;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Appends the owning command's usage line to the failure message.
    pub fn usage(mut self, usage: &str) -> Self {
        self.message.push('\n');
        self.message.push_str(usage);
        self
    }
}

/// Splits raw input into a command word and its argument string, then routes
/// to that command's parser. The argument string keeps its leading whitespace
/// so the tokenizer's preceded-by-whitespace rule holds for the first prefix.
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new("Please enter a command."));
    }
    let (word, args) = match trimmed.find(char::is_whitespace) {
        Some(pos) => (&trimmed[..pos], &trimmed[pos..]),
        None => (trimmed, ""),
    };
    commands::parse(word, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_fails() {
        assert!(parse_command("").is_err());
        assert!(parse_command("   ").is_err());
    }

    #[test]
    fn test_unknown_command_word_fails() {
        let err = parse_command("frobnicate 1").unwrap_err();
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn test_dispatch_reaches_command_parser() {
        assert_eq!(parse_command("undo").unwrap(), Command::Undo);
        assert_eq!(parse_command("  list  ").unwrap(), Command::List);
    }

    #[test]
    fn test_usage_appended_to_message() {
        let err = ParseError::new("bad field").usage("Usage: x");
        assert_eq!(err.to_string(), "bad field\nUsage: x");
    }
}
