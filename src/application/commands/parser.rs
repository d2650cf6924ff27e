//! Command parser - Splits prefixed chat text into a command name and arguments

use thiserror::Error;

/// Why shell-style splitting gave up
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("no closing quotation for {0}")]
    UnterminatedQuote(char),

    #[error("no escaped character")]
    TrailingEscape,
}

/// Split like a POSIX shell: whitespace separates words, single quotes are
/// literal, double quotes allow backslash escapes, and adjacent quoted and
/// bare parts join into one word.
pub fn shell_split(input: &str) -> Result<Vec<String>, TokenizeError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(TokenizeError::UnterminatedQuote('\'')),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(esc @ ('"' | '\\' | '$' | '`')) => current.push(esc),
                            Some('\n') => {}
                            Some(other) => {
                                current.push('\\');
                                current.push(other);
                            }
                            None => return Err(TokenizeError::UnterminatedQuote('"')),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(TokenizeError::UnterminatedQuote('"')),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(ch) => current.push(ch),
                    None => return Err(TokenizeError::TrailingEscape),
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// A prefixed message split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
    /// Text after the prefix, untouched
    pub unsplit: String,
}

/// Parses incoming text into commands
#[derive(Debug, Clone)]
pub struct CommandParser {
    command_prefix: String,
}

impl CommandParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.command_prefix
    }

    /// Text after the prefix, or `None` if the text is not a command
    pub fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.strip_prefix(self.command_prefix.as_str())
    }

    /// Tokenize shell-style, falling back to whitespace splitting
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        match shell_split(text) {
            Ok(words) => words,
            Err(e) => {
                tracing::warn!(
                    "Failed to split arguments of {:?} ({}), falling back to whitespace splitting",
                    text,
                    e
                );
                text.split_whitespace().map(str::to_string).collect()
            }
        }
    }

    /// Parse a command message; `None` if the prefix is missing or nothing follows it
    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        let unsplit = self.strip_prefix(text)?;
        let mut tokens = self.tokenize(unsplit).into_iter();
        let name = tokens.next()?;

        Some(ParsedCommand {
            name,
            args: tokens.collect(),
            unsplit: unsplit.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_words_stay_together() {
        assert_eq!(
            shell_split(r#"remind 30 "stand up" 'and stretch'"#).unwrap(),
            vec!["remind", "30", "stand up", "and stretch"]
        );
    }

    #[test]
    fn escapes_and_joined_parts() {
        assert_eq!(shell_split(r#"a\ b "x\"y"z ''"#).unwrap(), vec!["a b", "x\"yz", ""]);
        assert_eq!(shell_split("  spaced   out  ").unwrap(), vec!["spaced", "out"]);
    }

    #[test]
    fn unbalanced_quotes_are_errors() {
        assert_eq!(shell_split("say \"hi"), Err(TokenizeError::UnterminatedQuote('"')));
        assert_eq!(shell_split("it's"), Err(TokenizeError::UnterminatedQuote('\'')));
        assert_eq!(shell_split("end\\"), Err(TokenizeError::TrailingEscape));
    }

    #[test]
    fn parse_falls_back_to_whitespace() {
        let parser = CommandParser::new("!");
        let parsed = parser.parse("!say it's fine").unwrap();
        assert_eq!(parsed.name, "say");
        assert_eq!(parsed.args, vec!["it's", "fine"]);
        assert_eq!(parsed.unsplit, "say it's fine");
    }

    #[test]
    fn parse_requires_prefix_and_name() {
        let parser = CommandParser::new("!!");
        assert!(parser.parse("hello").is_none());
        assert!(parser.parse("!hello").is_none());
        assert!(parser.parse("!!").is_none());
        assert_eq!(parser.parse("!!ping").unwrap().name, "ping");
    }
}
