//! Key file parsing
//!
//! `key.vdf` is a Valve KeyValues text document:
//!
//! ```text
//! "depots"
//! {
//!     "3489701"
//!     {
//!         "DecryptionKey" "2266ca31..."
//!     }
//! }
//! ```
//!
//! The text is first parsed into a [`KeyValue`] tree, then the depot keys are
//! extracted with typed lookups that report the offending key on mismatch.

use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

use crate::resolver::core::{DepotId, DepotKeys};

/// Errors raised while reading a key file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyFileError {
    #[error("key file is not valid UTF-8")]
    InvalidUtf8,

    #[error("syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("depots key missing")]
    MissingDepots,

    #[error("depots value is not a nested structure (found {found})")]
    DepotsNotSection { found: &'static str },

    #[error("depot {depot} value is not a nested structure (found {found})")]
    DepotNotSection { depot: String, found: &'static str },

    #[error("depot {depot} missing DecryptionKey string (found {found})")]
    MissingDecryptionKey { depot: String, found: &'static str },

    #[error("depot id '{depot}' is not numeric")]
    InvalidDepotId { depot: String },
}

/// A KeyValues node: a string leaf or an ordered section of children
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    String(String),
    Section(Vec<(String, KeyValue)>),
}

impl KeyValue {
    /// Look up a direct child; with duplicate keys the last one wins
    pub fn get(&self, key: &str) -> Option<&KeyValue> {
        match self {
            KeyValue::Section(children) => children.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v),
            KeyValue::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyValue::String(s) => Some(s),
            KeyValue::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&[(String, KeyValue)]> {
        match self {
            KeyValue::Section(children) => Some(children),
            KeyValue::String(_) => None,
        }
    }

    /// Shape name used in error messages
    pub fn shape(&self) -> &'static str {
        match self {
            KeyValue::String(_) => "string",
            KeyValue::Section(_) => "nested structure",
        }
    }
}

#[derive(Debug, PartialEq)]
enum Token {
    Text(String),
    Open,
    Close,
}

struct Lexer<'a> {
    chars: Peekable<CharIndices<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices().peekable(),
            line: 1,
        }
    }

    fn error(&self, message: impl Into<String>) -> KeyFileError {
        KeyFileError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() || c == '\u{feff}' {
                self.bump();
            } else if c == '/' {
                let mut ahead = self.chars.clone();
                ahead.next();
                if matches!(ahead.peek(), Some(&(_, '/'))) {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                } else {
                    return;
                }
            } else {
                return;
            }
        }
    }

    /// Next significant token; platform conditionals like `[$WIN32]` are dropped
    fn next_token(&mut self) -> Result<Option<Token>, KeyFileError> {
        loop {
            self.skip_trivia();
            let Some(&(_, c)) = self.chars.peek() else {
                return Ok(None);
            };
            match c {
                '{' => {
                    self.bump();
                    return Ok(Some(Token::Open));
                }
                '}' => {
                    self.bump();
                    return Ok(Some(Token::Close));
                }
                '"' => {
                    self.bump();
                    return self.quoted().map(|s| Some(Token::Text(s)));
                }
                '[' => {
                    let conditional = self.bare();
                    if !conditional.ends_with(']') {
                        return Err(self.error(format!("unterminated conditional '{}'", conditional)));
                    }
                }
                _ => return Ok(Some(Token::Text(self.bare()))),
            }
        }
    }

    fn quoted(&mut self) -> Result<String, KeyFileError> {
        let start_line = self.line;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(KeyFileError::Syntax {
                        line: start_line,
                        message: "unterminated quoted string".to_string(),
                    });
                }
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => out.push('\\'),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn bare(&mut self) -> String {
        let mut out = String::new();
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '{' | '}' | '"') {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }
}

fn parse_section(lexer: &mut Lexer<'_>, nested: bool) -> Result<Vec<(String, KeyValue)>, KeyFileError> {
    let mut children = Vec::new();
    loop {
        let key = match lexer.next_token()? {
            None if nested => return Err(lexer.error("unexpected end of input, missing '}'")),
            None => return Ok(children),
            Some(Token::Close) if nested => return Ok(children),
            Some(Token::Close) => return Err(lexer.error("unexpected '}'")),
            Some(Token::Open) => return Err(lexer.error("expected a key, found '{'")),
            Some(Token::Text(key)) => key,
        };
        let value = match lexer.next_token()? {
            None => return Err(lexer.error(format!("key '{}' has no value", key))),
            Some(Token::Close) => return Err(lexer.error(format!("key '{}' has no value", key))),
            Some(Token::Text(value)) => KeyValue::String(value),
            Some(Token::Open) => KeyValue::Section(parse_section(lexer, true)?),
        };
        children.push((key, value));
    }
}

/// Parse KeyValues text into its root section
pub fn parse_keyvalues(text: &str) -> Result<KeyValue, KeyFileError> {
    let mut lexer = Lexer::new(text);
    parse_section(&mut lexer, false).map(KeyValue::Section)
}

/// Parse key file bytes into the depot → decryption key mapping
pub fn parse_key_file(bytes: &[u8]) -> Result<DepotKeys, KeyFileError> {
    let text = std::str::from_utf8(bytes).map_err(|_| KeyFileError::InvalidUtf8)?;
    let root = parse_keyvalues(text)?;
    depot_keys(&root)
}

/// Extract depot keys from a parsed key file
pub fn depot_keys(root: &KeyValue) -> Result<DepotKeys, KeyFileError> {
    let depots = root.get("depots").ok_or(KeyFileError::MissingDepots)?;
    let children = depots
        .as_section()
        .ok_or(KeyFileError::DepotsNotSection { found: depots.shape() })?;

    let mut keys = DepotKeys::new();
    for (depot, value) in children {
        let id: DepotId = depot.parse()?;
        if value.as_section().is_none() {
            return Err(KeyFileError::DepotNotSection {
                depot: depot.clone(),
                found: value.shape(),
            });
        }
        let key = match value.get("DecryptionKey") {
            Some(found) => found.as_str().ok_or(KeyFileError::MissingDecryptionKey {
                depot: depot.clone(),
                found: found.shape(),
            })?,
            None => {
                return Err(KeyFileError::MissingDecryptionKey {
                    depot: depot.clone(),
                    found: "nothing",
                });
            }
        };
        keys.insert(id, key);
    }
    Ok(keys)
}
