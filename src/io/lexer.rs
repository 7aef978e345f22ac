//! Token stream for the Newick format.
//!
//! The lexer splits input into typed tokens with 1-based line/column
//! metadata; the parser only consumes this contract. Labels may be quoted
//! with `'` or `"`, a doubled quote standing for a literal one.

use crate::tree::TreeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A named label, e.g. `Homo_sapiens`
    Symbol,
    /// A numeric literal, e.g. `0.2e-1`
    Number,
    /// A quoted label with the quotes stripped
    String,
    /// A single `(` or `)`
    Bracket,
    /// A single `,`, `;` or `:`
    Operator,
    /// The content of a `{...}` tag
    Tag,
    /// The content of a `[...]` comment
    Comment,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Line where the token starts (1-based)
    pub line: usize,
    /// Column where the token starts (1-based)
    pub column: usize,
}

impl Token {
    pub fn is_operator(&self, op: char) -> bool {
        self.kind == TokenKind::Operator && self.value.len() == 1 && self.value.starts_with(op)
    }

    pub fn is_bracket(&self, bracket: char) -> bool {
        self.kind == TokenKind::Bracket && self.value.len() == 1 && self.value.starts_with(bracket)
    }
}

/// True if a label containing `c` must be quoted on output.
pub(crate) fn needs_quoting(c: char) -> bool {
    is_reserved(c)
}

/// Characters that terminate an unquoted label.
fn is_reserved(c: char) -> bool {
    matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | ',' | ';' | ':' | '\'' | '"') || c.is_whitespace()
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Scanner {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume until `close`, returning the enclosed content. The opening
    /// character has already been consumed.
    fn until(&mut self, close: char, what: &str, line: usize, column: usize) -> Result<String, TreeError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == close => return Ok(value),
                Some(c) => value.push(c),
                None => {
                    return Err(TreeError::format(
                        format!("unterminated {} opened here", what),
                        line,
                        column,
                    ))
                }
            }
        }
    }

    /// Quoted label; a doubled quote inside stands for a literal one.
    fn quoted(&mut self, quote: char, line: usize, column: usize) -> Result<String, TreeError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.bump();
                        value.push(quote);
                    } else {
                        return Ok(value);
                    }
                }
                Some(c) => value.push(c),
                None => {
                    return Err(TreeError::format(
                        "unterminated quoted label opened here",
                        line,
                        column,
                    ))
                }
            }
        }
    }
}

fn is_number(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}

/// Split Newick text into tokens. Whitespace is insignificant outside
/// quoted labels.
pub fn tokenize(input: &str) -> Result<Vec<Token>, TreeError> {
    let mut scanner = Scanner::new(input);
    let mut tokens = Vec::new();

    while let Some(c) = scanner.peek() {
        let (line, column) = (scanner.line, scanner.column);
        if c.is_whitespace() {
            scanner.bump();
            continue;
        }
        let token = match c {
            '(' | ')' => {
                scanner.bump();
                Token {
                    kind: TokenKind::Bracket,
                    value: c.to_string(),
                    line,
                    column,
                }
            }
            ',' | ';' | ':' => {
                scanner.bump();
                Token {
                    kind: TokenKind::Operator,
                    value: c.to_string(),
                    line,
                    column,
                }
            }
            '{' => {
                scanner.bump();
                let value = scanner.until('}', "tag", line, column)?;
                Token {
                    kind: TokenKind::Tag,
                    value: value.trim().to_string(),
                    line,
                    column,
                }
            }
            '[' => {
                scanner.bump();
                let value = scanner.until(']', "comment", line, column)?;
                Token {
                    kind: TokenKind::Comment,
                    value,
                    line,
                    column,
                }
            }
            '}' | ']' => {
                return Err(TreeError::format(
                    format!("unmatched '{}'", c),
                    line,
                    column,
                ));
            }
            '\'' | '"' => {
                scanner.bump();
                let value = scanner.quoted(c, line, column)?;
                Token {
                    kind: TokenKind::String,
                    value,
                    line,
                    column,
                }
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = scanner.peek() {
                    if is_reserved(c) {
                        break;
                    }
                    value.push(c);
                    scanner.bump();
                }
                let kind = if is_number(&value) {
                    TokenKind::Number
                } else {
                    TokenKind::Symbol
                };
                Token {
                    kind,
                    value,
                    line,
                    column,
                }
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Line/column just past the end of the input, for errors at EOF.
pub fn end_position(input: &str) -> (usize, usize) {
    let line = input.chars().filter(|&c| c == '\n').count() + 1;
    let last = input.rfind('\n').map(|p| p + 1).unwrap_or(0);
    (line, input[last..].chars().count() + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = tokenize("(A:0.1,B)C;").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Bracket,
                TokenKind::Symbol,
                TokenKind::Operator,
                TokenKind::Number,
                TokenKind::Operator,
                TokenKind::Symbol,
                TokenKind::Bracket,
                TokenKind::Symbol,
                TokenKind::Operator,
            ]
        );
    }

    #[test]
    fn test_tokenize_positions() {
        let tokens = tokenize("(A,\n B);").unwrap();
        // B is on line 2, after one leading space.
        let b = tokens.iter().find(|t| t.value == "B").unwrap();
        assert_eq!((b.line, b.column), (2, 2));
    }

    #[test]
    fn test_tokenize_tag_and_comment() {
        let tokens = tokenize("A{42}[note];").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Tag);
        assert_eq!(tokens[1].value, "42");
        assert_eq!(tokens[2].kind, TokenKind::Comment);
        assert_eq!(tokens[2].value, "note");
    }

    #[test]
    fn test_tokenize_quoted() {
        let tokens = tokenize("'Homo sapiens';").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "Homo sapiens");

        let tokens = tokenize("'O''Brien';").unwrap();
        assert_eq!(tokens[0].value, "O'Brien");

        let tokens = tokenize("\"He said \"\"hi\"\"\";").unwrap();
        assert_eq!(tokens[0].value, "He said \"hi\"");
    }

    #[test]
    fn test_tokenize_scientific_notation() {
        let tokens = tokenize("0.2e-1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].value, "0.2e-1");
    }

    #[test]
    fn test_tokenize_unterminated() {
        assert!(matches!(tokenize("{42"), Err(TreeError::Format { .. })));
        assert!(matches!(tokenize("[oops"), Err(TreeError::Format { .. })));
        assert!(matches!(tokenize("'oops"), Err(TreeError::Format { .. })));
    }

    #[test]
    fn test_end_position() {
        assert_eq!(end_position("(A,B)C"), (1, 7));
        assert_eq!(end_position("(A,\nB)C"), (2, 4));
    }
}
