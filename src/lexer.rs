// File: src/lexer.rs
//
// Hand-written tokenizer for Monkey source. Char-by-char, no regex,
// tracking line/column the way parse errors need to report them.

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Str(String),

    Let,
    Function,
    True,
    False,
    If,
    Else,
    Return,

    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Eq,
    NotEq,

    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Illegal(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer { chars: source.chars().collect(), pos: 0, line: 1, column: 1 }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            s.push(c);
            self.advance();
        }
        s
    }

    fn read_string(&mut self) -> String {
        let mut s = String::new();
        self.advance(); // opening quote
        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance();
                break;
            }
            if c == '\\' {
                self.advance();
                match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some(other) => s.push(other),
                    None => break,
                }
            } else {
                s.push(c);
                self.advance();
            }
        }
        s
    }

    fn keyword(ident: &str) -> Option<TokenKind> {
        let kind = match ident {
            "let" => TokenKind::Let,
            "fn" => TokenKind::Function,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "return" => TokenKind::Return,
            _ => return None,
        };
        Some(kind)
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let (line, column) = (self.line, self.column);
            let Some(c) = self.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, line, column });
                break;
            };

            let kind = match c {
                '"' => TokenKind::Str(self.read_string()),
                '0'..='9' => {
                    let digits = self.read_while(|c| c.is_ascii_digit());
                    TokenKind::Int(digits.parse().unwrap_or(0))
                }
                c if c.is_alphabetic() || c == '_' => {
                    let ident = self.read_while(|c| c.is_alphanumeric() || c == '_');
                    Lexer::keyword(&ident).unwrap_or(TokenKind::Ident(ident))
                }
                '=' if self.peek_at(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    TokenKind::Eq
                }
                '!' if self.peek_at(1) == Some('=') => {
                    self.advance();
                    self.advance();
                    TokenKind::NotEq
                }
                '=' => {
                    self.advance();
                    TokenKind::Assign
                }
                '+' => {
                    self.advance();
                    TokenKind::Plus
                }
                '-' => {
                    self.advance();
                    TokenKind::Minus
                }
                '!' => {
                    self.advance();
                    TokenKind::Bang
                }
                '*' => {
                    self.advance();
                    TokenKind::Asterisk
                }
                '/' => {
                    self.advance();
                    TokenKind::Slash
                }
                '<' => {
                    self.advance();
                    TokenKind::Lt
                }
                '>' => {
                    self.advance();
                    TokenKind::Gt
                }
                ',' => {
                    self.advance();
                    TokenKind::Comma
                }
                ';' => {
                    self.advance();
                    TokenKind::Semicolon
                }
                ':' => {
                    self.advance();
                    TokenKind::Colon
                }
                '(' => {
                    self.advance();
                    TokenKind::LParen
                }
                ')' => {
                    self.advance();
                    TokenKind::RParen
                }
                '{' => {
                    self.advance();
                    TokenKind::LBrace
                }
                '}' => {
                    self.advance();
                    TokenKind::RBrace
                }
                '[' => {
                    self.advance();
                    TokenKind::LBracket
                }
                ']' => {
                    self.advance();
                    TokenKind::RBracket
                }
                other => {
                    self.advance();
                    TokenKind::Illegal(other)
                }
            };

            tokens.push(Token { kind, line, column });
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_let_statement() {
        assert_eq!(
            kinds("let five = 5;"),
            vec![
                TokenKind::Let,
                TokenKind::Ident("five".to_string()),
                TokenKind::Assign,
                TokenKind::Int(5),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_two_char_operators() {
        assert_eq!(kinds("== !="), vec![TokenKind::Eq, TokenKind::NotEq, TokenKind::Eof]);
    }

    #[test]
    fn tokenizes_string_literal_with_escapes() {
        assert_eq!(
            kinds(r#""hello\nworld""#),
            vec![TokenKind::Str("hello\nworld".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn tokenizes_function_literal() {
        assert_eq!(
            kinds("fn(x, y) { x + y; }"),
            vec![
                TokenKind::Function,
                TokenKind::LParen,
                TokenKind::Ident("x".to_string()),
                TokenKind::Comma,
                TokenKind::Ident("y".to_string()),
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Ident("x".to_string()),
                TokenKind::Plus,
                TokenKind::Ident("y".to_string()),
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_array_and_hash_punctuation() {
        assert_eq!(
            kinds("[1, 2]; {\"a\": 1};"),
            vec![
                TokenKind::LBracket,
                TokenKind::Int(1),
                TokenKind::Comma,
                TokenKind::Int(2),
                TokenKind::RBracket,
                TokenKind::Semicolon,
                TokenKind::LBrace,
                TokenKind::Str("a".to_string()),
                TokenKind::Colon,
                TokenKind::Int(1),
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn illegal_character_is_tokenized_distinctly() {
        assert_eq!(kinds("@"), vec![TokenKind::Illegal('@'), TokenKind::Eof]);
    }
}
