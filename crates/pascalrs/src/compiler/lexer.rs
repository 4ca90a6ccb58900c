// Hand-rolled scanner for the Pascal-like language
// Keywords resolve through a single match; `//` starts a line comment

use super::reader::{EOF_CHAR, Reader};
use super::token::{TokenData, TokenKind};

pub struct Lexer<'a> {
    reader: Reader<'a>,
    line: usize,
    error: Option<String>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            reader: Reader::new(source),
            line: 1,
            error: None,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<TokenData>, String> {
        let mut tokens = Vec::new();

        loop {
            self.skip_trivia();
            if self.reader.is_eof() || self.error.is_some() {
                break;
            }

            self.reader.reset_buff();
            let kind = self.lex();
            if self.error.is_some() {
                break;
            }
            tokens.push(TokenData::new(kind, self.reader.current_range(), self.line));
        }

        if let Some(err) = self.error {
            return Err(err);
        }

        tokens.push(TokenData::new(
            TokenKind::Eof,
            self.reader.current_range(),
            self.line,
        ));
        Ok(tokens)
    }

    fn error(&mut self, message: String) {
        if self.error.is_none() {
            self.error = Some(format!("{}: {}", self.line, message));
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.reader.current_char() {
                '\n' => {
                    self.line += 1;
                    self.reader.bump();
                }
                c if c.is_whitespace() => self.reader.bump(),
                '/' if self.reader.next_char() == '/' => {
                    self.reader.eat_while(|ch| ch != '\n');
                }
                _ => break,
            }
        }
    }

    fn name_to_kind(name: &str) -> TokenKind {
        match name {
            "program" => TokenKind::Program,
            "var" => TokenKind::Var,
            "begin" => TokenKind::Begin,
            "end" => TokenKind::End,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "print" => TokenKind::Print,
            "procedure" => TokenKind::Procedure,
            "function" => TokenKind::Function,
            "integer" => TokenKind::Integer,
            "real" => TokenKind::Real,
            _ => TokenKind::Name,
        }
    }

    fn lex(&mut self) -> TokenKind {
        match self.reader.current_char() {
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.reader
                    .eat_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');
                Self::name_to_kind(self.reader.current_text())
            }
            c if c.is_ascii_digit() => self.lex_number(),
            ':' => {
                self.reader.bump();
                if self.reader.current_char() == '=' {
                    self.reader.bump();
                    TokenKind::Assign
                } else {
                    TokenKind::Colon
                }
            }
            '<' => {
                self.reader.bump();
                match self.reader.current_char() {
                    '=' => {
                        self.reader.bump();
                        TokenKind::Le
                    }
                    '>' => {
                        self.reader.bump();
                        TokenKind::Ne
                    }
                    _ => TokenKind::Lt,
                }
            }
            '>' => {
                self.reader.bump();
                if self.reader.current_char() == '=' {
                    self.reader.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '=' => {
                self.reader.bump();
                TokenKind::Eq
            }
            '+' => {
                self.reader.bump();
                TokenKind::Plus
            }
            '-' => {
                self.reader.bump();
                TokenKind::Minus
            }
            '*' => {
                self.reader.bump();
                TokenKind::Star
            }
            '/' => {
                self.reader.bump();
                TokenKind::Slash
            }
            '(' => {
                self.reader.bump();
                TokenKind::LeftParen
            }
            ')' => {
                self.reader.bump();
                TokenKind::RightParen
            }
            ';' => {
                self.reader.bump();
                TokenKind::Semicolon
            }
            ',' => {
                self.reader.bump();
                TokenKind::Comma
            }
            '.' => {
                self.reader.bump();
                TokenKind::Dot
            }
            EOF_CHAR => TokenKind::Eof,
            other => {
                self.error(format!("unexpected character '{}'", other));
                self.reader.bump();
                TokenKind::Eof
            }
        }
    }

    /// digits, optionally followed by '.' digits
    fn lex_number(&mut self) -> TokenKind {
        self.reader.eat_while(|ch| ch.is_ascii_digit());
        if self.reader.current_char() == '.' && self.reader.next_char().is_ascii_digit() {
            self.reader.bump();
            self.reader.eat_while(|ch| ch.is_ascii_digit());
        }
        TokenKind::Number
    }
}

/// Parse the text of a `Number` token. The scanner only produces
/// `digits['.'digits]`, so this cannot fail on scanner output, but the
/// front end still propagates the error rather than trusting that.
pub fn parse_number(text: &str) -> Result<f64, String> {
    text.parse::<f64>()
        .map_err(|_| format!("malformed number '{}'", text))
}
