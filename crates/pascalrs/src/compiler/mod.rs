// Front end for the Pascal-like language
// One-token-lookahead recursive descent over the scanner's token stream,
// emitting raw quadruples with backpatched position-indexed jump targets

mod code;
mod expr;
mod lexer;
mod reader;
mod stmt;
mod token;

pub use lexer::Lexer;
pub use token::{TokenData, TokenKind};

use crate::ir::Quadruple;
use crate::symbols::SymbolTable;

/// A compiled procedure or function body: its own quadruple sequence,
/// optimized independently of the main program
#[derive(Debug, Clone)]
pub struct ProcChunk {
    pub name: String,
    pub params: Vec<String>,
    pub quads: Vec<Quadruple>,
    pub returns_value: bool,
}

/// Output of the front end: the main sequence, one chunk per declared
/// procedure/function, and the symbol/constant tables
#[derive(Debug)]
pub struct Program {
    pub quads: Vec<Quadruple>,
    pub procs: Vec<ProcChunk>,
    pub table: SymbolTable,
}

/// Compiler state threaded through the recursive-descent routines
pub struct Compiler<'a> {
    source: &'a str,
    chunk_name: String,
    tokens: Vec<TokenData>,
    pos: usize,
    pub(crate) table: SymbolTable,
    pub(crate) out: Vec<Quadruple>,
    pub(crate) temp_counter: usize,
    pub(crate) procs: Vec<ProcChunk>,
}

impl<'a> Compiler<'a> {
    /// Compile source code to a quadruple program
    pub fn compile(source: &str) -> Result<Program, String> {
        Self::compile_with_name(source, "input")
    }

    /// Compile source code with a specific chunk name for error reporting
    pub fn compile_with_name(source: &str, chunk_name: &str) -> Result<Program, String> {
        let tokens = Lexer::new(source)
            .tokenize()
            .map_err(|e| format!("{}:{}", chunk_name, e))?;

        let mut c = Compiler {
            source,
            chunk_name: chunk_name.to_string(),
            tokens,
            pos: 0,
            table: SymbolTable::new(),
            out: Vec::new(),
            temp_counter: 0,
            procs: Vec::new(),
        };

        stmt::program(&mut c)?;

        Ok(Program {
            quads: c.out,
            procs: c.procs,
            table: c.table,
        })
    }

    pub(crate) fn current(&self) -> &TokenData {
        // The token vector always ends with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn kind(&self) -> TokenKind {
        self.current().kind
    }

    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
    }

    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    /// Consume the current token if it matches
    pub(crate) fn accept(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<TokenData, String> {
        if self.check(kind) {
            let token = self.current().clone();
            self.advance();
            Ok(token)
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                kind.describe(),
                self.kind().describe()
            )))
        }
    }

    pub(crate) fn token_text(&self, token: &TokenData) -> &'a str {
        &self.source[token.range.clone()]
    }

    pub(crate) fn error(&self, message: impl AsRef<str>) -> String {
        format!(
            "{}:{}: {}",
            self.chunk_name,
            self.current().line,
            message.as_ref()
        )
    }
}
