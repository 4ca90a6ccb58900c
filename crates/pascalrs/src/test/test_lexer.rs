// Scanner tests
use crate::compiler::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source)
        .tokenize()
        .expect("scan should succeed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_keywords_and_names() {
    assert_eq!(
        kinds("program demo; var x: integer;"),
        vec![
            TokenKind::Program,
            TokenKind::Name,
            TokenKind::Semicolon,
            TokenKind::Var,
            TokenKind::Name,
            TokenKind::Colon,
            TokenKind::Integer,
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_two_char_operators() {
    assert_eq!(
        kinds("x := a <> b; a <= b; a >= b"),
        vec![
            TokenKind::Name,
            TokenKind::Assign,
            TokenKind::Name,
            TokenKind::Ne,
            TokenKind::Name,
            TokenKind::Semicolon,
            TokenKind::Name,
            TokenKind::Le,
            TokenKind::Name,
            TokenKind::Semicolon,
            TokenKind::Name,
            TokenKind::Ge,
            TokenKind::Name,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_colon_alone_is_not_assign() {
    assert_eq!(
        kinds("x : y"),
        vec![TokenKind::Name, TokenKind::Colon, TokenKind::Name, TokenKind::Eof]
    );
}

#[test]
fn test_numbers() {
    let tokens = Lexer::new("3 3.14 10.0").tokenize().unwrap();
    let texts: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Number)
        .map(|t| &"3 3.14 10.0"[t.range.clone()])
        .collect();
    assert_eq!(texts, vec!["3", "3.14", "10.0"]);
}

#[test]
fn test_line_comment_skipped() {
    assert_eq!(
        kinds("x // this is ignored\n:= 1"),
        vec![TokenKind::Name, TokenKind::Assign, TokenKind::Number, TokenKind::Eof]
    );
}

#[test]
fn test_line_numbers() {
    let tokens = Lexer::new("x\ny\n\nz").tokenize().unwrap();
    let lines: Vec<usize> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Name)
        .map(|t| t.line)
        .collect();
    assert_eq!(lines, vec![1, 2, 4]);
}

#[test]
fn test_unexpected_character() {
    let result = Lexer::new("x := @").tokenize();
    assert!(result.is_err());
    let message = result.unwrap_err();
    assert!(message.contains("unexpected character"), "{}", message);
}

#[test]
fn test_dot_after_integer_part_needs_digits() {
    // "end." must scan as 'end' '.', and "1." as number then dot
    assert_eq!(
        kinds("1."),
        vec![TokenKind::Number, TokenKind::Dot, TokenKind::Eof]
    );
}
