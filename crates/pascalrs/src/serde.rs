// JSON views over compiler artifacts for the CLI driver.
// Kept behind the `serde` feature so library consumers pay for it only when
// they want the serialization surface.

use serde_json::{Value, json};

use crate::codegen::TargetLine;
use crate::compiler::TokenData;
use crate::ir::{Quadruple, display_number};
use crate::symbols::SymbolTable;

pub fn tokens_to_json(tokens: &[TokenData], source: &str) -> Value {
    let items: Vec<Value> = tokens
        .iter()
        .map(|token| {
            json!({
                "kind": token.kind,
                "text": &source[token.range.clone()],
                "line": token.line,
            })
        })
        .collect();
    json!({ "tokens": items })
}

pub fn quads_to_json(quads: &[Quadruple]) -> Value {
    let items: Vec<Value> = quads
        .iter()
        .enumerate()
        .map(|(index, quad)| {
            json!({
                "index": index,
                "op": quad.op.mnemonic(),
                "arg1": quad.arg1.to_string(),
                "arg2": quad.arg2.to_string(),
                "result": quad.result.to_string(),
            })
        })
        .collect();
    Value::Array(items)
}

pub fn symbols_to_json(table: &SymbolTable) -> Value {
    let symbols: Vec<Value> = table
        .entries()
        .iter()
        .map(|entry| {
            json!({
                "name": entry.name,
                "kind": entry.kind,
                "type": entry.ty,
                "address": entry.address,
                "scope_level": entry.scope_level,
            })
        })
        .collect();
    let constants: Vec<Value> = table
        .constants()
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            json!({
                "index": index,
                "value": value,
                "display": display_number(value),
            })
        })
        .collect();
    json!({ "symbols": symbols, "constants": constants })
}

pub fn target_to_json(lines: &[TargetLine]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|line| json!({ "line": line.line, "code": line.code }))
        .collect();
    Value::Array(items)
}
