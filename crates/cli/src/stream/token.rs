// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Format-independent token model.

use serde::Serialize;
use serde_json::{Number, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    Key(String),
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Placeholder a [`splice`](super::splice) replaces with another sequence
    Marker(u32),
}

/// Flatten any serializable value into tokens.
///
/// Object keys come out in serialization order.
pub fn disassemble<T: Serialize + ?Sized>(value: &T) -> Result<Vec<Token>, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let mut tokens = Vec::new();
    push_value(value, &mut tokens);
    Ok(tokens)
}

fn push_value(value: Value, tokens: &mut Vec<Token>) {
    match value {
        Value::Null => tokens.push(Token::Null),
        Value::Bool(b) => tokens.push(Token::Bool(b)),
        Value::Number(n) => tokens.push(Token::Number(n)),
        Value::String(s) => tokens.push(Token::String(s)),
        Value::Array(items) => {
            tokens.push(Token::StartArray);
            for item in items {
                push_value(item, tokens);
            }
            tokens.push(Token::EndArray);
        }
        Value::Object(map) => {
            tokens.push(Token::StartObject);
            for (key, item) in map {
                tokens.push(Token::Key(key));
                push_value(item, tokens);
            }
            tokens.push(Token::EndObject);
        }
    }
}

/// Replace the value stored under a top-level `key` of an object.
///
/// Returns `None` if `tokens` is not an object or has no such key.
pub fn replace_at(tokens: Vec<Token>, key: &str, replacement: Vec<Token>) -> Option<Vec<Token>> {
    if tokens.first() != Some(&Token::StartObject) {
        return None;
    }

    let mut out = Vec::with_capacity(tokens.len() + replacement.len());
    let mut replacement = Some(replacement);
    let mut depth = 0usize;
    // Some(n): dropping the old value, n containers deep inside it
    let mut skipping: Option<usize> = None;
    let mut replaced = false;

    for token in tokens {
        if let Some(inner) = skipping {
            let inner = match token {
                Token::StartObject | Token::StartArray => inner + 1,
                Token::EndObject | Token::EndArray => inner.saturating_sub(1),
                _ => inner,
            };
            skipping = (inner > 0).then_some(inner);
            continue;
        }

        let at_target = depth == 1 && matches!(&token, Token::Key(k) if k == key);
        match token {
            Token::StartObject | Token::StartArray => depth += 1,
            Token::EndObject | Token::EndArray => depth = depth.saturating_sub(1),
            _ => {}
        }
        out.push(token);

        if at_target {
            if let Some(replacement) = replacement.take() {
                out.extend(replacement);
                replaced = true;
                skipping = Some(0);
            }
        }
    }

    replaced.then_some(out)
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
