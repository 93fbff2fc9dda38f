// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tokens to compact JSON text.
//!
//! Output is byte-for-byte what `serde_json::to_vec` produces for the same
//! value: strings and numbers are written by `serde_json` itself.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::token::Token;

/// Default number of bytes gathered before a chunk is emitted.
pub const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Clone, Copy, Debug)]
struct Frame {
    object: bool,
    first: bool,
}

/// Incremental writer. Feed tokens in order with [`push`](Self::push).
#[derive(Clone, Debug, Default)]
pub struct JsonStringer {
    stack: Vec<Frame>,
    after_key: bool,
}

impl JsonStringer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the text for one token to `out`.
    pub fn push(&mut self, token: &Token, out: &mut Vec<u8>) {
        match token {
            Token::Marker(_) => {}
            Token::EndObject | Token::EndArray => {
                self.stack.pop();
                out.push(if matches!(token, Token::EndObject) { b'}' } else { b']' });
            }
            Token::Key(key) => {
                self.separate(out);
                write_string(key, out);
                out.push(b':');
                self.after_key = true;
            }
            Token::StartObject | Token::StartArray => {
                self.value_prefix(out);
                let object = matches!(token, Token::StartObject);
                out.push(if object { b'{' } else { b'[' });
                self.stack.push(Frame {
                    object,
                    first: true,
                });
            }
            Token::Null => {
                self.value_prefix(out);
                out.extend_from_slice(b"null");
            }
            Token::Bool(b) => {
                self.value_prefix(out);
                out.extend_from_slice(if *b { b"true" } else { b"false" });
            }
            Token::Number(n) => {
                self.value_prefix(out);
                let _ = serde_json::to_writer(&mut *out, n);
            }
            Token::String(s) => {
                self.value_prefix(out);
                write_string(s, out);
            }
        }
    }

    /// Whether every container opened so far has been closed.
    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty() && !self.after_key
    }

    fn value_prefix(&mut self, out: &mut Vec<u8>) {
        if self.after_key {
            self.after_key = false;
            return;
        }
        if self.stack.last().is_some_and(|f| !f.object) {
            self.separate(out);
        }
    }

    fn separate(&mut self, out: &mut Vec<u8>) {
        if let Some(frame) = self.stack.last_mut() {
            if frame.first {
                frame.first = false;
            } else {
                out.push(b',');
            }
        }
    }
}

fn write_string(s: &str, out: &mut Vec<u8>) {
    // Infallible into a Vec.
    let _ = serde_json::to_writer(&mut *out, s);
}

/// Render tokens to chunks of roughly `chunk_size` bytes.
pub fn stringify<I>(tokens: I, chunk_size: usize) -> impl Iterator<Item = Bytes>
where
    I: IntoIterator<Item = Token>,
{
    let mut tokens = tokens.into_iter();
    let mut stringer = JsonStringer::new();
    std::iter::from_fn(move || {
        let mut buf = Vec::with_capacity(chunk_size.min(CHUNK_SIZE));
        for token in tokens.by_ref() {
            stringer.push(&token, &mut buf);
            if buf.len() >= chunk_size {
                break;
            }
        }
        (!buf.is_empty()).then(|| Bytes::from(buf))
    })
}

/// Stream form of [`stringify`]: renders whatever tokens are ready into one
/// chunk, up to `max_tokens` at a time.
pub fn stringify_stream<S>(tokens: S, max_tokens: usize) -> impl Stream<Item = Bytes>
where
    S: Stream<Item = Token>,
{
    tokens
        .ready_chunks(max_tokens.max(1))
        .scan(JsonStringer::new(), |stringer, batch| {
            let mut buf = Vec::new();
            for token in &batch {
                stringer.push(token, &mut buf);
            }
            futures::future::ready(Some(Bytes::from(buf)))
        })
        .filter(|chunk| futures::future::ready(!chunk.is_empty()))
}

#[cfg(test)]
#[path = "stringer_tests.rs"]
mod tests;
