// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Token-level serialization for large result sets.
//!
//! Values are disassembled into a flat [`Token`] sequence, record sequences
//! are spliced into a template at a [`Token::Marker`], and the result is
//! rendered to compact JSON a chunk at a time.

pub mod splice;
pub mod stringer;
pub mod token;

pub use splice::{splice, splice_stream, Splice, SpliceStream};
pub use stringer::{stringify, stringify_stream, JsonStringer};
pub use token::{disassemble, replace_at, Token};

use futures::{stream, Stream, StreamExt};

/// Marker the wrapped-array template carries where records go.
pub const RECORDS_MARKER: u32 = 0;

fn record_tokens<T: serde::Serialize>(record: &T) -> Vec<Token> {
    disassemble(record).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "dropping record that failed to serialize");
        Vec::new()
    })
}

/// Tokens for a bare JSON array of `records`, one record disassembled at a time.
pub fn array_tokens<I, T>(records: I) -> impl Iterator<Item = Token>
where
    I: IntoIterator<Item = T>,
    T: serde::Serialize,
{
    let body = records.into_iter().flat_map(|record| record_tokens(&record));
    std::iter::once(Token::StartArray)
        .chain(body)
        .chain(std::iter::once(Token::EndArray))
}

/// `{"<key>": <marker>}`, ready for [`splice`].
pub fn wrapped_template(key: &str) -> Vec<Token> {
    let mut shape = serde_json::Map::new();
    shape.insert(key.to_string(), serde_json::Value::Null);
    disassemble(&shape)
        .ok()
        .and_then(|tokens| replace_at(tokens, key, vec![Token::Marker(RECORDS_MARKER)]))
        .unwrap_or_default()
}

/// Tokens for `{"<key>": [records...]}` built by splicing into a template.
pub fn wrapped_array_tokens<I, T>(key: &str, records: I) -> impl Iterator<Item = Token>
where
    I: IntoIterator<Item = T>,
    T: serde::Serialize,
{
    splice(wrapped_template(key), RECORDS_MARKER, array_tokens(records))
}

/// Stream form of [`array_tokens`].
pub fn array_stream<S, T>(records: S) -> impl Stream<Item = Token> + Unpin
where
    S: Stream<Item = T> + Unpin,
    T: serde::Serialize,
{
    let body = records.flat_map(|record| stream::iter(record_tokens(&record)));
    stream::iter([Token::StartArray])
        .chain(body)
        .chain(stream::iter([Token::EndArray]))
}

/// Stream form of [`wrapped_array_tokens`].
pub fn wrapped_array_stream<S, T>(key: &str, records: S) -> impl Stream<Item = Token> + Unpin
where
    S: Stream<Item = T> + Unpin,
    T: serde::Serialize,
{
    splice_stream(
        stream::iter(wrapped_template(key)),
        RECORDS_MARKER,
        array_stream(records),
    )
}
