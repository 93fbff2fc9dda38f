// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Interleaving one token sequence into another at a marker.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use super::token::Token;

/// Yield `template`, substituting the whole of `insert` for the first
/// `Marker(marker)`. Other markers pass through untouched.
pub fn splice<T, I>(template: T, marker: u32, insert: I) -> Splice<T::IntoIter, I::IntoIter>
where
    T: IntoIterator<Item = Token>,
    I: IntoIterator<Item = Token>,
{
    Splice {
        template: template.into_iter(),
        insert: Some(insert.into_iter()),
        marker,
        inserting: false,
    }
}

pub struct Splice<T, I> {
    template: T,
    insert: Option<I>,
    marker: u32,
    inserting: bool,
}

impl<T, I> Iterator for Splice<T, I>
where
    T: Iterator<Item = Token>,
    I: Iterator<Item = Token>,
{
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if self.inserting {
                match self.insert.as_mut().and_then(Iterator::next) {
                    Some(token) => return Some(token),
                    None => {
                        self.inserting = false;
                        self.insert = None;
                    }
                }
            }
            match self.template.next()? {
                Token::Marker(m) if m == self.marker && self.insert.is_some() => {
                    self.inserting = true;
                }
                token => return Some(token),
            }
        }
    }
}

/// Stream form of [`splice`].
pub fn splice_stream<T, I>(template: T, marker: u32, insert: I) -> SpliceStream<T, I>
where
    T: Stream<Item = Token> + Unpin,
    I: Stream<Item = Token> + Unpin,
{
    SpliceStream {
        template,
        insert: Some(insert),
        marker,
        inserting: false,
    }
}

pub struct SpliceStream<T, I> {
    template: T,
    insert: Option<I>,
    marker: u32,
    inserting: bool,
}

impl<T, I> Stream for SpliceStream<T, I>
where
    T: Stream<Item = Token> + Unpin,
    I: Stream<Item = Token> + Unpin,
{
    type Item = Token;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Token>> {
        let this = &mut *self;
        loop {
            if this.inserting {
                if let Some(insert) = this.insert.as_mut() {
                    match Pin::new(insert).poll_next(cx) {
                        Poll::Ready(Some(token)) => return Poll::Ready(Some(token)),
                        Poll::Ready(None) => {}
                        Poll::Pending => return Poll::Pending,
                    }
                }
                this.inserting = false;
                this.insert = None;
            }
            match Pin::new(&mut this.template).poll_next(cx) {
                Poll::Ready(Some(Token::Marker(m)))
                    if m == this.marker && this.insert.is_some() =>
                {
                    this.inserting = true;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
#[path = "splice_tests.rs"]
mod tests;
