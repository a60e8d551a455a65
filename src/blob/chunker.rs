use std::{
    pin::Pin,
    task::{Context, Poll},
};

use bytes::{Bytes, BytesMut};
use futures::{ready, Stream};
use pin_project::pin_project;

use crate::error::StorageError;

/// Regroups an arbitrary byte stream into chunks of exactly `chunk_size`
/// bytes. Only the final chunk may be shorter; empty input yields nothing.
#[pin_project]
#[derive(Debug)]
pub struct Chunked<S> {
    #[pin]
    inner: S,
    chunk_size: usize,
    buffer: BytesMut,
    done: bool,
}

impl<S> Chunked<S> {
    /// Wraps `inner`. `chunk_size` must be non-zero.
    pub fn new(inner: S, chunk_size: usize) -> Self {
        debug_assert!(chunk_size > 0);
        Self {
            inner,
            chunk_size,
            buffer: BytesMut::new(),
            done: false,
        }
    }
}

impl<S> Stream for Chunked<S>
where
    S: Stream<Item = Result<Bytes, StorageError>>,
{
    type Item = Result<Bytes, StorageError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        loop {
            if this.buffer.len() >= *this.chunk_size {
                return Poll::Ready(Some(Ok(this.buffer.split_to(*this.chunk_size).freeze())));
            }

            if *this.done {
                if this.buffer.is_empty() {
                    return Poll::Ready(None);
                }
                return Poll::Ready(Some(Ok(this.buffer.split().freeze())));
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => this.buffer.extend_from_slice(&bytes),
                Some(Err(err)) => {
                    *this.done = true;
                    this.buffer.clear();
                    return Poll::Ready(Some(Err(err)));
                }
                None => *this.done = true,
            }
        }
    }
}
