//! Streaming "gunzip if gzipped" filter over an upstream response body
//!
//! Concatenated gzip members are inflated in sequence; anything after the
//! last member that is not another member is ignored.

use std::io::{self, Write};
use std::mem;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use bytes::Bytes;
use flate2::write::GzDecoder;
use futures_util::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use pkgate_core::error::GatewayError;
use crate::RegistryResult;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

type ByteSource = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

enum DecodeState {
    /// Collecting bytes to look for the gzip magic, at the start of the body
    /// or right after a complete member
    Sniffing { head: Vec<u8>, after_member: bool },
    /// Inside one gzip member
    Gzip(GzDecoder<Vec<u8>>),
    /// Body is not gzip, bytes pass through
    Plain,
    /// Non-gzip bytes after the last member, dropped
    Trailing,
    Done,
}

/// Decompressed tarball bytes, read once by a single consumer.
///
/// Chunks are inflated as they arrive; nothing is buffered beyond the
/// current chunk. Dropping the stream drops the upstream response and its
/// connection.
pub struct TarballStream {
    package: String,
    source: ByteSource,
    state: DecodeState,
}

impl TarballStream {
    /// Wrap a raw byte source. `package` is only used in error messages.
    pub fn new<S>(package: impl Into<String>, source: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            package: package.into(),
            source: Box::pin(source),
            state: DecodeState::Sniffing {
                head: Vec::with_capacity(GZIP_MAGIC.len()),
                after_member: false,
            },
        }
    }

    /// Decode the body of an upstream response
    pub fn from_response(package: impl Into<String>, response: reqwest::Response) -> Self {
        let source = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| io::Error::new(io::ErrorKind::Other, e)));
        Self::new(package, source)
    }

    /// Drain the whole stream into memory
    pub async fn read_to_end(mut self) -> RegistryResult<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    /// Drain the stream into a writer, returning the number of bytes written
    pub async fn copy_to<W>(mut self, writer: &mut W) -> RegistryResult<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.next().await {
            let chunk = chunk?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| GatewayError::io("Failed to write tarball".to_string(), e))?;
            written += chunk.len() as u64;
        }
        writer
            .flush()
            .await
            .map_err(|e| GatewayError::io("Failed to flush tarball".to_string(), e))?;
        Ok(written)
    }

    fn feed(&mut self, chunk: Bytes) -> RegistryResult<Option<Bytes>> {
        if matches!(self.state, DecodeState::Plain) {
            return Ok(non_empty_bytes(chunk));
        }

        let mut out = Vec::new();
        let mut input: &[u8] = &chunk;

        while !input.is_empty() {
            match &mut self.state {
                DecodeState::Sniffing { head, after_member } => {
                    let take = (GZIP_MAGIC.len() - head.len()).min(input.len());
                    head.extend_from_slice(&input[..take]);
                    input = &input[take..];
                    if head.len() < GZIP_MAGIC.len() {
                        continue;
                    }

                    let head = mem::take(head);
                    let after_member = *after_member;
                    if head == GZIP_MAGIC {
                        let mut decoder = GzDecoder::new(Vec::new());
                        decoder.write_all(&head).map_err(|e| corrupt(&self.package, e))?;
                        self.state = DecodeState::Gzip(decoder);
                    } else if after_member {
                        self.state = DecodeState::Trailing;
                    } else {
                        out.extend_from_slice(&head);
                        self.state = DecodeState::Plain;
                    }
                }
                DecodeState::Gzip(decoder) => {
                    let consumed = decoder.write(input).map_err(|e| corrupt(&self.package, e))?;
                    if consumed == 0 {
                        // Member complete, trailer included
                        decoder.try_finish().map_err(|e| corrupt(&self.package, e))?;
                        out.append(decoder.get_mut());
                        self.state = DecodeState::Sniffing {
                            head: Vec::with_capacity(GZIP_MAGIC.len()),
                            after_member: true,
                        };
                    } else {
                        out.append(decoder.get_mut());
                        input = &input[consumed..];
                    }
                }
                DecodeState::Plain => {
                    out.extend_from_slice(input);
                    input = &[];
                }
                DecodeState::Trailing | DecodeState::Done => {
                    input = &[];
                }
            }
        }

        Ok(non_empty(out))
    }

    fn finish(&mut self) -> RegistryResult<Option<Bytes>> {
        match mem::replace(&mut self.state, DecodeState::Done) {
            // Fewer bytes than the magic: cannot be gzip
            DecodeState::Sniffing { head, after_member: false } => Ok(non_empty(head)),
            DecodeState::Sniffing { after_member: true, .. } => Ok(None),
            DecodeState::Gzip(decoder) => {
                let rest = decoder.finish().map_err(|e| corrupt(&self.package, e))?;
                Ok(non_empty(rest))
            }
            DecodeState::Plain | DecodeState::Trailing | DecodeState::Done => Ok(None),
        }
    }
}

impl Stream for TarballStream {
    type Item = RegistryResult<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if matches!(this.state, DecodeState::Done) {
                return Poll::Ready(None);
            }

            let result = match ready!(this.source.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => this.feed(chunk),
                Some(Err(e)) => Err(GatewayError::network(
                    format!("Failed to read tarball for {}", this.package),
                    e,
                )),
                None => match this.finish() {
                    Ok(None) => return Poll::Ready(None),
                    other => other,
                },
            };

            match result {
                Ok(Some(bytes)) => return Poll::Ready(Some(Ok(bytes))),
                Ok(None) => continue,
                Err(e) => {
                    this.state = DecodeState::Done;
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}

impl std::fmt::Debug for TarballStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TarballStream").field("package", &self.package).finish_non_exhaustive()
    }
}

fn corrupt(package: &str, error: io::Error) -> GatewayError {
    GatewayError::MalformedDocument {
        package: package.to_string(),
        message: format!("tarball is not valid gzip: {}", error),
    }
}

fn non_empty_bytes(bytes: Bytes) -> Option<Bytes> {
    if bytes.is_empty() {
        None
    } else {
        Some(bytes)
    }
}

fn non_empty(bytes: Vec<u8>) -> Option<Bytes> {
    if bytes.is_empty() {
        None
    } else {
        Some(Bytes::from(bytes))
    }
}
