// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Two-mode CBOR encoder.
//!
//! Signing runs the same encode path twice when the caller needs to size a
//! buffer: once in [`EncodeMode::Sizing`], where bytes are only counted, and once
//! in [`EncodeMode::Writing`] against the real buffer. Both passes must produce
//! the same length.

use std::fmt;

use cosesign_abstractions::CoseError;
use minicbor::data::Tag;
use minicbor::encode::Write;
use minicbor::Encoder;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EncodeMode {
    /// Count bytes only. Signers skip cryptographic work.
    Sizing,
    /// Write into the caller's buffer.
    Writing,
}

/// Write error raised when the fixed-capacity buffer is full.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SinkFull;

impl fmt::Display for SinkFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("output buffer full")
    }
}

/// Output target of a [`CoseEncoder`]: a borrowed buffer, or nothing when sizing.
#[derive(Debug)]
pub struct OutputSink<'b> {
    buf: Option<&'b mut [u8]>,
    len: usize,
    overflowed: bool,
}

impl Write for OutputSink<'_> {
    type Error = SinkFull;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let end = self.len.checked_add(data.len()).ok_or(SinkFull)?;
        if let Some(buf) = self.buf.as_deref_mut() {
            let Some(dst) = buf.get_mut(self.len..end) else {
                self.overflowed = true;
                return Err(SinkFull);
            };
            dst.copy_from_slice(data);
        }
        self.len = end;
        Ok(())
    }
}

pub struct CoseEncoder<'b> {
    inner: Encoder<OutputSink<'b>>,
}

impl<'b> CoseEncoder<'b> {
    /// An encoder that only counts the bytes it would write.
    pub fn sizing() -> Self {
        Self::with_sink(OutputSink { buf: None, len: 0, overflowed: false })
    }

    /// An encoder that writes into `buf`, failing with `BufferTooSmall` when it is full.
    pub fn writing(buf: &'b mut [u8]) -> Self {
        Self::with_sink(OutputSink { buf: Some(buf), len: 0, overflowed: false })
    }

    fn with_sink(sink: OutputSink<'b>) -> Self {
        Self { inner: Encoder::new(sink) }
    }

    pub fn mode(&self) -> EncodeMode {
        if self.inner.writer().buf.is_some() {
            EncodeMode::Writing
        } else {
            EncodeMode::Sizing
        }
    }

    pub fn is_sizing(&self) -> bool {
        self.mode() == EncodeMode::Sizing
    }

    /// Bytes written (or counted) so far.
    pub fn len(&self) -> usize {
        self.inner.writer().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tag(&mut self, tag: u64) -> Result<&mut Self, CoseError> {
        self.op(|e| e.tag(Tag::new(tag)))
    }

    pub fn array(&mut self, len: u64) -> Result<&mut Self, CoseError> {
        self.op(|e| e.array(len))
    }

    pub fn map(&mut self, len: u64) -> Result<&mut Self, CoseError> {
        self.op(|e| e.map(len))
    }

    pub fn bytes(&mut self, bytes: &[u8]) -> Result<&mut Self, CoseError> {
        self.op(|e| e.bytes(bytes))
    }

    pub fn str(&mut self, s: &str) -> Result<&mut Self, CoseError> {
        self.op(|e| e.str(s))
    }

    pub fn i64(&mut self, value: i64) -> Result<&mut Self, CoseError> {
        self.op(|e| e.i64(value))
    }

    pub fn null(&mut self) -> Result<&mut Self, CoseError> {
        self.op(|e| e.null())
    }

    /// Append already-encoded CBOR unchanged.
    pub fn raw(&mut self, cbor: &[u8]) -> Result<&mut Self, CoseError> {
        self.inner.writer_mut().write_all(cbor).map_err(|_| CoseError::BufferTooSmall)?;
        Ok(self)
    }

    /// Consume the encoder, returning the number of bytes written or counted.
    pub fn finish(self) -> usize {
        self.inner.into_writer().len
    }

    pub(crate) fn inner_mut(&mut self) -> &mut Encoder<OutputSink<'b>> {
        &mut self.inner
    }

    pub(crate) fn map_encode_error(&self, err: minicbor::encode::Error<SinkFull>) -> CoseError {
        if self.inner.writer().overflowed {
            CoseError::BufferTooSmall
        } else {
            CoseError::CborNotWellFormed(err.to_string())
        }
    }

    fn op<F>(&mut self, f: F) -> Result<&mut Self, CoseError>
    where
        F: for<'e> FnOnce(
            &'e mut Encoder<OutputSink<'b>>,
        ) -> Result<&'e mut Encoder<OutputSink<'b>>, minicbor::encode::Error<SinkFull>>,
    {
        let result = f(&mut self.inner).map(|_| ());
        match result {
            Ok(()) => Ok(self),
            Err(e) => Err(self.map_encode_error(e)),
        }
    }
}
