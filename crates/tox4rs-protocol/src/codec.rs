//! Event batch codec.
//!
//! Batch format:
//!
//! ```text
//! magic: u32 BE | version: u16 BE | count: u32 BE | count x record
//! record: length: u32 BE | serde JSON
//! ```
//!
//! A zero-length poll result is an empty batch. Anything else that does not
//! parse exactly is an error: the engine and this decoder disagree about the
//! format and the caller must not continue with partial data.

use std::marker::PhantomData;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::events::EventRecord;
use crate::{DecodeError, BATCH_MAGIC, BATCH_VERSION};

/// Maximum encoded record size: 1 MB (a raw video frame fits comfortably).
const MAX_RECORD_SIZE: usize = 1024 * 1024;

/// Length prefix size in bytes.
const LENGTH_PREFIX_SIZE: usize = 4;

/// magic + version + count.
const HEADER_SIZE: usize = 4 + 2 + 4;

/// Upper bound on up-front allocation from an untrusted record count.
const MAX_PREALLOC: usize = 1024;

/// Codec for framing one record type over a byte buffer.
pub struct RecordCodec<Ev> {
    _record: PhantomData<fn() -> Ev>,
}

impl<Ev> RecordCodec<Ev> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<Ev> Default for RecordCodec<Ev> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ev: EventRecord> Decoder for RecordCodec<Ev> {
    type Item = Ev;
    type Error = DecodeError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Need at least the length prefix
        if src.len() < LENGTH_PREFIX_SIZE {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if length > MAX_RECORD_SIZE {
            return Err(DecodeError::RecordTooLarge {
                size: length,
                max: MAX_RECORD_SIZE,
            });
        }

        let total = LENGTH_PREFIX_SIZE + length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_SIZE);
        let record_bytes = src.split_to(length);

        let record: Ev = serde_json::from_slice(&record_bytes)?;
        Ok(Some(record))
    }
}

impl<Ev: EventRecord> Encoder<&Ev> for RecordCodec<Ev> {
    type Error = DecodeError;

    fn encode(&mut self, item: &Ev, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = serde_json::to_vec(item)?;

        if payload.len() > MAX_RECORD_SIZE {
            return Err(DecodeError::RecordTooLarge {
                size: payload.len(),
                max: MAX_RECORD_SIZE,
            });
        }

        dst.reserve(LENGTH_PREFIX_SIZE + payload.len());
        dst.put_u32(payload.len() as u32);
        dst.extend_from_slice(&payload);

        Ok(())
    }
}

/// The ordered records produced by one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBatch<Ev> {
    records: Vec<Ev>,
}

impl<Ev> EventBatch<Ev> {
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Ev] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Ev> {
        self.records.iter()
    }
}

impl<Ev> From<Vec<Ev>> for EventBatch<Ev> {
    fn from(records: Vec<Ev>) -> Self {
        Self { records }
    }
}

impl<Ev> IntoIterator for EventBatch<Ev> {
    type Item = Ev;
    type IntoIter = std::vec::IntoIter<Ev>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

/// Decode exactly one poll result.
pub fn decode_batch<Ev: EventRecord>(bytes: &[u8]) -> Result<EventBatch<Ev>, DecodeError> {
    if bytes.is_empty() {
        return Ok(EventBatch::empty());
    }
    if bytes.len() < HEADER_SIZE {
        return Err(DecodeError::Truncated {
            context: "batch header",
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let mut buf = BytesMut::from(bytes);

    let magic = buf.get_u32();
    if magic != BATCH_MAGIC {
        return Err(DecodeError::InvalidMagic {
            expected: BATCH_MAGIC,
            got: magic,
        });
    }

    let version = buf.get_u16();
    if version != BATCH_VERSION {
        return Err(DecodeError::VersionMismatch {
            got: version,
            supported: BATCH_VERSION,
        });
    }

    let declared = buf.get_u32() as usize;
    let mut codec = RecordCodec::<Ev>::new();
    let mut records = Vec::with_capacity(declared.min(MAX_PREALLOC));

    while records.len() < declared {
        match codec.decode(&mut buf)? {
            Some(record) => records.push(record),
            None if buf.is_empty() => {
                return Err(DecodeError::CountMismatch {
                    declared,
                    found: records.len(),
                });
            }
            None => {
                return Err(DecodeError::Truncated {
                    context: "record",
                    needed: frame_length(&buf),
                    available: buf.len(),
                });
            }
        }
    }

    if !buf.is_empty() {
        return Err(DecodeError::TrailingBytes {
            remaining: buf.len(),
        });
    }

    tracing::trace!(records = records.len(), "decoded event batch");
    Ok(EventBatch { records })
}

/// Encode records into one batch, preserving order.
pub fn encode_batch<Ev: EventRecord>(records: &[Ev]) -> Result<Bytes, DecodeError> {
    let mut dst = BytesMut::with_capacity(HEADER_SIZE);
    dst.put_u32(BATCH_MAGIC);
    dst.put_u16(BATCH_VERSION);
    dst.put_u32(records.len() as u32);

    let mut codec = RecordCodec::<Ev>::new();
    for record in records {
        codec.encode(record, &mut dst)?;
    }
    Ok(dst.freeze())
}

/// Bytes a partial frame at the front of `buf` would need to be complete.
fn frame_length(buf: &BytesMut) -> usize {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return LENGTH_PREFIX_SIZE;
    }
    LENGTH_PREFIX_SIZE + u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize
}
