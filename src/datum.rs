//! # Datum - Codec-Level Value Representation
//!
//! A [`Datum`] is a value as the row codec sees it: a width class, not a
//! SQL type. Small scalars are stored inline in the enum, larger values
//! borrow the caller's (or the row's) bytes, so decoding is zero-copy.
//!
//! ## Width Classes
//!
//! | Variant | Storage |
//! |---------|---------|
//! | `Int1` / `Int2` / `Int4` / `Int8` | Inline scalar, direct load/store |
//! | `Fixed` | Fixed-length bytes, copied verbatim |
//! | `Var` | Self-describing varlena blob, length prefix included |
//!
//! Signedness of the integer variants is caller interpretation; the codec
//! only moves bits. A `Var` datum always holds a complete blob as produced
//! by [`varlena::wrap`]: the first 4 bytes declare the blob's total length,
//! that length counting the prefix itself.

use eyre::{bail, ensure, Result};

/// Helpers for the self-describing variable-length encoding.
pub mod varlena {
    use super::*;

    /// Size of the little-endian length prefix, counted in the length.
    pub const PREFIX_SIZE: usize = 4;

    /// Builds a varlena blob around a payload.
    pub fn wrap(payload: &[u8]) -> Vec<u8> {
        let total = PREFIX_SIZE + payload.len();
        debug_assert!(total <= u32::MAX as usize);
        let mut blob = Vec::with_capacity(total);
        blob.extend_from_slice(&(total as u32).to_le_bytes());
        blob.extend_from_slice(payload);
        blob
    }

    /// Reads the total length a blob declares for itself.
    pub fn total_size(blob: &[u8]) -> Result<usize> {
        ensure!(
            blob.len() >= PREFIX_SIZE,
            "varlena blob of {} bytes is too short for its length prefix",
            blob.len()
        );
        let declared = u32::from_le_bytes([blob[0], blob[1], blob[2], blob[3]]) as usize;
        ensure!(
            declared >= PREFIX_SIZE,
            "varlena declares {} bytes, less than its own prefix",
            declared
        );
        Ok(declared)
    }

    /// Returns the payload of a complete blob, prefix stripped.
    pub fn payload(blob: &[u8]) -> Result<&[u8]> {
        let declared = total_size(blob)?;
        ensure!(
            declared == blob.len(),
            "varlena declares {} bytes but the blob holds {}",
            declared,
            blob.len()
        );
        Ok(&blob[PREFIX_SIZE..])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datum<'a> {
    Int1(i8),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    /// Fixed-length value stored by reference; length fixed by the schema.
    Fixed(&'a [u8]),
    /// Complete varlena blob, self-declared length prefix included.
    Var(&'a [u8]),
}

impl<'a> Datum<'a> {
    /// Placeholder for a null slot in a parallel values array. The encoder
    /// never reads the value of a null-flagged attribute.
    pub const fn null_slot() -> Datum<'static> {
        Datum::Fixed(&[])
    }

    /// Encoded byte length in a row's data region, alignment excluded.
    pub fn encoded_size(&self) -> usize {
        match self {
            Datum::Int1(_) => 1,
            Datum::Int2(_) => 2,
            Datum::Int4(_) => 4,
            Datum::Int8(_) => 8,
            Datum::Fixed(bytes) => bytes.len(),
            Datum::Var(blob) => blob.len(),
        }
    }

    /// Payload of a `Var` datum, length prefix stripped.
    pub fn var_payload(&self) -> Result<&'a [u8]> {
        match *self {
            Datum::Var(blob) => varlena::payload(blob),
            other => bail!("expected a varlena value, got {}", other.kind()),
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Datum::Int1(_) => "int1",
            Datum::Int2(_) => "int2",
            Datum::Int4(_) => "int4",
            Datum::Int8(_) => "int8",
            Datum::Fixed(_) => "fixed bytes",
            Datum::Var(_) => "varlena",
        }
    }
}
