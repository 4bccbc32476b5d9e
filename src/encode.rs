//! # Size Calculator and Data Encoder
//!
//! Building a row is a dual pass over the same traversal: the buffer must
//! be allocated before it can be filled, so [`data_region_size`] first
//! computes the exact data-region length, then `fill_data` writes values
//! into the pre-sized, pre-zeroed buffer in the identical order. Both walk
//! the schema attribute by attribute, skip nulls entirely (a null advances
//! neither the offset nor the alignment), and round the running offset up
//! to each non-null attribute's alignment boundary before counting or
//! writing it.

use eyre::{bail, Result};

use crate::datum::Datum;
use crate::header::row_flags;
use crate::schema::{StorageClass, TupleSchema};

/// Byte length of the data region for the given values and null flags.
///
/// Callers must pass one value and one null flag per schema attribute;
/// values in null-flagged slots are ignored. No side effects.
pub fn data_region_size(schema: &TupleSchema, values: &[Datum<'_>], nulls: &[bool]) -> usize {
    debug_assert_eq!(values.len(), schema.attr_count());
    debug_assert_eq!(nulls.len(), schema.attr_count());

    let mut size = 0;
    for (i, attr) in schema.attrs().iter().enumerate() {
        if nulls[i] {
            continue;
        }
        size = attr.align().align_up(size);
        size += values[i].encoded_size();
    }
    size
}

/// Writes the data region and (when present) the null bitmap, mirroring
/// the [`data_region_size`] traversal byte for byte. Returns the flag bits
/// discovered along the way. Padding bytes are left zeroed, never
/// uninitialized.
pub(crate) fn fill_data(
    data: &mut [u8],
    mut bitmap: Option<&mut [u8]>,
    schema: &TupleSchema,
    values: &[Datum<'_>],
    nulls: &[bool],
) -> Result<u16> {
    let mut flags = 0u16;
    let mut off = 0usize;

    for (i, attr) in schema.attrs().iter().enumerate() {
        if nulls[i] {
            // the cleared bitmap bit marks the null; the value slot is ignored
            flags |= row_flags::HAS_NULLS;
            continue;
        }
        if let Some(bits) = bitmap.as_deref_mut() {
            bits[i / 8] |= 1 << (i % 8);
        }

        off = attr.align().align_up(off);
        match (attr.class(), &values[i]) {
            (StorageClass::Inline1, Datum::Int1(v)) => data[off] = *v as u8,
            (StorageClass::Inline2, Datum::Int2(v)) => {
                data[off..off + 2].copy_from_slice(&v.to_le_bytes());
            }
            (StorageClass::Inline4, Datum::Int4(v)) => {
                data[off..off + 4].copy_from_slice(&v.to_le_bytes());
            }
            (StorageClass::Inline8, Datum::Int8(v)) => {
                data[off..off + 8].copy_from_slice(&v.to_le_bytes());
            }
            (StorageClass::FixedRef(len), Datum::Fixed(bytes)) => {
                data[off..off + len].copy_from_slice(bytes);
            }
            (StorageClass::Var | StorageClass::VarFixed(_), Datum::Var(blob)) => {
                flags |= row_flags::HAS_VAR_ATTRS;
                // the blob is copied whole, self-declared length prefix included
                data[off..off + blob.len()].copy_from_slice(blob);
            }
            (class, value) => bail!(
                "attribute {:?} ({:?}) cannot hold a {} value",
                attr.name(),
                class,
                value.kind()
            ),
        }
        off += values[i].encoded_size();
    }

    Ok(flags)
}
