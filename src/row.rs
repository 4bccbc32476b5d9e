//! # Row - Owned Row Buffer and Builder
//!
//! A [`Row`] owns one contiguous buffer: the 44-byte header, the optional
//! null bitmap, padding up to an 8-byte boundary, and the data region.
//! [`Row::build`] assembles a row from parallel value/null arrays;
//! [`Row::from_bytes`] revalidates a buffer that came back from storage.
//!
//! Rows are logically immutable once built. The only mutation the codec
//! offers is [`Row::header_mut`], through which the storage layer stamps
//! identity fields (row id, transaction ids) after placing the row;
//! "modifying" a row's values always produces a new row.

use eyre::{ensure, Result};
use zerocopy::FromBytes;

use crate::datum::Datum;
use crate::encode::{data_region_size, fill_data};
use crate::header::{row_flags, RowHeader, ROW_HEADER_SIZE};
use crate::schema::{Alignment, TupleSchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub(crate) buf: Vec<u8>,
}

impl Row {
    /// Builds a row from one value and one null flag per schema attribute.
    /// Values in null-flagged slots are ignored. The null bitmap is omitted
    /// entirely when nothing is null, which the decoder exploits as its
    /// fast path.
    pub fn build(schema: &TupleSchema, values: &[Datum<'_>], nulls: &[bool]) -> Result<Row> {
        let natts = schema.attr_count();
        ensure!(
            values.len() == natts && nulls.len() == natts,
            "expected {} values and null flags, got {} values and {} flags",
            natts,
            values.len(),
            nulls.len()
        );
        for (i, attr) in schema.attrs().iter().enumerate() {
            if !nulls[i] {
                attr.check_datum(&values[i])?;
            }
        }

        let has_nulls = nulls.iter().any(|&null| null);
        let bitmap_len = if has_nulls {
            TupleSchema::null_bitmap_size(natts)
        } else {
            0
        };
        // conservative: the data region always starts on a double boundary
        let data_off = Alignment::Double.align_up(ROW_HEADER_SIZE + bitmap_len);
        let total_len = data_off + data_region_size(schema, values, nulls);
        ensure!(
            u32::try_from(total_len).is_ok(),
            "row of {} bytes exceeds the format limit",
            total_len
        );

        let mut buf = vec![0u8; total_len];
        let (prefix, data) = buf.split_at_mut(data_off);
        let bitmap = if has_nulls {
            Some(&mut prefix[ROW_HEADER_SIZE..ROW_HEADER_SIZE + bitmap_len])
        } else {
            None
        };
        let flags = fill_data(data, bitmap, schema, values, nulls)?;

        let header = RowHeader::mut_from(&mut buf)?;
        header.set_total_len(total_len as u32);
        header.set_attr_count(natts as u16);
        header.set_data_off(data_off as u16);
        // a newly built row has not been superseded by any later version
        header.set_flags(flags | row_flags::DELETED_TXN_INVALID);

        Ok(Row { buf })
    }

    /// Revalidates a buffer holding an encoded row. The header must agree
    /// with the buffer length and leave room for its own bitmap.
    pub fn from_bytes(buf: Vec<u8>) -> Result<Row> {
        let header = RowHeader::ref_from(&buf)?;
        let total_len = header.total_len();
        let data_off = header.data_off();
        let bitmap_len = if header.has_nulls() {
            TupleSchema::null_bitmap_size(header.attr_count())
        } else {
            0
        };
        ensure!(
            total_len == buf.len(),
            "header declares {} bytes but the buffer holds {}",
            total_len,
            buf.len()
        );
        ensure!(
            data_off >= ROW_HEADER_SIZE + bitmap_len && data_off <= buf.len(),
            "data region offset {} inconsistent with a {}-byte header and bitmap",
            data_off,
            ROW_HEADER_SIZE + bitmap_len
        );
        Ok(Row { buf })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn header(&self) -> &RowHeader {
        // a Row invariantly holds at least a full header
        RowHeader::ref_from_bytes(&self.buf[..ROW_HEADER_SIZE]).expect("row buffer holds a header")
    }

    pub fn header_mut(&mut self) -> &mut RowHeader {
        RowHeader::mut_from_bytes(&mut self.buf[..ROW_HEADER_SIZE])
            .expect("row buffer holds a header")
    }

    /// Number of attributes this row was encoded with; a schema that grew
    /// since then may count more.
    pub fn attr_count(&self) -> usize {
        self.header().attr_count()
    }

    /// The null bitmap, present only when at least one attribute is null.
    /// Bit `i` set means attribute `i + 1` is present (non-null).
    pub fn null_bitmap(&self) -> Option<&[u8]> {
        let header = self.header();
        if !header.has_nulls() {
            return None;
        }
        let len = TupleSchema::null_bitmap_size(header.attr_count());
        Some(&self.buf[ROW_HEADER_SIZE..ROW_HEADER_SIZE + len])
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.buf[self.header().data_off()..]
    }
}
