//! # Attribute Decoder
//!
//! [`Row::get`] extracts a single attribute from an encoded row. Because
//! nulls and variable-length values shift everything encoded after them,
//! attribute offsets are not constant per schema in general, and the
//! decoder picks one of three strategies per request:
//!
//! 1. **No-null fast path**: the row stored no bitmap, so every offset is
//!    row-independent. Cached offsets are trusted unconditionally; on a
//!    miss the cache is extended forward from the last known offset, and
//!    the extension keeps going past the target while offsets stay
//!    row-independent.
//! 2. **Null-tolerant cached path**: the row has a bitmap, but the bitmap
//!    proves no attribute strictly before the target is null, which is
//!    exactly the precondition every cache entry was computed under.
//! 3. **Slow path**: some earlier attribute is null in this row, so the
//!    true offset is row-specific. Attributes are walked one by one; the
//!    cache is still populated opportunistically, but only for the prefix
//!    not preceded by any null in this row, and population stops for good
//!    after the first unbounded variable-length attribute.
//!
//! Populating the cache never changes what a request returns, only how
//! much of the row it walks.

use eyre::{ensure, Result};

use crate::datum::{varlena, Datum};
use crate::row::Row;
use crate::schema::{Attribute, StorageClass, TupleSchema};
use crate::sysattr::SysAttr;

/// Bit `idx` set means attribute `idx + 1` is present (non-null).
fn bit_is_set(bitmap: &[u8], idx: usize) -> bool {
    bitmap[idx / 8] & (1 << (idx % 8)) != 0
}

/// True if any attribute strictly before `idx` is null. Whole bytes are
/// compared against 0xff before the final byte is masked.
fn any_null_before(bitmap: &[u8], idx: usize) -> bool {
    let full_bytes = idx / 8;
    for &byte in &bitmap[..full_bytes] {
        if byte != 0xff {
            return true;
        }
    }
    let mask = (1u8 << (idx % 8)) - 1;
    (!bitmap[full_bytes]) & mask != 0
}

/// Encoded size of the attribute starting at `off`, bounds-checked against
/// the data region.
fn stored_size(attr: &Attribute, data: &[u8], off: usize) -> Result<usize> {
    ensure!(
        off <= data.len(),
        "attribute {:?} starts at offset {} beyond the {}-byte data region",
        attr.name(),
        off,
        data.len()
    );
    let size = match attr.static_size() {
        Some(size) => size,
        None => varlena::total_size(&data[off..])?,
    };
    ensure!(
        off + size <= data.len(),
        "attribute {:?} needs {} bytes at offset {} of a {}-byte data region",
        attr.name(),
        size,
        off,
        data.len()
    );
    Ok(size)
}

/// Reads the value starting at `off` according to the attribute's storage
/// class.
fn fetch<'a>(attr: &Attribute, data: &'a [u8], off: usize) -> Result<Datum<'a>> {
    let size = stored_size(attr, data, off)?;
    let bytes = &data[off..off + size];
    Ok(match attr.class() {
        StorageClass::Inline1 => Datum::Int1(bytes[0] as i8),
        StorageClass::Inline2 => Datum::Int2(i16::from_le_bytes([bytes[0], bytes[1]])),
        StorageClass::Inline4 => {
            Datum::Int4(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        StorageClass::Inline8 => {
            let raw: [u8; 8] = bytes
                .try_into()
                .map_err(|_| eyre::eyre!("short read for attribute {:?}", attr.name()))?;
            Datum::Int8(i64::from_le_bytes(raw))
        }
        StorageClass::FixedRef(_) => Datum::Fixed(bytes),
        StorageClass::Var | StorageClass::VarFixed(_) => {
            if let StorageClass::VarFixed(expected) = attr.class() {
                let declared = varlena::total_size(bytes)?;
                ensure!(
                    declared == expected,
                    "fixed-size variable attribute {:?} declares {} bytes, expected {}",
                    attr.name(),
                    declared,
                    expected
                );
            }
            Datum::Var(bytes)
        }
    })
}

impl Row {
    /// Returns attribute `attno` (1-based) of this row, or `Ok(None)` when
    /// it is null. Negative numbers select system attributes; zero is
    /// invalid. A positive number beyond this row's stored attribute count
    /// (but within the schema) reads as null: the schema grew after the
    /// row was encoded.
    pub fn get<'a>(&'a self, schema: &TupleSchema, attno: i32) -> Result<Option<Datum<'a>>> {
        if attno < 0 {
            return self.sys_attr(attno).map(Some);
        }
        ensure!(attno != 0, "attribute number zero is not addressable");
        let idx = (attno - 1) as usize;
        ensure!(
            idx < schema.attr_count(),
            "attribute {} out of range for a schema of {} attributes",
            attno,
            schema.attr_count()
        );
        if attno as usize > self.attr_count() {
            return Ok(None);
        }
        self.get_regular(schema, idx)
    }

    fn get_regular<'a>(&'a self, schema: &TupleSchema, idx: usize) -> Result<Option<Datum<'a>>> {
        let attrs = schema.attrs();
        let data = self.data();
        let row_natts = self.attr_count();

        let bitmap = self.null_bitmap();
        let mut slow = false;
        if let Some(bits) = bitmap {
            if !bit_is_set(bits, idx) {
                return Ok(None);
            }
            slow = any_null_before(bits, idx);
        }

        if !slow {
            // no null before the target: offsets are row-independent as
            // long as no unbounded attribute sits at or before it
            if let Some(off) = attrs[idx].cached_offset() {
                return fetch(&attrs[idx], data, off).map(Some);
            }
            if idx == 0 {
                return fetch(&attrs[0], data, 0).map(Some);
            }
            if self.header().has_var_attrs() {
                // `..=` so an unbounded target itself forces the row walk
                for attr in &attrs[..=idx] {
                    if attr.static_size().is_none() {
                        slow = true;
                        break;
                    }
                }
            }
        }

        if !slow {
            // attributes up to the target are all statically sized: extend
            // the cache from the last cached entry through the target, then
            // keep going while offsets stay row-independent
            attrs[0].set_cached_offset(0);
            let mut resume = 1;
            while resume < idx && attrs[resume].cached_offset().is_some_and(|off| off > 0) {
                resume += 1;
            }
            let prev = &attrs[resume - 1];
            let (Some(prev_off), Some(prev_size)) = (prev.cached_offset(), prev.static_size())
            else {
                eyre::bail!(
                    "offset cache inconsistent before attribute {:?}",
                    prev.name()
                );
            };
            let mut off = prev_off + prev_size;
            let all_fixed = !self.header().has_var_attrs();

            for k in resume..attrs.len() {
                if k > idx {
                    if k >= row_natts || attrs[k].cached_offset().is_some() {
                        break;
                    }
                    if bitmap.is_some_and(|bits| !bit_is_set(bits, k)) {
                        break;
                    }
                    if !all_fixed && attrs[k].static_size().is_none() {
                        break;
                    }
                }
                off = attrs[k].align().align_up(off);
                attrs[k].set_cached_offset(off);
                off += stored_size(&attrs[k], data, off)?;
            }

            let Some(target_off) = attrs[idx].cached_offset() else {
                eyre::bail!(
                    "offset cache failed to cover attribute {:?}",
                    attrs[idx].name()
                );
            };
            return fetch(&attrs[idx], data, target_off).map(Some);
        }

        // walk this specific row; offsets generalize to other rows only
        // until the first null or unbounded attribute is passed
        let mut use_cache = true;
        let mut off = 0usize;
        for i in 0..idx {
            if bitmap.is_some_and(|bits| !bit_is_set(bits, i)) {
                use_cache = false;
                continue;
            }
            match attrs[i].cached_offset() {
                Some(cached) if use_cache => off = cached,
                _ => {
                    off = attrs[i].align().align_up(off);
                    if use_cache {
                        attrs[i].set_cached_offset(off);
                    }
                }
            }
            off += stored_size(&attrs[i], data, off)?;
            if attrs[i].static_size().is_none() {
                use_cache = false;
            }
        }
        off = attrs[idx].align().align_up(off);
        fetch(&attrs[idx], data, off).map(Some)
    }

    /// True if attribute `attno` is null in this row. Numbers beyond the
    /// row's stored attribute count read as null; system attributes are
    /// always present.
    pub fn attr_is_null(&self, attno: i32) -> Result<bool> {
        if attno > 0 {
            if attno as usize > self.attr_count() {
                return Ok(true);
            }
            let Some(bitmap) = self.null_bitmap() else {
                return Ok(false);
            };
            return Ok(!bit_is_set(bitmap, (attno - 1) as usize));
        }
        ensure!(attno != 0, "attribute number zero is not addressable");
        ensure!(
            SysAttr::from_attno(attno).is_some(),
            "unrecognized system attribute number {}",
            attno
        );
        Ok(false)
    }

    /// Decodes every attribute into parallel value/null arrays, the exact
    /// inverse of [`Row::build`]. Null slots hold [`Datum::null_slot`].
    pub fn deform<'a>(&'a self, schema: &TupleSchema) -> Result<(Vec<Datum<'a>>, Vec<bool>)> {
        let natts = schema.attr_count();
        let mut values = Vec::with_capacity(natts);
        let mut nulls = Vec::with_capacity(natts);
        for attno in 1..=natts {
            match self.get(schema, attno as i32)? {
                Some(datum) => {
                    values.push(datum);
                    nulls.push(false);
                }
                None => {
                    values.push(Datum::null_slot());
                    nulls.push(true);
                }
            }
        }
        Ok((values, nulls))
    }
}
