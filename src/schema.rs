//! # Schema Descriptors with Cached Attribute Offsets
//!
//! A [`TupleSchema`] is the ordered list of [`Attribute`] descriptors a row
//! is encoded and decoded against. Each descriptor resolves its length,
//! by-value, and fixed-size-override properties once, into a
//! [`StorageClass`], and carries the one piece of mutable state in the
//! whole codec: a lazily populated cached byte offset.
//!
//! ## Storage Classes
//!
//! | Class | Encoding | Statically sized |
//! |-------|----------|------------------|
//! | `Inline1/2/4/8` | Direct scalar store | yes |
//! | `FixedRef(n)` | Verbatim copy of n bytes | yes |
//! | `VarFixed(n)` | Varlena blob, always n bytes total | yes |
//! | `Var` | Varlena blob, length self-declared | no |
//!
//! `VarFixed` covers types whose encoding family is variable-length but
//! whose type modifier pins every value to one size; for offset caching it
//! behaves exactly like a fixed-length attribute.
//!
//! ## Offset Cache
//!
//! `cache_off` starts at -1 (unknown) and is populated by the decoder with
//! the attribute's data-region offset, which is the same for every row of
//! the schema in which no earlier attribute is null. The slot is a single
//! relaxed-atomic word: concurrent writers recompute identical values, so
//! a duplicate store is benign and no lock is taken.

use std::sync::atomic::{AtomicI32, Ordering};

use eyre::{bail, ensure, Result};

use crate::datum::{varlena, Datum};

/// Hard upper bound on attributes per schema.
pub const MAX_ATTRIBUTES: usize = 1600;

/// Byte boundary an attribute's start offset is rounded up to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Byte,
    Short,
    Int,
    Double,
}

impl Alignment {
    pub const fn bytes(self) -> usize {
        match self {
            Alignment::Byte => 1,
            Alignment::Short => 2,
            Alignment::Int => 4,
            Alignment::Double => 8,
        }
    }

    pub const fn align_up(self, offset: usize) -> usize {
        let boundary = self.bytes();
        (offset + boundary - 1) & !(boundary - 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Inline1,
    Inline2,
    Inline4,
    Inline8,
    FixedRef(usize),
    VarFixed(usize),
    Var,
}

impl StorageClass {
    /// Encoded size when it is row-independent; `None` for true
    /// variable-length attributes.
    pub const fn static_size(self) -> Option<usize> {
        match self {
            StorageClass::Inline1 => Some(1),
            StorageClass::Inline2 => Some(2),
            StorageClass::Inline4 => Some(4),
            StorageClass::Inline8 => Some(8),
            StorageClass::FixedRef(len) => Some(len),
            StorageClass::VarFixed(size) => Some(size),
            StorageClass::Var => None,
        }
    }

    pub const fn is_by_value(self) -> bool {
        matches!(
            self,
            StorageClass::Inline1
                | StorageClass::Inline2
                | StorageClass::Inline4
                | StorageClass::Inline8
        )
    }
}

#[derive(Debug)]
pub struct Attribute {
    name: String,
    class: StorageClass,
    align: Alignment,
    cache_off: AtomicI32,
}

impl Attribute {
    pub fn new(name: impl Into<String>, class: StorageClass, align: Alignment) -> Self {
        Self {
            name: name.into(),
            class,
            align,
            cache_off: AtomicI32::new(-1),
        }
    }

    pub fn int1(name: impl Into<String>) -> Self {
        Self::new(name, StorageClass::Inline1, Alignment::Byte)
    }

    pub fn int2(name: impl Into<String>) -> Self {
        Self::new(name, StorageClass::Inline2, Alignment::Short)
    }

    pub fn int4(name: impl Into<String>) -> Self {
        Self::new(name, StorageClass::Inline4, Alignment::Int)
    }

    pub fn int8(name: impl Into<String>) -> Self {
        Self::new(name, StorageClass::Inline8, Alignment::Double)
    }

    pub fn fixed(name: impl Into<String>, len: usize, align: Alignment) -> Self {
        debug_assert!(len > 0);
        Self::new(name, StorageClass::FixedRef(len), align)
    }

    pub fn var(name: impl Into<String>) -> Self {
        Self::new(name, StorageClass::Var, Alignment::Int)
    }

    pub fn var_fixed(name: impl Into<String>, size: usize) -> Self {
        debug_assert!(size >= varlena::PREFIX_SIZE);
        Self::new(name, StorageClass::VarFixed(size), Alignment::Int)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> StorageClass {
        self.class
    }

    pub fn align(&self) -> Alignment {
        self.align
    }

    /// Encoded size when it is row-independent; `None` for true
    /// variable-length attributes, whose size lives in each value.
    pub fn static_size(&self) -> Option<usize> {
        self.class.static_size()
    }

    pub fn is_by_value(&self) -> bool {
        self.class.is_by_value()
    }

    /// Cached data-region offset, valid for any row of this schema with no
    /// null attribute before this one.
    pub fn cached_offset(&self) -> Option<usize> {
        let off = self.cache_off.load(Ordering::Relaxed);
        if off < 0 {
            None
        } else {
            Some(off as usize)
        }
    }

    pub(crate) fn set_cached_offset(&self, off: usize) {
        // Idempotent: every writer derives the same offset for this slot,
        // so a racing duplicate store is harmless.
        debug_assert!(off <= i32::MAX as usize);
        self.cache_off.store(off as i32, Ordering::Relaxed);
    }

    pub(crate) fn check_datum(&self, datum: &Datum<'_>) -> Result<()> {
        match (self.class, datum) {
            (StorageClass::Inline1, Datum::Int1(_))
            | (StorageClass::Inline2, Datum::Int2(_))
            | (StorageClass::Inline4, Datum::Int4(_))
            | (StorageClass::Inline8, Datum::Int8(_)) => Ok(()),
            (StorageClass::FixedRef(len), Datum::Fixed(bytes)) => {
                ensure!(
                    bytes.len() == len,
                    "attribute {:?} expects {} bytes, value holds {}",
                    self.name,
                    len,
                    bytes.len()
                );
                Ok(())
            }
            (StorageClass::Var, Datum::Var(blob)) => {
                let declared = varlena::total_size(blob)?;
                ensure!(
                    declared == blob.len(),
                    "attribute {:?}: varlena declares {} bytes but the value holds {}",
                    self.name,
                    declared,
                    blob.len()
                );
                Ok(())
            }
            (StorageClass::VarFixed(size), Datum::Var(blob)) => {
                let declared = varlena::total_size(blob)?;
                ensure!(
                    declared == blob.len() && blob.len() == size,
                    "attribute {:?} expects a {}-byte varlena, value declares {} over {} bytes",
                    self.name,
                    size,
                    declared,
                    blob.len()
                );
                Ok(())
            }
            (class, value) => bail!(
                "attribute {:?} ({:?}) cannot hold a {} value",
                self.name,
                class,
                value.kind()
            ),
        }
    }
}

impl Clone for Attribute {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            class: self.class,
            align: self.align,
            // the memo carries over; offsets depend only on the schema shape
            cache_off: AtomicI32::new(self.cache_off.load(Ordering::Relaxed)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TupleSchema {
    attrs: Vec<Attribute>,
}

impl TupleSchema {
    pub fn new(attrs: Vec<Attribute>) -> Result<Self> {
        ensure!(
            attrs.len() <= MAX_ATTRIBUTES,
            "schema has {} attributes, maximum is {}",
            attrs.len(),
            MAX_ATTRIBUTES
        );
        Ok(Self { attrs })
    }

    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    pub fn attr(&self, idx: usize) -> Option<&Attribute> {
        self.attrs.get(idx)
    }

    pub fn null_bitmap_size(attr_count: usize) -> usize {
        attr_count.div_ceil(8)
    }
}
