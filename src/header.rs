//! # Row Header
//!
//! Every encoded row starts with a fixed 44-byte header. The header splits
//! into two named groups:
//!
//! - **Identity fields** ([`IdentityFields`]): object id, self row id, and
//!   the four transaction/command visibility fields. These belong to the
//!   caller's domain; the codec stores them, returns them through system
//!   attributes, and preserves them verbatim when a row is modified.
//! - **Layout fields**: total length, attribute count, flags, and the data
//!   region offset. These describe the physical encoding and are always
//!   recomputed when a row is (re)built.
//!
//! ## Header Layout (44 bytes, little-endian)
//!
//! ```text
//! +-----------+-----------+--------+-----------+-----------+-----------+-----------+-------+-------+----------+
//! | total_len | object_id | row_id | created   | created   | deleted   | deleted   | attr  | flags | data_off |
//! | u32       | u32       | 6B     | txn u64   | cmd u32   | txn u64   | cmd u32   | count | u16   | u16      |
//! |           |           |        |           |           |           |           | u16   |       |          |
//! +-----------+-----------+--------+-----------+-----------+-----------+-----------+-------+-------+----------+
//! ```
//!
//! The null bitmap, when present, follows the header immediately; the data
//! region starts at `data_off`, which is always rounded up to an 8-byte
//! boundary.
//!
//! ## Zerocopy Safety
//!
//! The header structs use zerocopy traits (`FromBytes`, `IntoBytes`,
//! `Immutable`, `KnownLayout`, `Unaligned`) so a header can be read in
//! place from a row buffer without copying, at any byte offset.

use std::mem;

use eyre::Result;
use zerocopy::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const ROW_HEADER_SIZE: usize = 44;

pub mod row_flags {
    /// The row carries a null bitmap between the header and the data region.
    pub const HAS_NULLS: u16 = 0x0001;
    /// At least one variable-length attribute is present in the data region.
    pub const HAS_VAR_ATTRS: u16 = 0x0002;
    /// The deleting-transaction field has not been stamped: the row has not
    /// been superseded by a later version. Set on every freshly built row.
    pub const DELETED_TXN_INVALID: u16 = 0x0004;
}

/// Self-locator of a row: the page and slot it was stored at.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct RowId {
    page_no: U32,
    slot_no: U16,
}

impl RowId {
    pub const SIZE: usize = 6;

    pub fn new(page_no: u32, slot_no: u16) -> Self {
        Self {
            page_no: U32::new(page_no),
            slot_no: U16::new(slot_no),
        }
    }

    pub fn page_no(&self) -> u32 {
        self.page_no.get()
    }

    pub fn slot_no(&self) -> u16 {
        self.slot_no.get()
    }
}

/// The header fields preserved verbatim across [`Row::modify`]: a logical
/// update produces a new physical row that is still the same object.
///
/// [`Row::modify`]: crate::row::Row::modify
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct IdentityFields {
    object_id: U32,
    row_id: RowId,
    created_txn: U64,
    created_cmd: U32,
    deleted_txn: U64,
    deleted_cmd: U32,
}

#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned,
)]
pub struct RowHeader {
    total_len: U32,
    identity: IdentityFields,
    attr_count: U16,
    flags: U16,
    data_off: U16,
}

const _: () = assert!(mem::size_of::<RowId>() == RowId::SIZE);
const _: () = assert!(mem::size_of::<IdentityFields>() == 34);
const _: () = assert!(mem::size_of::<RowHeader>() == ROW_HEADER_SIZE);

/// Byte offset of the row id within the header; the row-id system
/// attribute is returned by reference to these bytes.
pub(crate) const ROW_ID_OFFSET: usize =
    mem::offset_of!(RowHeader, identity) + mem::offset_of!(IdentityFields, row_id);

impl RowHeader {
    pub(crate) fn ref_from(bytes: &[u8]) -> Result<&Self> {
        eyre::ensure!(
            bytes.len() >= ROW_HEADER_SIZE,
            "buffer too small for a row header: {} < {}",
            bytes.len(),
            ROW_HEADER_SIZE
        );
        Self::ref_from_bytes(&bytes[..ROW_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse row header: {e:?}"))
    }

    pub(crate) fn mut_from(bytes: &mut [u8]) -> Result<&mut Self> {
        eyre::ensure!(
            bytes.len() >= ROW_HEADER_SIZE,
            "buffer too small for a row header: {} < {}",
            bytes.len(),
            ROW_HEADER_SIZE
        );
        Self::mut_from_bytes(&mut bytes[..ROW_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse row header: {e:?}"))
    }

    pub fn total_len(&self) -> usize {
        self.total_len.get() as usize
    }

    pub fn attr_count(&self) -> usize {
        self.attr_count.get() as usize
    }

    pub fn flags(&self) -> u16 {
        self.flags.get()
    }

    pub fn data_off(&self) -> usize {
        self.data_off.get() as usize
    }

    pub fn has_nulls(&self) -> bool {
        self.flags.get() & row_flags::HAS_NULLS != 0
    }

    pub fn has_var_attrs(&self) -> bool {
        self.flags.get() & row_flags::HAS_VAR_ATTRS != 0
    }

    pub fn deleted_txn_is_invalid(&self) -> bool {
        self.flags.get() & row_flags::DELETED_TXN_INVALID != 0
    }

    pub fn identity(&self) -> IdentityFields {
        self.identity
    }

    pub fn set_identity(&mut self, identity: IdentityFields) {
        self.identity = identity;
    }

    pub fn object_id(&self) -> u32 {
        self.identity.object_id.get()
    }

    pub fn set_object_id(&mut self, object_id: u32) {
        self.identity.object_id = U32::new(object_id);
    }

    pub fn row_id(&self) -> RowId {
        self.identity.row_id
    }

    pub fn set_row_id(&mut self, row_id: RowId) {
        self.identity.row_id = row_id;
    }

    pub fn created_txn(&self) -> u64 {
        self.identity.created_txn.get()
    }

    pub fn set_created_txn(&mut self, txn: u64) {
        self.identity.created_txn = U64::new(txn);
    }

    pub fn created_cmd(&self) -> u32 {
        self.identity.created_cmd.get()
    }

    pub fn set_created_cmd(&mut self, cmd: u32) {
        self.identity.created_cmd = U32::new(cmd);
    }

    pub fn deleted_txn(&self) -> u64 {
        self.identity.deleted_txn.get()
    }

    pub fn set_deleted_txn(&mut self, txn: u64) {
        self.identity.deleted_txn = U64::new(txn);
    }

    pub fn deleted_cmd(&self) -> u32 {
        self.identity.deleted_cmd.get()
    }

    pub fn set_deleted_cmd(&mut self, cmd: u32) {
        self.identity.deleted_cmd = U32::new(cmd);
    }

    pub(crate) fn set_total_len(&mut self, len: u32) {
        self.total_len = U32::new(len);
    }

    pub(crate) fn set_attr_count(&mut self, count: u16) {
        self.attr_count = U16::new(count);
    }

    pub(crate) fn set_flags(&mut self, flags: u16) {
        self.flags = U16::new(flags);
    }

    pub(crate) fn set_data_off(&mut self, off: u16) {
        self.data_off = U16::new(off);
    }
}
