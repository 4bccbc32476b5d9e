//! # System Attributes
//!
//! Every row carries a fixed set of metadata fields in its header, outside
//! the schema's attribute numbering: the self row id, the object id, and
//! the four transaction/command visibility fields. They are addressed with
//! negative attribute numbers, have compile-time lengths and by-value
//! properties independent of any schema, and are never null.

use eyre::{bail, Result};

use crate::datum::Datum;
use crate::header::{RowId, ROW_ID_OFFSET};
use crate::row::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysAttr {
    /// Where the row lives: page and slot. The only by-reference entry.
    RowId,
    ObjectId,
    CreatedTxn,
    CreatedCmd,
    DeletedTxn,
    DeletedCmd,
}

impl SysAttr {
    pub fn from_attno(attno: i32) -> Option<SysAttr> {
        match attno {
            -1 => Some(SysAttr::RowId),
            -2 => Some(SysAttr::ObjectId),
            -3 => Some(SysAttr::CreatedTxn),
            -4 => Some(SysAttr::CreatedCmd),
            -5 => Some(SysAttr::DeletedTxn),
            -6 => Some(SysAttr::DeletedCmd),
            _ => None,
        }
    }

    pub const fn attno(self) -> i32 {
        match self {
            SysAttr::RowId => -1,
            SysAttr::ObjectId => -2,
            SysAttr::CreatedTxn => -3,
            SysAttr::CreatedCmd => -4,
            SysAttr::DeletedTxn => -5,
            SysAttr::DeletedCmd => -6,
        }
    }

    pub const fn len(self) -> usize {
        match self {
            SysAttr::RowId => RowId::SIZE,
            SysAttr::ObjectId => 4,
            SysAttr::CreatedTxn => 8,
            SysAttr::CreatedCmd => 4,
            SysAttr::DeletedTxn => 8,
            SysAttr::DeletedCmd => 4,
        }
    }

    pub const fn by_value(self) -> bool {
        !matches!(self, SysAttr::RowId)
    }
}

impl Row {
    pub(crate) fn sys_attr(&self, attno: i32) -> Result<Datum<'_>> {
        let Some(sys) = SysAttr::from_attno(attno) else {
            bail!("unrecognized system attribute number {}", attno);
        };
        let header = self.header();
        Ok(match sys {
            SysAttr::RowId => Datum::Fixed(&self.buf[ROW_ID_OFFSET..ROW_ID_OFFSET + RowId::SIZE]),
            SysAttr::ObjectId => Datum::Int4(header.object_id() as i32),
            SysAttr::CreatedTxn => Datum::Int8(header.created_txn() as i64),
            SysAttr::CreatedCmd => Datum::Int4(header.created_cmd() as i32),
            SysAttr::DeletedTxn => Datum::Int8(header.deleted_txn() as i64),
            SysAttr::DeletedCmd => Datum::Int4(header.deleted_cmd() as i32),
        })
    }
}
