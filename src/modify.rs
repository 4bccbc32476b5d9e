//! # Row Modifier
//!
//! A logical update never rewrites a row in place: [`Row::modify`] merges
//! the old row with a sparse replacement set, builds a brand-new row, and
//! then splices the identity header fields from the original, so the
//! result adopts the new physical layout while remaining the same object
//! to every layer above.

use eyre::{ensure, Result};
use smallvec::SmallVec;

use crate::datum::Datum;
use crate::row::Row;
use crate::schema::TupleSchema;

impl Row {
    /// Produces a new row from this one plus a sparse replacement set.
    ///
    /// The three arrays run parallel to the schema: where `replace[i]` is
    /// false the attribute is fetched from this row, where it is true the
    /// supplied value/null pair is taken instead. The new row's identity
    /// header fields are copied verbatim from this row; its layout fields
    /// (length, attribute count, flags, data offset) are the freshly
    /// computed ones.
    pub fn modify(
        &self,
        schema: &TupleSchema,
        repl_values: &[Datum<'_>],
        repl_nulls: &[bool],
        replace: &[bool],
    ) -> Result<Row> {
        let natts = schema.attr_count();
        ensure!(
            repl_values.len() == natts && repl_nulls.len() == natts && replace.len() == natts,
            "replacement arrays must hold {} entries, got {} values, {} nulls, {} flags",
            natts,
            repl_values.len(),
            repl_nulls.len(),
            replace.len()
        );

        let mut values: SmallVec<[Datum<'_>; 16]> = SmallVec::with_capacity(natts);
        let mut nulls: SmallVec<[bool; 16]> = SmallVec::with_capacity(natts);
        for i in 0..natts {
            if replace[i] {
                values.push(repl_values[i]);
                nulls.push(repl_nulls[i]);
            } else {
                match self.get(schema, (i + 1) as i32)? {
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
        }

        let mut new_row = Row::build(schema, &values, &nulls)?;
        let identity = self.header().identity();
        new_row.header_mut().set_identity(identity);
        Ok(new_row)
    }
}
