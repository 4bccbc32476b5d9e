//! Fuzz testing for row decoding.
//!
//! Feeds arbitrary buffers through `Row::from_bytes` and then decodes
//! every attribute of an arbitrary schema against whatever survived
//! validation. Decoding hostile bytes may error, but must never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use rowpack::{Attribute, Row, TupleSchema};

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzAttrClass {
    Int1,
    Int2,
    Int4,
    Int8,
    Fixed6,
    Fixed16,
    Var,
    VarFixed8,
}

#[derive(Debug, Arbitrary)]
struct DecodeInput {
    classes: Vec<FuzzAttrClass>,
    buffer: Vec<u8>,
}

fn attribute(idx: usize, class: FuzzAttrClass) -> Attribute {
    let name = format!("c{idx}");
    match class {
        FuzzAttrClass::Int1 => Attribute::int1(name),
        FuzzAttrClass::Int2 => Attribute::int2(name),
        FuzzAttrClass::Int4 => Attribute::int4(name),
        FuzzAttrClass::Int8 => Attribute::int8(name),
        FuzzAttrClass::Fixed6 => Attribute::fixed(name, 6, rowpack::Alignment::Byte),
        FuzzAttrClass::Fixed16 => Attribute::fixed(name, 16, rowpack::Alignment::Int),
        FuzzAttrClass::Var => Attribute::var(name),
        FuzzAttrClass::VarFixed8 => Attribute::var_fixed(name, 8),
    }
}

fuzz_target!(|input: DecodeInput| {
    let attrs: Vec<Attribute> = input
        .classes
        .iter()
        .take(64)
        .enumerate()
        .map(|(i, &class)| attribute(i, class))
        .collect();
    let Ok(schema) = TupleSchema::new(attrs) else {
        return;
    };

    let Ok(row) = Row::from_bytes(input.buffer) else {
        return;
    };

    for attno in -8..=(schema.attr_count() as i32 + 1) {
        let _ = row.get(&schema, attno);
        let _ = row.attr_is_null(attno);
    }
    let _ = row.deform(&schema);
});
