//! Row modification: replacement merging and identity-header splicing
//! across repeated logical updates.

use rowpack::{varlena, Attribute, Datum, Row, RowId, TupleSchema};

fn account_schema() -> TupleSchema {
    TupleSchema::new(vec![
        Attribute::int8("id"),
        Attribute::var("owner"),
        Attribute::int4("balance"),
        Attribute::int2("flags"),
    ])
    .unwrap()
}

fn build_account(schema: &TupleSchema) -> Row {
    let owner = varlena::wrap(b"alice");
    let values = [
        Datum::Int8(9001),
        Datum::Var(&owner),
        Datum::Int4(1500),
        Datum::Int2(0b10),
    ];
    let mut row = Row::build(schema, &values, &[false; 4]).unwrap();

    let header = row.header_mut();
    header.set_object_id(0xdead);
    header.set_row_id(RowId::new(12, 4));
    header.set_created_txn(500);
    header.set_created_cmd(7);
    row
}

#[test]
fn identity_survives_a_chain_of_modifications() {
    let schema = account_schema();
    let original = build_account(&schema);
    let identity = original.header().identity();

    let mut current = original;
    for step in 0..5i32 {
        let repl = [
            Datum::null_slot(),
            Datum::null_slot(),
            Datum::Int4(1500 + step),
            Datum::null_slot(),
        ];
        current = current
            .modify(&schema, &repl, &[false; 4], &[false, false, true, false])
            .unwrap();
        assert_eq!(current.header().identity(), identity);
        assert_eq!(
            current.get(&schema, 3).unwrap(),
            Some(Datum::Int4(1500 + step))
        );
    }

    // untouched attributes rode along unchanged
    assert_eq!(current.get(&schema, 1).unwrap(), Some(Datum::Int8(9001)));
    assert_eq!(
        current.get(&schema, 2).unwrap().unwrap().var_payload().unwrap(),
        b"alice"
    );
    assert_eq!(current.get(&schema, 4).unwrap(), Some(Datum::Int2(0b10)));
}

#[test]
fn layout_fields_come_from_the_rebuilt_row() {
    let schema = account_schema();
    let original = build_account(&schema);

    // replacing the owner with a longer name grows the row
    let owner = varlena::wrap(b"bartholomew mcallister");
    let repl = [
        Datum::null_slot(),
        Datum::Var(&owner),
        Datum::null_slot(),
        Datum::null_slot(),
    ];
    let modified = original
        .modify(&schema, &repl, &[false; 4], &[false, true, false, false])
        .unwrap();

    assert!(modified.header().total_len() > original.header().total_len());
    assert_eq!(modified.header().attr_count(), 4);
    assert!(modified.header().deleted_txn_is_invalid());
    assert_eq!(modified.header().object_id(), 0xdead);
    assert_eq!(modified.header().row_id(), RowId::new(12, 4));
    assert_eq!(modified.header().created_txn(), 500);
    assert_eq!(modified.header().created_cmd(), 7);
}

#[test]
fn modifying_a_row_never_touches_the_original() {
    let schema = account_schema();
    let original = build_account(&schema);
    let before = original.as_bytes().to_vec();

    let repl = [
        Datum::Int8(1),
        Datum::null_slot(),
        Datum::Int4(2),
        Datum::Int2(3),
    ];
    let _modified = original
        .modify(&schema, &repl, &[false, true, false, false], &[true; 4])
        .unwrap();

    assert_eq!(original.as_bytes(), &before[..]);
}

#[test]
fn replacing_everything_is_equivalent_to_a_fresh_build_plus_identity() {
    let schema = account_schema();
    let original = build_account(&schema);

    let owner = varlena::wrap(b"carol");
    let repl = [
        Datum::Int8(4242),
        Datum::Var(&owner),
        Datum::Int4(-5),
        Datum::Int2(0),
    ];
    let modified = original
        .modify(&schema, &repl, &[false; 4], &[true; 4])
        .unwrap();

    let mut fresh = Row::build(&schema, &repl, &[false; 4]).unwrap();
    fresh.header_mut().set_identity(original.header().identity());
    assert_eq!(modified, fresh);
}

#[test]
fn modify_under_a_grown_schema_fills_new_attributes_with_null() {
    let old_schema = TupleSchema::new(vec![Attribute::int4("a"), Attribute::int2("b")]).unwrap();
    let row = Row::build(
        &old_schema,
        &[Datum::Int4(10), Datum::Int2(20)],
        &[false, false],
    )
    .unwrap();

    let new_schema = TupleSchema::new(vec![
        Attribute::int4("a"),
        Attribute::int2("b"),
        Attribute::var("c"),
    ])
    .unwrap();

    // keep everything: the grown attribute reads as null and stays null
    let repl = [Datum::null_slot(); 3];
    let migrated = row
        .modify(&new_schema, &repl, &[false; 3], &[false; 3])
        .unwrap();

    assert_eq!(migrated.attr_count(), 3);
    assert_eq!(migrated.get(&new_schema, 1).unwrap(), Some(Datum::Int4(10)));
    assert_eq!(migrated.get(&new_schema, 2).unwrap(), Some(Datum::Int2(20)));
    assert_eq!(migrated.get(&new_schema, 3).unwrap(), None);
    assert!(migrated.header().has_nulls());
}
