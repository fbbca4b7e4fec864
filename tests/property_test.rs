use std::collections::BTreeSet;

use proptest::prelude::*;

use typedata::{merge_values, OverwritePaths, Schema, StructSchema, Type, TypedStruct, TypedValue};

// -- Strategy helpers --

fn arb_primitive() -> impl Strategy<Value = Type> {
    prop_oneof![
        Just(Type::Boolean),
        Just(Type::Short),
        Just(Type::Int),
        Just(Type::Long),
        Just(Type::Float),
        Just(Type::Double),
        Just(Type::String),
        Just(Type::Bytes),
    ]
}

fn arb_fields() -> impl Strategy<Value = Vec<(String, Type)>> {
    prop::collection::btree_map("[a-z]{1,6}", arb_primitive(), 1..8)
        .prop_map(|fields| fields.into_iter().collect())
}

fn arb_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,5}", 1..4).prop_map(|segments| segments.join("."))
}

fn build(fields: &[(String, Type)]) -> StructSchema {
    fields
        .iter()
        .fold(StructSchema::new(), |s, (name, ty)| s.with_field(name.as_str(), Schema::simple(*ty)))
}

proptest! {
    /// Equality and fingerprints ignore field insertion order.
    #[test]
    fn schema_equality_is_order_independent(fields in arb_fields()) {
        let forward = build(&fields);
        let mut reversed_fields = fields.clone();
        reversed_fields.reverse();
        let reversed = build(&reversed_fields);

        prop_assert_eq!(&forward, &reversed);
        prop_assert_eq!(forward.fingerprint(), reversed.fingerprint());
        let (first, _) = &fields[0];
        prop_assert_eq!(forward.field(first).map(|f| f.index()), Some(0));
        prop_assert_eq!(
            reversed.field(first).map(|f| f.index()),
            Some(fields.len() - 1)
        );
    }

    /// Any sequence of removals and additions leaves indices 0..len.
    #[test]
    fn indices_stay_contiguous(
        names in prop::collection::btree_set("[a-z]{1,4}", 1..10),
        mask in prop::collection::vec(any::<bool>(), 1..10),
        added in prop::collection::btree_set("[A-Z]{1,4}", 0..5),
    ) {
        let mut s = TypedStruct::new();
        for name in &names {
            s.put(name, 1).unwrap();
        }
        for (name, remove) in names.iter().zip(mask.iter().cycle()) {
            if *remove {
                s.remove(name);
            }
        }
        for name in &added {
            s.put(name, "x").unwrap();
        }

        let indices: Vec<usize> = s.iter().map(|f| f.index()).collect();
        prop_assert_eq!(indices, (0..s.len()).collect::<Vec<_>>());
        for (i, name) in s.field_names().into_iter().enumerate() {
            prop_assert_eq!(s.index_of(name), Some(i));
        }
    }

    /// A fresh path reads back the inserted value.
    #[test]
    fn insert_then_find(path in arb_path(), value in any::<i64>()) {
        let mut s = TypedStruct::new();
        s.insert(&path, value).unwrap();
        prop_assert_eq!(s.find(&path), Some(&TypedValue::long(value)));
    }

    /// Self-merge without overwrites doubles every scalar field.
    #[test]
    fn self_merge_doubles_scalars(values in prop::collection::btree_map("[a-z]{1,6}", any::<i32>(), 1..8)) {
        let mut s = TypedStruct::new();
        for (name, value) in &values {
            s.put(name, *value).unwrap();
        }
        let merged = merge_values(&s, &s, &OverwritePaths::none()).unwrap();
        let names: BTreeSet<&str> = merged.field_names().into_iter().collect();
        prop_assert_eq!(names.len(), values.len());
        for (name, value) in &values {
            let items = merged.get_array(name).unwrap();
            prop_assert_eq!(items, &[TypedValue::int(*value), TypedValue::int(*value)][..]);
        }
    }
}
