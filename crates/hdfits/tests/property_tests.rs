//! Property-based tests for the order and header round-trip guarantees.

use proptest::prelude::*;

use hdfits::container::File;
use hdfits::keywords::classify;
use hdfits::{
    read_container, write_container, Column, Header, ReadOptions, Table, TableLayout, Unit,
    UnitList, Value, WriteOptions,
};

fn roundtrip(units: &UnitList, options: &WriteOptions) -> UnitList {
    let mut file = File::in_memory();
    write_container(units, &mut file, options).unwrap();
    let reopened = File::from_bytes(&file.to_bytes().unwrap()).unwrap();
    read_container(&reopened, &ReadOptions::strict())
        .unwrap()
        .units
}

/// Distinct names in arbitrary (not sorted) order.
fn distinct_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[A-Z][A-Z0-9_]{0,11}", 1..max)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Header keys that are persisted as user metadata.
fn user_key() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9]{0,7}".prop_filter("reserved keyword", |k| classify(k).is_user())
}

fn header_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Logical),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e300f64..1.0e300).prop_map(Value::Float),
        "[ -~]{0,40}".prop_map(Value::String),
    ]
}

fn layout() -> impl Strategy<Value = TableLayout> {
    prop_oneof![Just(TableLayout::ColumnGroup), Just(TableLayout::Composite)]
}

proptest! {
    #[test]
    fn unit_order_roundtrips(names in distinct_names(12)) {
        let mut list = UnitList::new();
        for name in &names {
            list.push(Unit::primary(name)).unwrap();
        }
        let read = roundtrip(&list, &WriteOptions::default());
        prop_assert_eq!(read.names().collect::<Vec<_>>(), names.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn user_header_roundtrips(
        entries in prop::collection::btree_map(user_key(), (header_value(), prop::option::of("[ -~]{0,20}")), 0..16)
    ) {
        let mut header = Header::new();
        for (key, (value, comment)) in &entries {
            match comment {
                Some(c) => header.insert_with_comment(key, value.clone(), c),
                None => {
                    header.insert(key, value.clone());
                }
            }
        }
        let mut list = UnitList::new();
        list.push(Unit::primary("PRIMARY").with_header(header)).unwrap();

        let read = roundtrip(&list, &WriteOptions::default());
        let read = &read.get("PRIMARY").unwrap().header;
        prop_assert_eq!(read.len(), entries.len() * 2);
        for (key, (value, comment)) in &entries {
            prop_assert_eq!(read.get(key), Some(value));
            prop_assert_eq!(read.comment_for(key), Some(comment.as_deref().unwrap_or("")));
        }
    }

    #[test]
    fn column_order_roundtrips(names in distinct_names(10), rows in 0usize..20, layout in layout()) {
        let mut table = Table::new();
        for (i, name) in names.iter().enumerate() {
            let values: Vec<i32> = (0..rows).map(|r| (r * 31 + i) as i32).collect();
            table.add_column(Column::new(name, values)).unwrap();
        }
        let mut list = UnitList::new();
        list.push(Unit::table("T", table.clone())).unwrap();

        let options = WriteOptions::default().with_layout(layout);
        let read = roundtrip(&list, &options);
        let read = read.get("T").unwrap().as_table().unwrap();
        prop_assert_eq!(read, &table);
    }

    #[test]
    fn image_range_matches_extremes(
        (w, h, pixels) in (1usize..8, 1usize..8).prop_flat_map(|(w, h)| {
            (Just(w), Just(h), prop::collection::vec(any::<i32>(), w * h))
        })
    ) {
        let image = hdfits::TypedArray::from_shape_vec(vec![h, w], pixels.clone()).unwrap();
        let mut list = UnitList::new();
        list.push(Unit::image("IMG", image)).unwrap();
        let mut file = File::in_memory();
        write_container(&list, &mut file, &WriteOptions::default()).unwrap();

        let range = file.root().group("IMG").unwrap().dataset("DATA").unwrap().attr("IMAGE_MINMAXRANGE").cloned();
        let min = *pixels.iter().min().unwrap() as i64;
        let max = *pixels.iter().max().unwrap() as i64;
        prop_assert_eq!(range, Some(hdfits::container::AttrValue::Int(vec![min, max])));
    }
}
