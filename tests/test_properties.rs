use std::collections::HashSet;

use proptest::prelude::*;
use textdb::storage::codec;
use textdb::Table;

/// Values the line format can carry: anything without line breaks or
/// reserved tokens, spaces included.
fn value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 ,.'|_-]{0,12}").expect("Invalid regex")
}

fn column_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(
        prop::string::string_regex("[a-z][a-z0-9_]{0,7}").expect("Invalid regex"),
        1..5,
    )
    .prop_map(|set| set.into_iter().filter(|c| c != "id").collect::<Vec<_>>())
    .prop_filter("at least one data column", |cols| !cols.is_empty())
}

fn table_strategy() -> impl Strategy<Value = Table> {
    column_strategy().prop_flat_map(|columns| {
        let width = columns.len();
        prop::collection::vec(prop::collection::vec(value_strategy(), width), 0..8).prop_map(
            move |rows| {
                let mut table = Table::new("Props", columns.clone());
                for row in rows {
                    table.add_values(&row, true).expect("valid row");
                }
                table
            },
        )
    })
}

proptest! {
    #[test]
    fn prop_codec_round_trip(table in table_strategy()) {
        let text = codec::render(std::slice::from_ref(&table));
        let parsed = codec::parse(&text).unwrap();

        prop_assert_eq!(parsed.len(), 1);
        let decoded = &parsed[0];
        prop_assert_eq!(decoded.get_columns(), table.get_columns());

        let before = table.get_rows();
        let after = decoded.get_rows();
        prop_assert_eq!(before.len(), after.len());
        for (a, b) in before.iter().zip(after.iter()) {
            let a: Vec<(&str, &str)> = a.columns().zip(a.values().map(|v| v.as_str())).collect();
            let b: Vec<(&str, &str)> = b.columns().zip(b.values().map(|v| v.as_str())).collect();
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn prop_every_row_matches_schema_arity(table in table_strategy()) {
        let parsed = codec::parse(&codec::render(std::slice::from_ref(&table))).unwrap();
        let width = parsed[0].schema().column_count();
        for tuple in parsed[0].tuples() {
            prop_assert_eq!(tuple.len(), width);
        }
    }

    #[test]
    fn prop_generated_ids_are_unique(count in 1usize..40) {
        let mut table = Table::new("Ids", ["name"]);
        let mut ids = HashSet::new();
        for i in 0..count {
            let id = table.add_value("name", &i.to_string()).unwrap();
            prop_assert!(ids.insert(id));
        }
        let stored: HashSet<String> = table.get_rows().iter().map(|r| r.id().to_string()).collect();
        prop_assert_eq!(stored.len(), count);
    }
}
