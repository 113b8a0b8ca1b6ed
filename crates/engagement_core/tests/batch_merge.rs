use engagement_core::{batch_count, partition, BatchTable, BulkResponse, InputRow, QueryOutcome};
use pretty_assertions::assert_eq;
use serde_json::json;

fn row(index: usize, variants: &[Option<&str>]) -> InputRow {
    InputRow::new(
        index,
        Some(format!("10.1/{index}")),
        variants.iter().map(|v| v.map(ToOwned::to_owned)).collect(),
    )
    .unwrap()
}

fn response(entries: &[(&str, QueryOutcome)]) -> BulkResponse {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn shares(n: u64) -> QueryOutcome {
    QueryOutcome {
        object: Some(json!({"title": "Paper"})),
        engagement: Some(json!({"share_count": n})),
        error: None,
    }
}

#[test]
fn partition_covers_every_index_once() {
    for (len, size) in [(0, 3), (1, 1), (5, 2), (6, 3), (101, 50)] {
        let ranges = partition(len, size);
        assert_eq!(ranges.len(), batch_count(len, size));
        let flat: Vec<usize> = ranges.iter().flat_map(|r| r.clone()).collect();
        assert_eq!(flat, (0..len).collect::<Vec<_>>());
        assert!(ranges.iter().all(|r| r.len() <= size));
    }
}

#[test]
fn partition_leaves_short_last_batch() {
    assert_eq!(partition(3, 2), vec![0..2, 2..3]);
    assert_eq!(batch_count(3, 2), 2);
}

#[test]
fn values_for_skips_missing_and_repeated_values() {
    let rows = vec![
        row(0, &[Some("https://a"), None]),
        row(1, &[Some(" https://a "), Some("https://b")]),
        row(2, &[Some("https://c"), None]),
    ];
    let table = BatchTable::new(&rows);
    assert_eq!(table.values_for(0), vec!["https://a", "https://c"]);
    assert_eq!(table.values_for(1), vec!["https://b"]);
}

#[test]
fn shared_value_is_merged_into_every_matching_row() {
    let rows = vec![
        row(0, &[Some("https://same")]),
        row(1, &[Some("https://other")]),
        row(2, &[Some("https://same")]),
    ];
    let mut table = BatchTable::new(&rows);
    table.merge(0, &response(&[("https://same", shares(7))]), "t1");

    let out = table.into_rows();
    assert_eq!(out[0].field(0), out[2].field(0));
    assert_eq!(
        out[0].field(0).unwrap().engagement.as_deref(),
        Some(r#"{"share_count":7}"#)
    );
    assert_eq!(out[0].timestamp(), Some("t1"));
    assert_eq!(out[1].field(0).unwrap().engagement, None);
    assert_eq!(out[1].timestamp(), None);
}

#[test]
fn merging_twice_equals_merging_once() {
    let rows = vec![
        row(0, &[Some("https://a"), Some("http://a")]),
        row(1, &[Some("https://b"), None]),
    ];
    let resp = response(&[
        ("https://a", shares(1)),
        ("https://b", QueryOutcome::failed("unsupported")),
    ]);

    let mut once = BatchTable::new(&rows);
    once.merge(0, &resp, "t");
    let mut twice = once.clone();
    twice.merge(0, &resp, "t");

    assert_eq!(once, twice);
    assert_eq!(
        twice.rows()[1].field(0).unwrap().error.as_deref(),
        Some("unsupported")
    );
}

#[test]
fn empty_object_and_null_engagement_are_not_written() {
    let rows = vec![row(0, &[Some("https://a")])];
    let mut table = BatchTable::new(&rows);
    let outcome = QueryOutcome {
        object: Some(json!({})),
        engagement: Some(serde_json::Value::Null),
        error: None,
    };
    table.merge(0, &response(&[("https://a", outcome)]), "t");

    let out = table.into_rows();
    assert_eq!(out[0].field(0).unwrap().object, None);
    assert_eq!(out[0].field(0).unwrap().engagement, None);
    assert_eq!(out[0].timestamp(), Some("t"));
}
