use planlens::plan::{parse_explain, parse_first, IngestError};

const SAMPLE: &str = r#"[
  {
    "Plan": {
      "Node Type": "Sort",
      "Parallel Aware": false,
      "Startup Cost": 1000.5,
      "Total Cost": 1200.75,
      "Plan Rows": 5000,
      "Plan Width": 48,
      "Actual Startup Time": 12.1,
      "Actual Total Time": 15.9,
      "Actual Rows": 4800,
      "Actual Loops": 1,
      "Sort Key": ["events.created_at DESC", "events.id"],
      "Sort Method": "external merge",
      "Sort Space Used": 5120,
      "Sort Space Type": "Disk",
      "Shared Hit Blocks": 300,
      "Shared Read Blocks": 120,
      "Plans": [
        {
          "Node Type": "Seq Scan",
          "Parent Relationship": "Outer",
          "Relation Name": "events",
          "Schema": "public",
          "Alias": "e",
          "Filter": "(status = 'active')",
          "Rows Removed by Filter": 20000,
          "Startup Cost": 0.0,
          "Total Cost": 800.0,
          "Plan Rows": 5000,
          "Plan Width": 48,
          "Actual Rows": 4800,
          "Actual Loops": 1
        }
      ]
    },
    "Planning Time": 0.42,
    "Triggers": [],
    "Execution Time": 17.3
  }
]"#;

#[test]
fn test_parse_full_envelope() {
    let explain = parse_first(SAMPLE).unwrap();

    assert_eq!(explain.planning_time, 0.42);
    assert_eq!(explain.execution_time, 17.3);

    let sort = &explain.plan;
    assert_eq!(sort.node_type, "Sort");
    assert_eq!(sort.total_cost, 1200.75);
    assert_eq!(sort.sort_space_type, "Disk");
    assert_eq!(sort.sort_space_used, 5120);
    assert_eq!(
        sort.sort_key,
        vec!["events.created_at DESC".to_string(), "events.id".to_string()]
    );
    assert_eq!(sort.shared_hit_blocks, 300);
    assert_eq!(sort.plans.len(), 1);

    let scan = &sort.plans[0];
    assert_eq!(scan.node_type, "Seq Scan");
    assert_eq!(scan.parent_relationship, "Outer");
    assert_eq!(scan.relation_name, "events");
    assert_eq!(scan.alias, "e");
    assert_eq!(scan.rows_removed_by_filter, 20_000);
    assert!(scan.plans.is_empty());
}

#[test]
fn test_missing_keys_default_to_zero_and_empty() {
    let explain = parse_first(r#"[{"Plan": {"Node Type": "Result"}}]"#).unwrap();

    let plan = &explain.plan;
    assert_eq!(plan.node_type, "Result");
    assert_eq!(plan.total_cost, 0.0);
    assert_eq!(plan.actual_rows, 0);
    assert_eq!(plan.actual_loops, 0);
    assert!(plan.filter.is_empty());
    assert!(plan.sort_key.is_empty());
    assert!(plan.plans.is_empty());
    assert!(!plan.inner_unique);
    assert_eq!(explain.execution_time, 0.0);
}

#[test]
fn test_unknown_keys_are_ignored() {
    // "Parallel Aware" above plus a made-up key neither breaks parsing.
    let explain = parse_first(
        r#"[{"Plan": {"Node Type": "Seq Scan", "Future PG Key": {"nested": true}}}]"#,
    )
    .unwrap();
    assert_eq!(explain.plan.node_type, "Seq Scan");
}

#[test]
fn test_first_of_multiple_envelopes_wins() {
    let data = r#"[
      {"Plan": {"Node Type": "Seq Scan"}, "Execution Time": 1.0},
      {"Plan": {"Node Type": "Index Scan"}, "Execution Time": 2.0}
    ]"#;

    let all = parse_explain(data).unwrap();
    assert_eq!(all.len(), 2);

    let first = parse_first(data).unwrap();
    assert_eq!(first.plan.node_type, "Seq Scan");
    assert_eq!(first.execution_time, 1.0);
}

#[test]
fn test_empty_array_is_rejected() {
    match parse_explain("[]") {
        Err(IngestError::Empty) => {}
        other => panic!("expected Empty, got {:?}", other.map(|v| v.len())),
    }
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(matches!(
        parse_explain("{not json"),
        Err(IngestError::InvalidJson(_))
    ));
    // A truncated paste is malformed too.
    assert!(matches!(
        parse_explain(r#"[{"Plan": {"Node Type": "Seq"#),
        Err(IngestError::InvalidJson(_))
    ));
}
