use planlens::comparator::{ChangeType, Comparator, Direction};
use planlens::plan::{ExplainEnvelope, PlanNode};

fn node(node_type: &str) -> PlanNode {
    PlanNode {
        node_type: node_type.to_string(),
        ..PlanNode::default()
    }
}

fn envelope(total_cost: f64, execution_time: f64) -> ExplainEnvelope {
    ExplainEnvelope {
        plan: PlanNode {
            total_cost,
            ..node("Seq Scan")
        },
        planning_time: 0.5,
        execution_time,
    }
}

#[test]
fn test_verdict_faster_and_cheaper() {
    let old = envelope(100.0, 50.0);
    let new = envelope(10.0, 5.0);

    let result = Comparator::new(5.0).compare(&old, &new);
    assert_eq!(result.summary.verdict, "faster and cheaper");
    assert_eq!(result.summary.cost_dir, Direction::Improved);
    assert_eq!(result.summary.time_dir, Direction::Improved);
}

#[test]
fn test_verdict_slower_and_more_expensive() {
    let old = envelope(10.0, 5.0);
    let new = envelope(100.0, 50.0);

    let result = Comparator::new(5.0).compare(&old, &new);
    assert_eq!(result.summary.verdict, "slower and more expensive");
}

#[test]
fn test_verdict_no_significant_change() {
    let old = envelope(100.0, 50.0);
    let new = envelope(100.0, 50.0);

    let result = Comparator::new(5.0).compare(&old, &new);
    assert_eq!(result.summary.verdict, "no significant change");
}

#[test]
fn test_mixed_verdicts() {
    let faster_pricier = Comparator::new(5.0).compare(&envelope(10.0, 50.0), &envelope(100.0, 5.0));
    assert_eq!(faster_pricier.summary.verdict, "faster but higher estimated cost");

    let cheaper_slower = Comparator::new(5.0).compare(&envelope(100.0, 5.0), &envelope(10.0, 50.0));
    assert_eq!(cheaper_slower.summary.verdict, "cheaper but slower execution");
}

#[test]
fn test_type_changed_root() {
    let old = ExplainEnvelope {
        plan: PlanNode {
            total_cost: 100.0,
            actual_rows: 1_000,
            ..node("Seq Scan")
        },
        ..ExplainEnvelope::default()
    };
    let new = ExplainEnvelope {
        plan: PlanNode {
            total_cost: 5.0,
            actual_rows: 10,
            ..node("Index Scan")
        },
        ..ExplainEnvelope::default()
    };

    let result = Comparator::default().compare(&old, &new);

    assert_eq!(result.root.change_type, ChangeType::TypeChanged);
    assert_eq!(result.root.old_node_type, "Seq Scan");
    assert_eq!(result.root.new_node_type, "Index Scan");
    assert_eq!(result.summary.nodes_type_changed, 1);
    assert_eq!(result.summary.nodes_modified, 0);
}

#[test]
fn test_identical_plans_are_all_no_change() {
    let child = PlanNode {
        total_cost: 20.0,
        actual_rows: 50,
        actual_total_time: 2.0,
        ..node("Index Scan")
    };
    let plan = PlanNode {
        total_cost: 100.0,
        actual_rows: 50,
        actual_total_time: 8.0,
        plans: vec![child],
        ..node("Nested Loop")
    };
    let explain = ExplainEnvelope {
        plan,
        planning_time: 0.2,
        execution_time: 9.0,
    };

    let result = Comparator::default().compare(&explain, &explain.clone());

    assert_eq!(result.root.change_type, ChangeType::NoChange);
    assert!(result
        .root
        .children
        .iter()
        .all(|d| d.change_type == ChangeType::NoChange));
    assert_eq!(result.root.cost_delta, 0.0);
    assert_eq!(result.root.rows_delta, 0);
    assert_eq!(result.summary.nodes_modified, 0);
    assert_eq!(result.summary.nodes_type_changed, 0);
    assert_eq!(result.summary.nodes_added, 0);
    assert_eq!(result.summary.nodes_removed, 0);
    assert_eq!(result.summary.verdict, "no significant change");
}

#[test]
fn test_threshold_monotonicity() {
    // An 8% cost move is significant at threshold 5, noise at threshold 10.
    let old = envelope(100.0, 0.0);
    let new = envelope(92.0, 0.0);

    let tight = Comparator::new(5.0).compare(&old, &new);
    assert_eq!(tight.summary.cost_dir, Direction::Improved);
    assert_eq!(tight.root.change_type, ChangeType::Modified);

    let loose = Comparator::new(10.0).compare(&old, &new);
    assert_eq!(loose.summary.cost_dir, Direction::Unchanged);
    assert_eq!(loose.root.change_type, ChangeType::NoChange);
}

#[test]
fn test_rows_direction_is_always_unchanged() {
    let old = ExplainEnvelope {
        plan: PlanNode {
            actual_rows: 10,
            ..node("Seq Scan")
        },
        ..ExplainEnvelope::default()
    };
    let new = ExplainEnvelope {
        plan: PlanNode {
            actual_rows: 10_000,
            ..node("Seq Scan")
        },
        ..ExplainEnvelope::default()
    };

    let result = Comparator::default().compare(&old, &new);
    assert_eq!(result.root.rows_dir, Direction::Unchanged);
    assert_eq!(result.root.rows_delta, 9_990);
}

#[test]
fn test_extra_new_children_report_as_added() {
    let old = PlanNode {
        plans: vec![node("Index Scan")],
        ..node("Nested Loop")
    };
    let added_child = PlanNode {
        total_cost: 3.0,
        plans: vec![node("Bitmap Index Scan")],
        ..node("Bitmap Heap Scan")
    };
    let new = PlanNode {
        plans: vec![node("Index Scan"), added_child],
        ..node("Nested Loop")
    };

    let result = Comparator::default().compare(
        &ExplainEnvelope {
            plan: old,
            ..ExplainEnvelope::default()
        },
        &ExplainEnvelope {
            plan: new,
            ..ExplainEnvelope::default()
        },
    );

    let added = &result.root.children[1];
    assert_eq!(added.change_type, ChangeType::Added);
    assert_eq!(added.node_type, "Bitmap Heap Scan");
    assert_eq!(added.new_cost, 3.0);
    assert_eq!(added.old_cost, 0.0);
    // The whole subtree under an added node is added.
    assert_eq!(added.children[0].change_type, ChangeType::Added);
    assert_eq!(result.summary.nodes_added, 2);
}

#[test]
fn test_missing_new_children_report_as_removed() {
    let old = PlanNode {
        plans: vec![node("Index Scan"), node("Materialize")],
        ..node("Nested Loop")
    };
    let new = PlanNode {
        plans: vec![node("Index Scan")],
        ..node("Nested Loop")
    };

    let result = Comparator::default().compare(
        &ExplainEnvelope {
            plan: old,
            ..ExplainEnvelope::default()
        },
        &ExplainEnvelope {
            plan: new,
            ..ExplainEnvelope::default()
        },
    );

    assert_eq!(result.root.children[1].change_type, ChangeType::Removed);
    assert_eq!(result.summary.nodes_removed, 1);
}

#[test]
fn test_sort_spill_flip_is_significant() {
    let old = ExplainEnvelope {
        plan: PlanNode {
            sort_space_type: "Memory".to_string(),
            ..node("Sort")
        },
        ..ExplainEnvelope::default()
    };
    let new = ExplainEnvelope {
        plan: PlanNode {
            sort_space_type: "Disk".to_string(),
            ..node("Sort")
        },
        ..ExplainEnvelope::default()
    };

    let result = Comparator::default().compare(&old, &new);
    assert_eq!(result.root.change_type, ChangeType::Modified);
    assert!(!result.root.old_sort_spill);
    assert!(result.root.new_sort_spill);
}

#[test]
fn test_summary_buffer_totals() {
    let old = ExplainEnvelope {
        plan: PlanNode {
            shared_read_blocks: 100,
            temp_read_blocks: 20,
            shared_hit_blocks: 400,
            ..node("Seq Scan")
        },
        ..ExplainEnvelope::default()
    };
    let new = ExplainEnvelope {
        plan: PlanNode {
            shared_read_blocks: 10,
            temp_read_blocks: 0,
            shared_hit_blocks: 500,
            ..node("Seq Scan")
        },
        ..ExplainEnvelope::default()
    };

    let result = Comparator::default().compare(&old, &new);
    assert_eq!(result.summary.old_total_reads, 120);
    assert_eq!(result.summary.new_total_reads, 10);
    assert_eq!(result.summary.old_total_hits, 400);
    assert_eq!(result.summary.new_total_hits, 500);
}

#[test]
fn test_comparison_is_deterministic() {
    let old = envelope(100.0, 50.0);
    let new = envelope(60.0, 20.0);
    let cmp = Comparator::default();

    let a = cmp.compare(&old, &new);
    let b = cmp.compare(&old, &new);
    assert_eq!(a.summary.verdict, b.summary.verdict);
    assert_eq!(a.root.change_type, b.root.change_type);
    assert_eq!(a.root.children.len(), b.root.children.len());
}
