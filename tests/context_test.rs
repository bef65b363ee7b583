use planlens::analyzer::PlanContext;
use planlens::plan::PlanNode;

fn node(node_type: &str) -> PlanNode {
    PlanNode {
        node_type: node_type.to_string(),
        ..PlanNode::default()
    }
}

#[test]
fn test_context_flattens_in_preorder_with_parents_and_depths() {
    //        Nested Loop
    //        /         \
    //   Seq Scan      Hash
    //      |
    //  Index Scan
    let grandchild = node("Index Scan");
    let left = PlanNode {
        plans: vec![grandchild],
        ..node("Seq Scan")
    };
    let right = node("Hash");
    let root = PlanNode {
        plans: vec![left, right],
        ..node("Nested Loop")
    };

    let ctx = PlanContext::build(&root);
    let nodes = ctx.all_nodes();

    let types: Vec<&str> = nodes.iter().map(|n| n.node.node_type.as_str()).collect();
    assert_eq!(types, vec!["Nested Loop", "Seq Scan", "Index Scan", "Hash"]);

    assert_eq!(nodes[0].parent, None);
    assert_eq!(nodes[1].parent, Some(0));
    assert_eq!(nodes[2].parent, Some(1));
    assert_eq!(nodes[3].parent, Some(0));

    let depths: Vec<usize> = nodes.iter().map(|n| n.depth).collect();
    assert_eq!(depths, vec![0, 1, 2, 1]);
}

#[test]
fn test_context_records_cte_definitions() {
    let definition = PlanNode {
        subplan_name: "CTE recent_orders".to_string(),
        plan_rows: 2_500,
        actual_rows: 370,
        ..node("Append")
    };
    let init_plan = PlanNode {
        // Non-CTE subplan names are not CTE definitions.
        subplan_name: "InitPlan 1 (returns $0)".to_string(),
        ..node("Result")
    };
    let root = PlanNode {
        plans: vec![definition, init_plan],
        ..node("Hash Join")
    };

    let ctx = PlanContext::build(&root);

    assert_eq!(ctx.ctes().len(), 1);
    let cte = &ctx.ctes()[0];
    assert_eq!(cte.name, "recent_orders");
    assert_eq!(cte.estimated_rows, 2_500);
    assert_eq!(cte.actual_rows, 370);
    assert_eq!(cte.node.node_type, "Append");
}

#[test]
fn test_ancestors_walk_to_root() {
    let leaf = node("Index Scan");
    let mid = PlanNode {
        plans: vec![leaf],
        ..node("Materialize")
    };
    let root = PlanNode {
        plans: vec![mid],
        ..node("Nested Loop")
    };

    let ctx = PlanContext::build(&root);

    // Leaf is index 2; its ancestors are the Materialize then the root.
    assert_eq!(ctx.ancestors(2), vec![1, 0]);
    assert!(ctx.ancestors(0).is_empty());
}

#[test]
fn test_single_node_context() {
    let root = node("Result");
    let ctx = PlanContext::build(&root);

    assert_eq!(ctx.all_nodes().len(), 1);
    assert_eq!(ctx.all_nodes()[0].depth, 0);
    assert!(ctx.ctes().is_empty());
}
