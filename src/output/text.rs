//! ANSI-colored terminal rendering of analysis and comparison results.

use std::io::{self, Write};

use crate::analyzer::{AnalysisResult, Severity};
use crate::comparator::{
    percent_change, ChangeType, ComparisonResult, Direction, NodeDelta, Summary,
};

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Render an analysis result as colored text.
pub fn render_analysis<W: Write>(w: &mut W, result: &AnalysisResult) -> io::Result<()> {
    writeln!(w, "{}{}Plan Summary{}\n", BOLD, CYAN, RESET)?;
    writeln!(w, "  Total Cost:     {:.2}", result.total_cost)?;
    if result.execution_time > 0.0 {
        writeln!(w, "  Execution Time: {:.3} ms", result.execution_time)?;
    }
    if result.planning_time > 0.0 {
        writeln!(w, "  Planning Time:  {:.3} ms", result.planning_time)?;
    }
    writeln!(w)?;

    if result.findings.is_empty() {
        writeln!(w, "{}{}No issues found.{}", BOLD, GREEN, RESET)?;
        return Ok(());
    }

    writeln!(
        w,
        "{}{}Findings ({}){}\n",
        BOLD,
        CYAN,
        result.findings.len(),
        RESET
    )?;

    for (i, finding) in result.findings.iter().enumerate() {
        let (label, color) = severity_format(finding.severity);
        writeln!(w, "  {}{:<8}{} {}", color, label, RESET, finding.description)?;
        writeln!(w, "  {}→ {}{}", DIM, finding.suggestion, RESET)?;
        if i + 1 < result.findings.len() {
            writeln!(w)?;
        }
    }

    Ok(())
}

fn severity_format(severity: Severity) -> (&'static str, &'static str) {
    match severity {
        Severity::Critical => ("CRITICAL", RED),
        Severity::Warning => ("WARNING", YELLOW),
        Severity::Info => ("INFO", CYAN),
    }
}

/// Render a comparison result as colored text.
pub fn render_comparison<W: Write>(w: &mut W, result: &ComparisonResult) -> io::Result<()> {
    let s = &result.summary;

    writeln!(w, "{}{}Summary{}\n", BOLD, CYAN, RESET)?;
    writeln!(
        w,
        "  Cost:           {}",
        format_delta(s.old_total_cost, s.new_total_cost, s.cost_pct, s.cost_dir, 2, "")
    )?;
    if s.old_execution_time > 0.0 || s.new_execution_time > 0.0 {
        writeln!(
            w,
            "  Execution Time: {}",
            format_delta(
                s.old_execution_time,
                s.new_execution_time,
                s.time_pct,
                s.time_dir,
                3,
                " ms"
            )
        )?;
    }
    if s.old_planning_time > 0.0 || s.new_planning_time > 0.0 {
        writeln!(
            w,
            "  Planning Time:  {}",
            format_delta(
                s.old_planning_time,
                s.new_planning_time,
                s.planning_pct,
                s.planning_dir,
                3,
                " ms"
            )
        )?;
    }
    if s.old_total_hits > 0 || s.new_total_hits > 0 || s.old_total_reads > 0 || s.new_total_reads > 0
    {
        writeln!(
            w,
            "  Buffers:        hit {}→{}, read {}→{}",
            s.old_total_hits, s.new_total_hits, s.old_total_reads, s.new_total_reads
        )?;
    }
    writeln!(w)?;

    let changes = s.nodes_added + s.nodes_removed + s.nodes_modified + s.nodes_type_changed;
    if changes == 0 {
        writeln!(w, "{}{}Plans are identical.{}", BOLD, GREEN, RESET)?;
        return Ok(());
    }

    writeln!(
        w,
        "  Changes: {} modified, {} type changed, {} added, {} removed\n",
        s.nodes_modified, s.nodes_type_changed, s.nodes_added, s.nodes_removed
    )?;

    writeln!(w, "{}{}Node Details{}\n", BOLD, CYAN, RESET)?;

    render_delta(w, &result.root, 0)?;
    render_verdict(w, s)?;

    Ok(())
}

fn render_delta<W: Write>(w: &mut W, d: &NodeDelta, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth + 1);

    match d.change_type {
        ChangeType::NoChange => {
            // Unchanged nodes are elided, their children still render.
            for child in &d.children {
                render_delta(w, child, depth)?;
            }
            return Ok(());
        }
        ChangeType::Added => render_added(w, &indent, d)?,
        ChangeType::Removed => render_removed(w, &indent, d)?,
        ChangeType::TypeChanged => render_type_changed(w, &indent, d)?,
        ChangeType::Modified => render_modified(w, &indent, d)?,
    }

    for child in &d.children {
        render_delta(w, child, depth + 1)?;
    }
    Ok(())
}

fn render_added<W: Write>(w: &mut W, indent: &str, d: &NodeDelta) -> io::Result<()> {
    write!(w, "{}{}+ {}{}", indent, GREEN, node_label(d), RESET)?;
    write!(w, " (cost={:.2}", d.new_cost)?;
    if d.new_time > 0.0 {
        write!(w, " time={:.3}ms", d.new_time)?;
    }
    writeln!(w, ")")
}

fn render_removed<W: Write>(w: &mut W, indent: &str, d: &NodeDelta) -> io::Result<()> {
    write!(w, "{}{}- {}{}", indent, RED, node_label(d), RESET)?;
    write!(w, " (cost={:.2}", d.old_cost)?;
    if d.old_time > 0.0 {
        write!(w, " time={:.3}ms", d.old_time)?;
    }
    writeln!(w, ")")
}

fn render_type_changed<W: Write>(w: &mut W, indent: &str, d: &NodeDelta) -> io::Result<()> {
    write!(
        w,
        "{}{}~ {} → {}{}",
        indent, YELLOW, d.old_node_type, d.new_node_type, RESET
    )?;
    if !d.relation.is_empty() {
        write!(w, " on {}", d.relation)?;
    }
    writeln!(w)?;

    render_metric_line(w, indent, "cost", d.old_cost, d.new_cost, d.cost_pct, d.cost_dir, 2, "")?;
    if d.old_time > 0.0 || d.new_time > 0.0 {
        render_metric_line(
            w, indent, "time", d.old_time, d.new_time, d.time_pct, d.time_dir, 3, " ms",
        )?;
    }
    if d.old_rows != d.new_rows {
        render_int_line(w, indent, "rows", d.old_rows, d.new_rows, d.rows_pct)?;
    }
    render_common_changes(w, indent, d)
}

fn render_modified<W: Write>(w: &mut W, indent: &str, d: &NodeDelta) -> io::Result<()> {
    writeln!(w, "{}{}~ {}{}", indent, YELLOW, node_label(d), RESET)?;

    render_metric_line(w, indent, "cost", d.old_cost, d.new_cost, d.cost_pct, d.cost_dir, 2, "")?;
    if d.old_time > 0.0 || d.new_time > 0.0 {
        render_metric_line(
            w, indent, "time", d.old_time, d.new_time, d.time_pct, d.time_dir, 3, " ms",
        )?;
    }
    if d.old_rows != d.new_rows {
        render_int_line(w, indent, "rows", d.old_rows, d.new_rows, d.rows_pct)?;
    }
    if d.old_loops != d.new_loops && (d.old_loops > 1 || d.new_loops > 1) {
        let pct = percent_change(d.old_loops as f64, d.new_loops as f64);
        render_int_line(w, indent, "loops", d.old_loops, d.new_loops, pct)?;
    }
    if d.old_rows_removed_by_filter != d.new_rows_removed_by_filter {
        let pct = percent_change(
            d.old_rows_removed_by_filter as f64,
            d.new_rows_removed_by_filter as f64,
        );
        render_int_line(
            w,
            indent,
            "rows removed by filter",
            d.old_rows_removed_by_filter,
            d.new_rows_removed_by_filter,
            pct,
        )?;
    }
    if d.old_workers_launched != d.new_workers_launched {
        writeln!(
            w,
            "{}  workers: {}/{} → {}/{}",
            indent,
            d.old_workers_launched,
            d.old_workers_planned,
            d.new_workers_launched,
            d.new_workers_planned
        )?;
    }
    render_common_changes(w, indent, d)
}

/// Field lines shared by modified and type-changed nodes.
fn render_common_changes<W: Write>(w: &mut W, indent: &str, d: &NodeDelta) -> io::Result<()> {
    render_text_change(w, indent, "filter", &d.old_filter, &d.new_filter)?;
    render_text_change(w, indent, "index cond", &d.old_index_cond, &d.new_index_cond)?;
    render_text_change(w, indent, "index", &d.old_index_name, &d.new_index_name)?;

    if d.old_buffer_reads != d.new_buffer_reads {
        let (color, arrow) = delta_indicator(d.old_buffer_reads, d.new_buffer_reads);
        writeln!(
            w,
            "{}  disk reads: {} → {}{} {}{}",
            indent, d.old_buffer_reads, color, d.new_buffer_reads, arrow, RESET
        )?;
    }
    if d.old_buffer_hits != d.new_buffer_hits {
        writeln!(
            w,
            "{}  cache hits: {} → {}",
            indent, d.old_buffer_hits, d.new_buffer_hits
        )?;
    }

    if d.old_sort_spill != d.new_sort_spill {
        if d.new_sort_spill {
            writeln!(w, "{}  {}sort: memory → disk ↑{}", indent, RED, RESET)?;
        } else {
            writeln!(w, "{}  {}sort: disk → memory ↓{}", indent, GREEN, RESET)?;
        }
    }
    if d.old_hash_batches != d.new_hash_batches {
        let (color, arrow) = delta_indicator(d.old_hash_batches as u64, d.new_hash_batches as u64);
        writeln!(
            w,
            "{}  hash batches: {} → {}{} {}{}",
            indent, d.old_hash_batches, color, d.new_hash_batches, arrow, RESET
        )?;
    }
    Ok(())
}

fn render_text_change<W: Write>(
    w: &mut W,
    indent: &str,
    label: &str,
    old: &str,
    new: &str,
) -> io::Result<()> {
    if old == new {
        return Ok(());
    }
    if old.is_empty() {
        writeln!(w, "{}  {}{} added: {}{}", indent, YELLOW, label, new, RESET)
    } else if new.is_empty() {
        writeln!(w, "{}  {}{} removed: {}{}", indent, GREEN, label, old, RESET)
    } else {
        writeln!(w, "{}  {}{}: {} → {}{}", indent, YELLOW, label, old, new, RESET)
    }
}

#[allow(clippy::too_many_arguments)]
fn render_metric_line<W: Write>(
    w: &mut W,
    indent: &str,
    label: &str,
    old: f64,
    new: f64,
    pct: f64,
    dir: Direction,
    precision: usize,
    unit: &str,
) -> io::Result<()> {
    writeln!(
        w,
        "{}  {}: {:.prec$}{} → {}{:.prec$}{} {} ({:+.1}%){}",
        indent,
        label,
        old,
        unit,
        dir_color(dir),
        new,
        unit,
        dir_arrow(dir),
        pct,
        RESET,
        prec = precision,
    )
}

fn render_int_line<W: Write>(
    w: &mut W,
    indent: &str,
    label: &str,
    old: u64,
    new: u64,
    pct: f64,
) -> io::Result<()> {
    writeln!(w, "{}  {}: {} → {} ({:+.1}%)", indent, label, old, new, pct)
}

fn render_verdict<W: Write>(w: &mut W, s: &Summary) -> io::Result<()> {
    use Direction::{Improved, Regressed};

    let color = match (s.time_dir, s.cost_dir) {
        (Improved, Improved) => GREEN,
        (Regressed, Regressed) => RED,
        (Improved, _) | (_, Improved) => YELLOW,
        _ => "",
    };
    if color.is_empty() {
        writeln!(w, "\nVerdict: {}", s.verdict)
    } else {
        writeln!(w, "\n{}Verdict: {}{}", color, s.verdict, RESET)
    }
}

fn format_delta(
    old: f64,
    new: f64,
    pct: f64,
    dir: Direction,
    precision: usize,
    unit: &str,
) -> String {
    format!(
        "{:.prec$}{} → {}{:.prec$}{} {} ({:+.1}%){}",
        old,
        unit,
        dir_color(dir),
        new,
        unit,
        dir_arrow(dir),
        pct,
        RESET,
        prec = precision,
    )
}

fn delta_indicator(old: u64, new: u64) -> (&'static str, &'static str) {
    if new > old {
        (RED, "↑")
    } else {
        (GREEN, "↓")
    }
}

fn dir_color(dir: Direction) -> &'static str {
    match dir {
        Direction::Improved => GREEN,
        Direction::Regressed => RED,
        Direction::Unchanged => "",
    }
}

fn dir_arrow(dir: Direction) -> &'static str {
    match dir {
        Direction::Improved => "↓",
        Direction::Regressed => "↑",
        Direction::Unchanged => "",
    }
}

fn node_label(d: &NodeDelta) -> String {
    if d.relation.is_empty() {
        d.node_type.clone()
    } else {
        format!("{} on {}", d.node_type, d.relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::Finding;
    use crate::comparator::Comparator;
    use crate::plan::{ExplainEnvelope, PlanNode};

    fn rendered(result: &AnalysisResult) -> String {
        let mut buf = Vec::new();
        render_analysis(&mut buf, result).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_analysis_renders_severity_labels() {
        let result = AnalysisResult {
            findings: vec![Finding {
                severity: Severity::Critical,
                node_type: "Sort".to_string(),
                relation: String::new(),
                description: "Sort spilled to disk".to_string(),
                suggestion: "Increase work_mem".to_string(),
            }],
            total_cost: 123.45,
            execution_time: 10.0,
            planning_time: 1.0,
        };
        let text = rendered(&result);
        assert!(text.contains("CRITICAL"));
        assert!(text.contains("Sort spilled to disk"));
        assert!(text.contains("Increase work_mem"));
    }

    #[test]
    fn test_analysis_no_findings() {
        let result = AnalysisResult {
            findings: Vec::new(),
            total_cost: 1.0,
            execution_time: 0.0,
            planning_time: 0.0,
        };
        assert!(rendered(&result).contains("No issues found."));
    }

    #[test]
    fn test_comparison_renders_verdict() {
        let old = ExplainEnvelope {
            plan: PlanNode {
                node_type: "Seq Scan".to_string(),
                total_cost: 100.0,
                ..PlanNode::default()
            },
            execution_time: 50.0,
            planning_time: 0.5,
        };
        let new = ExplainEnvelope {
            plan: PlanNode {
                node_type: "Index Scan".to_string(),
                total_cost: 10.0,
                ..PlanNode::default()
            },
            execution_time: 5.0,
            planning_time: 0.5,
        };

        let result = Comparator::default().compare(&old, &new);
        let mut buf = Vec::new();
        render_comparison(&mut buf, &result).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Verdict: faster and cheaper"));
        assert!(text.contains("Seq Scan → Index Scan"));
    }
}
