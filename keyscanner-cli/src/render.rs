//! Human-readable views of a lifecycle table: a text listing and a Graphviz
//! graph of the state machine.

use keyscanner_debounce::{LifecycleTable, Phase};
use std::fmt::Write;

fn sample(level: bool) -> char {
    if level {
        '1'
    } else {
        '0'
    }
}

/// Width of the phase name columns.
const NAME_W: usize = 18;

/// One row per phase: expectation, hold, transitions, emission and level.
pub fn phase_listing(table: &LifecycleTable) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<NAME_W$} {:>6} {:>5}  {:<NAME_W$} {:<NAME_W$} {:<5} {:>5}",
        "PHASE", "EXPECT", "HOLD", "NEXT", "GLITCH", "EMITS", "LEVEL"
    );
    for phase in table.phases() {
        let _ = writeln!(
            out,
            "{:<NAME_W$} {:>6} {:>5}  {:<NAME_W$} {:<NAME_W$} {:<5} {:>5}",
            phase.id.name(),
            sample(phase.expected_sample),
            phase.hold_ticks,
            phase.next_phase.name(),
            phase.glitch_phase.name(),
            if phase.emits_change { "yes" } else { "" },
            sample(table.level(phase.id)),
        );
    }
    out
}

fn node(out: &mut String, table: &LifecycleTable, phase: &Phase) {
    let shape = if phase.is_stable() {
        "doublecircle"
    } else {
        "circle"
    };
    let fill = if phase.emits_change {
        r##", style=filled, fillcolor="#f6d55c""##
    } else {
        ""
    };
    let _ = writeln!(
        out,
        r#"    {} [label="{}\n{}:{}\nlevel {}", shape={shape}{fill}];"#,
        phase.id.name(),
        phase.id.name(),
        sample(phase.expected_sample),
        phase.hold_ticks,
        sample(table.level(phase.id)),
    );
}

/// Graphviz DOT: natural transitions solid, glitch transitions dashed,
/// emitting phases filled and the noisy track in its own cluster.
pub fn dot(table: &LifecycleTable, name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph \"{}\" {{", name);
    out.push_str("    rankdir=LR;\n");
    out.push_str("    node [fontname=\"monospace\", fontsize=10];\n\n");

    for phase in table.phases().filter(|p| !p.id.is_noisy()) {
        node(&mut out, table, phase);
    }

    if table.has_noisy_track() {
        out.push_str("\n    subgraph cluster_noisy {\n");
        out.push_str("        label=\"noisy track\";\n");
        out.push_str("        style=dashed;\n");
        for phase in table.phases().filter(|p| p.id.is_noisy()) {
            out.push_str("    ");
            node(&mut out, table, phase);
        }
        out.push_str("    }\n");
    }
    out.push('\n');

    for phase in table.phases() {
        if !phase.is_stable() {
            let _ = writeln!(
                out,
                "    {} -> {} [label=\"{}\"];",
                phase.id.name(),
                phase.next_phase.name(),
                phase.hold_ticks
            );
        }
        if !phase.is_lock() {
            let _ = writeln!(
                out,
                "    {} -> {} [style=dashed, label=\"{}\"];",
                phase.id.name(),
                phase.glitch_phase.name(),
                sample(!phase.expected_sample)
            );
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyscanner_debounce::{CHATTER_DEFENSE, MINIMAL};

    #[test]
    fn test_listing_has_every_phase() {
        let listing = phase_listing(&MINIMAL);
        assert_eq!(listing.lines().count(), 1 + 6);
        let locked_on = listing
            .lines()
            .find(|l| l.starts_with("LOCKED_ON "))
            .unwrap();
        assert!(locked_on.contains("yes"));
        assert!(locked_on.contains(" 10 "));
        assert!(locked_on.trim_end().ends_with('1'));
    }

    #[test]
    fn test_dot_edges() {
        let dot = dot(&MINIMAL, "minimal");
        assert!(dot.starts_with("digraph \"minimal\" {"));
        assert!(dot.contains("    OFF -> TURNING_ON [style=dashed, label=\"1\"];"));
        assert!(dot.contains("    TURNING_OFF -> LOCKED_OFF [label=\"16\"];"));
        // Stable phases have no natural edge, locks no glitch edge.
        assert!(!dot.contains("    ON -> ON"));
        assert!(!dot.contains("LOCKED_ON -> LOCKED_ON"));
        assert!(!dot.contains("cluster_noisy"));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn test_dot_clusters_noisy_track() {
        let dot = dot(&CHATTER_DEFENSE, "chatter-defense");
        assert!(dot.contains("subgraph cluster_noisy"));
        assert!(dot.contains("    LOCKED_ON -> NOISY_LOCKED_ON [style=dashed, label=\"0\"];"));
        assert!(dot.contains("    NOISY_LOCKED_OFF -> OFF [label=\"1\"];"));
    }
}
