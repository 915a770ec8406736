use std::collections::BTreeMap;

use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};

use crate::solver::graph::NodeArcGraph;
use crate::solver::node::ArcId;

/// Counters for one arc across all propagation episodes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PerArcStats {
    pub evaluations: u64,
    pub prunings: u64,
    pub time_spent_micros: u64,
}

/// Aggregate propagation counters for a store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropagationStats {
    /// Completed or failed `propagate()` drains.
    pub episodes: u64,
    /// Individual arc evaluations across all episodes.
    pub evaluations: u64,
    /// Domain-change events produced by arc evaluations.
    pub prunings: u64,
    /// Episodes that ended in a propagation failure.
    pub failures: u64,
    pub arc_stats: BTreeMap<ArcId, PerArcStats>,
}

pub fn render_stats_table(stats: &PropagationStats, graph: &NodeArcGraph) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("Arc"),
        Cell::new("Type"),
        Cell::new("Complexity"),
        Cell::new("Evaluations"),
        Cell::new("Prunings"),
        Cell::new("Time / Call (µs)"),
        Cell::new("Total Time (ms)"),
    ]));

    let mut sorted_stats: Vec<(&ArcId, &PerArcStats)> = stats.arc_stats.iter().collect();
    sorted_stats.sort_by_key(|(_, s)| s.time_spent_micros);

    for (arc_id, arc_stats) in sorted_stats {
        let avg_time = if arc_stats.evaluations > 0 {
            arc_stats.time_spent_micros as f64 / arc_stats.evaluations as f64
        } else {
            0.0
        };
        let (kind, complexity) = if graph.contains_arc(*arc_id) {
            let arc = graph.arc(*arc_id);
            (format!("{:?}", arc.arc_type()), arc.complexity().to_string())
        } else {
            // Rolled back out of the graph since it was evaluated.
            ("(removed)".to_owned(), "-".to_owned())
        };

        table.add_row(Row::new(vec![
            Cell::new(&arc_id.to_string()),
            Cell::new(&kind),
            Cell::new(&complexity),
            Cell::new(&arc_stats.evaluations.to_string()),
            Cell::new(&arc_stats.prunings.to_string()),
            Cell::new(&format!("{avg_time:.2}")),
            Cell::new(&format!(
                "{:.2}",
                arc_stats.time_spent_micros as f64 / 1000.0
            )),
        ]));
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_survive_a_serde_round_trip() {
        let mut stats = PropagationStats {
            episodes: 3,
            evaluations: 12,
            prunings: 7,
            failures: 1,
            arc_stats: BTreeMap::new(),
        };
        let _ = stats.arc_stats.insert(
            ArcId(4),
            PerArcStats {
                evaluations: 5,
                prunings: 2,
                time_spent_micros: 80,
            },
        );

        let json = serde_json::to_string(&stats).unwrap();
        let back: PropagationStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.evaluations, 12);
        assert_eq!(back.arc_stats[&ArcId(4)].prunings, 2);
    }

    #[test]
    fn table_marks_arcs_no_longer_in_the_graph() {
        let mut stats = PropagationStats::default();
        let _ = stats.arc_stats.insert(
            ArcId(0),
            PerArcStats {
                evaluations: 1,
                prunings: 0,
                time_spent_micros: 10,
            },
        );
        let rendered = render_stats_table(&stats, &NodeArcGraph::new());
        assert!(rendered.contains("a0"));
        assert!(rendered.contains("(removed)"));
    }
}
