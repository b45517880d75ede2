use super::{
    node_label,
    timestamp::{self, SkipCounts, TimestampSource},
    KnowledgeGraph,
};
use crate::config::FixerConfig;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use petgraph::Direction;
use std::{fs, path::PathBuf, time::Instant};
use tracing::{debug, info, warn};

/// What one fixer pass over a graph did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    pub total_nodes: usize,
    /// Nodes that already had a usable timestamp.
    pub kept_existing: usize,
    /// Existing timestamps that had to be shifted to the target offset.
    pub normalized_existing: usize,
    pub from_incoming: usize,
    pub from_outgoing: usize,
    /// Nodes that got the run's wall-clock time.
    pub defaulted: usize,
    /// Naive or foreign-offset timestamps caught by the final sweep.
    pub tz_fixed: usize,
    /// Node timestamps that were present but unusable.
    pub node_skips: SkipCounts,
    /// Edge timestamps that were absent or unusable.
    pub edge_skips: SkipCounts,
}

impl FixReport {
    /// Nodes whose timestamp came from their own value or an incident edge.
    pub fn processed(&self) -> usize {
        self.kept_existing + self.from_incoming + self.from_outgoing
    }
}

/// Give every node a timestamp at `offset`.
///
/// Tiers, first hit wins: the node's own value, the earliest incoming edge,
/// the earliest outgoing edge, then `now`. Topology and edge attributes are
/// never modified.
pub fn fix_timestamps(
    graph: &mut KnowledgeGraph,
    offset: FixedOffset,
    now: DateTime<FixedOffset>,
) -> FixReport {
    let total = graph.node_count();
    let mut report = FixReport {
        total_nodes: total,
        ..FixReport::default()
    };
    let mut processed = vec![false; total];
    let nodes: Vec<_> = graph.node_indices().collect();

    info!("Processing {} nodes...", total);

    // Pass 1: own value, else incoming edges.
    for (i, &idx) in nodes.iter().enumerate() {
        if i % 10 == 0 {
            info!("Processed {}/{} nodes", i, total);
        }

        let node_value = graph.node_timestamp(idx).cloned();
        match timestamp::extract(node_value.as_ref()) {
            TimestampSource::Found(parsed) => {
                if !timestamp::is_normalized(&parsed, offset) {
                    report.normalized_existing += 1;
                }
                let fixed = timestamp::normalize(parsed, offset);
                graph.set_node_timestamp(idx, timestamp::to_value(fixed));
                report.kept_existing += 1;
                processed[idx.index()] = true;
                continue;
            }
            TimestampSource::Skipped(timestamp::SkipReason::Missing) => {}
            TimestampSource::Skipped(reason) => {
                debug!(
                    node = %node_label(graph.node(idx)),
                    reason = %reason,
                    "ignoring stored node timestamp"
                );
                report.node_skips.record(reason);
            }
        }

        let found = timestamp::earliest(
            graph.edge_timestamps(idx, Direction::Incoming),
            &mut report.edge_skips,
        );
        if let Some(utc) = found {
            graph.set_node_timestamp(idx, timestamp::to_value(utc.with_timezone(&offset)));
            report.from_incoming += 1;
            processed[idx.index()] = true;
        }
    }

    // Pass 2: outgoing edges for whatever pass 1 left.
    for &idx in &nodes {
        if processed[idx.index()] {
            continue;
        }
        let found = timestamp::earliest(
            graph.edge_timestamps(idx, Direction::Outgoing),
            &mut report.edge_skips,
        );
        if let Some(utc) = found {
            graph.set_node_timestamp(idx, timestamp::to_value(utc.with_timezone(&offset)));
            report.from_outgoing += 1;
            processed[idx.index()] = true;
        }
    }

    // Fallback: one shared wall-clock value.
    let remaining = total - report.processed();
    if remaining > 0 {
        warn!("{} nodes still don't have timestamps", remaining);
        let fallback = timestamp::to_value(now.with_timezone(&offset));
        for &idx in &nodes {
            if processed[idx.index()] {
                continue;
            }
            info!(
                "Setting default timestamp for node: {}",
                node_label(graph.node(idx))
            );
            graph.set_node_timestamp(idx, fallback.clone());
            report.defaulted += 1;
        }
    }

    // Sweep: nothing may leave naive or at another offset.
    for &idx in &nodes {
        let source = timestamp::extract(graph.node_timestamp(idx));
        if let TimestampSource::Found(parsed) = source {
            if !timestamp::is_normalized(&parsed, offset) {
                debug!(
                    node = %node_label(graph.node(idx)),
                    naive = parsed.is_naive(),
                    "coercing node timestamp to target offset"
                );
                let fixed = timestamp::normalize(parsed, offset);
                graph.set_node_timestamp(idx, timestamp::to_value(fixed));
                report.tz_fixed += 1;
            }
        }
    }
    if report.tz_fixed > 0 {
        info!("Fixed timezone issues for {} nodes", report.tz_fixed);
    }

    report
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.json` under `config.backup_dir`.
pub fn backup_path(config: &FixerConfig, at: DateTime<FixedOffset>) -> PathBuf {
    config.backup_dir.join(format!(
        "{}_{}.json",
        config.backup_prefix,
        at.format("%Y%m%d_%H%M%S")
    ))
}

/// Load, fix, and write the graph plus its backup copy.
#[tracing::instrument(level = "info", skip(config), fields(input = %config.input.display()))]
pub fn run(config: &FixerConfig) -> Result<FixReport> {
    let start = Instant::now();

    info!("Loading graph from {}...", config.input.display());
    let mut graph = KnowledgeGraph::load(&config.input)?;

    let now = Utc::now().with_timezone(&config.offset);
    let report = fix_timestamps(&mut graph, config.offset, now);

    let bytes = graph.to_json_bytes()?;
    info!("Saving fixed graph to {}...", config.output.display());
    fs::write(&config.output, &bytes)
        .with_context(|| format!("failed to write graph {}", config.output.display()))?;

    info!("Graph fixing complete!");
    info!(
        processed = report.processed(),
        kept_existing = report.kept_existing,
        normalized_existing = report.normalized_existing,
        from_incoming = report.from_incoming,
        from_outgoing = report.from_outgoing,
        defaulted = report.defaulted,
        "Total nodes processed: {}",
        report.processed()
    );
    info!("{} edge timestamps skipped", report.edge_skips.total());
    for (reason, count) in report.edge_skips.iter() {
        info!(reason = %reason, count, "edge timestamps skipped");
    }
    for (reason, count) in report.node_skips.iter() {
        warn!(reason = %reason, count, "node timestamps replaced");
    }

    let backup = backup_path(config, Utc::now().with_timezone(&config.offset));
    fs::write(&backup, &bytes)
        .with_context(|| format!("failed to write backup {}", backup.display()))?;
    info!("Created backup at {}", backup.display());

    info!(
        "Processing completed in {:.2} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok(report)
}
