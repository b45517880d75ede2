// src/bin/fix_graph_timestamps.rs

use anyhow::Result;
use pipeline_fixups::{config::FixerConfig, graph, logging};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init();

    // ─── 2) fixed paths, GMT+7 target offset ─────────────────────────
    let config = FixerConfig::default();

    // ─── 3) backfill node timestamps, write output + backup ──────────
    graph::run(&config)?;
    Ok(())
}
