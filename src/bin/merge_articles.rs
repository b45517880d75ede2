// src/bin/merge_articles.rs

use anyhow::Result;
use pipeline_fixups::{config::MergeConfig, logging, merge};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init();

    // ─── 2) fixed inputs / output in the working directory ───────────
    let config = MergeConfig::default();

    // ─── 3) merge, sort, renumber, write ─────────────────────────────
    merge::run(&config)?;
    Ok(())
}
