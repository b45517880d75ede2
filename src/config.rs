use chrono::FixedOffset;
use std::path::PathBuf;

/// Seconds east of UTC for the pipeline's reporting timezone (GMT+7).
pub const GMT7_OFFSET_SECS: i32 = 7 * 3600;

/// Inputs and output of the article merge job.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub first: PathBuf,
    pub second: PathBuf,
    pub output: PathBuf,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            first: PathBuf::from("summarized_articles_0321.csv"),
            second: PathBuf::from("summarized_articles_checkpoint_8.csv"),
            output: PathBuf::from("summarized_articles_merged.csv"),
        }
    }
}

/// Paths and timezone for the graph timestamp fixer.
#[derive(Debug, Clone)]
pub struct FixerConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Directory the backup copy is written into.
    pub backup_dir: PathBuf,
    /// Backup file name is `<backup_prefix>_<YYYYmmdd_HHMMSS>.json`.
    pub backup_prefix: String,
    /// Every node timestamp ends up at this offset.
    pub offset: FixedOffset,
}

impl Default for FixerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("knowledge_graph_p3_0201-0305.json"),
            output: PathBuf::from("knowledge_graph_p3_fixed_0201-0305.json"),
            backup_dir: PathBuf::from("."),
            backup_prefix: "knowledge_graph_p3_fixed_backup".to_string(),
            offset: gmt7(),
        }
    }
}

pub fn gmt7() -> FixedOffset {
    FixedOffset::east_opt(GMT7_OFFSET_SECS).unwrap()
}
