pub mod config;
pub mod date_parser;
pub mod graph;
pub mod logging;
pub mod merge;
