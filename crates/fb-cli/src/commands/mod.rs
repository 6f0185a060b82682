//! CLI command implementations

pub(crate) mod adjust;
pub(crate) mod common;
pub(crate) mod export;
pub(crate) mod ingest;
pub(crate) mod lag;
pub(crate) mod run;
pub(crate) mod screen;
