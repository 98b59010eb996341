//! Process and file system plumbing shared by all pipeline stages.

pub mod fs;
pub mod process;
