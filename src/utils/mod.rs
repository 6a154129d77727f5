//! Utility modules shared by the build stages.

pub mod exec;
pub mod fs;
