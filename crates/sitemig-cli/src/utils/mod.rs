//! Shared CLI helpers

pub mod logging;
pub mod site;
