//! Command implementations for the sitemig CLI

mod news;
mod site;
mod stage;

pub use news::execute as export_news;
pub use site::execute as export_site;
pub use stage::execute as stage_news;
