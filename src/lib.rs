pub mod coerce;
pub mod config;
pub mod db;
pub mod extract;
pub mod ids;
pub mod ledger;
pub mod loader;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod snapshot;
pub mod source;
pub mod stages;
pub mod tables;
