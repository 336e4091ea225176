pub mod config;
pub mod ledger;
pub mod logging;
pub mod state;
pub mod store;
