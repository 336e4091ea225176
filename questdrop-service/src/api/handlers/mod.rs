pub mod health;
pub mod journey;
pub mod reconcile;
pub mod types;
pub mod webhook;
