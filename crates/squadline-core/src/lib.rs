// Library root: re-exports all modules so integration tests and the CLI can
// access the crate's public API.

pub mod config;
pub mod db;
pub mod lineup;
pub mod pool;
