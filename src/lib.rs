pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod eos;
pub mod error;
pub mod index;
pub mod interp;
mod is_close;
pub mod loader;
pub mod mixture;
pub mod species_tables;
pub mod state;
