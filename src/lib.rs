pub mod config;
pub use config::run;

pub mod api;
pub mod arguments;
pub mod artifacts;
pub mod deployer;
pub mod error;
pub mod formatting;
pub mod models;
pub mod output;
pub mod project;
pub mod stream;
pub mod transaction;
pub mod wallet;

mod chains;
mod contracts;
mod events;
mod swaps;
mod transfers;
