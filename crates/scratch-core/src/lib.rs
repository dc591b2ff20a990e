pub mod config;
pub mod error;
pub mod io;
pub mod ledger;
pub mod lessons;
pub mod llm;
pub mod paths;
pub mod settings;
pub mod types;

pub use error::{Result, ScratchError};
