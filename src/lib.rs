pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod server;
pub mod session;
pub mod transcript;

pub use error::{Error, Result};
