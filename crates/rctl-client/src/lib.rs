//! rctl Client Library
//!
//! Core functionality for the remote control client

pub mod address;
pub mod app;
pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod repl;
pub mod terminal;
pub mod transport;

pub use error::{ClientError, ErrorKind, Result};
