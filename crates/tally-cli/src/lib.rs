//! Vessel Tally command-line front end
//!
//! The binary in `main.rs` only parses arguments and sets up logging; the
//! handlers and the steps they are built from live here.

pub mod cli;
pub mod commands;
pub mod output;
pub mod workflow;
