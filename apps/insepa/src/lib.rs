//! # insepa
//!
//! The command-line collaborator around `insepa-core`: CLI parsing,
//! configuration, and the file-backed document store.

pub mod cli;
pub mod config;
pub mod store;
