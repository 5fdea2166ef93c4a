//! Notekeep CLI - Command-line interface for a MongoDB notes collection.
//!
//! This crate provides the `notekeep` binary: a walkthrough of every store
//! operation plus commands to add, list, show, edit and remove notes.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
