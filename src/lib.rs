//! Pokedex CLI Library
//!
//! This module exposes the cache, API client, storage and command modules for
//! use in integration tests.

pub mod cache;
pub mod cli;
pub mod commands;
pub mod data;
pub mod logging;
pub mod repl;
pub mod store;
