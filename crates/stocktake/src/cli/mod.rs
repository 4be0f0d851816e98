//! CLI module for Stocktake
//!
//! Commands open the local database, optionally sync an inventory snapshot
//! into it, and drive the audit engine.

pub mod audit;
pub mod config;
pub mod context;
pub mod error;
pub mod inventory;
pub mod locations;
pub mod output;
pub mod reports;
