//! taskdash - task reporting and aggregation
//!
//! Loads a tabular task tracker (spreadsheet or CSV), narrows it with a
//! status/owner selection, and derives the views a dashboard shows:
//! headline KPIs, grouped counts, cycle time, monthly completions,
//! overdue work, pending validation and risk keywords.
//!
//! # Module Organization
//!
//! - `source`: spreadsheet/CSV loading, column mapping and the table cache
//! - `table`: the canonical task record and table
//! - `filter`: status/owner selection
//! - `kpi`, `aggregate`, `cycle_time`, `risk`: derived views
//! - `report`: one recomputation pass over every view
//! - `export`: xlsx/csv/json writers for derived tables
//! - `config`: `.taskdash.toml` loading
//! - `output`: human and JSON output
//! - `cli`: command-line interface using clap

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod cycle_time;
pub mod error;
pub mod export;
pub mod filter;
pub mod kpi;
pub mod output;
pub mod report;
pub mod risk;
pub mod source;
pub mod table;

pub use error::{Error, Result};
