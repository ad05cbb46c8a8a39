//! Tallyboard - period aggregation and trend analytics.
//!
//! The analytics core ([`analysis`]) is a set of pure functions over an
//! in-memory list of [`models::Record`]s: bucket them into days, weeks or
//! months, aggregate each bucket, compute period-over-period growth and
//! rank groups. The remaining modules wire that core to a command-line
//! tool that reads data-store exports and writes Markdown or JSON reports.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod report;

#[cfg(test)]
mod fixtures;

pub use error::AnalyticsError;
