//! indexboard: global market index dashboard.
//!
//! Hexagonal architecture: the pipeline (registry, cached fetch, price table,
//! normalization, correlation) lives in [`domain`], port traits in [`ports`],
//! concrete providers and renderers in [`adapters`], and the command line in
//! [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
