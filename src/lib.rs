//! LinkSync importer - migrates legacy SQL link dumps into a PocketBase
//! record store.
//!
//! The pipeline extracts bookmark rows from a narrow SQL INSERT shape,
//! discovers a favicon for each link through a multi-stage cascade, and
//! upserts records against the remote `links` collection with
//! duplicate-aware, partially-failure-tolerant semantics.

pub mod auth;
pub mod cli;
pub mod config;
pub mod favicon;
pub mod models;
pub mod services;
pub mod sql;
pub mod store;
