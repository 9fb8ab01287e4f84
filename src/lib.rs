//! LogiScore operations toolkit
//!
//! Library behind the one-shot operator binaries in `src/bin`: schema
//! migrations and data fixes for the LogiScore database, Stripe price
//! configuration and verification, and smoke tests for the backend API.
//!
//! # Modules
//!
//! - `config`: Environment configuration for database, Stripe and smoke tests.
//! - `db`: Backend detection and the single-connection database handle.
//! - `ddl`: Guarded, idempotent DDL helpers.
//! - `errors`: Error taxonomy and context helpers.
//! - `ident`: Validated SQL identifiers.
//! - `maintenance`: Review weight and user type repairs.
//! - `migrations`: One module per schema migration.
//! - `report`: Step outcomes and migration reports.
//! - `schema`: Catalog introspection for PostgreSQL and SQLite.
//! - `seed`: Review question catalogue, promotion defaults and sample dev data.
//! - `billing`, `stripe_client`, `stripe_models`, `stripe_verify`: Stripe tooling.
//! - `smoke`: HTTP smoke-test suites.
//! - `telemetry`: Tracing subscriber setup.

pub mod billing;
pub mod config;
pub mod db;
pub mod ddl;
pub mod errors;
pub mod ident;
pub mod maintenance;
pub mod migrations;
pub mod report;
pub mod schema;
pub mod seed;
pub mod smoke;
pub mod stripe_client;
pub mod stripe_models;
pub mod stripe_verify;
pub mod telemetry;
