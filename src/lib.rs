//! # CEAP Componenti Backend
//!
//! Intake API for sales leads, contact messages and chatbot leads, plus a
//! component catalog query, over a document store that may or may not be
//! there.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────────┐   ┌──────────────┐
//! │  HTTP (axum) │──▶│ Submission Gateway  │──▶│ DocumentStore │
//! │  /api/*      │   │ Catalog Gateway     │   │ SQLite / mem  │
//! └──────────────┘   └─────────┬──────────┘   └──────────────┘
//!                              │ empty / unavailable
//!                              ▼
//!                     ┌──────────────────┐
//!                     │ Fallback catalog │
//!                     │ Not-saved ack    │
//!                     └──────────────────┘
//! ```
//!
//! The gateways live in the `ceap-core` crate. This crate supplies the
//! SQLite store, configuration, the HTTP server and the `ceap` CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`db`] | Lazy SQLite connection pool |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite `DocumentStore` |
//! | [`store`] | Store handle construction from config |
//! | [`intake`] | Multipart form parsing |
//! | [`server`] | HTTP API |
//! | [`catalog_cmd`] | Catalog import / list commands |

pub mod catalog_cmd;
pub mod config;
pub mod db;
pub mod intake;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod store;
