//! # CEAP Core
//!
//! Storage-agnostic logic for the CEAP Componenti backend: inquiry models,
//! the document store trait, and the degradable persistence gateway.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! Concrete stores and the HTTP surface live in the `ceap-backend` crate.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Leads, contact messages, catalog records, validation |
//! | [`attachment`] | Embedding uploaded files into parent documents |
//! | [`store`] | `DocumentStore` trait and in-memory implementation |
//! | [`gateway`] | Availability probe, writer, three-outcome submission policy |
//! | [`catalog`] | Catalog reads with fallback dataset |
//! | [`diagnostics`] | Store health report |
//! | [`faq`] | Static FAQ entries |

pub mod attachment;
pub mod catalog;
pub mod diagnostics;
pub mod error;
pub mod faq;
pub mod gateway;
pub mod models;
pub mod store;
