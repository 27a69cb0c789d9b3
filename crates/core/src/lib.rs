//! SriSri Core - Shared catalog types.
//!
//! This crate provides the domain types used across the SriSri Ethnics
//! components:
//! - `client` - REST client with query cache, auth session and uploads
//! - `cli` - Admin command-line tool for managing the catalog
//!
//! # Architecture
//!
//! The core crate contains only types, validation and pure helpers - no I/O,
//! no HTTP clients, no storage. This keeps it lightweight and usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - Products, categories, filters, prices, slugs and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
