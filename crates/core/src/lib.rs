//! RocketShoes Core - Shared cart types.
//!
//! This crate provides the types used across the RocketShoes cart components:
//! - `cart` - Cart store, collaborator clients, storage and notifications
//! - `cli` - Terminal front end driving the cart store
//!
//! # Architecture
//!
//! The core crate contains only types and pure list transformations - no I/O,
//! no HTTP clients, no storage access. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product ids, product metadata, line items, stock records and
//!   the ordered cart state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
