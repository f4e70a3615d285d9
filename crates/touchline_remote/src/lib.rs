//! # Touchline Remote
//!
//! The cloud side of the store contract.
//!
//! This crate provides:
//! - [`RemoteApi`], the transport trait a cloud backend implements
//! - [`RemoteRecord`], the tagged wire form of every entity
//! - [`RemoteStore`], a `DataStore` over any transport
//! - [`MemoryRemote`], an in-memory backend with failure injection
//!
//! Connectivity is checked before every call; offline calls fail fast
//! with [`OFFLINE_MESSAGE`] and never reach the transport.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod error;
mod memory;
mod store;

pub use api::{RemoteApi, RemoteRecord};
pub use error::{RemoteError, RemoteResult, OFFLINE_MESSAGE};
pub use memory::MemoryRemote;
pub use store::RemoteStore;
