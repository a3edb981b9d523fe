//! Live queries for MediLink
//!
//! A live query keeps pushing the full current result set to the client
//! whenever matching data changes, until explicitly cancelled. The
//! [`LiveCollectionAdapter`] mirrors one such query into view state.

mod adapter;
mod client;
mod message;

pub use adapter::{AdapterState, DraftRecord, LiveCollectionAdapter, LiveRecord};
pub use client::{ConnectionState, LiveClient};
pub use message::{LiveEvent, LiveMessage};
