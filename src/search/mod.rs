//! Search over HMS list endpoints
//!
//! - [`RemoteSearch`]: debounced term sent to the server as `?search=`,
//!   results cached per term
//! - [`ClientSearch`] / [`filter_items`]: filtering of an already-fetched
//!   collection in memory

mod client;
mod remote;

pub use client::{filter_items, ClientSearch, Predicate, CLIENT_SEARCH_DEBOUNCE};
pub use remote::{RemoteSearch, SearchOptions, SearchState};
