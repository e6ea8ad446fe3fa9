//! Search criteria, paging and the two-phase result fetch.
//!
//! A search asks the service for one page of matching ids, then for the
//! records behind those ids. [`SearchController`] sequences overlapping
//! searches so that only the newest issued one is ever published.

mod controller;
mod types;

pub use controller::SearchController;
pub use types::{PageRequest, SearchCriteria, SearchError, SearchOutcome, SearchSnapshot};
