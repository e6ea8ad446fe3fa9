//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the capability traits the
//! core depends on, so sessions can be driven without a network or disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fetchmate_core::testing::{fixtures, MemoryStorage, MockDogApi};
//!
//! let api = Arc::new(MockDogApi::new());
//! api.set_dogs(fixtures::dogs(85, "Beagle")).await;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let session = Session::new(api.clone(), storage, "favorites");
//! ```

mod memory_storage;
mod mock_dog_api;

pub use memory_storage::MemoryStorage;
pub use mock_dog_api::{ApiOperation, MockDogApi, RecordedApiCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::api::DogRecord;

    /// Create a test dog with reasonable defaults.
    pub fn dog(id: &str, breed: &str) -> DogRecord {
        DogRecord {
            id: id.to_string(),
            img: format!("https://images.test/{}.jpg", id),
            name: format!("Dog {}", id),
            age: 3,
            zip_code: "10001".to_string(),
            breed: breed.to_string(),
        }
    }

    /// Create `count` dogs of one breed with ids `<breed>-<n>`.
    pub fn dogs(count: usize, breed: &str) -> Vec<DogRecord> {
        let prefix = breed.to_lowercase().replace(' ', "-");
        (0..count)
            .map(|i| dog(&format!("{}-{:03}", prefix, i), breed))
            .collect()
    }

    /// Identifiers of the given dogs.
    pub fn ids(dogs: &[DogRecord]) -> Vec<String> {
        dogs.iter().map(|d| d.id.clone()).collect()
    }
}
