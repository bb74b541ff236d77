pub mod database;
pub mod query_store;
pub mod work_queue;

#[cfg(test)]
mod test_utils;

pub use database::{State, StateBackend, StateError};
pub use query_store::{QueryStore, QueryStoreError};
pub use work_queue::WorkQueue;
