//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod item_repo;

#[cfg(test)]
mod tests;

pub use traits::{ItemStore, Repository, SortKey};
pub use db::{init_db, DbState, SharedConnection, IN_MEMORY};
pub use item_repo::ItemRepository;
