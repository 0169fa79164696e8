//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO external dependencies (except serde and chrono).

mod entity;
mod item;
mod owner;

pub use entity::{Entity, DomainError, DomainResult};
pub use item::{normalize_title, Item, ItemPatch, ItemStatus, NewItem};
pub use owner::OwnerId;
