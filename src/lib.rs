//! Todo Frontend
//!
//! - models: client mirrors of the backend entities
//! - commands: bindings to backend actions over an `Invoke` transport
//! - reducer / coordinator: optimistic updates and their reconciliation
//! - list_view / notice: what the UI shows

pub mod commands;
pub mod coordinator;
pub mod list_view;
pub mod models;
pub mod notice;
pub mod reducer;

pub use coordinator::{ActionFailure, MutationCoordinator, MutationHandle, Outcome, Rejection, Snapshot};
pub use notice::{Notice, NoticeLevel};
