//! Commands Layer
//!
//! Mutation actions and the dispatch surface the UI layer calls into.

mod invoke;
mod item_cmd;
mod result;

pub use invoke::invoke;
pub use item_cmd::*;
pub use result::{ActionError, ActionResult, ErrorKind, GENERIC_STORE_MESSAGE};
