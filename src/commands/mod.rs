//! Command Wrappers
//!
//! Frontend bindings to backend actions, organized by domain.

mod in_process;
mod item;

use async_trait::async_trait;
use serde_json::Value;

/// Transport to the backend: command name plus JSON arguments in, JSON reply out.
#[async_trait]
pub trait Invoke: Send + Sync + 'static {
    async fn invoke(&self, cmd: &str, args: Value) -> Value;
}

// Re-export all public items
pub use in_process::InProcess;
pub use item::*;
