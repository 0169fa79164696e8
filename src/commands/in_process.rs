//! In-process transport
//!
//! Calls the backend's dispatch directly, as one signed-in caller.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use todo_server_lib::session::Session;
use todo_server_lib::AppState;

use super::Invoke;

pub struct InProcess {
    state: Arc<AppState>,
    session: Session,
}

impl InProcess {
    pub fn new(state: Arc<AppState>, session: Session) -> Self {
        Self { state, session }
    }
}

#[async_trait]
impl Invoke for InProcess {
    async fn invoke(&self, cmd: &str, args: Value) -> Value {
        todo_server_lib::commands::invoke(&self.state, &self.session, cmd, args).await
    }
}
