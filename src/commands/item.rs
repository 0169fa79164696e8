//! Item Commands
//!
//! Frontend bindings for item-related backend actions.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::models::{ActionResult, Item, ItemStatus};
use super::Invoke;

// ========================
// Argument Structs
// ========================

#[derive(Serialize)]
struct TitleArgs<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct IdArgs {
    id: i64,
}

#[derive(Serialize)]
struct StatusArgs {
    id: i64,
    status: ItemStatus,
}

#[derive(Serialize)]
struct RenameArgs<'a> {
    id: i64,
    title: &'a str,
}

async fn call<I, A, T>(invoker: &I, cmd: &str, args: &A) -> ActionResult<T>
where
    I: Invoke + ?Sized,
    A: Serialize,
    T: DeserializeOwned,
{
    let args = match serde_json::to_value(args) {
        Ok(args) => args,
        Err(e) => return ActionResult::transport(format!("Could not encode {} arguments: {}", cmd, e)),
    };
    let reply = invoker.invoke(cmd, args).await;
    serde_json::from_value(reply).unwrap_or_else(|e| {
        log::error!("{}: undecodable reply: {}", cmd, e);
        ActionResult::transport("Unexpected response from server")
    })
}

// ========================
// Commands
// ========================

pub async fn list_items<I: Invoke + ?Sized>(invoker: &I) -> ActionResult<Vec<Item>> {
    call(invoker, "list_items", &Value::Null).await
}

pub async fn add_item<I: Invoke + ?Sized>(invoker: &I, title: &str) -> ActionResult<Item> {
    call(invoker, "add_item", &TitleArgs { title }).await
}

pub async fn update_item_status<I: Invoke + ?Sized>(invoker: &I, id: i64, status: ItemStatus) -> ActionResult<Item> {
    call(invoker, "update_item_status", &StatusArgs { id, status }).await
}

pub async fn update_item_title<I: Invoke + ?Sized>(invoker: &I, id: i64, title: &str) -> ActionResult<Item> {
    call(invoker, "update_item_title", &RenameArgs { id, title }).await
}

pub async fn delete_item<I: Invoke + ?Sized>(invoker: &I, id: i64) -> ActionResult<Item> {
    call(invoker, "delete_item", &IdArgs { id }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    /// Records calls and answers with a canned reply
    struct Echo {
        calls: Mutex<Vec<(String, Value)>>,
        reply: Value,
    }

    #[async_trait]
    impl Invoke for Echo {
        async fn invoke(&self, cmd: &str, args: Value) -> Value {
            self.calls.lock().push((cmd.to_string(), args));
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn test_arguments_on_the_wire() {
        let echo = Echo {
            calls: Mutex::new(Vec::new()),
            reply: json!({"ok": false, "errorKind": "NotFoundOrForbidden", "message": "Item not found"}),
        };

        update_item_status(&echo, 4, ItemStatus::Done).await;
        update_item_title(&echo, 4, "eggs").await;
        delete_item(&echo, 4).await;
        add_item(&echo, "milk").await;

        let calls = echo.calls.lock().clone();
        assert_eq!(calls[0], ("update_item_status".to_string(), json!({"id": 4, "status": "DONE"})));
        assert_eq!(calls[1], ("update_item_title".to_string(), json!({"id": 4, "title": "eggs"})));
        assert_eq!(calls[2], ("delete_item".to_string(), json!({"id": 4})));
        assert_eq!(calls[3], ("add_item".to_string(), json!({"title": "milk"})));
    }

    #[tokio::test]
    async fn test_garbage_reply_is_transport_failure() {
        let echo = Echo {
            calls: Mutex::new(Vec::new()),
            reply: json!("<html>502</html>"),
        };
        let result = list_items(&echo).await;
        assert_eq!(result.into_result().unwrap_err().0, ErrorKind::Transport);
    }
}
