//! Name-based command dispatch
//!
//! The UI layer calls actions by name with JSON arguments, the same shape a
//! desktop IPC bridge would deliver. The reply is always an `ActionResult`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::ItemStatus;
use crate::session::SessionProvider;
use crate::AppState;
use super::item_cmd;
use super::result::{ActionError, ActionResult, ErrorKind, GENERIC_STORE_MESSAGE};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TitleArgs {
    title: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IdArgs {
    id: i64,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StatusArgs {
    id: i64,
    status: ItemStatus,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RenameArgs {
    id: i64,
    title: String,
}

fn parse_args<T: DeserializeOwned>(cmd: &str, args: Value) -> Result<T, Value> {
    serde_json::from_value(args).map_err(|e| {
        log::warn!("{}: bad arguments: {}", cmd, e);
        let rejected: ActionResult<()> = Err(ActionError::Validation(format!("Invalid arguments for {}: {}", cmd, e))).into();
        respond(rejected)
    })
}

fn respond<T: Serialize>(result: ActionResult<T>) -> Value {
    serde_json::to_value(&result).unwrap_or_else(|e| {
        log::error!("Failed to encode action result: {}", e);
        json!({ "ok": false, "errorKind": ErrorKind::StoreError, "message": GENERIC_STORE_MESSAGE })
    })
}

/// Run the command `cmd` for the caller behind `session`.
pub async fn invoke(state: &AppState, session: &dyn SessionProvider, cmd: &str, args: Value) -> Value {
    match cmd {
        "add_item" => match parse_args::<TitleArgs>(cmd, args) {
            Ok(a) => respond(item_cmd::add_item(state, session, &a.title).await),
            Err(reply) => reply,
        },
        "update_item_status" => match parse_args::<StatusArgs>(cmd, args) {
            Ok(a) => respond(item_cmd::update_item_status(state, session, a.id, a.status).await),
            Err(reply) => reply,
        },
        "update_item_title" => match parse_args::<RenameArgs>(cmd, args) {
            Ok(a) => respond(item_cmd::update_item_title(state, session, a.id, &a.title).await),
            Err(reply) => reply,
        },
        "delete_item" => match parse_args::<IdArgs>(cmd, args) {
            Ok(a) => respond(item_cmd::delete_item(state, session, a.id).await),
            Err(reply) => reply,
        },
        "list_items" => respond(item_cmd::list_items(state, session).await),
        unknown => {
            log::warn!("Unknown command '{}'", unknown);
            let rejected: ActionResult<()> = Err(ActionError::Validation(format!("Unknown command '{}'", unknown))).into();
            respond(rejected)
        }
    }
}
