//! Mutation Coordinator
//!
//! Applies each intent to the optimistic collection synchronously, issues the
//! matching server action on its own task and reconciles when it answers:
//! confirmed intents fold the server's item into the base, failed ones are
//! dropped, the base is re-fetched and an error notice is queued.
//!
//! The optimistic collection is always `base` with every in-flight intent
//! applied in submission order, so settling one intent never disturbs the
//! others. Calls leave in submission order; an intent aimed at an item whose
//! add is still in flight waits for that add and then uses the stored id.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::commands::{self, Invoke};
use crate::list_view;
use crate::models::{ActionResult, ErrorKind, Item, ItemId, ItemStatus, TempId};
use crate::notice::Notice;
use crate::reducer::{self, Intent};

const STATUS_UPDATED: &str = "Item status updated";
const NEVER_SAVED: &str = "Item was never saved";

/// Intent refused before anything was applied or sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Title cannot be empty")]
    EmptyTitle,
    #[error("\"{0}\" is already on the list")]
    DuplicateTitle(String),
    #[error("Title is unchanged")]
    UnchangedTitle,
    #[error("No item {0}")]
    UnknownItem(ItemId),
}

/// Server-reported (or transport) failure of one intent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<(ErrorKind, String)> for ActionFailure {
    fn from((kind, message): (ErrorKind, String)) -> Self {
        Self { kind, message }
    }
}

/// How an intent ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed,
    Reverted(ActionFailure),
}

impl Outcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed)
    }
}

/// What the UI renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Optimistic collection, unsorted
    pub items: Vec<Item>,
    /// Shared add/search box
    pub input: String,
    /// Intents not yet settled
    pub in_flight: usize,
}

impl Snapshot {
    pub fn visible(&self) -> Vec<Item> {
        list_view::visible(&self.items, &self.input)
    }
}

/// One submitted intent
pub struct MutationHandle {
    id: ItemId,
    join: JoinHandle<Outcome>,
}

impl MutationHandle {
    /// Item the intent targets (the temporary id for an add)
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub async fn settled(self) -> Outcome {
        let id = self.id;
        self.join.await.unwrap_or_else(|e| {
            log::error!("mutation task for {} ended abnormally: {}", id, e);
            Outcome::Reverted(ActionFailure {
                kind: ErrorKind::Transport,
                message: "Update was interrupted".to_string(),
            })
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Stored(i64),
    Failed,
}

struct Pending {
    seq: u64,
    intent: Intent,
}

#[derive(Default)]
struct Ledger {
    /// Last server-confirmed collection
    base: Vec<Item>,
    /// In flight, in submission order
    pending: Vec<Pending>,
    next_seq: u64,
    next_temp: u64,
    input: String,
    /// Adds still in flight. Dependent intents subscribe at enqueue, so an
    /// entry is dropped as soon as its add resolves.
    temps: HashMap<TempId, watch::Sender<Option<Resolution>>>,
    notices: Vec<Notice>,
}

impl Ledger {
    fn optimistic(&self) -> Vec<Item> {
        reducer::apply_all(&self.base, self.pending.iter().map(|p| &p.intent))
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            items: self.optimistic(),
            input: self.input.clone(),
            in_flight: self.pending.len(),
        }
    }

    fn find(&self, id: ItemId) -> Result<Item, Rejection> {
        self.optimistic()
            .into_iter()
            .find(|i| i.id == id)
            .ok_or(Rejection::UnknownItem(id))
    }

    fn remove_pending(&mut self, seq: u64) {
        self.pending.retain(|p| p.seq != seq);
    }

    /// Take the server's copy unless the base already holds a newer one
    fn upsert(&mut self, item: Item, insert: bool) {
        match self.base.iter_mut().find(|i| i.id == item.id) {
            Some(existing) if item.updated_at >= existing.updated_at => *existing = item,
            Some(_) => {}
            None if insert => self.base.push(item),
            None => {}
        }
    }
}

struct Inner<I> {
    invoker: I,
    ledger: Mutex<Ledger>,
    state: watch::Sender<Snapshot>,
    /// Highest sequence number whose call has been issued
    issued: watch::Sender<u64>,
}

impl<I: Invoke> Inner<I> {
    fn publish(&self, ledger: &Ledger) {
        self.state.send_replace(ledger.snapshot());
    }

    fn mark_issued(&self, seq: u64) {
        self.issued.send_modify(|n| *n = (*n).max(seq));
    }

    async fn refresh(&self) -> Result<usize, ActionFailure> {
        match commands::list_items(&self.invoker).await.into_result() {
            Ok(items) => {
                let count = items.len();
                let mut ledger = self.ledger.lock();
                ledger.base = items;
                self.publish(&ledger);
                Ok(count)
            }
            Err(e) => {
                let failure = ActionFailure::from(e);
                log::warn!("refresh failed, keeping previous base: {}", failure);
                Err(failure)
            }
        }
    }

    fn confirm(&self, seq: u64, intent: &Intent, item: Item) {
        let mut ledger = self.ledger.lock();
        ledger.remove_pending(seq);
        match intent {
            Intent::Add { item: draft } => {
                if let (ItemId::Temp(temp), ItemId::Stored(stored)) = (draft.id, item.id) {
                    reducer::rekey(&mut ledger.base, temp, stored);
                    reducer::rekey_intents(ledger.pending.iter_mut().map(|p| &mut p.intent), temp, stored);
                    if let Some(tx) = ledger.temps.remove(&temp) {
                        tx.send_replace(Some(Resolution::Stored(stored)));
                    }
                }
                ledger.upsert(item, true);
            }
            Intent::Delete { .. } => ledger.base.retain(|i| i.id != item.id),
            Intent::SetStatus { .. } => {
                ledger.upsert(item, false);
                ledger.notices.push(Notice::info(STATUS_UPDATED));
            }
            Intent::SetTitle { .. } => ledger.upsert(item, false),
        }
        log::debug!("{} {} confirmed", intent.kind(), intent.target());
        self.publish(&ledger);
    }

    async fn revert(&self, seq: u64, intent: &Intent, failure: ActionFailure) -> Outcome {
        {
            let mut ledger = self.ledger.lock();
            ledger.remove_pending(seq);
            if let Intent::Add { item } = intent {
                if let Some(tx) = item.id.temp().and_then(|t| ledger.temps.remove(&t)) {
                    tx.send_replace(Some(Resolution::Failed));
                }
            }
            ledger.notices.push(Notice::error(failure.message.clone()));
            log::warn!("{} {} reverted: {:?} {}", intent.kind(), intent.target(), failure.kind, failure.message);
            self.publish(&ledger);
        }
        // Already logged; the previous base stays in place.
        let _ = self.refresh().await;
        Outcome::Reverted(failure)
    }

    async fn call(&self, intent: &Intent, stored: Option<i64>) -> ActionResult<Item> {
        match (intent, stored) {
            (Intent::Add { item }, _) => commands::add_item(&self.invoker, &item.title).await,
            (_, None) => ActionResult::transport(NEVER_SAVED),
            (Intent::Delete { .. }, Some(id)) => commands::delete_item(&self.invoker, id).await,
            (Intent::SetStatus { status, .. }, Some(id)) => {
                commands::update_item_status(&self.invoker, id, *status).await
            }
            (Intent::SetTitle { title, .. }, Some(id)) => commands::update_item_title(&self.invoker, id, title).await,
        }
    }
}

async fn run<I: Invoke>(
    inner: Arc<Inner<I>>,
    seq: u64,
    intent: Intent,
    waiter: Option<watch::Receiver<Option<Resolution>>>,
) -> Outcome {
    let mut issued = inner.issued.subscribe();
    let _ = issued.wait_for(|n| *n + 1 >= seq).await;

    let stored = match (intent.target(), waiter) {
        (ItemId::Stored(id), _) => Some(id),
        (ItemId::Temp(_), None) => None,
        (ItemId::Temp(_), Some(mut rx)) => {
            let resolution = match rx.wait_for(|r| r.is_some()).await {
                Ok(r) => *r,
                Err(_) => None,
            };
            match resolution {
                Some(Resolution::Stored(id)) => Some(id),
                _ => {
                    inner.mark_issued(seq);
                    let failure = ActionFailure {
                        kind: ErrorKind::NotFoundOrForbidden,
                        message: NEVER_SAVED.to_string(),
                    };
                    return inner.revert(seq, &intent, failure).await;
                }
            }
        }
    };

    inner.mark_issued(seq);
    match inner.call(&intent, stored).await.into_result() {
        Ok(item) => {
            inner.confirm(seq, &intent, item);
            Outcome::Confirmed
        }
        Err(e) => inner.revert(seq, &intent, e.into()).await,
    }
}

/// Client-side owner of the optimistic collection.
///
/// Cheap to clone; clones share state. Mutating methods spawn onto the
/// current Tokio runtime.
pub struct MutationCoordinator<I: Invoke> {
    inner: Arc<Inner<I>>,
}

impl<I: Invoke> Clone for MutationCoordinator<I> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<I: Invoke> MutationCoordinator<I> {
    pub fn new(invoker: I) -> Self {
        Self {
            inner: Arc::new(Inner {
                invoker,
                ledger: Mutex::new(Ledger::default()),
                state: watch::Sender::new(Snapshot::default()),
                issued: watch::Sender::new(0),
            }),
        }
    }

    /// Replace the base with the server's list. Returns the item count.
    pub async fn load(&self) -> Result<usize, ActionFailure> {
        self.inner.refresh().await.inspect_err(|failure| {
            self.inner.ledger.lock().notices.push(Notice::error(failure.message.clone()));
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.borrow().clone()
    }

    /// Filtered and ordered for display
    pub fn visible(&self) -> Vec<Item> {
        self.snapshot().visible()
    }

    /// Drain queued notices, oldest first
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut self.inner.ledger.lock().notices)
    }

    pub fn set_input(&self, text: &str) {
        let mut ledger = self.inner.ledger.lock();
        ledger.input = text.to_string();
        self.inner.publish(&ledger);
    }

    /// Add the input box text as a new item, clearing the box right away.
    pub fn submit_input(&self) -> Result<MutationHandle, Rejection> {
        let mut ledger = self.inner.ledger.lock();
        let title = ledger.input.clone();
        let intent = Self::add_intent(&mut ledger, &title)?;
        ledger.input.clear();
        Ok(self.enqueue(ledger, intent))
    }

    pub fn add(&self, title: &str) -> Result<MutationHandle, Rejection> {
        let mut ledger = self.inner.ledger.lock();
        let intent = Self::add_intent(&mut ledger, title)?;
        Ok(self.enqueue(ledger, intent))
    }

    pub fn set_status(&self, id: ItemId, status: ItemStatus) -> Result<MutationHandle, Rejection> {
        let ledger = self.inner.ledger.lock();
        ledger.find(id)?;
        Ok(self.enqueue(ledger, Intent::SetStatus { id, status }))
    }

    /// Flip between `PENDING` and `DONE`
    pub fn toggle(&self, id: ItemId) -> Result<MutationHandle, Rejection> {
        let ledger = self.inner.ledger.lock();
        let status = ledger.find(id)?.status.toggled();
        Ok(self.enqueue(ledger, Intent::SetStatus { id, status }))
    }

    pub fn rename(&self, id: ItemId, title: &str) -> Result<MutationHandle, Rejection> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Rejection::EmptyTitle);
        }
        let ledger = self.inner.ledger.lock();
        if ledger.find(id)?.title == title {
            return Err(Rejection::UnchangedTitle);
        }
        Ok(self.enqueue(ledger, Intent::SetTitle { id, title: title.to_string() }))
    }

    pub fn delete(&self, id: ItemId) -> Result<MutationHandle, Rejection> {
        let ledger = self.inner.ledger.lock();
        ledger.find(id)?;
        Ok(self.enqueue(ledger, Intent::Delete { id }))
    }

    fn add_intent(ledger: &mut Ledger, title: &str) -> Result<Intent, Rejection> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Rejection::EmptyTitle);
        }
        let lowered = title.to_lowercase();
        if ledger.optimistic().iter().any(|i| i.title.to_lowercase() == lowered) {
            return Err(Rejection::DuplicateTitle(title.to_string()));
        }

        ledger.next_temp += 1;
        let temp = TempId { temp: ledger.next_temp };
        ledger.temps.insert(temp, watch::Sender::new(None));
        Ok(Intent::Add {
            item: Item::draft(temp, title.to_string(), Utc::now()),
        })
    }

    /// Apply `intent` speculatively, publish, then hand it to its own task.
    fn enqueue(&self, mut ledger: parking_lot::MutexGuard<'_, Ledger>, intent: Intent) -> MutationHandle {
        ledger.next_seq += 1;
        let seq = ledger.next_seq;
        let id = intent.target();
        let waiter = match (&intent, id) {
            (Intent::Add { .. }, _) => None,
            (_, ItemId::Temp(t)) => ledger.temps.get(&t).map(|tx| tx.subscribe()),
            _ => None,
        };
        ledger.pending.push(Pending { seq, intent: intent.clone() });
        log::debug!("{} {} applied (seq {})", intent.kind(), id, seq);
        self.inner.publish(&ledger);
        drop(ledger);

        let join = tokio::spawn(run(self.inner.clone(), seq, intent, waiter));
        MutationHandle { id, join }
    }
}
