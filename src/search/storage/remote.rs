//! Storage proxy backed by a dedicated server thread
//!
//! The real storage lives on its own thread and is only ever touched by
//! that thread. Every other thread talks to it through one request/reply
//! channel pair, and a mutex around the client side keeps exactly one call
//! in flight. `record`/`record_all`/`reinsert` are fire-and-forget; `take`
//! and `parent` block for the reply.
//!
//! `finish()` stops the server and moves the storage back into the proxy,
//! after which every call is served locally.
//!
//! The prepared variant asks for the next item right after each
//! `record_all`, so a worker that reports its successors and then asks for
//! more work usually finds one already cached. A cached item is only handed
//! out while nothing else has touched the frontier since it was fetched;
//! otherwise it goes back and a fresh take replaces it.
//!
//! `checkout`/`checkin` track the estimates of items being expanded. An
//! item is only checked out if no cheaper item is still out, because that
//! item's successors could reach the same states more cheaply.

use crate::error::{Result, SearchError};
use crate::search::storage::{Checkout, FrontierItem, ParentRecord, Storage};
use crate::search::{Cost, State};
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace, warn};

/// Message sent from a client to the storage server
enum Request<S: State> {
    /// Record items under one parent, optionally replying with the next take
    Record {
        items: Vec<FrontierItem<S>>,
        parent: Option<S>,
        pull_next: bool,
    },
    Reinsert(FrontierItem<S>),
    Take,
    Parent(S),
    /// Stop serving and hand the storage back
    Finish,
}

/// Message sent from the storage server to the client
enum Reply<S: State> {
    Item(Option<FrontierItem<S>>),
    Parent(Option<ParentRecord<S>>),
    Storage(Box<dyn Storage<S>>),
}

/// Server loop: owns the storage until told to finish
fn serve<S: State>(
    mut storage: Box<dyn Storage<S>>,
    requests: Receiver<Request<S>>,
    replies: Sender<Reply<S>>,
) {
    while let Ok(request) = requests.recv() {
        let reply = match request {
            Request::Record {
                items,
                parent,
                pull_next,
            } => {
                storage.record_all(items, parent);
                if !pull_next {
                    continue;
                }
                Reply::Item(storage.take())
            }
            Request::Reinsert(item) => {
                storage.reinsert(item);
                continue;
            }
            Request::Take => Reply::Item(storage.take()),
            Request::Parent(state) => Reply::Parent(storage.parent(&state)),
            Request::Finish => {
                debug!(
                    open = storage.len(),
                    recorded = storage.recorded(),
                    "Storage server handing storage back"
                );
                let _ = replies.send(Reply::Storage(storage));
                return;
            }
        };
        if replies.send(reply).is_err() {
            debug!("Storage client gone, server exiting");
            return;
        }
    }
    debug!("Storage requests closed, server exiting");
}

/// Client end of a running server
struct Connection<S: State> {
    requests: Sender<Request<S>>,
    replies: Receiver<Reply<S>>,
    server: Option<JoinHandle<()>>,
    /// Item prefetched by the prepared variant
    waiting: Option<FrontierItem<S>>,
    /// Nothing has been recorded or reinserted since `waiting` was fetched
    waiting_fresh: bool,
}

impl<S: State> Connection<S> {
    fn send(&self, request: Request<S>) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| SearchError::StorageClosed)
    }

    fn recv_item(&self) -> Result<Option<FrontierItem<S>>> {
        match self.replies.recv() {
            Ok(Reply::Item(item)) => Ok(item),
            _ => Err(SearchError::StorageClosed),
        }
    }

    fn recv_parent(&self) -> Result<Option<ParentRecord<S>>> {
        match self.replies.recv() {
            Ok(Reply::Parent(record)) => Ok(record),
            _ => Err(SearchError::StorageClosed),
        }
    }

    fn recv_storage(&self) -> Result<Box<dyn Storage<S>>> {
        match self.replies.recv() {
            Ok(Reply::Storage(storage)) => Ok(storage),
            _ => Err(SearchError::StorageClosed),
        }
    }

    /// The current best item, using the cached one if still valid
    fn take(&mut self) -> Result<Option<FrontierItem<S>>> {
        if let Some(item) = self.waiting.take() {
            if self.waiting_fresh {
                return Ok(Some(item));
            }
            self.send(Request::Reinsert(item))?;
        }
        self.send(Request::Take)?;
        self.recv_item()
    }
}

impl<S: State> Drop for Connection<S> {
    fn drop(&mut self) {
        if let Some(server) = self.server.take() {
            // Closing the request channel ends the server loop
            let (closed, _) = unbounded();
            drop(std::mem::replace(&mut self.requests, closed));
            if server.join().is_err() {
                warn!("Storage server panicked");
            }
        }
    }
}

enum Link<S: State> {
    Remote(Connection<S>),
    Local(Box<dyn Storage<S>>),
}

struct Inner<S: State> {
    link: Link<S>,
    /// Estimates of the items checked out and not yet checked back in
    checked_out: BTreeMap<Cost, usize>,
}

impl<S: State> Inner<S> {
    fn take(&mut self) -> Result<Option<FrontierItem<S>>> {
        match &mut self.link {
            Link::Remote(conn) => conn.take(),
            Link::Local(storage) => Ok(storage.take()),
        }
    }

    fn record_all(
        &mut self,
        items: Vec<FrontierItem<S>>,
        parent: Option<S>,
        prepared: bool,
    ) -> Result<()> {
        match &mut self.link {
            Link::Remote(conn) => {
                let pull_next = prepared && conn.waiting.is_none();
                conn.send(Request::Record {
                    items,
                    parent,
                    pull_next,
                })?;
                if pull_next {
                    conn.waiting = conn.recv_item()?;
                }
                conn.waiting_fresh = pull_next;
                Ok(())
            }
            Link::Local(storage) => {
                storage.record_all(items, parent);
                Ok(())
            }
        }
    }

    fn reinsert(&mut self, item: FrontierItem<S>) -> Result<()> {
        match &mut self.link {
            Link::Remote(conn) => {
                conn.waiting_fresh = false;
                conn.send(Request::Reinsert(item))
            }
            Link::Local(storage) => {
                storage.reinsert(item);
                Ok(())
            }
        }
    }

    fn lowest_checked_out(&self) -> Option<Cost> {
        self.checked_out.keys().next().copied()
    }

    fn release(&mut self, item: &FrontierItem<S>) {
        let priority = item.priority();
        if let Some(count) = self.checked_out.get_mut(&priority) {
            *count -= 1;
            if *count == 0 {
                self.checked_out.remove(&priority);
            }
        }
    }
}

/// Storage proxy shared between threads
pub struct RemoteStorage<S: State> {
    inner: Mutex<Inner<S>>,
    prepared: bool,
}

impl<S: State> RemoteStorage<S> {
    /// Move `storage` onto a server thread
    pub fn spawn(storage: Box<dyn Storage<S>>) -> Result<Self> {
        Self::start(storage, false)
    }

    /// Like `spawn`, but prefetch the next item after every `record_all`
    pub fn spawn_prepared(storage: Box<dyn Storage<S>>) -> Result<Self> {
        Self::start(storage, true)
    }

    fn start(storage: Box<dyn Storage<S>>, prepared: bool) -> Result<Self> {
        let (request_tx, request_rx) = unbounded();
        let (reply_tx, reply_rx) = bounded(1);

        let server = thread::Builder::new()
            .name("astar-storage".to_string())
            .spawn(move || serve(storage, request_rx, reply_tx))?;

        debug!(prepared, "Storage server started");

        Ok(Self {
            inner: Mutex::new(Inner {
                link: Link::Remote(Connection {
                    requests: request_tx,
                    replies: reply_rx,
                    server: Some(server),
                    waiting: None,
                    waiting_fresh: false,
                }),
                checked_out: BTreeMap::new(),
            }),
            prepared,
        })
    }

    /// Whether calls still go to the server thread
    pub fn is_remote(&self) -> bool {
        matches!(self.inner.lock().link, Link::Remote(_))
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn record(&self, item: FrontierItem<S>, parent: Option<S>) -> Result<()> {
        let mut inner = self.inner.lock();
        match &mut inner.link {
            Link::Remote(conn) => {
                conn.waiting_fresh = false;
                conn.send(Request::Record {
                    items: vec![item],
                    parent,
                    pull_next: false,
                })
            }
            Link::Local(storage) => {
                storage.record(item, parent);
                Ok(())
            }
        }
    }

    pub fn record_all(&self, items: Vec<FrontierItem<S>>, parent: Option<S>) -> Result<()> {
        self.inner.lock().record_all(items, parent, self.prepared)
    }

    pub fn take(&self) -> Result<Option<FrontierItem<S>>> {
        self.inner.lock().take()
    }

    pub fn reinsert(&self, item: FrontierItem<S>) -> Result<()> {
        self.inner.lock().reinsert(item)
    }

    pub fn parent(&self, state: &S) -> Result<Option<ParentRecord<S>>> {
        let mut inner = self.inner.lock();
        match &mut inner.link {
            Link::Remote(conn) => {
                conn.send(Request::Parent(state.clone()))?;
                conn.recv_parent()
            }
            Link::Local(storage) => Ok(storage.parent(state)),
        }
    }

    /// Stop the server and serve every further call locally
    ///
    /// A prefetched item is returned to the open set. Calling `finish` twice
    /// is a no-op.
    pub fn finish(&self) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let storage = match &mut inner.link {
            Link::Local(_) => return Ok(()),
            Link::Remote(conn) => {
                conn.send(Request::Finish)?;
                let mut storage = conn.recv_storage()?;
                if let Some(server) = conn.server.take() {
                    if server.join().is_err() {
                        warn!("Storage server panicked after handing storage back");
                    }
                }
                if let Some(item) = conn.waiting.take() {
                    storage.reinsert(item);
                }
                storage
            }
        };
        inner.link = Link::Local(storage);
        inner.checked_out.clear();
        debug!("Storage reclaimed from server");
        Ok(())
    }

    /// Take the best item for expansion
    ///
    /// Defers when a cheaper item is still checked out; the best item stays
    /// in the frontier.
    pub fn checkout(&self) -> Result<Checkout<S>> {
        let mut inner = self.inner.lock();
        let Some(item) = inner.take()? else {
            return Ok(Checkout::Empty);
        };

        let priority = item.priority();
        if let Some(lowest) = inner.lowest_checked_out() {
            if priority > lowest {
                trace!(priority, lowest, "Deferring checkout");
                inner.reinsert(item)?;
                return Ok(Checkout::Deferred);
            }
        }

        *inner.checked_out.entry(priority).or_insert(0) += 1;
        Ok(Checkout::Item(item))
    }

    /// Report the successors of a checked out item
    pub fn checkin(&self, items: Vec<FrontierItem<S>>, parent: FrontierItem<S>) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.release(&parent);
        inner.record_all(items, Some(parent.state), self.prepared)
    }

    /// Give a checked out item back unexpanded
    pub fn checkin_unexpanded(&self, item: FrontierItem<S>) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.release(&item);
        inner.reinsert(item)
    }

    /// Items checked out and not yet checked back in
    pub fn checked_out(&self) -> usize {
        self.inner.lock().checked_out.values().sum()
    }
}

impl<'a, S: State> crate::search::storage::Frontier<S> for &'a RemoteStorage<S> {
    fn take(&mut self) -> Result<Checkout<S>> {
        self.checkout()
    }

    fn record_all(&mut self, items: Vec<FrontierItem<S>>, parent: FrontierItem<S>) -> Result<()> {
        self.checkin(items, parent)
    }

    fn reinsert(&mut self, item: FrontierItem<S>) -> Result<()> {
        self.checkin_unexpanded(item)
    }
}
