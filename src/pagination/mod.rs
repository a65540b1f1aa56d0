//! Incremental pagination over a cursor-based connection.
//!
//! A [`Paginator`] owns the accumulated, order-preserving list of nodes for
//! one connection of one root entity (the issues of a repository, the
//! comments of an issue). Pages are appended through [`Paginator::load_next`]
//! and deduplicated by node key, first occurrence winning, so a node that
//! shifts between pages on the server never moves or repeats on screen.
//!
//! Loads are serialised: while one is in flight further calls are no-ops.
//! A [`Paginator::reset`] bumps a generation counter; a fetch that was
//! started under an older generation is discarded when it lands.
//!
//! The paginator is single-threaded by construction. State lives in a
//! `RefCell` that is never borrowed across an `.await`.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Debug;
use std::future::Future;

use tracing::{debug, warn};

use crate::cache::{CacheEntity, SharedCache};
use crate::connection::{Connection, Keyed, PageInfo};
use crate::error::{BoxedStr, LensError};
use crate::listeners::{SubscriptionId, Subscribers};


/// Largest page GitHub serves for a connection.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Where pages come from.
pub trait PageSource {
    /// Identity of the object that owns the connection.
    type Root: Clone + PartialEq + Debug;
    type Node: Keyed;

    /// Fetch up to `page_size` nodes following `after` (or the first page when
    /// `after` is `None`).
    fn fetch_page(
        &self,
        root: &Self::Root,
        after: Option<&str>,
        page_size: u32,
    ) -> impl Future<Output = Result<Connection<Self::Node>, LensError>>;
}

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No page held yet.
    Empty,
    /// At least one page held and more remain.
    Loaded,
    /// A next-page fetch is in flight.
    Loading,
    /// Every page has been merged. Terminal until the next reset.
    Exhausted,
}

/// Why [`Paginator::load_next`] returned without fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotInitialized,
    InFlight,
    Exhausted,
}

/// Result of a load that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was merged; `added` counts nodes not seen before.
    Merged { added: usize },
    /// No fetch was issued and nothing changed.
    Skipped(SkipReason),
    /// The fetch finished after a reset and its result was dropped.
    Stale,
}

/// State changes pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginatorEvent {
    Reset,
    Merged { added: usize, has_more: bool },
}

struct State<R, N: Keyed> {
    root: Option<R>,
    generation: u64,
    phase: Phase,
    page_info: PageInfo,
    items: Vec<N>,
    seen: HashSet<N::Key>,
}

impl<R, N: Keyed> State<R, N> {
    fn new() -> Self {
        Self {
            root: None,
            generation: 0,
            phase: Phase::Empty,
            page_info: PageInfo::exhausted(),
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Append unseen nodes in order and adopt the page's cursor state.
    ///
    /// The caller validates `page.page_info` first; this cannot fail, so a
    /// merge is all-or-nothing.
    fn merge(&mut self, page: Connection<N>) -> usize {
        let before = self.items.len();
        for edge in page.edges {
            if self.seen.insert(edge.node.key()) {
                self.items.push(edge.node);
            }
        }
        self.phase = if page.page_info.has_next_page {
            Phase::Loaded
        } else {
            Phase::Exhausted
        };
        self.page_info = page.page_info;
        self.items.len() - before
    }
}

type Sink<N> = Box<dyn Fn(&N)>;

/// Accumulates the pages of one connection. See the module docs.
pub struct Paginator<S: PageSource> {
    source: S,
    page_size: u32,
    state: RefCell<State<S::Root, S::Node>>,
    sink: Option<Sink<S::Node>>,
    listeners: Subscribers<PaginatorEvent>,
}

impl<S: PageSource> Paginator<S> {
    /// Create an empty paginator. `page_size` is clamped to
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(source: S, page_size: u32) -> Self {
        Self {
            source,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            state: RefCell::new(State::new()),
            sink: None,
            listeners: Subscribers::default(),
        }
    }

    /// Write every merged node into `cache`, keeping the shared entity
    /// records current as pages arrive.
    #[must_use]
    pub fn with_cache(mut self, cache: SharedCache) -> Self
    where
        S::Node: CacheEntity + 'static,
    {
        self.sink = Some(Box::new(move |node: &S::Node| {
            if let Err(e) = cache.upsert_entity(node) {
                warn!("failed to cache {}: {e}", node.entity_key());
            }
        }));
        self
    }

    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Forget every page and scope the paginator to `root`.
    ///
    /// Any fetch still in flight is orphaned: its result will be discarded
    /// on arrival.
    pub fn reset(&self, root: S::Root) {
        {
            let mut st = self.state.borrow_mut();
            st.generation += 1;
            st.root = Some(root);
            st.phase = Phase::Empty;
            st.page_info = PageInfo::exhausted();
            st.items.clear();
            st.seen.clear();
            debug!(root = ?st.root, generation = st.generation, "connection reset");
        }
        self.listeners.notify(&PaginatorEvent::Reset);
    }

    /// Install the first page for the current root.
    ///
    /// # Errors
    ///
    /// Returns [`LensError::NoRoot`] before the first [`reset`](Self::reset),
    /// [`LensError::AlreadyInitialized`] when a page is already held, and
    /// [`LensError::BadResponse`] when the page claims more results without a
    /// cursor. Nothing changes on error.
    pub fn initialize(&self, first_page: Connection<S::Node>) -> Result<(), LensError> {
        {
            let st = self.state.borrow();
            let root = st.root.as_ref().ok_or(LensError::NoRoot)?;
            if st.phase != Phase::Empty {
                return Err(LensError::AlreadyInitialized(format!("{root:?}").boxed()));
            }
        }
        first_page.page_info.next_cursor()?;
        self.commit_page(first_page);
        Ok(())
    }

    /// Reset to `root`, fetch its first page and install it.
    ///
    /// # Errors
    ///
    /// Propagates fetch failures and the errors of
    /// [`initialize`](Self::initialize). After a failure the paginator stays
    /// empty for `root`, so calling `start` again retries.
    pub async fn start(&self, root: S::Root) -> Result<LoadOutcome, LensError> {
        self.reset(root.clone());
        let generation = self.state.borrow().generation;
        let page = self.source.fetch_page(&root, None, self.page_size).await;
        if self.state.borrow().generation != generation {
            debug!(?root, "discarding first page fetched before a reset");
            return Ok(LoadOutcome::Stale);
        }
        self.initialize(page?)?;
        Ok(LoadOutcome::Merged { added: self.len() })
    }

    /// Fetch and merge the page after the stored cursor.
    ///
    /// Returns [`LoadOutcome::Skipped`] without fetching when nothing has been
    /// loaded, a load is already running, or the connection is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates fetch failures. The cursor and accumulated list are left as
    /// they were, so calling `load_next` again retries the same page.
    pub async fn load_next(&self) -> Result<LoadOutcome, LensError> {
        let (root, cursor, generation) = {
            let mut st = self.state.borrow_mut();
            match st.phase {
                Phase::Empty => return Ok(LoadOutcome::Skipped(SkipReason::NotInitialized)),
                Phase::Loading => return Ok(LoadOutcome::Skipped(SkipReason::InFlight)),
                Phase::Exhausted => return Ok(LoadOutcome::Skipped(SkipReason::Exhausted)),
                Phase::Loaded => {}
            }
            let Some(cursor) = st.page_info.next_cursor()?.map(str::to_owned) else {
                return Ok(LoadOutcome::Skipped(SkipReason::Exhausted));
            };
            let root = st.root.clone().ok_or(LensError::NoRoot)?;
            st.phase = Phase::Loading;
            (root, cursor, st.generation)
        };

        let guard = InFlight {
            state: &self.state,
            generation,
        };
        let result = self
            .source
            .fetch_page(&root, Some(&cursor), self.page_size)
            .await;
        drop(guard);

        if self.state.borrow().generation != generation {
            debug!(?root, "discarding page fetched before a reset");
            return Ok(LoadOutcome::Stale);
        }
        let page = result
            .inspect_err(|e| warn!(?root, cursor = %cursor, "loading next page failed: {e}"))?;
        page.page_info.next_cursor()?;
        let added = self.commit_page(page);
        Ok(LoadOutcome::Merged { added })
    }

    /// Merge a validated page, feed the cache and notify subscribers.
    fn commit_page(&self, page: Connection<S::Node>) -> usize {
        let (added, has_more) = {
            let mut st = self.state.borrow_mut();
            let added = st.merge(page);
            debug!(
                added,
                total = st.items.len(),
                has_more = st.page_info.has_next_page,
                "page merged"
            );
            (added, st.page_info.has_next_page)
        };
        if let Some(sink) = &self.sink {
            let st = self.state.borrow();
            let start = st.items.len() - added;
            st.items.iter().skip(start).for_each(|node| sink(node));
        }
        self.listeners
            .notify(&PaginatorEvent::Merged { added, has_more });
        added
    }

    /// Snapshot of the accumulated list, in server order.
    #[must_use]
    pub fn items(&self) -> Vec<S::Node>
    where
        S::Node: Clone,
    {
        self.state.borrow().items.clone()
    }

    /// Run `f` over the accumulated list without cloning it.
    ///
    /// `f` must not call back into this paginator's mutating methods.
    pub fn with_items<T>(&self, f: impl FnOnce(&[S::Node]) -> T) -> T {
        f(&self.state.borrow().items)
    }

    /// Keys of the accumulated list, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<<S::Node as Keyed>::Key> {
        self.state.borrow().items.iter().map(Keyed::key).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether another page may be requested.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.state.borrow().page_info.has_next_page
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Loading
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    #[must_use]
    pub fn end_cursor(&self) -> Option<String> {
        self.state.borrow().page_info.end_cursor.clone()
    }

    #[must_use]
    pub fn root(&self) -> Option<S::Root> {
        self.state.borrow().root.clone()
    }

    pub fn subscribe(&self, callback: impl Fn(&PaginatorEvent) + 'static) -> SubscriptionId {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.listeners.unsubscribe(id)
    }
}

/// Clears the in-flight flag once a fetch settles, including when the
/// `load_next` future is dropped mid-fetch.
struct InFlight<'a, R, N: Keyed> {
    state: &'a RefCell<State<R, N>>,
    generation: u64,
}

impl<R, N: Keyed> Drop for InFlight<'_, R, N> {
    fn drop(&mut self) {
        if let Ok(mut st) = self.state.try_borrow_mut()
            && st.generation == self.generation
            && st.phase == Phase::Loading
        {
            st.phase = Phase::Loaded;
        }
    }
}
