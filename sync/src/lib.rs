//! Synchronization of the paginated gallery with the device backend.
//!
//! [`GallerySyncController`] keeps one authoritative view of the gallery:
//! which page is shown, what the server last reported for it and whether a
//! fetch is in flight or failed. Fetches run as local tasks on the current
//! `LocalSet`; every fetch carries a [`FetchTicket`] and only the outcome of
//! the most recently issued ticket is ever applied.

use api_client::{ApiClient, ApiClientError, GalleryItem, GalleryPageResult, GalleryStats, Theme};
use resolver::{ClientContext, MediaResolver, ResolvedMedia};
use serde::Serialize;
use std::future::Future;
use std::rc::Rc;
use tokio::sync::mpsc;
use tokio::task::spawn_local;

/// Anything that can produce gallery pages.
pub trait GallerySource {
    fn fetch_page(&self, page: u32)
        -> impl Future<Output = Result<GalleryPageResult, ApiClientError>>;
}

impl GallerySource for ApiClient {
    fn fetch_page(&self, page: u32)
        -> impl Future<Output = Result<GalleryPageResult, ApiClientError>> {
        self.get_gallery_page(page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryState {
    pub current_page: u32,
    pub max_pages: u32,
    pub theme: Theme,
    pub items: Vec<GalleryItem>,
    pub stats: GalleryStats,
    pub status: SyncStatus,
    pub last_error: Option<String>,
}

impl Default for GalleryState {
    fn default() -> Self {
        GalleryState {
            current_page: 1,
            max_pages: 1,
            theme: Theme::default(),
            items: Vec::new(),
            stats: GalleryStats::default(),
            status: SyncStatus::Idle,
            last_error: None,
        }
    }
}

/// Identifies one issued fetch: the page it targets and its issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub page: u32,
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncProgress {
    Requested(u32),
    Loaded { page: u32, items: usize, total_pages: u32 },
    Failed { page: u32, error: String },
    Discarded(u32),
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDisposition {
    Applied,
    Failed,
    Discarded,
    /// The page no longer exists and the last page was requested instead.
    Reissued,
}

struct FetchOutcome {
    ticket: FetchTicket,
    result: Result<GalleryPageResult, ApiClientError>,
}

pub struct GallerySyncController<S: GallerySource + 'static = ApiClient> {
    source: Rc<S>,
    resolver: MediaResolver,
    state: GalleryState,
    current: FetchTicket,
    next_seq: u64,
    in_flight: usize,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    progress: Option<mpsc::UnboundedSender<SyncProgress>>,
}

impl<S: GallerySource + 'static> GallerySyncController<S> {
    /// Create the controller and immediately request page 1.
    ///
    /// # Panics
    ///
    /// Fetches are spawned with [`spawn_local`], so this must run inside a
    /// `tokio::task::LocalSet`.
    pub fn new(source: S, ctx: ClientContext) -> Self {
        Self::with_progress(source, ctx, None)
    }

    pub fn with_progress(
        source: S,
        ctx: ClientContext,
        progress: Option<mpsc::UnboundedSender<SyncProgress>>,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let mut controller = GallerySyncController {
            source: Rc::new(source),
            resolver: MediaResolver::new(ctx),
            state: GalleryState::default(),
            current: FetchTicket { page: 1, seq: 0 },
            next_seq: 0,
            in_flight: 0,
            outcome_tx,
            outcome_rx,
            progress,
        };
        controller.issue(1);
        controller
    }

    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    pub fn status(&self) -> SyncStatus {
        self.state.status
    }

    pub fn current_page(&self) -> u32 {
        self.state.current_page
    }

    pub fn max_pages(&self) -> u32 {
        self.state.max_pages
    }

    pub fn theme(&self) -> Theme {
        self.state.theme
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.state.items
    }

    pub fn stats(&self) -> &GalleryStats {
        &self.state.stats
    }

    pub fn last_error(&self) -> Option<&str> {
        self.state.last_error.as_deref()
    }

    pub fn resolver(&self) -> &MediaResolver {
        &self.resolver
    }

    /// Ticket of the fetch whose outcome will be applied next.
    pub fn current_ticket(&self) -> FetchTicket {
        self.current
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight > 0
    }

    pub fn has_previous(&self) -> bool {
        self.state.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.state.current_page < self.state.max_pages
    }

    fn notify(&self, event: SyncProgress) {
        if let Some(tx) = &self.progress {
            if let Err(e) = tx.send(event) {
                tracing::error!("Failed to send progress update: {}", e);
            }
        }
    }

    fn issue(&mut self, page: u32) {
        self.next_seq += 1;
        let ticket = FetchTicket {
            page,
            seq: self.next_seq,
        };
        self.current = ticket;
        self.state.current_page = page;
        self.state.status = SyncStatus::Loading;
        self.in_flight += 1;
        self.notify(SyncProgress::Requested(page));

        let source = Rc::clone(&self.source);
        let tx = self.outcome_tx.clone();
        spawn_local(async move {
            let result = source.fetch_page(page).await;
            // Fails only when the controller is gone.
            let _ = tx.send(FetchOutcome { ticket, result });
        });
    }

    /// Navigate to `page`. Out-of-range requests are ignored and return `false`.
    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub fn request_page(&mut self, page: u32) -> bool {
        if page < 1 || page > self.state.max_pages {
            tracing::debug!(
                page,
                max_pages = self.state.max_pages,
                "Ignoring out-of-range page request"
            );
            return false;
        }
        tracing::info!(page, "Requesting gallery page");
        self.issue(page);
        true
    }

    /// Request the current page again, typically after an error.
    pub fn retry(&mut self) -> bool {
        self.request_page(self.state.current_page)
    }

    pub fn next_page(&mut self) -> bool {
        match self.state.current_page.checked_add(1) {
            Some(page) => self.request_page(page),
            None => false,
        }
    }

    pub fn previous_page(&mut self) -> bool {
        self.request_page(self.state.current_page.saturating_sub(1))
    }

    /// Find an item of the current page by id.
    pub fn find_item(&self, id: &str) -> Option<&GalleryItem> {
        self.state.items.iter().find(|item| item.id() == id)
    }

    /// Resolve an item for detail display. Does not touch controller state.
    pub fn open_item(&self, item: &GalleryItem) -> ResolvedMedia {
        tracing::debug!(id = item.id(), "Opening gallery item");
        self.resolver.resolve(item)
    }

    /// Counterpart of [`open_item`](Self::open_item); detail views hold no core state.
    pub fn close_item(&self) {
        tracing::debug!("Closing gallery item");
    }

    /// Wait for the next completed fetch and apply or discard it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn process_next(&mut self) -> Option<FetchDisposition> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.outcome_rx.recv().await?;
        self.in_flight -= 1;
        Some(self.apply(outcome))
    }

    /// Process completed fetches until the latest request has settled.
    pub async fn settle(&mut self) -> SyncStatus {
        while self.state.status == SyncStatus::Loading {
            if self.process_next().await.is_none() {
                break;
            }
        }
        self.state.status
    }

    fn apply(&mut self, outcome: FetchOutcome) -> FetchDisposition {
        let FetchOutcome { ticket, result } = outcome;
        if ticket != self.current {
            tracing::debug!(
                page = ticket.page,
                current = self.current.page,
                "Discarding stale gallery response"
            );
            self.notify(SyncProgress::Discarded(ticket.page));
            return FetchDisposition::Discarded;
        }

        match result {
            Ok(page) => {
                let total_pages = page.total_pages.max(1);
                if ticket.page > total_pages {
                    // The items belong to a page that no longer exists; keep the
                    // gallery-wide fields and fetch the last page instead.
                    tracing::warn!(
                        page = ticket.page,
                        total_pages,
                        "Gallery shrank below the current page"
                    );
                    self.state.max_pages = total_pages;
                    self.state.theme = page.theme;
                    self.state.stats = page.stats.unwrap_or_default();
                    self.issue(total_pages);
                    return FetchDisposition::Reissued;
                }
                let item_count = page.items.len();
                self.state.items = page.items;
                self.state.max_pages = total_pages;
                self.state.theme = page.theme;
                self.state.stats = page.stats.unwrap_or_default();
                self.state.status = SyncStatus::Loaded;
                self.state.last_error = None;
                tracing::info!(
                    page = ticket.page,
                    items = item_count,
                    total_pages,
                    "Gallery page loaded"
                );
                self.notify(SyncProgress::Loaded {
                    page: ticket.page,
                    items: item_count,
                    total_pages,
                });
                FetchDisposition::Applied
            }
            Err(e) => {
                tracing::warn!(page = ticket.page, error = %e, "Failed to load gallery page");
                self.state.status = SyncStatus::Error;
                self.state.last_error = Some(e.to_string());
                self.notify(SyncProgress::Failed {
                    page: ticket.page,
                    error: e.to_string(),
                });
                FetchDisposition::Failed
            }
        }
    }
}
