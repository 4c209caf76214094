#![allow(dead_code)]

use api_client::{
    ApiClientError, GalleryItem, GalleryPageResult, GalleryStats, MediaAddress, MediaKind,
    StorageLocation, Theme,
};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use sync::GallerySource;
use tokio::sync::oneshot;

type PageResult = Result<GalleryPageResult, ApiClientError>;

#[derive(Default)]
struct GateInner {
    waiting: Vec<(u32, oneshot::Sender<PageResult>)>,
    calls: Vec<u32>,
}

/// Gallery source whose fetches stay pending until the test resolves them.
#[derive(Clone, Default)]
pub struct Gate {
    inner: Rc<RefCell<GateInner>>,
}

impl GallerySource for Gate {
    fn fetch_page(&self, page: u32) -> impl Future<Output = PageResult> {
        let (tx, rx) = oneshot::channel();
        {
            let mut inner = self.inner.borrow_mut();
            inner.calls.push(page);
            inner.waiting.push((page, tx));
        }
        async move {
            rx.await
                .unwrap_or_else(|_| Err(ApiClientError::Other("gate dropped".into())))
        }
    }
}

impl Gate {
    /// Yield until a fetch for `page` is waiting.
    pub async fn wait_for(&self, page: u32) {
        while !self.inner.borrow().waiting.iter().any(|(p, _)| *p == page) {
            tokio::task::yield_now().await;
        }
    }

    /// Complete the oldest waiting fetch for `page`.
    pub async fn resolve(&self, page: u32, result: PageResult) {
        self.wait_for(page).await;
        let tx = {
            let mut inner = self.inner.borrow_mut();
            let pos = inner
                .waiting
                .iter()
                .position(|(p, _)| *p == page)
                .unwrap();
            inner.waiting.remove(pos).1
        };
        tx.send(result).unwrap();
    }

    pub fn calls(&self) -> Vec<u32> {
        self.inner.borrow().calls.clone()
    }
}

pub fn item(id: &str, kind: MediaKind) -> GalleryItem {
    GalleryItem {
        address: MediaAddress::Id(id.to_string()),
        kind,
        captured_at: 1672574400,
        game: "Super Mario Odyssey".into(),
        storage: StorageLocation::Removable,
        file_size_bytes: 1536,
        file_name_hint: None,
    }
}

/// A page whose items are named `p{page}-{n}`.
pub fn page(page: u32, len: usize, total_pages: u32, theme: Theme) -> GalleryPageResult {
    GalleryPageResult {
        items: (0..len)
            .map(|n| item(&format!("p{}-{}", page, n), MediaKind::Image))
            .collect(),
        total_pages,
        theme,
        stats: Some(GalleryStats {
            screenshots: 40,
            videos: 2,
            index_time_secs: 1.5,
        }),
    }
}

pub fn ids(items: &[GalleryItem]) -> Vec<String> {
    items.iter().map(|i| i.id().to_string()).collect()
}
