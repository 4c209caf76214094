mod common;

use api_client::{GalleryStats, Theme};
use common::{ids, page, Gate};
use resolver::ClientContext;
use sync::{FetchDisposition, GallerySyncController, SyncStatus};
use tokio::task::LocalSet;

#[tokio::test(flavor = "current_thread")]
async fn test_initial_fetch_applies_page_one() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let gate = Gate::default();
            let mut controller = GallerySyncController::new(gate.clone(), ClientContext::default());
            assert_eq!(controller.status(), SyncStatus::Loading);
            assert_eq!(controller.current_page(), 1);
            assert!(controller.items().is_empty());

            gate.resolve(1, Ok(page(1, 3, 4, Theme::Dark))).await;
            assert_eq!(controller.settle().await, SyncStatus::Loaded);

            assert_eq!(gate.calls(), vec![1]);
            assert_eq!(controller.max_pages(), 4);
            assert_eq!(controller.theme(), Theme::Dark);
            assert_eq!(ids(controller.items()), vec!["p1-0", "p1-1", "p1-2"]);
            assert_eq!(controller.stats().videos, 2);
            assert!(controller.last_error().is_none());
            assert!(!controller.is_pending());
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn test_request_page_updates_current_page() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let gate = Gate::default();
            let mut controller = GallerySyncController::new(gate.clone(), ClientContext::default());
            gate.resolve(1, Ok(page(1, 2, 3, Theme::Light))).await;
            controller.settle().await;

            for target in [3, 2, 1] {
                assert!(controller.request_page(target));
                assert_eq!(controller.current_page(), target);
                assert_eq!(controller.status(), SyncStatus::Loading);
                gate.resolve(target, Ok(page(target, 2, 3, Theme::Light))).await;
                assert_eq!(controller.settle().await, SyncStatus::Loaded);
                assert_eq!(controller.current_page(), target);
                assert_eq!(controller.items()[0].id(), format!("p{}-0", target));
            }
            assert_eq!(gate.calls(), vec![1, 3, 2, 1]);
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn test_out_of_range_request_is_noop() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let gate = Gate::default();
            let mut controller = GallerySyncController::new(gate.clone(), ClientContext::default());
            gate.resolve(1, Ok(page(1, 2, 2, Theme::Dark))).await;
            controller.settle().await;
            let before = controller.state().clone();

            assert!(!controller.request_page(0));
            assert!(!controller.request_page(3));
            assert!(!controller.request_page(u32::MAX));

            assert_eq!(controller.state(), &before);
            assert!(!controller.is_pending());
            assert_eq!(controller.process_next().await, None);
            assert_eq!(gate.calls(), vec![1]);
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn test_boundary_navigation() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let gate = Gate::default();
            let mut controller = GallerySyncController::new(gate.clone(), ClientContext::default());
            gate.resolve(1, Ok(page(1, 1, 2, Theme::Light))).await;
            controller.settle().await;

            assert!(!controller.has_previous());
            assert!(controller.has_next());
            assert!(!controller.previous_page());

            assert!(controller.next_page());
            gate.resolve(2, Ok(page(2, 1, 2, Theme::Light))).await;
            controller.settle().await;
            assert!(controller.has_previous());
            assert!(!controller.has_next());
            assert!(!controller.next_page());
            assert_eq!(controller.current_page(), 2);
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn test_server_theme_is_authoritative() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let gate = Gate::default();
            let mut controller = GallerySyncController::new(gate.clone(), ClientContext::default());
            gate.resolve(1, Ok(page(1, 1, 2, Theme::Dark))).await;
            controller.settle().await;
            assert_eq!(controller.theme(), Theme::Dark);

            controller.request_page(2);
            gate.resolve(2, Ok(page(2, 1, 2, Theme::Light))).await;
            assert_eq!(controller.process_next().await, Some(FetchDisposition::Applied));
            assert_eq!(controller.theme(), Theme::Light);
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn test_shrunken_gallery_clamps_current_page() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let gate = Gate::default();
            let mut controller = GallerySyncController::new(gate.clone(), ClientContext::default());
            gate.resolve(1, Ok(page(1, 1, 5, Theme::Light))).await;
            controller.settle().await;

            controller.request_page(5);
            gate.resolve(5, Ok(page(5, 2, 3, Theme::Dark))).await;
            assert_eq!(controller.process_next().await, Some(FetchDisposition::Reissued));
            assert_eq!(controller.status(), SyncStatus::Loading);
            assert_eq!(controller.current_page(), 3);
            assert_eq!(controller.max_pages(), 3);
            assert_eq!(controller.theme(), Theme::Dark);
            assert_eq!(ids(controller.items()), vec!["p1-0"]);

            gate.resolve(3, Ok(page(3, 2, 3, Theme::Dark))).await;
            assert_eq!(controller.settle().await, SyncStatus::Loaded);
            assert_eq!(gate.calls(), vec![1, 5, 3]);
            assert_eq!(controller.current_page(), 3);
            assert_eq!(ids(controller.items()), vec!["p3-0", "p3-1"]);
            assert!(!controller.has_next());
            assert!(!controller.is_pending());
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn test_missing_stats_reset_to_zero() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let gate = Gate::default();
            let mut controller = GallerySyncController::new(gate.clone(), ClientContext::default());
            gate.resolve(1, Ok(page(1, 1, 2, Theme::Light))).await;
            controller.settle().await;
            assert_eq!(controller.stats().screenshots, 40);

            controller.request_page(2);
            let mut without_stats = page(2, 1, 2, Theme::Light);
            without_stats.stats = None;
            gate.resolve(2, Ok(without_stats)).await;
            assert_eq!(controller.settle().await, SyncStatus::Loaded);
            assert_eq!(controller.stats(), &GalleryStats::default());
        })
        .await;
}

#[tokio::test(flavor = "current_thread")]
async fn test_open_item_does_not_change_state() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let gate = Gate::default();
            let mut controller = GallerySyncController::new(
                gate.clone(),
                ClientContext::new("http://192.168.100.25:1234"),
            );
            gate.resolve(1, Ok(page(1, 2, 1, Theme::Light))).await;
            controller.settle().await;
            let before = controller.state().clone();

            let item = controller.find_item("p1-1").cloned().unwrap();
            let resolved = controller.open_item(&item);
            controller.close_item();

            assert_eq!(resolved.full_url, "http://192.168.100.25:1234/file?id=p1-1");
            assert_eq!(resolved.size, "1.5 KB");
            assert_eq!(controller.state(), &before);
            assert!(controller.find_item("missing").is_none());
        })
        .await;
}
