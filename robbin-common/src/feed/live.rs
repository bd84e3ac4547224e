use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info};

use super::controller::{self, FeedController, PollOutcome};
use super::range::TimeRange;
use crate::api::IncidentApi;
use crate::error::FeedError;
use crate::poller::{Liveness, Poller};

/// One mounted live feed: controller state, API handle and poll loop.
///
/// The controller lock is never held across a network call, so handlers
/// stay responsive while a refresh is in flight.
pub struct LiveFeed {
    controller: Arc<Mutex<FeedController>>,
    api: Arc<dyn IncidentApi>,
    poller: Option<Poller>,
}

impl LiveFeed {
    pub fn new(api: Arc<dyn IncidentApi>, range: TimeRange) -> Self {
        Self {
            controller: Arc::new(Mutex::new(FeedController::new(range))),
            api,
            poller: None,
        }
    }

    /// Start polling every `interval`; the first refresh runs immediately
    pub fn mount(&mut self, interval: Duration) {
        if self.poller.is_some() {
            return;
        }

        let controller = self.controller.clone();
        let api = self.api.clone();
        let poller = Poller::start("live-feed", interval, move |live| {
            let controller = controller.clone();
            let api = api.clone();
            async move {
                let outcome = poll_once(&controller, api.as_ref(), &live).await;
                debug!(?outcome, "live feed tick");
            }
        });

        info!(interval_secs = interval.as_secs(), "live feed mounted");
        self.poller = Some(poller);
    }

    /// Stop polling; responses still in flight are dropped
    pub async fn unmount(&mut self) {
        if let Some(poller) = self.poller.take() {
            let name = poller.name();
            poller.stop().await;
            info!(poller = name, "live feed unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_running)
    }

    /// Shared controller state for rendering and user actions
    pub fn controller(&self) -> Arc<Mutex<FeedController>> {
        self.controller.clone()
    }

    /// Run a single refresh outside the schedule
    pub async fn refresh(&self) -> PollOutcome {
        poll_once(&self.controller, self.api.as_ref(), &Liveness::always()).await
    }

    /// Submit the current selection as a new incident.
    ///
    /// State is snapshotted under the lock; the request runs without it.
    /// On success only the submitted ids leave the selection, so events
    /// picked while the request was in flight stay selected.
    pub async fn generate_incident(&self) -> Result<String, FeedError> {
        let (mut selection, events) = {
            let feed = self.controller.lock().await;
            (feed.selection().clone(), feed.events().to_vec())
        };
        let submitted: Vec<String> = selection.ids().map(str::to_string).collect();

        let incident_id =
            controller::generate_incident(self.api.as_ref(), &mut selection, &events).await?;

        self.controller
            .lock()
            .await
            .release_selection(&submitted);
        Ok(incident_id)
    }
}

/// One poll tick: skip while paused, otherwise fetch and commit atomically
pub async fn poll_once(
    controller: &Mutex<FeedController>,
    api: &dyn IncidentApi,
    live: &Liveness,
) -> PollOutcome {
    if controller.lock().await.is_paused() {
        return PollOutcome::Skipped;
    }

    let result = api.list_events().await;

    if !live.is_live() {
        return PollOutcome::Discarded;
    }
    controller.lock().await.apply_poll_result(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::controller::tests::{event, RecordingApi};
    use crate::feed::range::RelativeWindow;
    use crate::feed::selection::SelectionChange;
    use chrono::Utc;
    use std::sync::atomic::Ordering;

    fn feed_with(api: Arc<RecordingApi>) -> LiveFeed {
        LiveFeed::new(api, TimeRange::Relative(RelativeWindow::AllTime))
    }

    #[tokio::test]
    async fn test_paused_tick_issues_no_fetch() {
        let api = Arc::new(RecordingApi::default());
        api.events
            .lock()
            .unwrap()
            .push(event("a", "error", Utc::now()));
        let feed = feed_with(api.clone());

        assert_eq!(feed.refresh().await, PollOutcome::Applied(1));
        assert_eq!(api.event_fetches.load(Ordering::SeqCst), 1);

        feed.controller().lock().await.pause();
        api.events.lock().unwrap().clear();

        assert_eq!(feed.refresh().await, PollOutcome::Skipped);
        assert_eq!(api.event_fetches.load(Ordering::SeqCst), 1);
        assert_eq!(feed.controller().lock().await.events().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_events() {
        let api = Arc::new(RecordingApi::default());
        api.events
            .lock()
            .unwrap()
            .push(event("a", "warning", Utc::now()));
        let feed = feed_with(api.clone());
        feed.refresh().await;

        *api.fail_events.lock().unwrap() = true;
        assert_eq!(feed.refresh().await, PollOutcome::Failed);
        assert_eq!(feed.controller().lock().await.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_polls_until_selection_pauses() {
        let api = Arc::new(RecordingApi::default());
        api.events
            .lock()
            .unwrap()
            .push(event("a", "error", Utc::now()));
        let mut feed = feed_with(api.clone());

        feed.mount(Duration::from_secs(15));
        assert!(feed.is_mounted());
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(api.event_fetches.load(Ordering::SeqCst), 2);

        let change = feed.controller().lock().await.toggle_selection("a");
        assert_eq!(change, SelectionChange::Added);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.event_fetches.load(Ordering::SeqCst), 2);

        feed.unmount().await;
        assert!(!feed.is_mounted());
    }

    #[tokio::test]
    async fn test_generate_incident_clears_selection() {
        let api = Arc::new(RecordingApi::default());
        api.events
            .lock()
            .unwrap()
            .extend([event("a", "error", Utc::now()), event("b", "info", Utc::now())]);
        let feed = feed_with(api.clone());
        feed.refresh().await;

        {
            let controller = feed.controller();
            let mut state = controller.lock().await;
            state.toggle_selection("a");
            state.toggle_selection("b");
        }

        let id = feed.generate_incident().await.unwrap();
        assert_eq!(id, "inc-1");
        assert_eq!(api.created.lock().unwrap().len(), 1);
        assert!(feed.controller().lock().await.selection().is_empty());

        let err = feed.generate_incident().await.unwrap_err();
        assert_eq!(err, FeedError::Validation("no selection".to_string()));
        assert_eq!(api.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_selection_made_during_request_survives() {
        let api = Arc::new(RecordingApi::default());
        api.events.lock().unwrap().extend([
            event("a", "error", Utc::now()),
            event("b", "warning", Utc::now()),
        ]);
        api.hold_create.store(true, Ordering::SeqCst);
        let feed = feed_with(api.clone());
        feed.refresh().await;
        feed.controller().lock().await.toggle_selection("a");

        let select_meanwhile = async {
            while api.created.lock().unwrap().is_empty() {
                tokio::task::yield_now().await;
            }
            feed.controller().lock().await.toggle_selection("b");
            api.release_create.notify_one();
        };
        let (created, ()) = tokio::join!(feed.generate_incident(), select_meanwhile);

        assert_eq!(created.unwrap(), "inc-1");
        assert_eq!(*api.created.lock().unwrap(), vec![vec!["a".to_string()]]);
        let controller = feed.controller();
        let state = controller.lock().await;
        assert_eq!(state.selection().ids().collect::<Vec<_>>(), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_after_stop_is_discarded() {
        let api = Arc::new(RecordingApi::default());
        api.events
            .lock()
            .unwrap()
            .push(event("a", "error", Utc::now()));
        let controller = Mutex::new(FeedController::new(TimeRange::Relative(
            RelativeWindow::AllTime,
        )));

        let captured = Arc::new(std::sync::Mutex::new(None));
        let slot = captured.clone();
        let poller = Poller::start("capture", Duration::from_secs(15), move |live| {
            *slot.lock().unwrap() = Some(live);
            async {}
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        poller.stop().await;

        let live = captured.lock().unwrap().take().unwrap();
        assert!(!live.is_live());
        assert_eq!(
            poll_once(&controller, api.as_ref(), &live).await,
            PollOutcome::Discarded
        );
        assert_eq!(api.event_fetches.load(Ordering::SeqCst), 1);
        assert!(controller.lock().await.events().is_empty());
    }
}
