//! View-model and form submission pipeline

use crate::backend::{Backend, BackendError};
use crate::form::{FormFields, PayloadError, RequestPayload};
use crate::render::{render_for, ResultsContainer};
use crate::store::{ApiKeyStore, LocalStorage};
use crate::tabs::{Tab, TabController};
use crate::PresenterConfig;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Notify, RwLock};
use tracing::{debug, info, warn};

/// Busy label shown on a submit button while its request is in flight
pub const PROCESSING_LABEL: &str = "Processing...";

pub const MISSING_KEY_ALERT: &str = "Please enter a Google Maps API Key first.";

/// Result of a single submission
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Results were rendered and revealed
    Rendered,
    /// No API key entered; nothing was sent
    MissingApiKey,
    /// The form could not be turned into a payload; nothing was sent
    InvalidForm(PayloadError),
    /// The backend answered with a non-success status
    ServerError(String),
    /// Transport failure or undecodable response
    NetworkError(String),
    /// A newer submission on the same form replaced this one
    Superseded,
}

impl SubmitOutcome {
    /// Blocking alert to show the user, if any
    pub fn alert(&self) -> Option<String> {
        match self {
            SubmitOutcome::Rendered | SubmitOutcome::Superseded => None,
            SubmitOutcome::MissingApiKey => Some(MISSING_KEY_ALERT.to_string()),
            SubmitOutcome::InvalidForm(e) => Some(format!("Invalid form: {}", e)),
            SubmitOutcome::ServerError(message) => Some(format!("Error: {}", message)),
            SubmitOutcome::NetworkError(message) => Some(format!(
                "Network or Server Error. Check console for details.\n\nMessage: {}",
                message
            )),
        }
    }
}

impl From<BackendError> for SubmitOutcome {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::ServerError { message, .. } => SubmitOutcome::ServerError(message),
            other => SubmitOutcome::NetworkError(other.to_string()),
        }
    }
}

/// Submit button appearance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonState {
    pub label: &'static str,
    pub disabled: bool,
}

/// Everything the page shows, apart from the API key input
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub tabs: TabController,
    pub results: ResultsContainer,
}

/// An outstanding request on one form
struct InFlight {
    token: u64,
    cancel: Arc<Notify>,
}

/// The form-to-result presenter
pub struct Presenter {
    config: PresenterConfig,
    backend: Arc<dyn Backend>,
    api_key: RwLock<ApiKeyStore>,
    view: RwLock<ViewState>,
    in_flight: DashMap<Tab, InFlight>,
    next_token: AtomicU64,
}

impl Presenter {
    /// Create a presenter, loading any saved API key from storage
    pub fn new(config: PresenterConfig, backend: Arc<dyn Backend>, storage: LocalStorage) -> Self {
        let view = ViewState {
            tabs: TabController::new(config.initial_tab),
            results: ResultsContainer::new(),
        };

        Self {
            config,
            backend,
            api_key: RwLock::new(ApiKeyStore::load(storage)),
            view: RwLock::new(view),
            in_flight: DashMap::new(),
            next_token: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    pub async fn api_key(&self) -> String {
        self.api_key.read().await.value().to_string()
    }

    /// Change event of the API key input
    pub async fn set_api_key(&self, value: impl Into<String>) {
        self.api_key.write().await.on_change(value);
    }

    /// User activates a tab control
    pub async fn switch_tab(&self, tab: Tab) {
        let mut view = self.view.write().await;
        view.tabs.activate(tab);
        debug!(tab = %tab, "Switched tab");
    }

    /// Snapshot of the current view
    pub async fn view(&self) -> ViewState {
        self.view.read().await.clone()
    }

    /// Submit button state, derived from whether the form has a request in flight
    pub fn button_state(&self, tab: Tab) -> ButtonState {
        if self.in_flight.contains_key(&tab) {
            ButtonState {
                label: PROCESSING_LABEL,
                disabled: true,
            }
        } else {
            ButtonState {
                label: tab.submit_label(),
                disabled: false,
            }
        }
    }

    /// Submit `tab`'s form with the given raw field values.
    ///
    /// A submission on a form that already has one in flight cancels the
    /// older request; only the latest submission renders.
    pub async fn submit(&self, tab: Tab, fields: &FormFields) -> SubmitOutcome {
        let api_key = self.api_key().await;
        if api_key.is_empty() {
            warn!(tab = %tab, "Submission without API key");
            return SubmitOutcome::MissingApiKey;
        }

        // Rejected forms never cancel the request in flight
        let payload = match RequestPayload::from_form(&api_key, fields) {
            Ok(p) => p,
            Err(e) => {
                warn!(tab = %tab, error = %e, "Invalid form");
                return SubmitOutcome::InvalidForm(e);
            }
        };

        let (token, cancel) = self.begin(tab);
        let _guard = SubmitGuard {
            presenter: self,
            tab,
            token,
        };

        let endpoint = self.config.endpoint_for(tab);
        info!(tab = %tab, endpoint, token, "Submitting form");
        debug!(payload = ?payload.redacted(), "Sending data");

        let result = tokio::select! {
            result = self.backend.post(endpoint, &payload) => result,
            _ = cancel.notified() => {
                debug!(tab = %tab, token, "Request cancelled by newer submission");
                return SubmitOutcome::Superseded;
            }
        };

        if !self.is_current(tab, token) {
            return SubmitOutcome::Superseded;
        }

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                warn!(tab = %tab, error = %e, "Submit error");
                return e.into();
            }
        };

        let mut container = ResultsContainer::new();
        if let Err(e) = render_for(tab, &body, &mut container) {
            warn!(tab = %tab, error = %e, "Unexpected response shape");
            return SubmitOutcome::NetworkError(e.to_string());
        }

        let mut view = self.view.write().await;
        view.results = container;
        view.tabs.show_results();
        SubmitOutcome::Rendered
    }

    /// Register a new in-flight request for `tab`, cancelling any older one
    fn begin(&self, tab: Tab) -> (u64, Arc<Notify>) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed) + 1;
        let cancel = Arc::new(Notify::new());

        let previous = self.in_flight.insert(
            tab,
            InFlight {
                token,
                cancel: Arc::clone(&cancel),
            },
        );
        if let Some(previous) = previous {
            // notify_one keeps a permit if the old request is not yet waiting
            previous.cancel.notify_one();
        }

        (token, cancel)
    }

    fn is_current(&self, tab: Tab, token: u64) -> bool {
        self.in_flight
            .get(&tab)
            .map(|f| f.token == token)
            .unwrap_or(false)
    }
}

/// Clears a submission's in-flight entry on every exit path, which restores
/// the submit button. A superseded submission leaves the newer entry alone.
struct SubmitGuard<'a> {
    presenter: &'a Presenter,
    tab: Tab,
    token: u64,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.presenter
            .in_flight
            .remove_if(&self.tab, |_, f| f.token == self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Backend answering from a queue of canned responses
    #[derive(Default)]
    struct FakeBackend {
        responses: Mutex<Vec<Result<Value, BackendError>>>,
        calls: AtomicUsize,
        last: Mutex<Option<(String, RequestPayload)>>,
    }

    impl FakeBackend {
        fn answering(response: Result<Value, BackendError>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(vec![response]),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        fn name(&self) -> &str {
            "fake"
        }

        async fn post(
            &self,
            endpoint: &str,
            payload: &RequestPayload,
        ) -> Result<Value, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((endpoint.to_string(), payload.clone()));
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(BackendError::ConnectionError("no response queued".into())))
        }
    }

    /// Backend whose responses are released by the test
    struct GatedBackend {
        gates: Mutex<Vec<oneshot::Receiver<Value>>>,
    }

    #[async_trait]
    impl Backend for GatedBackend {
        fn name(&self) -> &str {
            "gated"
        }

        async fn post(
            &self,
            _endpoint: &str,
            _payload: &RequestPayload,
        ) -> Result<Value, BackendError> {
            let gate = self.gates.lock().unwrap().remove(0);
            gate.await
                .map_err(|_| BackendError::ConnectionError("gate dropped".into()))
        }
    }

    fn presenter(backend: Arc<dyn Backend>) -> Presenter {
        Presenter::new(PresenterConfig::default(), backend, LocalStorage::unavailable())
    }

    fn trip_fields() -> FormFields {
        FormFields::new()
            .with("origin", "Home")
            .with("destination", "Office")
            .with("window_start_date", "2024-05-01")
            .with("window_start_time", "08:00")
            .with("window_end_date", "2024-05-01")
            .with("window_end_time", "09:00")
    }

    fn trip_body(arrival: &str) -> Value {
        json!({
            "results": [{
                "departure_time": "2024-05-01T08:00:00",
                "arrival_text": arrival,
                "duration_text": "30 mins"
            }],
            "best_departure": "2024-05-01T08:00:00",
            "min_duration_seconds": 1800
        })
    }

    #[tokio::test]
    async fn test_missing_key_sends_nothing() {
        let backend = FakeBackend::answering(Ok(trip_body("8:30am")));
        let presenter = presenter(backend.clone());

        let outcome = presenter.submit(Tab::OptimizeTrip, &trip_fields()).await;

        assert_eq!(outcome, SubmitOutcome::MissingApiKey);
        assert_eq!(outcome.alert().as_deref(), Some(MISSING_KEY_ALERT));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(!presenter.button_state(Tab::OptimizeTrip).disabled);
    }

    #[tokio::test]
    async fn test_successful_submit_renders_and_reveals() {
        let backend = FakeBackend::answering(Ok(trip_body("8:30am")));
        let presenter = presenter(backend.clone());
        presenter.set_api_key("key").await;

        let outcome = presenter.submit(Tab::OptimizeTrip, &trip_fields()).await;

        assert_eq!(outcome, SubmitOutcome::Rendered);
        let view = presenter.view().await;
        assert!(view.tabs.results_visible());
        assert!(view.results.html().contains("8:30am"));

        let (endpoint, payload) = backend.last.lock().unwrap().clone().unwrap();
        assert_eq!(endpoint, "/api/optimize-trip");
        assert_eq!(payload.api_key, "key");
        assert_eq!(payload.window_start.as_deref(), Some("2024-05-01T08:00:00"));

        assert_eq!(
            presenter.button_state(Tab::OptimizeTrip),
            ButtonState {
                label: "Find Best Time",
                disabled: false
            }
        );
    }

    #[tokio::test]
    async fn test_work_form_uses_work_endpoint() {
        let backend = FakeBackend::answering(Ok(json!({"results": []})));
        let presenter = presenter(backend.clone());
        presenter.set_api_key("key").await;

        let fields = FormFields::new()
            .with("origins", "A\nB")
            .with("destination", "Office")
            .with("work_duration_hours", "8");
        let outcome = presenter.submit(Tab::OptimizeWork, &fields).await;

        assert_eq!(outcome, SubmitOutcome::Rendered);
        let (endpoint, payload) = backend.last.lock().unwrap().clone().unwrap();
        assert_eq!(endpoint, "/api/optimize-work");
        assert_eq!(payload.origins, Some(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(
            presenter.view().await.results.html(),
            "<p>No viable schedules found.</p>"
        );
    }

    #[tokio::test]
    async fn test_server_error_alerts_without_rendering() {
        let backend = FakeBackend::answering(Err(BackendError::from_error_body(
            500,
            &json!({"error": "Invalid API key"}),
        )));
        let presenter = presenter(backend);
        presenter.set_api_key("key").await;

        let outcome = presenter.submit(Tab::OptimizeTrip, &trip_fields()).await;

        assert_eq!(outcome.alert().as_deref(), Some("Error: Invalid API key"));
        let view = presenter.view().await;
        assert!(!view.tabs.results_visible());
        assert_eq!(view.results.html(), "");
        assert!(!presenter.button_state(Tab::OptimizeTrip).disabled);
    }

    #[tokio::test]
    async fn test_network_error_alert_includes_message() {
        let backend = FakeBackend::answering(Err(BackendError::ConnectionError("refused".into())));
        let presenter = presenter(backend);
        presenter.set_api_key("key").await;

        let outcome = presenter.submit(Tab::OptimizeTrip, &trip_fields()).await;

        let alert = outcome.alert().unwrap();
        assert!(alert.starts_with("Network or Server Error."));
        assert!(alert.ends_with("Message: Connection failed: refused"));
        assert_eq!(
            presenter.button_state(Tab::OptimizeTrip),
            ButtonState {
                label: "Find Best Time",
                disabled: false
            }
        );
    }

    #[tokio::test]
    async fn test_unexpected_response_shape_alerts_and_restores_button() {
        let backend = FakeBackend::answering(Ok(json!({"results": "nope"})));
        let presenter = presenter(backend);
        presenter.set_api_key("key").await;

        let outcome = presenter.submit(Tab::OptimizeTrip, &trip_fields()).await;

        assert!(matches!(outcome, SubmitOutcome::NetworkError(_)));
        assert!(outcome
            .alert()
            .unwrap()
            .starts_with("Network or Server Error. Check console for details."));
        assert!(!presenter.view().await.tabs.results_visible());
        assert_eq!(
            presenter.button_state(Tab::OptimizeTrip),
            ButtonState {
                label: "Find Best Time",
                disabled: false
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_timestamp_sends_nothing() {
        let backend = FakeBackend::answering(Ok(trip_body("x")));
        let presenter = presenter(backend.clone());
        presenter.set_api_key("key").await;

        let fields = trip_fields().with("window_end_time", "");
        let outcome = presenter.submit(Tab::OptimizeTrip, &fields).await;

        assert_eq!(
            outcome,
            SubmitOutcome::InvalidForm(PayloadError::MissingTime { field: "window_end" })
        );
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(!presenter.button_state(Tab::OptimizeTrip).disabled);
    }

    #[tokio::test]
    async fn test_switching_tab_hides_results() {
        let backend = FakeBackend::answering(Ok(trip_body("8:30am")));
        let presenter = presenter(backend);
        presenter.set_api_key("key").await;
        presenter.submit(Tab::OptimizeTrip, &trip_fields()).await;
        assert!(presenter.view().await.tabs.results_visible());

        presenter.switch_tab(Tab::OptimizeWork).await;

        let view = presenter.view().await;
        assert_eq!(view.tabs.active(), Tab::OptimizeWork);
        assert!(!view.tabs.results_visible());
    }

    #[tokio::test]
    async fn test_newer_submission_supersedes_older() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let backend = Arc::new(GatedBackend {
            gates: Mutex::new(vec![first_rx, second_rx]),
        });
        let presenter = Arc::new(presenter(backend));
        presenter.set_api_key("key").await;

        let first = tokio::spawn({
            let presenter = Arc::clone(&presenter);
            async move { presenter.submit(Tab::OptimizeTrip, &trip_fields()).await }
        });
        tokio::task::yield_now().await;
        while !presenter.button_state(Tab::OptimizeTrip).disabled {
            tokio::task::yield_now().await;
        }
        assert_eq!(presenter.button_state(Tab::OptimizeTrip).label, PROCESSING_LABEL);

        let second = tokio::spawn({
            let presenter = Arc::clone(&presenter);
            async move { presenter.submit(Tab::OptimizeTrip, &trip_fields()).await }
        });

        assert_eq!(first.await.unwrap(), SubmitOutcome::Superseded);
        // The older response arriving late changes nothing
        let _ = first_tx.send(trip_body("stale"));
        assert!(presenter.button_state(Tab::OptimizeTrip).disabled);

        second_tx.send(trip_body("fresh")).unwrap();
        assert_eq!(second.await.unwrap(), SubmitOutcome::Rendered);

        let html = presenter.view().await.results.html().to_string();
        assert!(html.contains("fresh"));
        assert!(!html.contains("stale"));
        assert!(!presenter.button_state(Tab::OptimizeTrip).disabled);
    }

    #[tokio::test]
    async fn test_rejected_form_leaves_request_in_flight() {
        let (tx, rx) = oneshot::channel();
        let backend = Arc::new(GatedBackend {
            gates: Mutex::new(vec![rx]),
        });
        let presenter = Arc::new(presenter(backend));
        presenter.set_api_key("key").await;

        let first = tokio::spawn({
            let presenter = Arc::clone(&presenter);
            async move { presenter.submit(Tab::OptimizeTrip, &trip_fields()).await }
        });
        while !presenter.button_state(Tab::OptimizeTrip).disabled {
            tokio::task::yield_now().await;
        }

        let invalid = trip_fields().with("window_end_time", "");
        let second = presenter.submit(Tab::OptimizeTrip, &invalid).await;
        assert_eq!(
            second,
            SubmitOutcome::InvalidForm(PayloadError::MissingTime { field: "window_end" })
        );
        assert_eq!(presenter.button_state(Tab::OptimizeTrip).label, PROCESSING_LABEL);

        tx.send(trip_body("kept")).unwrap();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Rendered);

        let view = presenter.view().await;
        assert!(view.tabs.results_visible());
        assert!(view.results.html().contains("kept"));
        assert!(!presenter.button_state(Tab::OptimizeTrip).disabled);
    }
}
