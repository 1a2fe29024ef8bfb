//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use xlate_hub::HubClient;
use xlate_llm::LlmClient;
use xlate_trace::TraceClient;

use crate::config::Config;

/// State shared across all HTTP handlers.
///
/// The three remote-service clients are stateless and thread-safe; they are
/// constructed once at startup and never torn down. No per-request state
/// lives here, so two concurrent requests share nothing but connection
/// pools.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Prompt hub client.
    pub hub: Arc<HubClient>,
    /// Chat-completion client.
    pub llm: Arc<LlmClient>,
    /// Tracing/feedback client; `None` when no tracing endpoint is
    /// configured, in which case runs are not recorded.
    pub trace: Option<Arc<TraceClient>>,
}

impl AppState {
    pub fn from_config(config: Config) -> Self {
        let hub = HubClient::new(&config.hub_base_url, config.hub_api_key.clone());
        let llm = LlmClient::new(&config.model_base_url, config.model_api_key.clone());
        let trace = config
            .trace_base_url
            .as_deref()
            .map(|base| Arc::new(TraceClient::new(base, config.trace_api_key.clone())));
        Self {
            config: Arc::new(config),
            hub: Arc::new(hub),
            llm: Arc::new(llm),
            trace,
        }
    }
}
