//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for xlate-server.
///
/// Every field has a default so the server starts without any environment
/// variables set; remote-service credentials are the usual exceptions and
/// stay `None` until configured.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated allowed CORS origins; `None` means wildcard.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI at `/swagger-ui` (default: `true`).
    pub enable_swagger: bool,

    /// Base URL of the chat-completion service.
    pub model_base_url: String,

    /// Bearer token for the chat-completion service.
    pub model_api_key: Option<String>,

    /// Generation model name. The translation model is a fine-tune, so this
    /// usually comes from `OPENAI_FINE_TUNED_MODEL_NAME`.
    pub model_name: String,

    /// Base URL of the prompt hub.
    pub hub_base_url: String,

    /// API key for the prompt hub.
    pub hub_api_key: Option<String>,

    /// Base URL of the tracing service. `None` disables run recording; chat
    /// still works and the run-id response header is empty.
    pub trace_base_url: Option<String>,

    /// API key for the tracing service.
    pub trace_api_key: Option<String>,

    /// Prompt reference used for the first turn of a conversation.
    pub initial_prompt: String,

    /// Prompt reference used for every later turn.
    pub followup_prompt: String,

    /// Bounded wait, in seconds, for the generation run to start before the
    /// request fails as an upstream error.
    pub run_start_timeout_secs: u64,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("XLATE_BIND", "0.0.0.0:3000"),
            log_level: env_or("XLATE_LOG", "info"),
            log_json: env_flag("XLATE_LOG_JSON", false),
            cors_allowed_origins: std::env::var("XLATE_CORS_ORIGINS").ok(),
            enable_swagger: env_flag("XLATE_ENABLE_SWAGGER", true),
            model_base_url: env_or("XLATE_MODEL_BASE_URL", "https://api.openai.com/v1"),
            model_api_key: std::env::var("XLATE_MODEL_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .ok(),
            model_name: std::env::var("XLATE_MODEL_NAME")
                .or_else(|_| std::env::var("OPENAI_FINE_TUNED_MODEL_NAME"))
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_owned()),
            hub_base_url: env_or("XLATE_HUB_BASE_URL", "https://api.hub.langchain.com"),
            hub_api_key: std::env::var("XLATE_HUB_API_KEY").ok(),
            trace_base_url: std::env::var("XLATE_TRACE_BASE_URL").ok(),
            trace_api_key: std::env::var("XLATE_TRACE_API_KEY").ok(),
            initial_prompt: env_or("XLATE_INITIAL_PROMPT", "jacob/langchain-python-to-js"),
            followup_prompt: env_or(
                "XLATE_FOLLOWUP_PROMPT",
                "jacob/langchain-python-to-js-follow-up",
            ),
            run_start_timeout_secs: parse_env("XLATE_RUN_START_TIMEOUT_SECS", 30),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
