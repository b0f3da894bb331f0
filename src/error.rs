use crate::transport::TransportError;
use thiserror::Error;

/// Where a configuration or runtime error came from.
///
/// Rendered after the message as `(setting ES_ENDPOINT = "ftp://x", in config)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Environment variable or config field, e.g. `ES_MAX_RETRIES`.
    pub setting: Option<String>,
    /// The offending raw value.
    pub value: Option<String>,
    /// Component that raised the error: `config`, `http_transport`, `slot_limiter`.
    pub component: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_setting(mut self, setting: impl Into<String>) -> Self {
        self.setting = Some(setting.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

/// Terminal outcomes of a search call.
///
/// Retryable conditions (transport failures, 429, 5xx) never reach the caller
/// while retries remain; callers only observe one of these after the executor
/// has given up.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error after {attempts} attempt(s): {source}")]
    Transport {
        #[source]
        source: TransportError,
        attempts: u32,
    },

    #[error("Search request exhausted retries after {attempts} attempt(s){}", format_status(.status))]
    ExhaustedRetries { status: Option<u16>, attempts: u32 },

    #[error("Search request failed with unexpected status {status}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Failed to decode response body (HTTP {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("Search cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },
}

fn format_context(ctx: &ErrorContext) -> String {
    let setting = match (&ctx.setting, &ctx.value) {
        (Some(setting), Some(value)) => Some(format!("setting {} = {:?}", setting, value)),
        (Some(setting), None) => Some(format!("setting {}", setting)),
        (None, Some(value)) => Some(format!("value {:?}", value)),
        (None, None) => None,
    };
    let component = ctx.component.as_ref().map(|c| format!("in {}", c));
    let parts: Vec<String> = setting.into_iter().chain(component).collect();
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn format_status(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (last status {})", s),
        None => String::new(),
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// HTTP status associated with this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ExhaustedRetries { status, .. } => *status,
            Error::UnexpectedStatus { status, .. } | Error::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }
}
