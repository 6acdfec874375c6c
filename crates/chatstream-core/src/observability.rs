//! Process-wide tracing setup for chat stream clients.
//!
//! Every run driven by [`StreamController`](crate::StreamController) executes
//! inside a `stream` span carrying `stream_id` and `thread_id`. Within it the
//! controller logs under the `chatstream_core::controller` target:
//!
//! - `stream started` (info)
//! - `folded stream event` (debug, `event`, `changed`) once per frame
//! - `stream done` (info), `stream failed` (warn, `error`)
//! - `transport handle released` (debug)
//!
//! `stop_stream` and a superseding `start_stream` run on the caller's side
//! and log `stream stopped` (info, `stream_id`, `clear`) and
//! `superseding live stream` (debug, `superseded`, `stream_id`) instead.
//!
//! The HTTP transport logs `opening event stream` (debug, `url`) under
//! `chatstream_core::transport::http`.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Set to `false`, `0`, `no` or `off` to skip installing a subscriber.
pub const ENABLED_ENV: &str = "CHATSTREAM_OBSERVABILITY";
/// Filter directives, taking precedence over `RUST_LOG`.
pub const LOG_LEVEL_ENV: &str = "CHATSTREAM_LOG_LEVEL";
/// Write JSON lines to this file instead of stderr.
pub const JSON_LOG_PATH_ENV: &str = "CHATSTREAM_JSON_LOG_PATH";

/// Filter used when neither env variable holds valid directives.
pub const DEFAULT_FILTER: &str = "warn,chatstream_core=info,chatstream=info";

const DEFAULT_JSON_FILE: &str = "chatstream.logs.jsonl";

static INIT: OnceCell<()> = OnceCell::new();

/// Resolved logging settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObservabilityConfig {
    pub enabled: bool,
    /// `EnvFilter` directives.
    pub filter: String,
    pub json_log_path: Option<PathBuf>,
}

impl ObservabilityConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup(ENABLED_ENV)
            .and_then(|value| parse_bool(&value))
            .unwrap_or(true);
        let filter = [LOG_LEVEL_ENV, "RUST_LOG"]
            .into_iter()
            .filter_map(|key| lookup(key))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty() && EnvFilter::try_new(value).is_ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let json_log_path = lookup(JSON_LOG_PATH_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self {
            enabled,
            filter,
            json_log_path,
        }
    }

    fn install(&self) {
        if !self.enabled {
            return;
        }
        let filter =
            EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let registry = tracing_subscriber::registry().with(filter);
        let _ = match &self.json_log_path {
            Some(path) => {
                let (dir, file) = split_log_path(path);
                let _ = std::fs::create_dir_all(&dir);
                let writer = tracing_appender::rolling::never(dir, file);
                registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_current_span(true)
                            .with_span_list(false)
                            .with_writer(writer),
                    )
                    .try_init()
            }
            // stdout belongs to the rendered conversation
            None => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr),
                )
                .try_init(),
        };
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_JSON_FILE));
    (dir.to_path_buf(), file)
}

/// Installs the global tracing subscriber from the environment, once per
/// process. Later calls are no-ops, as is an already installed subscriber.
pub fn init_observability() {
    INIT.get_or_init(|| ObservabilityConfig::from_env().install());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> ObservabilityConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ObservabilityConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_target_this_crate() {
        let config = config(&[]);
        assert!(config.enabled);
        assert_eq!(config.filter, DEFAULT_FILTER);
        assert_eq!(config.json_log_path, None);
    }

    #[test]
    fn log_level_wins_over_rust_log_and_invalid_filters_fall_through() {
        let picked = config(&[
            (LOG_LEVEL_ENV, "chatstream_core::controller=debug"),
            ("RUST_LOG", "trace"),
        ]);
        assert_eq!(picked.filter, "chatstream_core::controller=debug");

        let fallback = config(&[
            (LOG_LEVEL_ENV, "chatstream_core=loud"),
            ("RUST_LOG", " debug "),
        ]);
        assert_eq!(fallback.filter, "debug");
    }

    #[test]
    fn disabled_only_by_a_false_spelling() {
        assert!(!config(&[(ENABLED_ENV, " OFF ")]).enabled);
        assert!(config(&[(ENABLED_ENV, "maybe")]).enabled);
        assert!(config(&[(ENABLED_ENV, "yes")]).enabled);
    }

    #[test]
    fn json_path_splits_into_dir_and_file() {
        let config = config(&[(JSON_LOG_PATH_ENV, "logs/run.jsonl")]);
        let path = config.json_log_path.expect("path");
        assert_eq!(
            split_log_path(&path),
            (PathBuf::from("logs"), PathBuf::from("run.jsonl"))
        );
        assert_eq!(
            split_log_path(Path::new("run.jsonl")),
            (PathBuf::from("."), PathBuf::from("run.jsonl"))
        );
    }

    #[test]
    fn init_is_idempotent() {
        init_observability();
        init_observability();
    }
}
