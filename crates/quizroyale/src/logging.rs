//! Tracing subscriber setup for the binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::QuizError;

/// Installs the global subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter.
/// With `json` set, every event is written as one JSON object per line.
pub fn init(level: &str, json: bool) -> Result<(), QuizError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| QuizError::Logging(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_target(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };
    result.map_err(|e| QuizError::Logging(e.to_string()))?;

    tracing::debug!(level, json, "logging initialised");
    Ok(())
}
