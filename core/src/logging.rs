use crate::config::LoggingConfig;

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "curator.log";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. The returned guard must be kept alive for as long
/// as file logging should keep flushing.
pub fn init(config: &LoggingConfig) -> Option<WorkerGuard> {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

	let registry = tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_target(true));

	match &config.directory {
		Some(directory) => {
			let (non_blocking, guard) =
				tracing_appender::non_blocking(rolling::daily(directory, LOG_FILE_PREFIX));

			// Someone else may have installed a subscriber already, tests do it all the time
			let _ = registry
				.with(
					fmt::layer()
						.with_writer(non_blocking)
						.with_ansi(false),
				)
				.try_init();

			Some(guard)
		}
		None => {
			let _ = registry.try_init();
			None
		}
	}
}
