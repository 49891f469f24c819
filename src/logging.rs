// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Structured JSON logging shared by the server and the poll job.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured JSON logging.
///
/// `RUST_LOG` directives are honoured; by default this crate logs at debug
/// and everything else at info.
pub fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::from_default_env()
        .add_directive(
            "segment_tracker=debug"
                .parse()
                .expect("static directive is valid"),
        )
        .add_directive("info".parse().expect("static directive is valid"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
