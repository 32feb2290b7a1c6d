//! Feature-gated tracing for parser and linearizer instrumentation.
//!
//! With the `tracing` feature the macros below are the `tracing` crate's
//! own. Without it they expand to nothing and spans are zero-sized
//! stand-ins, so instrumented code carries no cost.
//!
//! ```rust,ignore
//! use crate::trace::{debug_span, trace};
//!
//! let _span = debug_span!("feed", token = token).entered();
//! trace!(items = n, "scanned");
//! ```

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, Span};

#[cfg(not(feature = "tracing"))]
mod noop {
    /// Stand-in span.
    pub struct Span;

    impl Span {
        pub fn none() -> Self {
            Span
        }

        pub fn entered(self) -> SpanGuard {
            SpanGuard
        }
    }

    pub struct SpanGuard;

    impl Drop for SpanGuard {
        fn drop(&mut self) {}
    }

    #[macro_export]
    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    pub use crate::{debug, debug_span, info, trace};
}

#[cfg(not(feature = "tracing"))]
pub use noop::*;

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls keep the first subscriber.
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}

/// Install a folded-stack layer writing to `path`.
///
/// The stacks are flushed when the returned guard is dropped. Returns None
/// if the file cannot be created or a subscriber is already installed.
#[cfg(feature = "tracing")]
pub fn init_flamegraph(path: &str) -> Option<impl Drop> {
    use tracing_flame::FlameLayer;
    use tracing_subscriber::{prelude::*, registry::Registry};

    let (flame_layer, guard) = FlameLayer::with_file(path).ok()?;
    Registry::default().with(flame_layer).try_init().ok()?;
    Some(guard)
}

#[cfg(not(feature = "tracing"))]
pub fn init_flamegraph(_path: &str) -> Option<impl Drop> {
    struct NoGuard;
    impl Drop for NoGuard {
        fn drop(&mut self) {}
    }
    Some(NoGuard)
}

#[cfg(test)]
#[path = "tests/trace.rs"]
mod tests;
