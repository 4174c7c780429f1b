#![allow(unused_macros)]
//! Internal logging macros.
//!
//! These macros are the side channel for conditions the tracing machinery
//! tolerates but must not surface to the application: stack misuse,
//! failing listeners, and the like. They are intended for use inside
//! tracelink crates and custom listeners/adapters, not for general
//! application logging.
//!
//! With the default `internal-logs` feature the macros emit `tracing`
//! events targeted at the crate name; without it they compile to nothing.

/// Log an internal debug message.
///
/// # Fields:
/// - `name`: the operation being logged.
/// - Additional optional key-value pairs.
///
/// # Example:
/// ```rust
/// use tracelink::tracelink_debug;
/// tracelink_debug!(name: "TracedClient.Call", method = "GET".to_owned());
/// ```
#[macro_export]
macro_rules! tracelink_debug {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name; // Compiler will optimize this out as it's unused.
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::debug!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+); // Compiler will optimize this out as it's unused.
        }
    };
}

/// Log an internal warning, e.g. tolerated misuse of the span stack.
///
/// # Fields:
/// - `name`: the operation being logged.
/// - Additional optional key-value pairs.
#[macro_export]
macro_rules! tracelink_warn {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name; // Compiler will optimize this out as it's unused.
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::warn!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+); // Compiler will optimize this out as it's unused.
        }
    };
}

/// Log an internal error, e.g. a listener that panicked.
///
/// # Fields:
/// - `name`: the operation being logged.
/// - Additional optional key-value pairs.
#[macro_export]
macro_rules! tracelink_error {
    (name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::error!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = $name; // Compiler will optimize this out as it's unused.
        }
    };
    (name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::error!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name, $($key = $value),+);
        }

        #[cfg(not(feature = "internal-logs"))]
        {
            let _ = ($name, $($value),+); // Compiler will optimize this out as it's unused.
        }
    };
}
