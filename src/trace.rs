//! Logging macros that forward to `tracing` when the feature is enabled and
//! expand to nothing otherwise.

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($arg:tt)+) => {
        ::tracing::trace!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)+) => {};
}

#[cfg(feature = "tracing")]
macro_rules! debug {
    ($($arg:tt)+) => {
        ::tracing::debug!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)+) => {};
}

#[cfg(feature = "tracing")]
macro_rules! warn {
    ($($arg:tt)+) => {
        ::tracing::warn!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn {
    ($($arg:tt)+) => {};
}
