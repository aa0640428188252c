#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bay_monitor;
pub mod config;
pub mod indicator;
pub mod interval;
pub mod net;
pub mod occupancy;
pub mod scheduler;
pub mod sensor;
pub mod shared;

#[cfg(test)]
pub mod tests {

    #[cfg(feature = "log")]
    #[cfg_attr(feature = "log", ctor::ctor)]
    fn init() {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_thread_names(true)
            .with_level(true)
            .pretty()
            .init();
    }
}
