//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (monotonic milliseconds fed into the simulation)
//! - Seeds
//! - Logging setup
//! - Storage and JS bindings (LocalStorage, `WebGame`) on web

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Monotonic millisecond clock anchored at construction
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    #[cfg(not(target_arch = "wasm32"))]
    origin: std::time::Instant,
    #[cfg(target_arch = "wasm32")]
    origin: f64,
}

impl Clock {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new() -> Self {
        Self {
            origin: js_sys::Date::now(),
        }
    }

    /// Milliseconds since the clock was created
    #[cfg(not(target_arch = "wasm32"))]
    pub fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    /// Milliseconds since the clock was created. `Date.now()` can step
    /// backwards; the simulation clamps that.
    #[cfg(target_arch = "wasm32")]
    pub fn now_ms(&self) -> u64 {
        (js_sys::Date::now() - self.origin).max(0.0) as u64
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

/// Fresh seed for obstacle spawning
pub fn random_seed() -> u64 {
    rand::random()
}

/// Parse a log level name, defaulting to `Info`
pub fn parse_level(name: &str) -> log::LevelFilter {
    match name.to_lowercase().as_str() {
        "off" => log::LevelFilter::Off,
        "error" => log::LevelFilter::Error,
        "warn" => log::LevelFilter::Warn,
        "info" => log::LevelFilter::Info,
        "debug" => log::LevelFilter::Debug,
        "trace" => log::LevelFilter::Trace,
        _ => log::LevelFilter::Info,
    }
}

/// Install the logger. Safe to call more than once.
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging(level: log::LevelFilter) {
    let result = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
    if let Err(e) = result {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
}

/// Install the console logger and panic hook. Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging(level: log::LevelFilter) {
    console_error_panic_hook::set_once();
    let level = level.to_level().unwrap_or(log::Level::Error);
    if console_log::init_with_level(level).is_err() {
        web_sys::console::warn_1(&wasm_bindgen::JsValue::from_str("logger already initialized"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), log::LevelFilter::Debug);
        assert_eq!(parse_level("off"), log::LevelFilter::Off);
        assert_eq!(parse_level("bogus"), log::LevelFilter::Info);
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = Clock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
