pub mod config;
pub mod logging;

/// Build version, overridable at compile time through `APP_VERSION`.
pub const VERSION: &str = match option_env!("APP_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};
