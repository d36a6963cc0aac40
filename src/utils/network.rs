//! Network utilities and helpers

/// Get user agent string
pub fn get_user_agent() -> &'static str {
    concat!("YoutubeAccountManager/", env!("CARGO_PKG_VERSION"))
}
