pub mod credentials;
pub mod gateway;
pub mod inventory;
pub mod logging;
pub mod prompt;
pub mod session;

use std::time::Duration;

/// Build an HTTP client with a bounded request timeout. Builder failure is
/// loud: the default client has no timeout, so a silent fallback would drop
/// the bounded-wait guarantee.
pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            log::warn!("HTTP client builder failed ({e}); falling back to a client without the configured timeout");
            reqwest::Client::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_builds_with_timeout() {
        // Normal construction must take the configured-timeout path, not
        // the fallback
        let _ = http_client(Duration::from_secs(1));
    }
}
