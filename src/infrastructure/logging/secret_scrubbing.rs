use regex::{Captures, Regex};
use std::sync::LazyLock;

static GOOGLE_API_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"AIza[0-9A-Za-z_\-]{35}").expect("valid regex"));

static KEY_QUERY_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&]key=)[^&\s]+").expect("valid regex"));

static BEARER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-_\.]+").expect("valid regex"));

static KEY_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(["']?(?:api_key|apikey|x-goog-api-key|token|secret)["']?\s*[:=]\s*)["']?[a-zA-Z0-9\-_\.]{8,}["']?"#,
    )
    .expect("valid regex")
});

/// Redacts credentials from text before it reaches a log line or a user.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretScrubber;

impl SecretScrubber {
    pub fn new() -> Self {
        Self
    }

    /// Scrub a message of sensitive data
    pub fn scrub(&self, message: &str) -> String {
        let scrubbed = GOOGLE_API_KEY.replace_all(message, "[API_KEY_REDACTED]");
        let scrubbed = KEY_QUERY_PARAM.replace_all(&scrubbed, "${1}[REDACTED]");
        let scrubbed = BEARER.replace_all(&scrubbed, "Bearer [TOKEN_REDACTED]");
        let scrubbed =
            KEY_FIELD.replace_all(&scrubbed, |caps: &Captures| format!("{}[REDACTED]", &caps[1]));
        scrubbed.into_owned()
    }

    /// Scrub and cap a response body to `max_chars` characters.
    pub fn scrub_truncated(&self, message: &str, max_chars: usize) -> String {
        let scrubbed = self.scrub(message);
        if scrubbed.chars().count() <= max_chars {
            scrubbed
        } else {
            let head: String = scrubbed.chars().take(max_chars).collect();
            format!("{head}...")
        }
    }
}
