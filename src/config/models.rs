use serde_derive::{Deserialize, Serialize};

// Keys are flat and underscore-free so the same name works in the YAML file,
// as an OSG_* ENV var and as a flag. When adding a field, add a
// #[serde(rename = "ihavenounderscores")] where needed.

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(rename = "gettererurl")]
    pub getterer_url: String,
    #[serde(rename = "statustoken")]
    pub status_token: String,
    /// Per-request timeout in seconds.
    pub ttl: u64,
    /// Minimum whitespace between table columns.
    pub padding: usize,
    #[serde(rename = "loglevel")]
    pub log_level: String,
    #[serde(rename = "sentrydsn")]
    pub sentry_dsn: Option<String>,
}
