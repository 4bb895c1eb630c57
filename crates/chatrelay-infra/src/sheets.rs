//! SheetLogger -- concrete [`LogSink`] for the Google Sheets mirror.
//!
//! Appends one row per call via the Sheets `values:append` REST endpoint
//! with a bearer token. On any remote failure it makes exactly one
//! fallback attempt: appending the comma-joined rendering of the row to
//! a local text file, created if absent. Failures never propagate to the
//! caller; the returned [`LogWriteOutcome`] says what happened.
//!
//! The bearer token is wrapped in [`secrecy::SecretString`] and exposed
//! only while building the request headers.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use chatrelay_core::log::LogSink;
use chatrelay_types::config::SheetsConfig;
use chatrelay_types::log::{LogRow, LogWriteOutcome};

/// Remote append target, present only when the sink is fully configured.
struct SheetsTarget {
    spreadsheet_id: String,
    worksheet: String,
    api_token: SecretString,
}

/// Best-effort spreadsheet logger with a local file fallback.
pub struct SheetLogger {
    client: reqwest::Client,
    base_url: String,
    target: Option<SheetsTarget>,
    fallback_path: PathBuf,
}

impl SheetLogger {
    /// Build from configuration (consumed: the bearer token moves into
    /// the logger). A missing URL or token, or an URL the spreadsheet id
    /// cannot be extracted from, yields a logger that skips remote
    /// appends for the process lifetime.
    pub fn from_config(config: SheetsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to create reqwest client");

        let target = match (config.sheet_url, config.api_token) {
            (Some(url), Some(api_token)) => match extract_spreadsheet_id(&url) {
                Some(spreadsheet_id) => Some(SheetsTarget {
                    spreadsheet_id,
                    worksheet: config.worksheet,
                    api_token,
                }),
                None => {
                    warn!(url = %url, "could not extract a spreadsheet id; sheet logging disabled");
                    None
                }
            },
            _ => None,
        };

        Self {
            client,
            base_url: "https://sheets.googleapis.com".to_string(),
            target,
            fallback_path: PathBuf::from(config.fallback_path),
        }
    }

    /// Whether the remote sheet handle was configured at startup.
    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// Override the API base URL (useful for testing).
    #[allow(dead_code)]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn append_url(&self, target: &SheetsTarget) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values/{}!A1:append?valueInputOption=USER_ENTERED",
            self.base_url, target.spreadsheet_id, target.worksheet
        )
    }

    async fn append_remote(&self, target: &SheetsTarget, row: &LogRow) -> Result<(), String> {
        let body = serde_json::json!({
            "majorDimension": "ROWS",
            "values": [row.cells()],
        });

        let response = self
            .client
            .post(self.append_url(target))
            .bearer_auth(target.api_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {status}: {error_body}"));
        }
        Ok(())
    }

    async fn append_fallback(&self, row: &LogRow) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.fallback_path)
            .await?;
        file.write_all(format!("{}\n", row.fallback_line()).as_bytes())
            .await?;
        file.flush().await
    }
}

impl LogSink for SheetLogger {
    async fn append(&self, row: LogRow) -> LogWriteOutcome {
        let Some(target) = &self.target else {
            debug!("skipping sheet log; sink is not configured");
            return LogWriteOutcome::Skipped;
        };

        match self.append_remote(target, &row).await {
            Ok(()) => {
                debug!(
                    participant = %row.participant_id,
                    bot = %row.bot_id,
                    role = %row.role,
                    "logged row to sheet"
                );
                LogWriteOutcome::Remote
            }
            Err(remote_err) => {
                warn!(error = %remote_err, "sheet append failed; writing fallback line");
                match self.append_fallback(&row).await {
                    Ok(()) => LogWriteOutcome::FallbackFile,
                    Err(fallback_err) => {
                        warn!(error = %fallback_err, "fallback logging also failed; row dropped");
                        LogWriteOutcome::Dropped(format!(
                            "remote: {remote_err}; fallback: {fallback_err}"
                        ))
                    }
                }
            }
        }
    }
}

/// Extract the spreadsheet id from a `.../spreadsheets/d/{id}/...` URL.
fn extract_spreadsheet_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/d/")?;
    let id = rest
        .split(['/', '?', '#'])
        .next()
        .filter(|id| !id.is_empty())?;
    Some(id.to_string())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use chatrelay_types::log::LogRole;

    use super::*;

    fn configured(tmp: &TempDir) -> SheetsConfig {
        SheetsConfig {
            sheet_url: Some(
                "https://docs.google.com/spreadsheets/d/1AbCdEfG/edit#gid=0".to_string(),
            ),
            worksheet: "conversations".to_string(),
            fallback_path: tmp
                .path()
                .join("sheet_log_backup.txt")
                .to_string_lossy()
                .into_owned(),
            api_token: Some(SecretString::from("test-token-not-real")),
        }
    }

    #[test]
    fn test_extract_spreadsheet_id() {
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/1AbC_dE-f/edit#gid=0"),
            Some("1AbC_dE-f".to_string())
        );
        assert_eq!(
            extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/xyz"),
            Some("xyz".to_string())
        );
        assert_eq!(extract_spreadsheet_id("https://example.com/nothing-here"), None);
        assert_eq!(extract_spreadsheet_id("https://docs.google.com/spreadsheets/d/"), None);
    }

    #[test]
    fn test_append_url_shape() {
        let tmp = TempDir::new().unwrap();
        let logger = SheetLogger::from_config(configured(&tmp));
        let target = logger.target.as_ref().unwrap();
        assert_eq!(
            logger.append_url(target),
            "https://sheets.googleapis.com/v4/spreadsheets/1AbCdEfG/values/conversations!A1:append?valueInputOption=USER_ENTERED"
        );
    }

    #[test]
    fn test_unconfigured_when_token_missing() {
        let tmp = TempDir::new().unwrap();
        let mut config = configured(&tmp);
        config.api_token = None;
        assert!(!SheetLogger::from_config(config).is_configured());
    }

    #[test]
    fn test_unconfigured_when_url_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let mut config = configured(&tmp);
        config.sheet_url = Some("https://example.com/not-a-sheet".to_string());
        assert!(!SheetLogger::from_config(config).is_configured());
    }

    #[tokio::test]
    async fn test_unconfigured_sink_skips_silently() {
        let tmp = TempDir::new().unwrap();
        let mut config = configured(&tmp);
        config.sheet_url = None;
        config.api_token = None;
        let logger = SheetLogger::from_config(config);

        let outcome = logger
            .append(LogRow::new("P1", "LongBot1", LogRole::User, "Hi"))
            .await;

        assert_eq!(outcome, LogWriteOutcome::Skipped);
        assert!(!tmp.path().join("sheet_log_backup.txt").exists());
    }

    #[tokio::test]
    async fn test_remote_failure_appends_one_fallback_line() {
        let tmp = TempDir::new().unwrap();
        // Unroutable base URL: the remote append fails fast, exercising
        // the fallback path without any network dependency.
        let logger = SheetLogger::from_config(configured(&tmp))
            .with_base_url("http://127.0.0.1:9".to_string());

        let mut row = LogRow::new("P1", "LongBot2", LogRole::User, "Hi");
        row.timestamp = "2026-01-01T12:00:00".to_string();

        let outcome = logger.append(row).await;
        assert_eq!(outcome, LogWriteOutcome::FallbackFile);

        let content = tokio::fs::read_to_string(tmp.path().join("sheet_log_backup.txt"))
            .await
            .unwrap();
        assert_eq!(
            content,
            "2026-01-01T12:00:00, P1, LongBot2, crt-random, user, Hi\n"
        );
    }

    #[tokio::test]
    async fn test_each_failed_append_adds_exactly_one_line() {
        let tmp = TempDir::new().unwrap();
        let logger = SheetLogger::from_config(configured(&tmp))
            .with_base_url("http://127.0.0.1:9".to_string());

        logger
            .append(LogRow::new("P1", "LongBot2", LogRole::User, "one"))
            .await;
        logger
            .append(LogRow::new("P1", "LongBot2", LogRole::Assistant, "two"))
            .await;

        let content = tokio::fs::read_to_string(tmp.path().join("sheet_log_backup.txt"))
            .await
            .unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_fallback_failure_drops_the_row() {
        let tmp = TempDir::new().unwrap();
        let mut config = configured(&tmp);
        // A directory path cannot be opened for appending.
        config.fallback_path = tmp.path().to_string_lossy().into_owned();
        let logger =
            SheetLogger::from_config(config).with_base_url("http://127.0.0.1:9".to_string());

        let outcome = logger
            .append(LogRow::new("P1", "LongBot2", LogRole::User, "Hi"))
            .await;
        assert!(outcome.is_dropped());
    }
}
