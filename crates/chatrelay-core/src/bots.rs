//! Static bot identity map.
//!
//! The survey assigns each participant a short numeric bot code; the
//! relay resolves it to the canonical bot name used in conversation keys
//! and log rows.

/// Bot id recorded when session creation arrives without a bot code.
pub const UNKNOWN_BOT: &str = "UnknownBot";

/// Resolve a bot code to its canonical name.
///
/// Codes outside the known range pass through verbatim so experimental
/// deployments can introduce ad-hoc bot names without a relay change.
pub fn resolve(code: &str) -> String {
    match code {
        "1" => "LongBot1".to_string(),
        "2" => "LongBot2".to_string(),
        "3" => "LongBot3".to_string(),
        "4" => "LongBot4".to_string(),
        "5" => "LongBot5".to_string(),
        "6" => "LongBot6".to_string(),
        "7" => "LongBot7".to_string(),
        "8" => "LongBot8".to_string(),
        other => other.to_string(),
    }
}

/// Resolve for session creation, where an absent code maps to the
/// sentinel instead of passing through.
pub fn resolve_or_unknown(code: &str) -> String {
    if code.is_empty() {
        UNKNOWN_BOT.to_string()
    } else {
        resolve(code)
    }
}
