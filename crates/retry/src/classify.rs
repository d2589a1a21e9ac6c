use orchestrator_types::ErrorCategory;

/// Implemented by whatever error type a retried operation raises so the
/// Retry Manager can decide whether to retry without parsing error text
/// itself at the call site. Adapter layers (the Resource Pool's RPC calls,
/// the Test Runner's phase errors) implement this once; everything above
/// matches on structured kinds, not text (design notes §9).
pub trait Classify {
    fn category(&self) -> ErrorCategory;
}

/// Substring/error-code classifier for adapting raw RPC error text into a
/// category, used at the boundary where a third-party error type doesn't
/// implement `Classify` itself.
#[must_use]
pub fn classify_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if lower.contains("revert") || lower.contains("execution reverted") {
        ErrorCategory::Revert
    } else if lower.contains("nonce") {
        ErrorCategory::Nonce
    } else if lower.contains("timeout") || lower.contains("timed out") || lower.contains("deadline") {
        ErrorCategory::Timeout
    } else if lower.contains("gas") || lower.contains("underpriced") || lower.contains("intrinsic") {
        ErrorCategory::Gas
    } else if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        ErrorCategory::Ratelimit
    } else if lower.contains("connection")
        || lower.contains("econnrefused")
        || lower.contains("disconnected")
        || lower.contains("network")
    {
        ErrorCategory::Connection
    } else {
        ErrorCategory::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_rpc_error_strings() {
        assert_eq!(classify_message("execution reverted: custom error"), ErrorCategory::Revert);
        assert_eq!(classify_message("nonce too low"), ErrorCategory::Nonce);
        assert_eq!(classify_message("request timed out"), ErrorCategory::Timeout);
        assert_eq!(classify_message("transaction underpriced"), ErrorCategory::Gas);
        assert_eq!(classify_message("HTTP 429 Too Many Requests"), ErrorCategory::Ratelimit);
        assert_eq!(classify_message("ECONNREFUSED"), ErrorCategory::Connection);
        assert_eq!(classify_message("something else entirely"), ErrorCategory::Unknown);
    }
}
