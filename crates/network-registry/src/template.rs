use std::env;

/// Expands `${NAME}` placeholders in `input` against the process
/// environment. Returns `None` if any placeholder has no matching
/// environment variable, so the caller can drop the URL rather than use
/// it unresolved.
pub fn expand(input: &str) -> Option<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            // Unterminated placeholder: treat the rest as literal, same as
            // "no usable endpoint" once the caller checks for `${`.
            return None;
        };
        let end = start + end;
        let name = &rest[start + 2..end];
        let value = env::var(name).ok()?;

        out.push_str(&rest[..start]);
        out.push_str(&value);
        rest = &rest[end + 1..];
    }
    out.push_str(rest);
    Some(out)
}

/// True if `input` still contains a `${...}` placeholder (used to detect a
/// value nobody attempted to expand).
#[must_use]
pub fn has_placeholder(input: &str) -> bool {
    input.contains("${")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_single_placeholder() {
        unsafe {
            env::set_var("ORCH_TEST_RPC_HOST", "rpc.example.com");
        }
        let expanded = expand("https://${ORCH_TEST_RPC_HOST}/v1").unwrap();
        assert_eq!(expanded, "https://rpc.example.com/v1");
        unsafe {
            env::remove_var("ORCH_TEST_RPC_HOST");
        }
    }

    #[test]
    fn missing_variable_yields_none() {
        unsafe {
            env::remove_var("ORCH_TEST_DEFINITELY_UNSET");
        }
        assert!(expand("https://${ORCH_TEST_DEFINITELY_UNSET}/v1").is_none());
    }

    #[test]
    fn literal_without_placeholder_is_returned_unchanged() {
        assert_eq!(expand("https://rpc.example.com").unwrap(), "https://rpc.example.com");
    }

    #[test]
    fn detects_placeholder_presence() {
        assert!(has_placeholder("${X}"));
        assert!(!has_placeholder("plain"));
    }
}
