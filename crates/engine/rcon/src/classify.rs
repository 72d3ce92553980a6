//! Response classification.
//!
//! The remote console reports failures as free text, so classification is
//! rule-based and case-insensitive: a response succeeds unless it is empty
//! or carries a recognizable failure marker.

/// Markers whose presence (case-insensitive) marks a response as failed.
const FAILURE_MARKERS: [&str; 3] = ["error", "failed", "unknown"];

const GAMERULE_MARKER: &str = "currently set to:";

/// True when the response text reads as a success.
pub fn is_success(response: &str) -> bool {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return false;
    }
    let lower = trimmed.to_ascii_lowercase();
    !FAILURE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Extracts the block count from a fill/setblock response: the first integer
/// directly preceding or following a token starting with `block`.
///
/// "Successfully filled 1234 blocks" → `Some(1234)`. Absence of a parseable
/// count is not a failure, merely `None`.
pub fn blocks_affected(response: &str) -> Option<u64> {
    let tokens: Vec<&str> = response.split_whitespace().collect();
    for (i, token) in tokens.iter().enumerate() {
        if !token.to_ascii_lowercase().starts_with("block") {
            continue;
        }
        let preceding = i
            .checked_sub(1)
            .and_then(|j| parse_count(tokens[j]));
        if preceding.is_some() {
            return preceding;
        }
        let following = tokens.get(i + 1).and_then(|t| parse_count(t));
        if following.is_some() {
            return following;
        }
    }
    None
}

/// Extracts the value following "currently set to:" from a gamerule query
/// response, trimmed of whitespace.
pub fn gamerule_value(response: &str) -> Option<String> {
    let start = find_ascii_ci(response, GAMERULE_MARKER)?;
    Some(response[start + GAMERULE_MARKER.len()..].trim().to_string())
}

fn parse_count(token: &str) -> Option<u64> {
    token
        .trim_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .ok()
}

/// Byte index of an ASCII needle, ignoring case. Matched bytes are ASCII, so
/// the returned index and the slice past the needle stay on char boundaries.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_fill_response() {
        assert!(is_success("Successfully filled 1234 blocks"));
        assert_eq!(blocks_affected("Successfully filled 1234 blocks"), Some(1234));
    }

    #[test]
    fn test_error_response_is_failure() {
        assert!(!is_success("Error: Unknown block type: invalid_block"));
        assert!(!is_success("Command failed"));
        assert!(!is_success("UNKNOWN command"));
    }

    #[test]
    fn test_empty_response_is_failure() {
        assert!(!is_success(""));
        assert!(!is_success("   "));
    }

    #[test]
    fn test_benign_response_is_success() {
        assert!(is_success("Set the time to 1000"));
        assert!(is_success("Teleported dev to 300.0, 101.0, 300.0"));
    }

    #[test]
    fn test_block_count_following_the_token() {
        assert_eq!(blocks_affected("Affected blocks: 99"), Some(99));
    }

    #[test]
    fn test_block_count_with_parenthesized_plural() {
        assert_eq!(blocks_affected("Filled 42 block(s)"), Some(42));
    }

    #[test]
    fn test_missing_block_count_is_none() {
        assert_eq!(blocks_affected("Successfully filled some blocks"), None);
        assert_eq!(blocks_affected("Set the time to 1000"), None);
    }

    #[test]
    fn test_gamerule_value_extraction() {
        assert_eq!(
            gamerule_value("Gamerule doDaylightCycle is currently set to: false"),
            Some("false".to_string())
        );
        assert_eq!(
            gamerule_value("CURRENTLY SET TO:  true "),
            Some("true".to_string())
        );
        assert_eq!(gamerule_value("Set the time to 1000"), None);
    }
}
