//! The redirect convention shared with the verification service.
//!
//! The service sends the user back to the caller's redirect URL with the
//! [`REDIRECT_SENTINEL`] key in its query. Its presence, with any or no
//! value, is the only completion signal.

use url::form_urlencoded;

use crate::REDIRECT_SENTINEL;

/// Append `?verisync-redirect` to the caller's redirect URL.
///
/// Always joined with `?`, even when the URL already has a query string;
/// the service expects exactly this form.
pub fn with_sentinel(redirect_url: &str) -> String {
    format!("{redirect_url}?{REDIRECT_SENTINEL}")
}

/// Whether a navigated URL carries the completion sentinel.
///
/// Takes the raw string reported by the browser, which need not be a valid
/// absolute URL. Anything without a query is never a completion.
pub fn is_completion_redirect(url: &str) -> bool {
    let Some((_, rest)) = url.split_once('?') else {
        return false;
    };
    let query = rest.split_once('#').map_or(rest, |(query, _)| query);
    form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == REDIRECT_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_sentinel_as_query() {
        assert_eq!(
            with_sentinel("https://app.example/done"),
            "https://app.example/done?verisync-redirect"
        );
    }

    #[test]
    fn appends_sentinel_with_question_mark_even_after_a_query() {
        assert_eq!(
            with_sentinel("https://app.example/done?user=42"),
            "https://app.example/done?user=42?verisync-redirect"
        );
    }

    #[test]
    fn detects_bare_and_valued_sentinel() {
        assert!(is_completion_redirect("https://app.example/done?verisync-redirect"));
        assert!(is_completion_redirect("https://app.example/done?verisync-redirect="));
        assert!(is_completion_redirect(
            "https://app.example/done?a=1&verisync-redirect=yes&b=2"
        ));
        assert!(is_completion_redirect(
            "myapp://kyc/finished?verisync-redirect#section"
        ));
    }

    #[test]
    fn ignores_urls_without_sentinel() {
        assert!(!is_completion_redirect("https://app.example/done"));
        assert!(!is_completion_redirect("https://app.example/done?"));
        assert!(!is_completion_redirect("https://app.example/done?a=verisync-redirect"));
        assert!(!is_completion_redirect("https://app.example/verisync-redirect"));
        assert!(!is_completion_redirect("https://app.example/done#verisync-redirect"));
        assert!(!is_completion_redirect("about:blank"));
        assert!(!is_completion_redirect(""));
    }

    #[test]
    fn sentinel_in_fragment_only_does_not_count() {
        assert!(!is_completion_redirect(
            "https://app.example/done?a=1#verisync-redirect"
        ));
    }

    #[test]
    fn encoded_sentinel_inside_a_value_does_not_count() {
        // the outbound synchronizer URL carries the sentinel only inside redirect_url
        assert!(!is_completion_redirect(
            "https://app.verisync.co/synchronizer?client_id=c1&redirect_url=https%3A%2F%2Fapp.example%2Fdone%3Fverisync-redirect"
        ));
    }
}
