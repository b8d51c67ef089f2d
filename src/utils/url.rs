//! Endpoint construction for the chat API.

/// Strip trailing slashes so endpoints can be appended without doubling them.
///
/// ```
/// use sidenote::utils::url::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url("https://generativelanguage.googleapis.com/v1beta/openai/"),
///     "https://generativelanguage.googleapis.com/v1beta/openai"
/// );
/// ```
pub fn normalize_base_url(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use sidenote::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.example.com/v1/", "/chat/completions"),
///     "https://api.example.com/v1/chat/completions"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        endpoint.trim_start_matches('/')
    )
}
