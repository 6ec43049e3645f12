//! Anti-forgery token extraction from the portal's login form.

use regex::Regex;

/// Extracts the `_token` hidden-input value from a login page, tolerating
/// either attribute order. Returns `None` when the form carries no token
/// (some portal builds omit it); the login submission then simply leaves
/// the field out.
pub(crate) fn extract_login_token(html: &str) -> Option<String> {
    let name_first = Regex::new(
        r#"(?is)<input[^>]*\bname\s*=\s*["']_token["'][^>]*\bvalue\s*=\s*["']([^"']*)["']"#,
    )
    .expect("valid token regex");
    let value_first = Regex::new(
        r#"(?is)<input[^>]*\bvalue\s*=\s*["']([^"']*)["'][^>]*\bname\s*=\s*["']_token["']"#,
    )
    .expect("valid token regex");

    name_first
        .captures(html)
        .or_else(|| value_first.captures(html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
        .filter(|token| !token.is_empty())
}
