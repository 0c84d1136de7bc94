use crate::models::FlowError;
use crate::utils::logging::FlowLogging;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// Query parameter a page can use to ask for a specific return URL
pub const RETURN_URL_PARAMETER: &str = "returnUrl";

const MAX_RETURN_URL_LENGTH: usize = 2048;

// Control characters and invisible direction/separator marks never belong in a return URL
static SUSPICIOUS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x00-\x1F\x7F-\x9F]|[\u{200E}\u{200F}\u{2060}-\u{2064}]")
        .unwrap_or_else(|e| unreachable!("static return-url pattern is valid: {e}"))
});

/// Pick the URL the user returns to once the flow completes
///
/// Order: the URL stored in the flow state, then the `returnUrl` query
/// parameter of the current page, then `default_return_url`, then the base
/// URI. Only the query parameter is attacker-controlled, so only it goes
/// through [`validate_return_url`].
///
/// # Errors
/// Returns [`FlowError::InvalidReturnUrl`] if the query parameter points
/// outside the application, or [`FlowError::InvalidUri`] if the current URI
/// cannot be parsed.
pub fn resolve_return_url(
    state_return_url: Option<&str>,
    current_uri: &str,
    base_uri: &str,
    default_return_url: Option<&str>,
) -> Result<String, FlowError> {
    if let Some(url) = state_return_url {
        debug!("Using return url from flow state: {url}");
        return Ok(url.to_string());
    }

    if let Some(from_query) = query_parameter(current_uri, RETURN_URL_PARAMETER)? {
        validate_return_url(&from_query, base_uri)?;
        debug!("Using return url from query: {from_query}");
        return Ok(from_query);
    }

    Ok(default_return_url.unwrap_or(base_uri).to_string())
}

/// Check that `candidate` stays inside the application rooted at `base_uri`
///
/// The candidate must be absolute, share the base URI's origin and live
/// under its path.
///
/// # Errors
/// Returns [`FlowError::InvalidReturnUrl`] when any check fails.
pub fn validate_return_url(candidate: &str, base_uri: &str) -> Result<(), FlowError> {
    let reject = |reason: &str| {
        FlowLogging::log_return_url_rejected(candidate, reason);
        Err(FlowError::InvalidReturnUrl {
            url: candidate.to_string(),
        })
    };

    if candidate.len() > MAX_RETURN_URL_LENGTH {
        return reject("too long");
    }

    if decoded_variants(candidate)
        .iter()
        .any(|variant| SUSPICIOUS_PATTERN.is_match(variant))
    {
        return reject("control or invisible characters");
    }

    let Ok(base) = Url::parse(base_uri) else {
        return reject("base uri is not absolute");
    };
    let Ok(parsed) = Url::parse(candidate) else {
        return reject("not an absolute url");
    };

    if parsed.origin() != base.origin() {
        return reject("origin mismatch");
    }

    if !parsed.path().starts_with(base.path()) {
        return reject("outside the application base path");
    }

    Ok(())
}

/// Value of the first query parameter named `name` (case-insensitive)
///
/// Keys and values are percent-decoded only; a literal `+` stays a `+`.
/// Blank values count as absent.
///
/// # Errors
/// Returns [`FlowError::InvalidUri`] if `uri` is not an absolute URL.
pub fn query_parameter(uri: &str, name: &str) -> Result<Option<String>, FlowError> {
    let parsed = Url::parse(uri).map_err(|e| FlowError::invalid_uri(uri, &e))?;
    let Some(query) = parsed.query() else {
        return Ok(None);
    };

    Ok(query
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            percent_decode(key)
                .eq_ignore_ascii_case(name)
                .then(|| percent_decode(value))
        })
        .filter(|value| !value.trim().is_empty()))
}

fn percent_decode(raw: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

/// The raw value plus its single and double URL-decoded forms
fn decoded_variants(value: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(3);
    variants.push(value.to_string());

    if let Ok(decoded) = urlencoding::decode(value) {
        let decoded = decoded.into_owned();
        if decoded != value {
            if let Ok(double_decoded) = urlencoding::decode(&decoded) {
                let double_decoded = double_decoded.into_owned();
                if double_decoded != decoded {
                    variants.push(double_decoded);
                }
            }
            variants.push(decoded);
        }
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://app.example/";

    #[test]
    fn test_state_return_url_wins() {
        let url = resolve_return_url(
            Some("https://app.example/orders"),
            "https://app.example/authentication/login?returnUrl=https%3A%2F%2Fapp.example%2Fother",
            BASE,
            Some("https://app.example/default"),
        )
        .unwrap();
        assert_eq!(url, "https://app.example/orders");
    }

    #[test]
    fn test_state_return_url_is_not_validated() {
        // The state comes back from the protected round trip, not from the query
        let url = resolve_return_url(
            Some("https://partner.example/"),
            "https://app.example/authentication/login-callback?code=abc",
            BASE,
            None,
        )
        .unwrap();
        assert_eq!(url, "https://partner.example/");
    }

    #[test]
    fn test_query_return_url_used_when_same_origin() {
        let url = resolve_return_url(
            None,
            "https://app.example/authentication/login?returnUrl=https%3A%2F%2Fapp.example%2Fcart%3Fid%3D4",
            BASE,
            None,
        )
        .unwrap();
        assert_eq!(url, "https://app.example/cart?id=4");
    }

    #[test]
    fn test_query_parameter_keeps_literal_plus() {
        let value = query_parameter(
            "https://app.example/authentication/login?returnUrl=https://app.example/a+b",
            RETURN_URL_PARAMETER,
        )
        .unwrap();
        assert_eq!(value.as_deref(), Some("https://app.example/a+b"));

        let message = query_parameter(
            "https://app.example/authentication/login-failed?message=access%20denied%2B",
            "message",
        )
        .unwrap();
        assert_eq!(message.as_deref(), Some("access denied+"));
    }

    #[test]
    fn test_query_parameter_first_match_and_blank() {
        let uri = "https://app.example/?flag&message=&message=second";
        assert_eq!(query_parameter(uri, "message").unwrap(), None);
        assert_eq!(query_parameter(uri, "missing").unwrap(), None);
        assert_eq!(query_parameter("https://app.example/", "message").unwrap(), None);
    }

    #[test]
    fn test_query_parameter_name_is_case_insensitive() {
        let url = resolve_return_url(
            None,
            "https://app.example/authentication/login?ReturnURL=https://app.example/x",
            BASE,
            None,
        )
        .unwrap();
        assert_eq!(url, "https://app.example/x");
    }

    #[test]
    fn test_cross_origin_query_return_url_rejected() {
        let result = resolve_return_url(
            None,
            "https://app.example/authentication/login?returnUrl=https://evil.example",
            BASE,
            None,
        );
        assert_eq!(
            result,
            Err(FlowError::InvalidReturnUrl {
                url: "https://evil.example".to_string()
            })
        );
    }

    #[test]
    fn test_default_then_base_uri() {
        let current = "https://app.example/authentication/logout";
        assert_eq!(
            resolve_return_url(None, current, BASE, Some("https://app.example/authentication/logged-out"))
                .unwrap(),
            "https://app.example/authentication/logged-out"
        );
        assert_eq!(resolve_return_url(None, current, BASE, None).unwrap(), BASE);
    }

    #[test]
    fn test_blank_query_return_url_is_ignored() {
        let url = resolve_return_url(
            None,
            "https://app.example/authentication/login?returnUrl=%20%20",
            BASE,
            None,
        )
        .unwrap();
        assert_eq!(url, BASE);
    }

    #[test]
    fn test_unparseable_current_uri() {
        let result = resolve_return_url(None, "not a uri", BASE, None);
        assert!(matches!(result, Err(FlowError::InvalidUri { .. })));
    }

    #[test]
    fn test_open_redirect_payloads_rejected() {
        let payloads = [
            "//evil.example",
            "/relative/path",
            "https://app.example.evil.example/",
            "https://app.example@evil.example/",
            "http://app.example/",
            "https://app.example:8443/",
            "javascript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "https://app.example/%0d%0aSet-Cookie:x",
            "https://app.example/%250a",
            "https://app.example/\u{200E}path",
        ];

        for payload in payloads {
            assert!(
                validate_return_url(payload, BASE).is_err(),
                "payload should be rejected: {payload}"
            );
        }
    }

    #[test]
    fn test_base_path_prefix_enforced() {
        let base = "https://app.example/portal/";
        assert!(validate_return_url("https://app.example/portal/home", base).is_ok());
        assert!(validate_return_url("https://app.example/portal/", base).is_ok());
        assert!(validate_return_url("https://app.example/portals", base).is_err());
        assert!(validate_return_url("https://app.example/admin", base).is_err());
    }

    #[test]
    fn test_long_return_url_rejected() {
        let long = format!("{BASE}{}", "a".repeat(MAX_RETURN_URL_LENGTH));
        assert!(validate_return_url(&long, BASE).is_err());
    }
}
