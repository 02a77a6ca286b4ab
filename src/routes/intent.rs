//! Navigation intent: where to send the user once a gate or screen is done.
//!
//! The intended path travels in the query string as `redirect` (`to` is also
//! read). Only same-origin absolute paths are honoured so a crafted link cannot
//! bounce the user to another site after login.

use super::paths;
use url::form_urlencoded;

pub const REDIRECT_PARAM: &str = "redirect";
const ALT_REDIRECT_PARAM: &str = "to";

/// `route?redirect=<target>`.
#[must_use]
pub fn with_redirect(route: &str, target: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(REDIRECT_PARAM, target)
        .finish();
    format!("{route}?{query}")
}

#[must_use]
pub fn login_location(from: &str) -> String {
    with_redirect(paths::LOGIN, from)
}

/// Redirect target carried by `query` (with or without the leading `?`), if
/// it is a safe local path.
#[must_use]
pub fn redirect_target(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut fallback = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == REDIRECT_PARAM {
            return is_local_path(&value).then(|| value.into_owned());
        }
        if key == ALT_REDIRECT_PARAM && fallback.is_none() {
            fallback = Some(value.into_owned());
        }
    }
    fallback.filter(|value| is_local_path(value))
}

/// Splits `/path?query` into its path and query parts.
#[must_use]
pub fn split_location(location: &str) -> (&str, &str) {
    location.split_once('?').unwrap_or((location, ""))
}

fn is_local_path(value: &str) -> bool {
    value.starts_with('/') && !value.starts_with("//") && !value.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_location_encodes_target() {
        assert_eq!(
            login_location("/reports?year=2024&q=a b"),
            "/login?redirect=%2Freports%3Fyear%3D2024%26q%3Da+b"
        );
    }

    #[test]
    fn redirect_target_round_trips() {
        let location = with_redirect(paths::MFA_ENABLE, "/orders/42?tab=items");
        let (path, query) = split_location(&location);
        assert_eq!(path, "/mfa/enable");
        assert_eq!(redirect_target(query).as_deref(), Some("/orders/42?tab=items"));
    }

    #[test]
    fn redirect_target_accepts_to_and_leading_question_mark() {
        assert_eq!(redirect_target("?to=%2Fsettings").as_deref(), Some("/settings"));
        assert_eq!(
            redirect_target("to=/a&redirect=/b").as_deref(),
            Some("/b"),
            "redirect wins over to"
        );
    }

    #[test]
    fn redirect_target_rejects_foreign_targets() {
        assert_eq!(redirect_target("redirect=https://evil.example"), None);
        assert_eq!(redirect_target("redirect=//evil.example/x"), None);
        assert_eq!(redirect_target("redirect=/\\evil.example"), None);
        assert_eq!(redirect_target("redirect="), None);
        assert_eq!(redirect_target(""), None);
    }
}
