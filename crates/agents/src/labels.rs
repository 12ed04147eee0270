//! Lenient parsing of labeled model replies.
//!
//! Agents ask the model for lines such as `SUCCESS_PROBABILITY: 72`. A reply
//! that omits or mangles a label is normal, not an error: every reader here
//! returns a [`LabelValue`] that says whether the value was parsed or fell
//! back to a default, and why.

use tracing::warn;

/// A parsed label, or the default that replaced it.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelValue<T> {
    Parsed(T),
    Fallback { value: T, reason: String },
}

impl<T> LabelValue<T> {
    fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self::Fallback {
            value,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Parsed(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Parsed(value) | Self::Fallback { value, .. } => value,
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LabelValue<U> {
        match self {
            Self::Parsed(value) => LabelValue::Parsed(f(value)),
            Self::Fallback { value, reason } => LabelValue::Fallback {
                value: f(value),
                reason,
            },
        }
    }

    /// Unwrap the value, logging a warning when it is a fallback.
    pub fn or_warn(self, agent: &str, label: &str) -> T {
        if let Self::Fallback { reason, .. } = &self {
            warn!(agent = %agent, label = %label, reason = %reason, "Using default for label");
        }
        self.into_value()
    }
}

/// Raw value of the last line starting with `LABEL:`, split on the first colon.
pub fn find_label<'a>(reply: &'a str, label: &str) -> Option<&'a str> {
    reply
        .lines()
        .rev()
        .map(str::trim_start)
        .find_map(|line| {
            line.strip_prefix(label)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(str::trim)
        })
}

/// Free-text label. Empty values count as missing.
pub fn text(reply: &str, label: &str, default: &str) -> LabelValue<String> {
    match find_label(reply, label) {
        Some(value) if !value.is_empty() => LabelValue::Parsed(value.to_string()),
        Some(_) => LabelValue::fallback(default.to_string(), format!("{label} is empty")),
        None => LabelValue::fallback(default.to_string(), format!("{label} missing")),
    }
}

/// Upper-cased free-text label, for enumerations like `LOW/MEDIUM/HIGH`.
pub fn keyword(reply: &str, label: &str, default: &str) -> LabelValue<String> {
    text(reply, label, default).map(|v| v.to_uppercase())
}

/// Numeric label. A trailing `%` is tolerated; non-finite values fall back.
pub fn number(reply: &str, label: &str, default: f64) -> LabelValue<f64> {
    let Some(raw) = find_label(reply, label) else {
        return LabelValue::fallback(default, format!("{label} missing"));
    };

    match raw.trim_end_matches('%').trim().parse::<f64>() {
        Ok(value) if value.is_finite() => LabelValue::Parsed(value),
        Ok(_) => LabelValue::fallback(default, format!("{label} is not finite: {raw}")),
        Err(_) => LabelValue::fallback(default, format!("{label} is not a number: {raw}")),
    }
}

/// `YES`/`NO` label. Any value containing `YES` is true.
pub fn yes_no(reply: &str, label: &str, default: bool) -> LabelValue<bool> {
    match find_label(reply, label) {
        Some(value) => LabelValue::Parsed(value.to_uppercase().contains("YES")),
        None => LabelValue::fallback(default, format!("{label} missing")),
    }
}

/// Comma-separated list label. `NONE` is an explicit empty list.
pub fn list(reply: &str, label: &str) -> LabelValue<Vec<String>> {
    let Some(raw) = find_label(reply, label) else {
        return LabelValue::fallback(Vec::new(), format!("{label} missing"));
    };

    if raw.eq_ignore_ascii_case("none") {
        return LabelValue::Parsed(Vec::new());
    }

    LabelValue::Parsed(
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(String::from)
            .collect(),
    )
}

/// Body of a `HEADER:` section, up to the next of `headers`.
///
/// Returns `None` when the header does not occur in the reply.
pub fn extract_section(reply: &str, header: &str, headers: &[&str]) -> Option<String> {
    let marker = format!("{header}:");
    let start = reply.find(&marker)? + marker.len();
    let rest = &reply[start..];

    let end = headers
        .iter()
        .filter(|h| **h != header)
        .filter_map(|h| rest.find(&format!("{h}:")))
        .min()
        .unwrap_or(rest.len());

    Some(strip_trailing_enumerator(rest[..end].trim()).to_string())
}

/// Drop a dangling `2)` or `2.` line left by the next numbered item.
fn strip_trailing_enumerator(body: &str) -> &str {
    let Some((head, last)) = body.rsplit_once('\n') else {
        return body;
    };
    let last = last.trim();
    let digits = last.trim_end_matches([')', '.']);
    let is_enumerator = digits.len() + 1 == last.len()
        && !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit());
    if is_enumerator { head.trim_end() } else { body }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "Here is my answer.\n\
        SUCCESS_PROBABILITY: 72%\n\
        BEST_LOCATION:  Austin, TX \n\
        REASONING: Strong demand: recurring revenue.\n\
        SEARCH_NEEDED: yes\n\
        ISSUES: churn, pricing , \n\
        RED_FLAGS: NONE\n";

    #[test]
    fn splits_on_first_colon() {
        assert_eq!(
            find_label(REPLY, "REASONING"),
            Some("Strong demand: recurring revenue.")
        );
        assert_eq!(find_label(REPLY, "MISSING"), None);
    }

    #[test]
    fn label_must_be_followed_by_colon() {
        assert_eq!(find_label("SUCCESS_PROBABILITY_RAW: 3", "SUCCESS_PROBABILITY"), None);
    }

    #[test]
    fn last_occurrence_wins() {
        let reply = "LOCATION: Berlin\nLOCATION: Paris";
        assert_eq!(find_label(reply, "LOCATION"), Some("Paris"));
    }

    #[test]
    fn text_labels_trim_and_fall_back() {
        assert_eq!(
            text(REPLY, "BEST_LOCATION", "San Francisco, CA"),
            LabelValue::Parsed("Austin, TX".to_string())
        );

        let missing = text("nothing here", "BEST_LOCATION", "San Francisco, CA");
        assert!(!missing.is_parsed());
        assert_eq!(missing.into_value(), "San Francisco, CA");

        let empty = text("BEST_LOCATION:   ", "BEST_LOCATION", "fallback");
        assert_eq!(empty.value(), "fallback");
    }

    #[test]
    fn numbers_tolerate_percent_sign() {
        assert_eq!(number(REPLY, "SUCCESS_PROBABILITY", 50.0), LabelValue::Parsed(72.0));
        assert_eq!(number("X: 12.5", "X", 0.0).into_value(), 12.5);
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let parsed = number("SUCCESS_PROBABILITY: high", "SUCCESS_PROBABILITY", 50.0);
        match parsed {
            LabelValue::Fallback { value, reason } => {
                assert_eq!(value, 50.0);
                assert!(reason.contains("not a number"));
            }
            LabelValue::Parsed(_) => panic!("expected fallback"),
        }

        assert_eq!(number("X: NaN", "X", 50.0).into_value(), 50.0);
        assert_eq!(number("X: inf", "X", 50.0).into_value(), 50.0);
    }

    #[test]
    fn yes_no_labels() {
        assert_eq!(yes_no(REPLY, "SEARCH_NEEDED", false), LabelValue::Parsed(true));
        assert_eq!(yes_no("SEARCH_NEEDED: NO", "SEARCH_NEEDED", true).into_value(), false);
        assert!(yes_no("", "SEARCH_NEEDED", true).into_value());
    }

    #[test]
    fn list_labels() {
        assert_eq!(list(REPLY, "ISSUES").into_value(), vec!["churn", "pricing"]);
        assert_eq!(list(REPLY, "RED_FLAGS"), LabelValue::Parsed(vec![]));
        assert!(!list(REPLY, "QUERIES").is_parsed());
    }

    #[test]
    fn keyword_is_uppercased() {
        assert_eq!(keyword("SEVERITY: high", "SEVERITY", "LOW").into_value(), "HIGH");
        assert_eq!(keyword("", "SEVERITY", "LOW").into_value(), "LOW");
    }

    #[test]
    fn sections_stop_at_next_header() {
        let headers = ["MARKET_DEMAND", "AUDIENCE_PROFILE", "SUMMARY"];
        let reply = "1) MARKET_DEMAND: Large and growing.\n\
                     2) AUDIENCE_PROFILE: Urban pet owners.\n\
                     3) SUMMARY: Go.";

        assert_eq!(
            extract_section(reply, "MARKET_DEMAND", &headers).as_deref(),
            Some("Large and growing.")
        );
        assert_eq!(
            extract_section(reply, "SUMMARY", &headers).as_deref(),
            Some("Go.")
        );
        assert_eq!(extract_section(reply, "COMPETITION", &headers), None);
    }

    #[test]
    fn sections_drop_dangling_enumerators_only() {
        let headers = ["MARKET_DEMAND", "AUDIENCE_PROFILE"];
        let dotted = "1. MARKET_DEMAND: Demand is strong.\n- Growth 12%\n2. AUDIENCE_PROFILE: Owners";
        assert_eq!(
            extract_section(dotted, "MARKET_DEMAND", &headers).as_deref(),
            Some("Demand is strong.\n- Growth 12%")
        );

        let inline = "MARKET_DEMAND: Revenue grew 5.\nAUDIENCE_PROFILE: Owners";
        assert_eq!(
            extract_section(inline, "MARKET_DEMAND", &headers).as_deref(),
            Some("Revenue grew 5.")
        );

        let bare = "MARKET_DEMAND: 12.\nAUDIENCE_PROFILE: Owners";
        assert_eq!(
            extract_section(bare, "MARKET_DEMAND", &headers).as_deref(),
            Some("12.")
        );
    }

    #[test]
    fn or_warn_returns_value() {
        assert_eq!(number("", "X", 50.0).or_warn("test", "X"), 50.0);
        assert_eq!(LabelValue::Parsed(3).map(|v| v * 2).into_value(), 6);
    }
}
