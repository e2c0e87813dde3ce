use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use ratedesk_core::domain::rate::{Category, Profile, QualityTag, RateStatus};
use ratedesk_core::domain::session::{ExtractedSlots, SessionState};
use ratedesk_core::query::RateField;
use ratedesk_core::source::{RecordSource, RecordSourceError};

/// Pulls slot values out of chat messages. Every extractor is independent and
/// a failed country lookup never stops the others.
#[derive(Clone, Debug)]
pub struct SlotExtractor {
    lookup_timeout: Duration,
}

impl Default for SlotExtractor {
    fn default() -> Self {
        Self { lookup_timeout: Duration::from_secs(10) }
    }
}

impl SlotExtractor {
    pub fn new(lookup_timeout: Duration) -> Self {
        Self { lookup_timeout }
    }

    /// `text` must already be normalized. Country lookups are skipped when the
    /// session already has a country, since the result could not be used.
    pub async fn extract(
        &self,
        text: &str,
        current: &SessionState,
        source: &dyn RecordSource,
    ) -> ExtractedSlots {
        let country =
            if current.country.is_some() { None } else { self.resolve_country(text, source).await };

        ExtractedSlots {
            country,
            category: extract_category(text),
            profile: extract_profile(text),
            quality: extract_quality(text),
            status: extract_status(text),
            rate: extract_rate(text),
        }
    }

    async fn resolve_country(&self, text: &str, source: &dyn RecordSource) -> Option<String> {
        if let Some(digits) = extract_country_code(text) {
            match self.bounded(source.country_for_code(digits)).await {
                Ok(Some(country)) if !country.trim().is_empty() => {
                    debug!(
                        event_name = "dialogue.extract.country_by_code",
                        code = digits,
                        country = %country,
                        "country resolved from dialing code"
                    );
                    return Some(country);
                }
                Ok(_) => {}
                Err(error) => warn!(
                    event_name = "dialogue.extract.country_lookup_failed",
                    lookup = "code",
                    error = %error,
                    "country code lookup failed"
                ),
            }
        }

        match self.bounded(source.distinct_values(RateField::Country)).await {
            Ok(names) => match_country_name(text, names),
            Err(error) => {
                warn!(
                    event_name = "dialogue.extract.country_lookup_failed",
                    lookup = "name",
                    error = %error,
                    "country name enumeration failed"
                );
                None
            }
        }
    }

    async fn bounded<T>(
        &self,
        lookup: impl std::future::Future<Output = Result<T, RecordSourceError>>,
    ) -> Result<T, RecordSourceError> {
        tokio::time::timeout(self.lookup_timeout, lookup).await.unwrap_or_else(|_| {
            Err(RecordSourceError::Unavailable(format!(
                "lookup exceeded {}s",
                self.lookup_timeout.as_secs()
            )))
        })
    }
}

pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

fn country_code_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\+?(\d{1,3})").expect("Invalid country code regex"))
}

fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+\.\d+|\.\d+|\d+").expect("Invalid number regex"))
}

/// Digits of the first dialing-code-like token, without the leading `+`.
pub fn extract_country_code(text: &str) -> Option<&str> {
    country_code_pattern()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|digits| digits.as_str())
}

/// First known country whose name occurs in `text`. Longer names are tried
/// first so "Nigeria" is not reported as "Niger"; ties go alphabetically.
pub fn match_country_name(text: &str, names: impl IntoIterator<Item = String>) -> Option<String> {
    let mut names = names.into_iter().filter(|name| !name.trim().is_empty()).collect::<Vec<_>>();
    names.sort_by(|left, right| {
        right.chars().count().cmp(&left.chars().count()).then_with(|| left.cmp(right))
    });

    let haystack = text.to_lowercase();
    names.into_iter().find(|name| haystack.contains(&name.to_lowercase()))
}

/// Plain substring match, so "cc" also fires inside words like "accent".
pub fn extract_category(text: &str) -> Option<Category> {
    if text.contains("cc") {
        Some(Category::Cc)
    } else if text.contains("cli") {
        Some(Category::Cli)
    } else {
        None
    }
}

pub fn extract_profile(text: &str) -> Option<Profile> {
    if text.contains("ivr") {
        Some(Profile::Ivr)
    } else if text.contains("outbound") {
        Some(Profile::Outbound)
    } else {
        None
    }
}

pub fn extract_quality(text: &str) -> Vec<QualityTag> {
    QualityTag::ALL.into_iter().filter(|tag| text.contains(tag.keyword())).collect()
}

/// "inactive" is checked first because it contains "active".
pub fn extract_status(text: &str) -> Option<RateStatus> {
    if text.contains("inactive") {
        Some(RateStatus::Inactive)
    } else if text.contains("active") {
        Some(RateStatus::Active)
    } else {
        None
    }
}

pub fn extract_rate(text: &str) -> Option<f64> {
    number_pattern().find(text).and_then(|literal| literal.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use super::{
        extract_category, extract_country_code, extract_profile, extract_quality, extract_rate,
        extract_status, match_country_name, normalize_text, SlotExtractor,
    };
    use ratedesk_core::domain::rate::{Category, Profile, QualityTag, RateRecord, RateStatus};
    use ratedesk_core::domain::session::SessionState;
    use ratedesk_core::query::{RateField, RecordQuery};
    use ratedesk_core::source::{RecordSource, RecordSourceError};

    /// Maps every dialing code to a blank name; knows "Germany" by name.
    struct BlankCodeSource;

    #[async_trait]
    impl RecordSource for BlankCodeSource {
        async fn find(&self, _query: &RecordQuery) -> Result<Vec<RateRecord>, RecordSourceError> {
            Ok(Vec::new())
        }

        async fn distinct_values(
            &self,
            _field: RateField,
        ) -> Result<BTreeSet<String>, RecordSourceError> {
            Ok(BTreeSet::from(["Germany".to_string()]))
        }

        async fn country_for_code(
            &self,
            _digits: &str,
        ) -> Result<Option<String>, RecordSourceError> {
            Ok(Some("  ".to_string()))
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn normalization_trims_and_lowercases() {
        assert_eq!(normalize_text("  CC Rate for GERMANY \n"), "cc rate for germany");
    }

    #[test]
    fn country_code_takes_first_digit_run() {
        assert_eq!(extract_country_code("rates for +91 please"), Some("91"));
        assert_eq!(extract_country_code("code 4915 mobile"), Some("491"));
        assert_eq!(extract_country_code("no digits here"), None);
    }

    #[test]
    fn country_name_match_is_case_insensitive() {
        let found = match_country_name("cc rate for germany", names(&["France", "Germany"]));
        assert_eq!(found.as_deref(), Some("Germany"));
        assert_eq!(match_country_name("cc rate", names(&["France", "Germany"])), None);
    }

    #[test]
    fn country_name_match_prefers_longest_name() {
        let found = match_country_name("ivr to nigeria", names(&["Niger", "Nigeria"]));
        assert_eq!(found.as_deref(), Some("Nigeria"));

        let found = match_country_name("guinea or oman", names(&["Oman", "Guinea"]));
        assert_eq!(found.as_deref(), Some("Guinea"));
    }

    #[test]
    fn category_checks_cc_before_cli() {
        assert_eq!(extract_category("cc rate"), Some(Category::Cc));
        assert_eq!(extract_category("cli route"), Some(Category::Cli));
        assert_eq!(extract_category("cc or cli"), Some(Category::Cc));
        assert_eq!(extract_category("outbound"), None);
    }

    #[test]
    fn category_substring_matches_inside_words() {
        assert_eq!(extract_category("accent"), Some(Category::Cc));
    }

    #[test]
    fn profile_detection() {
        assert_eq!(extract_profile("ivr"), Some(Profile::Ivr));
        assert_eq!(extract_profile("outbound calls"), Some(Profile::Outbound));
        assert_eq!(extract_profile("inbound"), None);
    }

    #[test]
    fn quality_tags_follow_vocabulary_order() {
        assert_eq!(
            extract_quality("mobile and local, also fix"),
            vec![QualityTag::Local, QualityTag::Mobile, QualityTag::Fix]
        );
        assert!(extract_quality("premium").is_empty());
    }

    #[test]
    fn status_distinguishes_inactive() {
        assert_eq!(extract_status("only active routes"), Some(RateStatus::Active));
        assert_eq!(extract_status("show inactive"), Some(RateStatus::Inactive));
        assert_eq!(extract_status("any"), None);
    }

    #[test]
    fn rate_uses_first_numeric_literal() {
        assert_eq!(extract_rate("local mobile active 0.05"), Some(0.05));
        assert_eq!(extract_rate("rate .5 or 2"), Some(0.5));
        assert_eq!(extract_rate("12 then 0.4"), Some(12.0));
        assert_eq!(extract_rate("no numbers"), None);
    }

    #[tokio::test]
    async fn blank_name_from_code_lookup_is_not_a_country() {
        let extractor = SlotExtractor::default();
        let state = SessionState::default();

        let slots = extractor.extract("+49 rates", &state, &BlankCodeSource).await;
        assert_eq!(slots.country, None);

        let slots = extractor.extract("+49 germany", &state, &BlankCodeSource).await;
        assert_eq!(slots.country.as_deref(), Some("Germany"));
    }
}
