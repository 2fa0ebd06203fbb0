//! Heuristic filter for events that make poor destinations.
//!
//! Sold-out, cancelled, ticketed or restricted events are flagged so that
//! selection can skip them. Matching is a pure function of the event's name
//! and description; the first matching rule decides.

use std::sync::LazyLock;

use regex::Regex;

use super::Event;

const NAME_PATTERNS: &[&str] = &[
    r"(?i)\bsold out\b",
    r"(?i)\bcancel\b",
    r"(?i)\bgeschlossene\b",
    r"(?i)\babgesagte\b",
    r"(?i)\bannulliert\b",
    r"(?i)\bfuneral\b",
    r"(?i)\bbar\b",
    r"(?i)\bpub\b",
];

const DESCRIPTION_PATTERNS: &[&str] = &[
    r"[$¥₹₡₱£€₩₨﷼₽]",
    r"Rs *\d",
    r"(?i)\b(men|women|children) only\b",
];

const DESCRIPTION_SUBSTRINGS: &[&str] = &[
    "dollars",
    "support group",
    "regist",
    "rsvp",
    "anmelden",
    "anmeldung",
];

/// One classification rule.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Case-insensitive substring; stored lower-cased.
    Substring(String),
    /// Regular expression, matched as written.
    Pattern(Regex),
}

impl Matcher {
    /// Case-insensitive substring rule.
    pub fn substring(needle: &str) -> Self {
        Self::Substring(needle.to_lowercase())
    }

    /// Regular-expression rule.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Substring(needle) => text.to_lowercase().contains(needle.as_str()),
            Self::Pattern(regex) => regex.is_match(text),
        }
    }
}

/// Ordered name and description rules.
#[derive(Debug, Clone)]
pub struct BadEventClassifier {
    name_rules: Vec<Matcher>,
    description_rules: Vec<Matcher>,
}

impl BadEventClassifier {
    /// Build a classifier from explicit rule lists.
    pub fn new(name_rules: Vec<Matcher>, description_rules: Vec<Matcher>) -> Self {
        Self {
            name_rules,
            description_rules,
        }
    }

    /// Built-in rule set.
    pub fn try_standard() -> Result<Self, regex::Error> {
        let name_rules = NAME_PATTERNS
            .iter()
            .map(|pattern| Matcher::pattern(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        let mut description_rules = DESCRIPTION_PATTERNS
            .iter()
            .map(|pattern| Matcher::pattern(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        description_rules.extend(DESCRIPTION_SUBSTRINGS.iter().map(|s| Matcher::substring(s)));
        Ok(Self::new(name_rules, description_rules))
    }

    /// Built-in rule set, panicking if a built-in pattern fails to compile.
    pub fn standard() -> Self {
        match Self::try_standard() {
            Ok(classifier) => classifier,
            Err(err) => panic!("built-in classifier patterns must compile: {err}"),
        }
    }

    /// Append a name rule.
    #[must_use]
    pub fn with_name_rule(mut self, rule: Matcher) -> Self {
        self.name_rules.push(rule);
        self
    }

    /// Append a description rule.
    #[must_use]
    pub fn with_description_rule(mut self, rule: Matcher) -> Self {
        self.description_rules.push(rule);
        self
    }

    /// Whether `event` should be excluded from selection.
    pub fn is_bad(&self, event: &Event) -> bool {
        self.name_rules.iter().any(|rule| rule.is_match(&event.name))
            || self
                .description_rules
                .iter()
                .any(|rule| rule.is_match(&event.description))
    }
}

impl Default for BadEventClassifier {
    fn default() -> Self {
        Self::standard()
    }
}

static STANDARD: LazyLock<BadEventClassifier> = LazyLock::new(BadEventClassifier::standard);

/// Classify with the shared built-in rule set.
///
/// # Examples
/// ```
/// use eventdb::domain::{is_bad, RawEvent};
/// use serde_json::json;
///
/// let event = RawEvent::new(json!({
///     "id": "1",
///     "name": "Konzert - SOLD OUT",
///     "start_time": "2017-06-10T19:00:00Z",
/// }))
/// .decode()
/// .expect("decodes");
/// assert!(is_bad(&event));
/// ```
pub fn is_bad(event: &Event) -> bool {
    STANDARD.is_bad(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawEvent;
    use rstest::rstest;
    use serde_json::json;

    fn event(name: &str, description: &str) -> Event {
        RawEvent::new(json!({
            "id": "1",
            "name": name,
            "description": description,
            "start_time": "2017-06-10T19:00:00Z",
        }))
        .decode()
        .expect("decodes")
    }

    #[rstest]
    fn standard_patterns_compile() {
        assert!(BadEventClassifier::try_standard().is_ok());
    }

    #[rstest]
    #[case::sold_out("Techno Night SOLD OUT")]
    #[case::cancel("Lesung - CANCEL")]
    #[case::german_closed("Geschlossene Gesellschaft")]
    #[case::german_called_off("Abgesagte Party")]
    #[case::annulled("Konzert annulliert")]
    #[case::funeral("Funeral service")]
    #[case::bar("Quiz at the Bar")]
    #[case::pub_night("Pub crawl")]
    fn flags_names(#[case] name: &str) {
        assert!(is_bad(&event(name, "")));
    }

    #[rstest]
    #[case::dollar("Tickets $15")]
    #[case::euro("Eintritt 10€")]
    #[case::rupees("Entry Rs 200")]
    #[case::dollars_word("only ten dollars")]
    #[case::support_group("Weekly support group")]
    #[case::restricted("Women only meetup")]
    #[case::registration("Please register online")]
    #[case::rsvp("RSVP required")]
    #[case::anmeldung("Anmeldung erforderlich")]
    fn flags_descriptions(#[case] description: &str) {
        assert!(is_bad(&event("Open day", description)));
    }

    #[rstest]
    #[case("Barbecue in the park", "Bring friends")]
    #[case("Publishing workshop", "Free for everyone")]
    #[case("Street festival", "Music and food")]
    #[case("Cancellation policy clinic", "Drop in any time")]
    #[case("Garden walk", "Meet at room rs 200")]
    fn leaves_ordinary_events(#[case] name: &str, #[case] description: &str) {
        assert!(!is_bad(&event(name, description)));
    }

    #[rstest]
    fn extra_rules_extend_the_standard_set() {
        let classifier = BadEventClassifier::standard().with_name_rule(Matcher::substring("Private"));
        assert!(classifier.is_bad(&event("private party", "")));
        assert!(!is_bad(&event("private party", "")));
    }
}
