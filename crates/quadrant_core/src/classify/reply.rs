//! Parsing of free-form model output into a `ClassifierReply`.

use serde::Deserialize;

use super::{ClassifierError, ClassifierReply};
use crate::model::task::{Category, DurationEstimate};

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    category: String,
    #[serde(default)]
    duration: Option<String>,
}

/// Extracts the first JSON object from `text` and validates it.
///
/// The category must be one of `q1..q4`; an unparseable duration is dropped
/// rather than failing the whole reply.
pub fn parse_classifier_reply(text: &str) -> Result<ClassifierReply, ClassifierError> {
    let raw = first_suggestion(text)?;

    let category = raw
        .category
        .parse::<Category>()
        .map_err(|err| ClassifierError::InvalidReply(err.to_string()))?;
    if category == Category::Inbox {
        return Err(ClassifierError::InvalidReply(
            "classifier returned inbox".to_string(),
        ));
    }

    let duration = raw
        .duration
        .as_deref()
        .and_then(|value| value.parse::<DurationEstimate>().ok());
    Ok(ClassifierReply::suggest(category, duration))
}

/// Decodes one JSON value starting at each `{` in turn and stops at the first
/// that fits, ignoring whatever text follows it.
fn first_suggestion(text: &str) -> Result<RawSuggestion, ClassifierError> {
    let mut first_error = None;
    for (start, _) in text.match_indices('{') {
        let mut values =
            serde_json::Deserializer::from_str(&text[start..]).into_iter::<RawSuggestion>();
        match values.next() {
            Some(Ok(raw)) => return Ok(raw),
            Some(Err(err)) if first_error.is_none() => first_error = Some(err),
            _ => {}
        }
    }
    Err(ClassifierError::InvalidReply(match first_error {
        Some(err) => err.to_string(),
        None => "no json object in reply".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::DurationUnit;

    #[test]
    fn parses_fenced_json() {
        let text = "```json\n{\"category\": \"Q1\", \"duration\": \"45m\"}\n```";
        let reply = parse_classifier_reply(text).unwrap();
        assert_eq!(reply.category, Category::Q1);
        assert_eq!(reply.duration, Some(DurationEstimate::minutes(45)));
        assert!(reply.is_actionable());
    }

    #[test]
    fn bad_duration_is_dropped() {
        let reply =
            parse_classifier_reply(r#"{"category":"q3","duration":"a few"}"#).unwrap();
        assert_eq!(reply.category, Category::Q3);
        assert_eq!(reply.duration, None);

        let reply = parse_classifier_reply(r#"{"category":"q2","duration":"2 hours"}"#).unwrap();
        assert_eq!(
            reply.duration,
            Some(DurationEstimate::new(2, DurationUnit::Hours))
        );
    }

    #[test]
    fn trailing_text_with_braces_is_ignored() {
        let reply =
            parse_classifier_reply(r#"{"category":"q2","duration":"30m"} Note: {reason}"#)
                .unwrap();
        assert_eq!(reply.category, Category::Q2);
        assert_eq!(reply.duration, Some(DurationEstimate::minutes(30)));
    }

    #[test]
    fn skips_leading_braces_that_are_not_suggestions() {
        let reply =
            parse_classifier_reply(r#"Template {category}: {"category":"q4"}"#).unwrap();
        assert_eq!(reply.category, Category::Q4);
        assert_eq!(reply.duration, None);
    }

    #[test]
    fn rejects_inbox_and_garbage() {
        assert!(parse_classifier_reply(r#"{"category":"inbox"}"#).is_err());
        assert!(parse_classifier_reply("I think this is urgent").is_err());
        assert!(parse_classifier_reply(r#"{"category":"q9"}"#).is_err());
    }
}
