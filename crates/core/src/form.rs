use crate::domain::request::IdeaRequest;
use crate::error::ValidationError;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// How the form page was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    /// Plain page visit (GET/HEAD).
    Read,
    /// Form submission (POST).
    Submit,
}

/// Raw form fields exactly as posted. Every field is optional so that missing
/// values are reported by the validator instead of the form decoder.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIdeaForm {
    pub model: Option<String>,
    #[serde(rename = "api-key")]
    pub api_key: Option<String>,
    pub age: Option<String>,
    pub interests: Option<String>,
    pub count: Option<String>,
}

impl RawIdeaForm {
    /// Builds the form from decoded `key=value` pairs. A repeated key keeps its
    /// last value; unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "model" => &mut form.model,
                "api-key" => &mut form.api_key,
                "age" => &mut form.age,
                "interests" => &mut form.interests,
                "count" => &mut form.count,
                _ => continue,
            };
            *slot = Some(value);
        }
        form
    }
}

/// Turns a form submission into an [`IdeaRequest`].
///
/// Page visits yield `Ok(None)`. Submissions are checked field by field in the
/// order model, api-key, age, interests, count; the first failure is returned.
pub fn read_idea_request(
    method: FormMethod,
    form: &RawIdeaForm,
) -> Result<Option<IdeaRequest>, ValidationError> {
    if method != FormMethod::Submit {
        return Ok(None);
    }

    let model = form.model.as_ref().ok_or(ValidationError::Model)?;
    let api_key = form.api_key.as_ref().ok_or(ValidationError::ApiKey)?;
    let age = form
        .age
        .as_deref()
        .and_then(parse_truncated_int)
        .ok_or(ValidationError::Age)?;
    let interests = form.interests.as_ref().ok_or(ValidationError::Interests)?;
    let count = form
        .count
        .as_deref()
        .and_then(parse_truncated_int)
        .ok_or(ValidationError::Count)?;

    Ok(Some(IdeaRequest {
        model: model.clone(),
        api_key: api_key.clone(),
        age,
        interests: interests.clone(),
        count,
    }))
}

fn numeric_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$")
            .expect("numeric pattern is valid")
    })
}

/// Integer or decimal literal, with optional sign, exponent and surrounding
/// whitespace.
pub fn is_numeric(raw: &str) -> bool {
    numeric_pattern().is_match(raw)
}

/// Parses a numeric literal and truncates it toward zero, saturating at the
/// `i64` bounds.
pub fn parse_truncated_int(raw: &str) -> Option<i64> {
    if !is_numeric(raw) {
        return None;
    }
    let trimmed = raw.trim();
    if let Ok(exact) = trimmed.parse::<i64>() {
        return Some(exact);
    }
    let value = trimmed.parse::<f64>().ok()?;
    Some(value.trunc() as i64)
}
