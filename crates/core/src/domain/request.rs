use serde::Serialize;
use std::fmt;

/// A validated gift-idea submission. Built by [`crate::form::read_idea_request`].
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct IdeaRequest {
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub age: i64,
    pub interests: String,
    pub count: i64,
}

// The API key must never reach logs.
impl fmt::Debug for IdeaRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdeaRequest")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("age", &self.age)
            .field("interests", &self.interests)
            .field("count", &self.count)
            .finish()
    }
}
