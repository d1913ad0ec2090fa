use thiserror::Error;

/// First invalid field of a submitted form, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Model is required and must be a string.")]
    Model,

    #[error("API Key is required and must be a string.")]
    ApiKey,

    #[error("Age is required and must be a number.")]
    Age,

    #[error("Interests are required and must be a string.")]
    Interests,

    #[error("Count is required and must be a number.")]
    Count,
}

impl ValidationError {
    /// Form field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::ApiKey => "api-key",
            Self::Age => "age",
            Self::Interests => "interests",
            Self::Count => "count",
        }
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("model {0:?} is not available from any provider")]
    UnavailableModel(String),

    #[error("model response does not contain a JSON array")]
    MalformedResponse { raw_output: String },

    #[error("model response is not a valid idea list: {source}")]
    Deserialization {
        #[source]
        source: serde_json::Error,
        json: String,
    },

    #[error(transparent)]
    Provider(#[from] anyhow::Error),
}
