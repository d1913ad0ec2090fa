use crate::domain::idea::Idea;
use crate::error::GenerateError;

/// Slice from the first `[` to the last `]`, inclusive.
pub fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parses the idea list out of a raw model reply, ignoring any prose or code
/// fences around the array.
pub fn parse_ideas(text: &str) -> Result<Vec<Idea>, GenerateError> {
    let json = extract_json_array(text).ok_or_else(|| GenerateError::MalformedResponse {
        raw_output: text.to_string(),
    })?;
    serde_json::from_str::<Vec<Idea>>(json).map_err(|source| GenerateError::Deserialization {
        source,
        json: json.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_array_surrounded_by_prose() {
        let text = "Here you go:\n[{\"name\":\"Book\",\"price\":19.99}]\nEnjoy";
        assert_eq!(
            extract_json_array(text),
            Some("[{\"name\":\"Book\",\"price\":19.99}]")
        );

        let ideas = parse_ideas(text).unwrap();
        assert_eq!(
            ideas,
            vec![Idea {
                name: "Book".to_string(),
                price: 19.99
            }]
        );
    }

    #[test]
    fn strips_markdown_fences() {
        let text = "```json\n[\n  {\"name\": \"Plaid\", \"price\": 35.5},\n  {\"name\": \"Thé\", \"price\": 12}\n]\n```";
        let ideas = parse_ideas(text).unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].name, "Plaid");
        assert_eq!(ideas[1].name, "Thé");
        assert_eq!(ideas[1].price, 12.0);
    }

    #[test]
    fn keeps_model_order() {
        let text = r#"[{"name":"c","price":3},{"name":"a","price":1},{"name":"b","price":2}]"#;
        let names: Vec<_> = parse_ideas(text)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn missing_brackets_is_malformed() {
        for text in ["no json here", "only [ open", "only ] close", "] reversed ["] {
            assert!(
                matches!(parse_ideas(text), Err(GenerateError::MalformedResponse { .. })),
                "{text:?}"
            );
        }
    }

    #[test]
    fn invalid_json_inside_brackets_is_deserialization_error() {
        let text = "[{\"name\":\"Pen\" \"price\": oops}]";
        match parse_ideas(text) {
            Err(GenerateError::Deserialization { json, .. }) => assert_eq!(json, text),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn wrong_field_types_are_deserialization_errors() {
        let text = r#"[{"name":"Pen","price":"cheap"}]"#;
        assert!(matches!(
            parse_ideas(text),
            Err(GenerateError::Deserialization { .. })
        ));
    }

    #[test]
    fn negative_prices_are_not_rejected() {
        let ideas = parse_ideas(r#"[{"name":"Refund","price":-1.0}]"#).unwrap();
        assert_eq!(ideas[0].price, -1.0);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_ideas("[]").unwrap().is_empty());
    }
}
