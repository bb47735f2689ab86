//! The profile extraction schema and payload validation.

use serde_json::{json, Value};

use crate::profile::{BioSentiment, CommunicationStyle, RelationshipGoals};

/// Fields a payload must carry for the extraction to count as successful.
pub const REQUIRED_FIELDS: [&str; 4] = ["interests", "personality_traits", "hobbies", "bio_sentiment"];

fn string_list(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "string"},
        "description": description
    })
}

/// Builds the JSON Schema sent to the service as the extraction tool's parameters.
///
/// # Examples
///
/// ```
/// use bio_extract_core::extraction::profile_schema;
///
/// let schema = profile_schema();
/// assert_eq!(schema["properties"].as_object().unwrap().len(), 11);
/// assert_eq!(schema["required"][3], "bio_sentiment");
/// ```
#[must_use]
pub fn profile_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "interests": string_list("List of interests mentioned in the bio"),
            "personality_traits": string_list("Personality traits inferred from the bio"),
            "hobbies": string_list("Hobbies mentioned or implied in the bio"),
            "career": {
                "type": "string",
                "description": "Career or job mentioned in the bio"
            },
            "education": {
                "type": "string",
                "description": "Educational background mentioned in the bio"
            },
            "relationship_goals": {
                "type": "string",
                "enum": RelationshipGoals::VALUES,
                "description": "Relationship goals mentioned or implied in the bio"
            },
            "lifestyle": string_list("Lifestyle choices or preferences mentioned in the bio"),
            "values": string_list("Personal values or beliefs expressed in the bio"),
            "communication_style": {
                "type": "string",
                "enum": CommunicationStyle::VALUES,
                "description": "Communication style inferred from the bio"
            },
            "notable_experiences": string_list("Notable life experiences mentioned in the bio"),
            "bio_sentiment": {
                "type": "string",
                "enum": BioSentiment::VALUES,
                "description": "Overall sentiment of the bio"
            }
        },
        "required": REQUIRED_FIELDS
    })
}

/// Collect all validation errors of `payload` against `schema`.
///
/// Returns one formatted string per failure, with the instance path. An empty
/// vector means the payload is valid.
#[must_use]
pub fn validate_payload(schema: &Value, payload: &Value) -> Vec<String> {
    match jsonschema::Validator::new(schema) {
        Ok(validator) => validator
            .iter_errors(payload)
            .map(|error| format!("At path '{}': {}", error.instance_path, error))
            .collect(),
        Err(e) => vec![format!("Schema compilation error: {e}")],
    }
}

/// Removes top-level `null` members so they read as absent optional fields.
#[must_use]
pub fn drop_null_fields(payload: Value) -> Value {
    match payload {
        Value::Object(map) => Value::Object(map.into_iter().filter(|(_, v)| !v.is_null()).collect()),
        other => other,
    }
}
