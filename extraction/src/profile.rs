//! Profile data model produced by extraction.

use serde::{Deserialize, Serialize};

/// Relationship goals stated or implied by a bio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipGoals {
    /// Looking for something casual.
    #[serde(rename = "casual")]
    Casual,
    /// Looking for a long-term relationship.
    #[serde(rename = "long-term")]
    LongTerm,
    /// Looking for friendship.
    #[serde(rename = "friendship")]
    Friendship,
    /// Nothing stated.
    #[serde(rename = "not specified", alias = "not-specified")]
    NotSpecified,
}

impl RelationshipGoals {
    /// Wire values accepted by the extraction schema.
    pub const VALUES: [&'static str; 4] = ["casual", "long-term", "friendship", "not specified"];
}

/// Communication style inferred from a bio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommunicationStyle {
    /// Straight to the point.
    #[serde(rename = "direct")]
    Direct,
    /// Jokes and playfulness.
    #[serde(rename = "humorous")]
    Humorous,
    /// Dry or ironic.
    #[serde(rename = "sarcastic")]
    Sarcastic,
    /// Polished, formal register.
    #[serde(rename = "formal")]
    Formal,
    /// Relaxed register.
    #[serde(rename = "casual")]
    Casual,
    /// Nothing to infer from.
    #[serde(rename = "not specified", alias = "not-specified")]
    NotSpecified,
}

impl CommunicationStyle {
    /// Wire values accepted by the extraction schema.
    pub const VALUES: [&'static str; 6] = [
        "direct",
        "humorous",
        "sarcastic",
        "formal",
        "casual",
        "not specified",
    ];
}

/// Overall sentiment of a bio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BioSentiment {
    /// Upbeat.
    Positive,
    /// Downbeat.
    Negative,
    /// Neither.
    Neutral,
    /// Both.
    Mixed,
}

impl BioSentiment {
    /// Wire values accepted by the extraction schema.
    pub const VALUES: [&'static str; 4] = ["positive", "negative", "neutral", "mixed"];
}

/// Structured information extracted from a single bio.
///
/// `interests`, `personality_traits`, `hobbies` and `bio_sentiment` are
/// required; every other field is left absent when the service omits it and is
/// skipped on serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedProfile {
    /// Interests mentioned in the bio.
    pub interests: Vec<String>,
    /// Personality traits inferred from the bio.
    pub personality_traits: Vec<String>,
    /// Hobbies mentioned or implied.
    pub hobbies: Vec<String>,
    /// Career or job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career: Option<String>,
    /// Educational background.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    /// Relationship goals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_goals: Option<RelationshipGoals>,
    /// Lifestyle choices or preferences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle: Option<Vec<String>>,
    /// Personal values or beliefs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    /// Communication style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_style: Option<CommunicationStyle>,
    /// Notable life experiences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notable_experiences: Option<Vec<String>>,
    /// Overall sentiment.
    pub bio_sentiment: BioSentiment,
}

/// An extracted profile tagged with the identifier of the row it came from.
///
/// Serializes flat: the profile fields followed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// The extracted fields.
    #[serde(flatten)]
    pub profile: ExtractedProfile,
    /// Identifier of the originating input row.
    pub id: String,
}

impl ProfileRecord {
    /// Attaches `id` to an extracted profile.
    #[must_use]
    pub fn new(id: impl Into<String>, profile: ExtractedProfile) -> Self {
        Self {
            profile,
            id: id.into(),
        }
    }
}
