//! Skill records: the approved review events the ledger attests to.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::canonical::record_hash;
use crate::error::ValidationError;
use crate::key::derive_record_key;
use crate::timestamp::{normalize, NormalizedTimestamp, RawTimestamp};
use crate::types::LedgerEntry;
use crate::validation::{parse_document, validate_record};

/// Course level as entered when the course was created.
///
/// Encoded as its exact string. Strings outside the known set are kept
/// verbatim so records written with them still verify.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
    /// Empty string.
    #[default]
    Unspecified,
    Unrecognized(String),
}

impl Level {
    /// Exact, case-sensitive match against the known levels.
    pub fn parse(s: &str) -> Self {
        match s {
            "Beginner" => Level::Beginner,
            "Intermediate" => Level::Intermediate,
            "Advanced" => Level::Advanced,
            "" => Level::Unspecified,
            other => Level::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
            Level::Unspecified => "",
            Level::Unrecognized(s) => s,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Level::Unrecognized(_))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Level::parse(&s))
    }
}

/// A reviewed skill event.
///
/// `hard_skill_names[i]` is scored by `hard_skill_scores[i]`. Neither the
/// writer nor the verifier ever reorders the pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRecord {
    #[serde(default)]
    pub custom_uid: String,
    #[serde(default)]
    pub course_code: String,
    #[serde(default)]
    pub course_title: String,
    #[serde(default)]
    pub hard_skill_names: Vec<String>,
    #[serde(default)]
    pub hard_skill_scores: Vec<u64>,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<RawTimestamp>,
    #[serde(default)]
    pub reviewed_by: String,
    #[serde(default)]
    pub school_id: String,
    #[serde(default)]
    pub cid: String,
}

impl SkillRecord {
    /// Start building a record for a student and course.
    pub fn builder(custom_uid: impl Into<String>, course_code: impl Into<String>) -> SkillRecordBuilder {
        SkillRecordBuilder::new(custom_uid, course_code)
    }

    /// Parse and validate a record document from the document store.
    pub fn from_document(doc: &serde_json::Value) -> Result<Self, ValidationError> {
        parse_document(doc)
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_record(self)
    }

    /// `reviewedAt` resolved to epoch seconds.
    pub fn normalized_reviewed_at(&self) -> NormalizedTimestamp {
        normalize(self.reviewed_at.as_ref())
    }

    /// `(name, score)` pairs in record order.
    pub fn skills(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.hard_skill_names
            .iter()
            .map(String::as_str)
            .zip(self.hard_skill_scores.iter().copied())
    }

    /// The entry the approval workflow writes for this record.
    ///
    /// Uses the same normalization and encoding as verification, keyed with
    /// the canonical seconds timestamp.
    pub fn ledger_entry(&self) -> Result<LedgerEntry, ValidationError> {
        self.validate()?;
        let reviewed_at = self.normalized_reviewed_at().seconds;
        let key = derive_record_key(&self.custom_uid, &self.course_code, u128::from(reviewed_at));
        Ok(LedgerEntry::new(key, record_hash(self, reviewed_at)))
    }
}

/// Builder for [`SkillRecord`]; skills are added as aligned pairs.
#[derive(Debug, Clone)]
pub struct SkillRecordBuilder {
    record: SkillRecord,
}

impl SkillRecordBuilder {
    /// Start a record. The owner defaults to the student.
    pub fn new(custom_uid: impl Into<String>, course_code: impl Into<String>) -> Self {
        let custom_uid = custom_uid.into();
        Self {
            record: SkillRecord {
                owner_id: custom_uid.clone(),
                custom_uid,
                course_code: course_code.into(),
                ..SkillRecord::default()
            },
        }
    }

    pub fn course_title(mut self, title: impl Into<String>) -> Self {
        self.record.course_title = title.into();
        self
    }

    /// Append one scored skill.
    pub fn skill(mut self, name: impl Into<String>, score: u64) -> Self {
        self.record.hard_skill_names.push(name.into());
        self.record.hard_skill_scores.push(score);
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.record.level = level;
        self
    }

    pub fn owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.record.owner_id = owner_id.into();
        self
    }

    pub fn reviewed_at(mut self, reviewed_at: impl Into<RawTimestamp>) -> Self {
        self.record.reviewed_at = Some(reviewed_at.into());
        self
    }

    pub fn reviewed_by(mut self, reviewer: impl Into<String>) -> Self {
        self.record.reviewed_by = reviewer.into();
        self
    }

    pub fn school_id(mut self, school_id: impl Into<String>) -> Self {
        self.record.school_id = school_id.into();
        self
    }

    pub fn cid(mut self, cid: impl Into<String>) -> Self {
        self.record.cid = cid.into();
        self
    }

    pub fn build(self) -> SkillRecord {
        self.record
    }
}
