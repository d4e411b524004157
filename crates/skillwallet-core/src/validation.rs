//! Record shape validation.
//!
//! Documents come from a schemaless store. Absent or `null` fields take
//! their empty defaults; a present field of the wrong JSON type is an error,
//! since encoding it as a default would hash something nobody wrote.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ValidationError;
use crate::record::{Level, SkillRecord};
use crate::timestamp::RawTimestamp;

/// Parse a record document, checking every field the encoding reads.
///
/// `hardSkillScores` is either an array parallel to `hardSkillNames` or, as
/// the review workflow stores it, an object keyed by skill name. The object
/// form is paired by name, so the scores follow `hardSkillNames` order.
pub fn parse_document(doc: &Value) -> Result<SkillRecord, ValidationError> {
    let map = doc.as_object().ok_or(ValidationError::NotAnObject)?;

    let level = Level::parse(&text(map, "level")?);
    if !level.is_recognized() {
        warn!(level = level.as_str(), "unrecognized course level, encoding verbatim");
    }

    let skill_names = names(map)?;
    let record = SkillRecord {
        custom_uid: text(map, "customUid")?,
        course_code: text(map, "courseCode")?,
        course_title: text(map, "courseTitle")?,
        hard_skill_scores: scores(map, &skill_names)?,
        hard_skill_names: skill_names,
        level,
        owner_id: text(map, "ownerId")?,
        reviewed_at: match map.get("reviewedAt") {
            None | Some(Value::Null) => None,
            Some(v) => Some(RawTimestamp::from_value(v)),
        },
        reviewed_by: text(map, "reviewedBy")?,
        school_id: text(map, "schoolId")?,
        cid: text(map, "cid")?,
    };

    validate_record(&record)?;
    Ok(record)
}

/// Structural invariants of a typed record.
pub fn validate_record(record: &SkillRecord) -> Result<(), ValidationError> {
    let names = record.hard_skill_names.len();
    let scores = record.hard_skill_scores.len();
    if names != scores {
        return Err(ValidationError::LengthMismatch { names, scores });
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn text(map: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ValidationError::FieldType {
            field,
            expected: "a string",
            found: json_kind(other),
        }),
    }
}

fn array<'a>(map: &'a Map<String, Value>, field: &'static str) -> Result<&'a [Value], ValidationError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(ValidationError::FieldType {
            field,
            expected: "an array",
            found: json_kind(other),
        }),
    }
}

fn names(map: &Map<String, Value>) -> Result<Vec<String>, ValidationError> {
    array(map, "hardSkillNames")?
        .iter()
        .enumerate()
        .map(|(index, v)| match v {
            Value::String(s) => Ok(s.clone()),
            other => Err(ValidationError::SkillName {
                index,
                found: json_kind(other),
            }),
        })
        .collect()
}

fn scores(map: &Map<String, Value>, names: &[String]) -> Result<Vec<u64>, ValidationError> {
    if let Some(Value::Object(by_name)) = map.get("hardSkillScores") {
        return scores_by_name(by_name, names);
    }
    array(map, "hardSkillScores")?
        .iter()
        .enumerate()
        .map(|(index, v)| entry_score(index, v))
        .collect()
}

fn scores_by_name(by_name: &Map<String, Value>, names: &[String]) -> Result<Vec<u64>, ValidationError> {
    if by_name.len() != names.len() {
        return Err(ValidationError::LengthMismatch {
            names: names.len(),
            scores: by_name.len(),
        });
    }
    names
        .iter()
        .enumerate()
        .map(|(index, name)| match by_name.get(name) {
            Some(v) => entry_score(index, v),
            None => Err(invalid_score(index, &format!("no score for skill `{}`", name))),
        })
        .collect()
}

/// A bare score or a `{ "score": .. }` entry.
fn entry_score(index: usize, value: &Value) -> Result<u64, ValidationError> {
    match value {
        Value::Object(obj) => match obj.get("score") {
            Some(inner) => score(index, inner),
            None => Err(invalid_score(index, "object without `score`")),
        },
        other => score(index, other),
    }
}

/// Scores are unsigned integers; fractions truncate toward zero.
fn score(index: usize, value: &Value) -> Result<u64, ValidationError> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Ok(u);
            }
            match n.as_f64() {
                Some(f) => truncate(index, f),
                None => Err(invalid_score(index, "not representable")),
            }
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(u) = s.parse::<u64>() {
                return Ok(u);
            }
            match s.parse::<f64>() {
                Ok(f) => truncate(index, f),
                Err(_) => Err(invalid_score(index, &format!("`{}` is not a number", s))),
            }
        }
        other => Err(invalid_score(index, json_kind(other))),
    }
}

fn truncate(index: usize, f: f64) -> Result<u64, ValidationError> {
    if !f.is_finite() {
        return Err(invalid_score(index, "not finite"));
    }
    let t = f.trunc();
    if t < 0.0 {
        return Err(invalid_score(index, "negative"));
    }
    if t >= u64::MAX as f64 {
        return Err(invalid_score(index, "too large"));
    }
    Ok(t as u64)
}

fn invalid_score(index: usize, reason: &str) -> ValidationError {
    ValidationError::InvalidScore {
        index,
        reason: reason.to_string(),
    }
}
