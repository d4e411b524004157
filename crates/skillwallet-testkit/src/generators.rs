//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{json, Value};

use skillwallet_core::{Level, RawTimestamp, SkillRecord};

/// Review times between 2001 and 2033, in seconds.
pub fn review_seconds() -> impl Strategy<Value = i64> {
    1_000_000_000i64..2_000_000_000
}

/// A free-text field, including multibyte characters and the empty string.
pub fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[A-Za-z0-9 _-]{1,40}",
        "\\PC{1,24}",
    ]
}

pub fn level() -> impl Strategy<Value = Level> {
    prop_oneof![
        Just(Level::Beginner),
        Just(Level::Intermediate),
        Just(Level::Advanced),
        Just(Level::Unspecified),
        "[a-z]{1,12}".prop_map(|s| Level::parse(&s)),
    ]
}

/// Aligned `(name, score)` pairs.
pub fn skill_pairs(max_len: usize) -> impl Strategy<Value = Vec<(String, u64)>> {
    prop::collection::vec((text(), 0u64..=100), 0..=max_len)
}

/// Every raw form that should normalize to `seconds`.
pub fn raw_forms(seconds: i64) -> Vec<RawTimestamp> {
    vec![
        RawTimestamp::Integer(seconds),
        RawTimestamp::Integer(seconds * 1000),
        RawTimestamp::Text(seconds.to_string()),
        RawTimestamp::Text((seconds * 1000).to_string()),
        RawTimestamp::Timestamp {
            seconds,
            nanoseconds: 0,
        },
        RawTimestamp::Serialized {
            seconds,
            nanoseconds: 0,
        },
    ]
}

/// A raw `reviewedAt` of any supported form, with the seconds it encodes.
pub fn raw_timestamp() -> impl Strategy<Value = (RawTimestamp, i64)> {
    (review_seconds(), 0usize..6).prop_map(|(seconds, form)| (raw_forms(seconds).swap_remove(form), seconds))
}

/// A structurally valid record.
pub fn record() -> impl Strategy<Value = SkillRecord> {
    (
        "[A-Za-z0-9]{8,28}",
        "[A-Z]{3}[0-9]{3}",
        text(),
        skill_pairs(6),
        level(),
        (text(), raw_timestamp(), text(), text(), text()),
    )
        .prop_map(
            |(uid, course, title, skills, level, (reviewer, (raw, _), school, cid, owner))| {
                let (names, scores): (Vec<_>, Vec<_>) = skills.into_iter().unzip();
                SkillRecord {
                    owner_id: if owner.is_empty() { uid.clone() } else { owner },
                    custom_uid: uid,
                    course_code: course,
                    course_title: title,
                    hard_skill_names: names,
                    hard_skill_scores: scores,
                    level,
                    reviewed_at: Some(raw),
                    reviewed_by: reviewer,
                    school_id: school,
                    cid,
                }
            },
        )
}

/// The record as a document-store JSON object.
pub fn to_document(record: &SkillRecord) -> Value {
    json!({
        "customUid": record.custom_uid,
        "courseCode": record.course_code,
        "courseTitle": record.course_title,
        "hardSkillNames": record.hard_skill_names,
        "hardSkillScores": record.hard_skill_scores,
        "level": record.level.as_str(),
        "ownerId": record.owner_id,
        "reviewedAt": record.reviewed_at.as_ref().map(RawTimestamp::to_value).unwrap_or(Value::Null),
        "reviewedBy": record.reviewed_by,
        "schoolId": record.school_id,
        "cid": record.cid,
    })
}
