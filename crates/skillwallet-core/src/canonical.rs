//! Canonical record encoding.
//!
//! The bytes hashed for a record are the `abi.encode` of its eleven fields in
//! the order the contract's `recordSkill` function declares them. The writer
//! sends the same token list as call arguments, so both sides encode from
//! [`record_tokens`].
//!
//! **This encoding is FROZEN.** Changing field order, types, or the handling
//! of absent values breaks verification of every record already written.

use crate::abi::{encode, encode_call, encode_packed, Token};
use crate::crypto::Keccak256Hash;
use crate::record::SkillRecord;

/// Write-side contract function.
pub const RECORD_SKILL_SIGNATURE: &str =
    "recordSkill(string,string,string,string[],uint256[],string,string,uint256,string,string,string)";

/// Read-side contract function returning `(bytes32[] keys, bytes32[] hashes)`.
pub const GET_ALL_SKILLS_SIGNATURE: &str = "getAllSkills()";

/// Field names and ABI types, in encoding order.
pub const RECORD_FIELDS: [(&str, &str); 11] = [
    ("customUid", "string"),
    ("courseCode", "string"),
    ("courseTitle", "string"),
    ("hardSkillNames", "string[]"),
    ("hardSkillScores", "uint256[]"),
    ("level", "string"),
    ("ownerId", "string"),
    ("reviewedAt", "uint256"),
    ("reviewedBy", "string"),
    ("schoolId", "string"),
    ("cid", "string"),
];

/// The record as ABI tokens, with `reviewed_at` already normalized to seconds.
pub fn record_tokens(record: &SkillRecord, reviewed_at: u64) -> Vec<Token> {
    vec![
        Token::String(record.custom_uid.clone()),
        Token::String(record.course_code.clone()),
        Token::String(record.course_title.clone()),
        Token::StringArray(record.hard_skill_names.clone()),
        Token::UintArray(record.hard_skill_scores.iter().map(|&s| u128::from(s)).collect()),
        Token::String(record.level.as_str().to_string()),
        Token::String(record.owner_id.clone()),
        Token::Uint(u128::from(reviewed_at)),
        Token::String(record.reviewed_by.clone()),
        Token::String(record.school_id.clone()),
        Token::String(record.cid.clone()),
    ]
}

/// `abi.encode` of the record fields.
pub fn canonical_record_bytes(record: &SkillRecord, reviewed_at: u64) -> Vec<u8> {
    encode(&record_tokens(record, reviewed_at))
}

/// Keccak-256 of [`canonical_record_bytes`].
pub fn record_hash(record: &SkillRecord, reviewed_at: u64) -> Keccak256Hash {
    Keccak256Hash::digest(&canonical_record_bytes(record, reviewed_at))
}

/// Calldata for `recordSkill` with the record's fields.
pub fn record_skill_calldata(record: &SkillRecord, reviewed_at: u64) -> Vec<u8> {
    encode_call(RECORD_SKILL_SIGNATURE, &record_tokens(record, reviewed_at))
}

/// `abi.encodePacked(string customUid, string courseCode, uint256 t)`.
pub fn record_key_preimage(custom_uid: &str, course_code: &str, t: u128) -> Vec<u8> {
    encode_packed(&[
        Token::String(custom_uid.to_string()),
        Token::String(course_code.to_string()),
        Token::Uint(t),
    ])
}
