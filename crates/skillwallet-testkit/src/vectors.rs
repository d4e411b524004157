//! Golden test vectors.
//!
//! Expected values were produced with an independent Keccak-256 and ABI
//! encoder. They pin the encoding the deployed contract expects: any change
//! here means records already on the ledger stop verifying.

use skillwallet_core::{Level, SkillRecord};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub custom_uid: &'static str,
    pub course_code: &'static str,
    pub course_title: &'static str,
    pub skills: &'static [(&'static str, u64)],
    pub level: &'static str,
    pub owner_id: &'static str,
    /// Normalized review time, seconds.
    pub reviewed_at: u64,
    pub reviewed_by: &'static str,
    pub school_id: &'static str,
    pub cid: &'static str,

    /// Length of `abi.encode` of the record.
    pub encoding_len: usize,
    /// Expected record hash (hex).
    pub record_hash: &'static str,
    /// Expected keys (hex) for `t = seconds`, `t = seconds * 1000`, `t = 0`.
    pub key_canonical: &'static str,
    pub key_ms: &'static str,
    pub key_zero: &'static str,
}

impl GoldenVector {
    /// The record this vector describes, `reviewedAt` as integer seconds.
    pub fn record(&self) -> SkillRecord {
        SkillRecord {
            custom_uid: self.custom_uid.to_string(),
            course_code: self.course_code.to_string(),
            course_title: self.course_title.to_string(),
            hard_skill_names: self.skills.iter().map(|(n, _)| n.to_string()).collect(),
            hard_skill_scores: self.skills.iter().map(|(_, s)| *s).collect(),
            level: Level::parse(self.level),
            owner_id: self.owner_id.to_string(),
            reviewed_at: Some((self.reviewed_at as i64).into()),
            reviewed_by: self.reviewed_by.to_string(),
            school_id: self.school_id.to_string(),
            cid: self.cid.to_string(),
        }
    }
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "two skills, intermediate",
            custom_uid: "test-student-123",
            course_code: "TEST101",
            course_title: "Test Course",
            skills: &[("Skill1", 4), ("Skill2", 5)],
            level: "Intermediate",
            owner_id: "test-student-123",
            reviewed_at: 1_700_000_000,
            reviewed_by: "test-teacher-456",
            school_id: "test-school",
            cid: "QmTestCID123",
            encoding_len: 1184,
            record_hash: "b637bc872885f8f29274969a7e4558eeba13cc7fa4c88bd025d8a61291fc397b",
            key_canonical: "4b50cd0daca557904b233f0107be7af01de92a0f4298b5f45402df4ec5692560",
            key_ms: "b109aee3f352198865d3ce0646010bdd0d5abd20e5e424469ba43c8a1c106e0b",
            key_zero: "0b8a3a3271fcd15675b792454462ee6039463bb68fea4ea71533cc1f8cc63029",
        },
        GoldenVector {
            name: "two skills, pairs rotated",
            custom_uid: "test-student-123",
            course_code: "TEST101",
            course_title: "Test Course",
            skills: &[("Skill2", 5), ("Skill1", 4)],
            level: "Intermediate",
            owner_id: "test-student-123",
            reviewed_at: 1_700_000_000,
            reviewed_by: "test-teacher-456",
            school_id: "test-school",
            cid: "QmTestCID123",
            encoding_len: 1184,
            record_hash: "c1f1effaca96f1508bc71d935530787d22721fda5fa2ddd42be5715f89d0b279",
            key_canonical: "4b50cd0daca557904b233f0107be7af01de92a0f4298b5f45402df4ec5692560",
            key_ms: "b109aee3f352198865d3ce0646010bdd0d5abd20e5e424469ba43c8a1c106e0b",
            key_zero: "0b8a3a3271fcd15675b792454462ee6039463bb68fea4ea71533cc1f8cc63029",
        },
        GoldenVector {
            name: "multibyte skill names, long cid",
            custom_uid: "T-3SMC5IMtuOfYU26KKK0v4l6T8e62",
            course_code: "IFB104",
            course_title: "Building IT Systems: an introduction to web development",
            skills: &[("HTML & CSS", 5), ("Python 数据处理", 3), ("Git", 4)],
            level: "Advanced",
            owner_id: "T-3SMC5IMtuOfYU26KKK0v4l6T8e62",
            reviewed_at: 1_718_000_000,
            reviewed_by: "teacher-qut-007",
            school_id: "qut",
            cid: "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi",
            encoding_len: 1376,
            record_hash: "ccc00bc6623553beced50c18cc604e41ae934c6342856a1a45c570f9ef38fde4",
            key_canonical: "022f0f7f9437363a0f77f13053665243fcdf8976a646885e65f175da22208a2a",
            key_ms: "ecf4bca68803af29cdb784c166e82d95d4dda16efe957cb54de0690e16ba528c",
            key_zero: "8a5272f2090a093f115e632cb45674f32d788393ad7b550e0f9d81bd7cf2c3ad",
        },
        GoldenVector {
            name: "all fields empty, zero timestamp",
            custom_uid: "",
            course_code: "",
            course_title: "",
            skills: &[],
            level: "",
            owner_id: "",
            reviewed_at: 0,
            reviewed_by: "",
            school_id: "",
            cid: "",
            encoding_len: 672,
            record_hash: "7dab95495cbf94af46979072966a7e68afae60947e3ad667406cea662b5ce167",
            key_canonical: "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563",
            key_ms: "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563",
            key_zero: "290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563",
        },
    ]
}
