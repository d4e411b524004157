//! End-to-end verification scenarios against in-memory and SQLite ledgers.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;

use async_trait::async_trait;
use skillwallet::core::key::{derive_record_key, CANONICAL, LEGACY_MILLIS, ZERO};
use skillwallet::core::timestamp::normalize;
use skillwallet::core::record_hash;
use skillwallet::ledger::LedgerError;
use skillwallet::{
    ErrorKind, IntegrityVerifier, JsonFileRecordSource, LedgerReader, LookupMode, MemoryLedger, MemoryRecordSource,
    Keccak256Hash, LedgerEntry, Outcome, RawTimestamp, SkillRecord, SqliteLedger, TimestampSource, VerifierConfig,
    VerifyError,
};
use skillwallet_testkit::generators::{raw_forms, raw_timestamp, record as arb_record, to_document};
use skillwallet_testkit::{sample_record, FlakyLedger, LedgerFixture};

fn verifier(fixture: &LedgerFixture) -> IntegrityVerifier<MemoryLedger> {
    IntegrityVerifier::new(fixture.ledger.clone(), VerifierConfig::default().with_trace())
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn canonical_entry_verifies() {
    let fixture = LedgerFixture::new();
    fixture.write_noise(5);
    let record = sample_record();
    let entry = fixture.write(&record);

    let result = verifier(&fixture).verify(&record, "job-1").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.outcome(), Outcome::Verified);
    assert_eq!(result.matched_variant.as_deref(), Some(CANONICAL));
    assert_eq!(result.database_hash, entry.data_hash);
    assert_eq!(result.blockchain_hash, Some(entry.data_hash));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn verification_is_idempotent() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write(&record);
    let verifier = verifier(&fixture);

    let first = verifier.verify(&record, "job-1").await.unwrap();
    let second = verifier.verify(&record, "job-1").await.unwrap();
    assert_eq!(first.database_hash, second.database_hash);
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_entry_is_not_found() {
    let fixture = LedgerFixture::new();
    fixture.write_noise(3);

    let result = verifier(&fixture).verify(&sample_record(), "job-1").await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.error, Some(ErrorKind::RecordNotFound));
    assert_eq!(result.outcome(), Outcome::NotVerified);
    assert!(result.blockchain_hash.is_none());
    assert!(result.matched_variant.is_none());

    let trace = result.trace.unwrap();
    assert_eq!(trace.candidates.len(), 3);
    assert!(trace.candidates.iter().all(|c| c.found == Some(false)));
}

#[tokio::test]
async fn tampered_entry_is_mismatch() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    let tampered = fixture.write_tampered(&record);

    let result = verifier(&fixture).verify(&record, "job-1").await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.error, Some(ErrorKind::HashMismatch));
    assert_eq!(result.matched_variant.as_deref(), Some(CANONICAL));
    assert_eq!(result.blockchain_hash, Some(tampered.data_hash));
    assert_ne!(result.database_hash, tampered.data_hash);
    // Differs only in the last byte: the comparison is over all 32 bytes.
    assert_eq!(
        result.database_hash.as_bytes()[..31],
        tampered.data_hash.as_bytes()[..31]
    );
}

#[tokio::test]
async fn edited_record_is_mismatch() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write(&record);

    let mut edited = record.clone();
    edited.hard_skill_scores[0] += 1;

    let result = verifier(&fixture).verify(&edited, "job-1").await.unwrap();
    assert_eq!(result.error, Some(ErrorKind::HashMismatch));
}

// ─────────────────────────────────────────────────────────────────────────────
// Key variants
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn legacy_millis_key_falls_back() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write_legacy_millis(&record);

    let result = verifier(&fixture).verify(&record, "job-1").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.matched_variant.as_deref(), Some(LEGACY_MILLIS));

    let trace = result.trace.unwrap();
    assert_eq!(trace.candidates[0].found, Some(false));
    assert_eq!(trace.candidates[1].found, Some(true));
    assert_eq!(trace.candidates[2].found, None);
}

#[tokio::test]
async fn legacy_millis_entry_with_other_hash_is_mismatch() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    let seconds = record.normalized_reviewed_at().seconds;
    let mut other = *record_hash(&record, seconds).as_bytes();
    other[0] ^= 0xff;
    fixture
        .ledger
        .record(
            derive_record_key(&record.custom_uid, &record.course_code, u128::from(seconds) * 1000),
            Keccak256Hash::from_bytes(other),
        )
        .unwrap();

    let result = verifier(&fixture).verify(&record, "job-1").await.unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.outcome(), Outcome::NotVerified);
    assert_eq!(result.error, Some(ErrorKind::HashMismatch));
    assert_eq!(result.matched_variant.as_deref(), Some(LEGACY_MILLIS));
    assert_eq!(result.blockchain_hash, Some(Keccak256Hash::from_bytes(other)));
    assert_ne!(result.blockchain_hash, Some(result.database_hash));
}

#[tokio::test]
async fn zero_key_falls_back() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write_zero_key(&record);

    let result = verifier(&fixture).verify(&record, "job-1").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.matched_variant.as_deref(), Some(ZERO));
}

#[tokio::test]
async fn highest_priority_variant_wins() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    // Written later in ledger order, but lower priority.
    fixture.write_zero_key(&record);
    fixture.write_legacy_millis(&record);
    fixture.write(&record);

    for lookup in [LookupMode::Auto, LookupMode::Scan] {
        let verifier = IntegrityVerifier::new(
            fixture.ledger.clone(),
            VerifierConfig::default().with_lookup(lookup),
        );
        let result = verifier.verify(&record, "job-1").await.unwrap();
        assert_eq!(result.matched_variant.as_deref(), Some(CANONICAL), "{:?}", lookup);
    }
}

#[tokio::test]
async fn first_write_wins_for_repeated_key() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write_tampered(&record);
    fixture.write(&record);

    let result = verifier(&fixture).verify(&record, "job-1").await.unwrap();
    assert_eq!(result.error, Some(ErrorKind::HashMismatch));
}

#[tokio::test]
async fn missing_timestamp_matches_zero_key_as_canonical() {
    let fixture = LedgerFixture::new();
    let mut record = sample_record();
    record.reviewed_at = None;
    fixture.write(&record);

    let result = verifier(&fixture).verify(&record, "job-1").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.matched_variant.as_deref(), Some(CANONICAL));

    let trace = result.trace.unwrap();
    assert_eq!(trace.timestamp_source, TimestampSource::Missing);
    assert_eq!(trace.reviewed_at, 0);
    assert_eq!(trace.candidates.len(), 1);
}

#[tokio::test]
async fn stored_millis_verifies_against_seconds_entry() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write(&record);

    let mut stored = record.clone();
    stored.reviewed_at = Some(RawTimestamp::Integer(1_700_000_000_000));
    let result = verifier(&fixture).verify(&stored, "job-1").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(result.trace.unwrap().timestamp_source, TimestampSource::EpochMillis);
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalization and ordering
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn normalization_equalities() {
    for raw in raw_forms(1_700_000_000) {
        assert_eq!(normalize(Some(&raw)).seconds, 1_700_000_000, "{:?}", raw);
    }
    let n = normalize(Some(&RawTimestamp::Integer(1_700_000_000_000)));
    assert_eq!(n.seconds, 1_700_000_000);
    assert_eq!(n.source, TimestampSource::EpochMillis);
    assert_eq!(normalize(None).seconds, 0);
}

#[test]
fn rotated_pairs_change_hash() {
    let record = sample_record();
    let mut rotated = record.clone();
    rotated.hard_skill_names.rotate_left(1);
    rotated.hard_skill_scores.rotate_left(1);

    let a = record.ledger_entry().unwrap();
    let b = rotated.ledger_entry().unwrap();
    assert_eq!(a.record_key, b.record_key);
    assert_ne!(a.data_hash, b.data_hash);
}

proptest! {
    #[test]
    fn every_raw_form_normalizes_to_its_seconds((raw, seconds) in raw_timestamp()) {
        prop_assert_eq!(normalize(Some(&raw)).seconds, seconds as u64);
    }

    #[test]
    fn written_records_verify(record in arb_record()) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let fixture = LedgerFixture::new();
        fixture.write(&record);

        let result = runtime.block_on(verifier(&fixture).verify(&record, "p")).unwrap();
        prop_assert!(result.is_valid);
        prop_assert_eq!(result.matched_variant.as_deref(), Some(CANONICAL));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_record_does_no_ledger_io() {
    let flaky = Arc::new(FlakyLedger::new(MemoryLedger::new()));
    let verifier = IntegrityVerifier::new(flaky.clone(), VerifierConfig::default());

    let mut record = sample_record();
    record.hard_skill_scores.pop();
    let err = verifier.verify(&record, "job-1").await.unwrap_err();
    assert!(matches!(err, VerifyError::MalformedRecord(_)));

    let doc = json!({ "customUid": "s-1", "courseCode": ["CS101"] });
    let err = verifier.verify_document(&doc, "job-2").await.unwrap_err();
    assert!(matches!(err, VerifyError::MalformedRecord(_)));

    assert_eq!(flaky.reads(), 0);
}

/// A node answering for an address that holds no contract.
struct NoContractLedger;

#[async_trait]
impl LedgerReader for NoContractLedger {
    async fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        Err(LedgerError::InvalidData("empty return data from getAllSkills()".into()))
    }

    fn backend(&self) -> &'static str {
        "rpc"
    }
}

#[tokio::test]
async fn misconfigured_ledger_is_not_worded_as_retry() {
    let verifier = IntegrityVerifier::new(Arc::new(NoContractLedger), VerifierConfig::default());
    let result = verifier.verify(&sample_record(), "job-1").await.unwrap();

    assert_eq!(result.outcome(), Outcome::Unavailable);
    assert!(!result.message.contains("retry"), "{}", result.message);
    assert!(result.message.contains("empty return data"));
}

#[tokio::test]
async fn ledger_failure_is_unavailable() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write(&record);

    let flaky = Arc::new(FlakyLedger::new(MemoryLedger::from_entries(
        fixture.ledger.entries().await.unwrap(),
    )));
    flaky.set_failing(true);
    let verifier = IntegrityVerifier::new(flaky.clone(), VerifierConfig::default());

    let result = verifier.verify(&record, "job-1").await.unwrap();
    assert_eq!(result.outcome(), Outcome::Unavailable);
    assert_eq!(result.error, Some(ErrorKind::TransientIo));
    assert!(result.blockchain_hash.is_none());
    assert!(result.is_retryable());
    assert!(result.message.contains("retry later"));

    // Retry once the ledger is back.
    flaky.set_failing(false);
    let retried = verifier.verify(&record, "job-1").await.unwrap();
    assert_eq!(retried.outcome(), Outcome::Verified);
    assert_eq!(retried.database_hash, result.database_hash);
}

#[tokio::test]
async fn scan_reads_ledger_once() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write_zero_key(&record);

    let flaky = Arc::new(FlakyLedger::new(MemoryLedger::from_entries(
        fixture.ledger.entries().await.unwrap(),
    )).scan_only());
    let verifier = IntegrityVerifier::new(flaky.clone(), VerifierConfig::default());

    let result = verifier.verify(&record, "job-1").await.unwrap();
    assert_eq!(result.matched_variant.as_deref(), Some(ZERO));
    assert_eq!(flaky.reads(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Documents and sources
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn document_forms_verify() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write(&record);

    let mut doc = to_document(&record);
    doc["reviewedAt"] = json!({ "_seconds": 1_700_000_000, "_nanoseconds": 512_000_000 });
    doc["hardSkillScores"] = json!([{ "score": "4" }, 5.0]);

    let result = verifier(&fixture).verify_document(&doc, "job-1").await.unwrap();
    assert!(result.is_valid);
    assert_eq!(
        result.trace.unwrap().timestamp_source,
        TimestampSource::SerializedTimestamp
    );
}

#[tokio::test]
async fn verify_from_memory_source() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write(&record);

    let source: MemoryRecordSource = [("job-1".to_string(), to_document(&record))].into_iter().collect();
    let verifier = verifier(&fixture);

    let result = verifier.verify_from_source(&source, "job-1").await.unwrap();
    assert!(result.is_valid);

    let err = verifier.verify_from_source(&source, "job-9").await.unwrap_err();
    assert!(matches!(err, VerifyError::UnknownRecord(id) if id == "job-9"));
}

#[tokio::test]
async fn verify_from_json_file_source() {
    let fixture = LedgerFixture::new();
    let record = sample_record();
    fixture.write_legacy_millis(&record);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    std::fs::write(&path, json!({ "job-1": to_document(&record) }).to_string()).unwrap();
    let source = JsonFileRecordSource::open(&path).unwrap();

    let result = verifier(&fixture).verify_from_source(&source, "job-1").await.unwrap();
    assert_eq!(result.matched_variant.as_deref(), Some(LEGACY_MILLIS));
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite mirror
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn sqlite_mirror_matches_memory_ledger() {
    let fixture = LedgerFixture::new();
    fixture.write_noise(10);
    let verified = sample_record();
    fixture.write_legacy_millis(&verified);
    let mut tampered = sample_record();
    tampered.course_code = "TEST102".to_string();
    fixture.write_tampered(&tampered);
    let mut missing = sample_record();
    missing.custom_uid = "nobody".to_string();

    let dir = tempfile::tempdir().unwrap();
    let mirror = SqliteLedger::open(dir.path().join("mirror.db")).unwrap();
    mirror.mirror_from(fixture.ledger.as_ref()).await.unwrap();
    let mirror = Arc::new(mirror);

    for record in [&verified, &tampered, &missing] {
        let from_memory = verifier(&fixture).verify(record, "job").await.unwrap();
        for lookup in [LookupMode::Auto, LookupMode::Scan] {
            let from_mirror = IntegrityVerifier::new(mirror.clone(), VerifierConfig::default().with_lookup(lookup))
                .verify(record, "job")
                .await
                .unwrap();
            assert_eq!(from_mirror.outcome(), from_memory.outcome());
            assert_eq!(from_mirror.error, from_memory.error);
            assert_eq!(from_mirror.matched_variant, from_memory.matched_variant);
            assert_eq!(from_mirror.blockchain_hash, from_memory.blockchain_hash);
        }
    }
}

#[tokio::test]
async fn concurrent_verifications_are_independent() {
    let fixture = LedgerFixture::new();
    let records: Vec<SkillRecord> = (0..8)
        .map(|i| {
            let mut r = sample_record();
            r.custom_uid = format!("student-{}", i);
            r
        })
        .collect();
    for r in records.iter().step_by(2) {
        fixture.write(r);
    }

    let verifier = Arc::new(verifier(&fixture));
    let handles: Vec<_> = records
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let verifier = verifier.clone();
            tokio::spawn(async move { (i, verifier.verify(&r, "job").await.unwrap()) })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.await.unwrap();
        assert_eq!(result.is_valid, i % 2 == 0, "record {}", i);
    }
}
