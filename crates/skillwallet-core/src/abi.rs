//! Solidity ABI encoding for the SkillWallet contract.
//!
//! Only the types the contract uses are modelled:
//! - `uint256`, `bytes32` (static, one 32-byte word)
//! - `string`, `string[]`, `uint256[]`, `bytes32[]` (dynamic, head offset + tail)
//!
//! [`encode`] is `abi.encode`: one head word per token, dynamic tokens point
//! into the tail with a byte offset from the start of the encoding.
//! [`encode_packed`] is `abi.encodePacked`: no offsets, no length words,
//! strings unpadded.
//!
//! **This encoding is FROZEN by the deployed contract.** A one-byte drift
//! breaks verification of every record ever written.

use crate::crypto::Keccak256Hash;
use crate::error::CoreError;

/// ABI word size in bytes.
pub const WORD: usize = 32;

/// An ABI value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `uint256`. Values used by the contract fit in 128 bits.
    Uint(u128),
    /// `bytes32`
    FixedBytes32([u8; 32]),
    /// `string`
    String(String),
    /// `string[]`
    StringArray(Vec<String>),
    /// `uint256[]`
    UintArray(Vec<u128>),
    /// `bytes32[]`
    FixedBytes32Array(Vec<[u8; 32]>),
}

impl Token {
    /// Whether the token is encoded in the tail.
    pub fn is_dynamic(&self) -> bool {
        !matches!(self, Token::Uint(_) | Token::FixedBytes32(_))
    }

    /// The Solidity type name, as it appears in function signatures.
    pub fn type_name(&self) -> &'static str {
        match self {
            Token::Uint(_) => "uint256",
            Token::FixedBytes32(_) => "bytes32",
            Token::String(_) => "string",
            Token::StringArray(_) => "string[]",
            Token::UintArray(_) => "uint256[]",
            Token::FixedBytes32Array(_) => "bytes32[]",
        }
    }
}

/// `abi.encode(tokens...)`.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Uint(n) => encode_uint(&mut head, *n),
            Token::FixedBytes32(b) => head.extend_from_slice(b),
            dynamic => {
                encode_uint(&mut head, (head_len + tail.len()) as u128);
                encode_tail(&mut tail, dynamic);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// `abi.encodePacked(tokens...)`.
///
/// Array elements of static type are padded to a full word; strings, alone
/// or inside arrays, are their raw UTF-8 bytes.
pub fn encode_packed(tokens: &[Token]) -> Vec<u8> {
    let mut buf = Vec::new();
    for token in tokens {
        match token {
            Token::Uint(n) => encode_uint(&mut buf, *n),
            Token::FixedBytes32(b) => buf.extend_from_slice(b),
            Token::String(s) => buf.extend_from_slice(s.as_bytes()),
            Token::StringArray(items) => {
                for s in items {
                    buf.extend_from_slice(s.as_bytes());
                }
            }
            Token::UintArray(items) => {
                for n in items {
                    encode_uint(&mut buf, *n);
                }
            }
            Token::FixedBytes32Array(items) => {
                for b in items {
                    buf.extend_from_slice(b);
                }
            }
        }
    }
    buf
}

/// First four bytes of `keccak256(signature)`.
pub fn function_selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256Hash::digest(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash.0[..4]);
    selector
}

/// Selector followed by the encoded arguments.
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut buf = function_selector(signature).to_vec();
    buf.extend_from_slice(&encode(tokens));
    buf
}

/// Write a big-endian `uint256` word.
fn encode_uint(buf: &mut Vec<u8>, n: u128) {
    buf.extend_from_slice(&[0u8; 16]);
    buf.extend_from_slice(&n.to_be_bytes());
}

/// Tail encoding of a token; static tokens are a single word.
fn encode_tail(buf: &mut Vec<u8>, token: &Token) {
    match token {
        Token::Uint(n) => encode_uint(buf, *n),
        Token::FixedBytes32(b) => buf.extend_from_slice(b),
        Token::String(s) => encode_string(buf, s),
        Token::StringArray(items) => encode_string_array(buf, items),
        Token::UintArray(items) => {
            encode_uint(buf, items.len() as u128);
            for n in items {
                encode_uint(buf, *n);
            }
        }
        Token::FixedBytes32Array(items) => {
            encode_uint(buf, items.len() as u128);
            for b in items {
                buf.extend_from_slice(b);
            }
        }
    }
}

/// Length word, then bytes right-padded with zeros to a word boundary.
fn encode_string(buf: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    encode_uint(buf, bytes.len() as u128);
    buf.extend_from_slice(bytes);
    let rem = bytes.len() % WORD;
    if rem != 0 {
        buf.resize(buf.len() + (WORD - rem), 0);
    }
}

/// Length word, one offset per element (relative to the first offset word),
/// then each element's string encoding.
fn encode_string_array(buf: &mut Vec<u8>, items: &[String]) {
    encode_uint(buf, items.len() as u128);

    let mut encoded = Vec::with_capacity(items.len());
    for s in items {
        let mut item = Vec::new();
        encode_string(&mut item, s);
        encoded.push(item);
    }

    let mut offset = items.len() * WORD;
    for item in &encoded {
        encode_uint(buf, offset as u128);
        offset += item.len();
    }
    for item in encoded {
        buf.extend_from_slice(&item);
    }
}

/// Decode the `(bytes32[], bytes32[])` return data of `getAllSkills()`.
///
/// Rejects truncated input, offsets outside the buffer and arrays of
/// different lengths.
pub fn decode_bytes32_array_pair(data: &[u8]) -> Result<(Vec<[u8; 32]>, Vec<[u8; 32]>), CoreError> {
    let first_offset = read_usize(data, 0)?;
    let second_offset = read_usize(data, WORD)?;

    let first = read_bytes32_array(data, first_offset)?;
    let second = read_bytes32_array(data, second_offset)?;

    if first.len() != second.len() {
        return Err(CoreError::DecodingError(format!(
            "array length mismatch: {} keys, {} hashes",
            first.len(),
            second.len()
        )));
    }

    Ok((first, second))
}

fn read_word(data: &[u8], at: usize) -> Result<&[u8], CoreError> {
    let end = at
        .checked_add(WORD)
        .ok_or_else(|| CoreError::DecodingError("offset overflow".into()))?;
    data.get(at..end).ok_or_else(|| {
        CoreError::DecodingError(format!("word at {} past end of {} bytes", at, data.len()))
    })
}

/// Read a word that must hold a small unsigned integer (offset or length).
fn read_usize(data: &[u8], at: usize) -> Result<usize, CoreError> {
    let word = read_word(data, at)?;
    let (high, low) = word.split_at(WORD - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(CoreError::DecodingError(format!("value at {} too large", at)));
    }
    let mut be = [0u8; 8];
    be.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(be))
        .map_err(|_| CoreError::DecodingError(format!("value at {} too large", at)))
}

fn read_bytes32_array(data: &[u8], offset: usize) -> Result<Vec<[u8; 32]>, CoreError> {
    let len = read_usize(data, offset)?;

    // Reject lengths that cannot fit before allocating.
    let needed = len
        .checked_mul(WORD)
        .and_then(|n| n.checked_add(offset + WORD))
        .ok_or_else(|| CoreError::DecodingError("array length overflow".into()))?;
    if needed > data.len() {
        return Err(CoreError::DecodingError(format!(
            "array of {} elements at {} exceeds {} bytes",
            len,
            offset,
            data.len()
        )));
    }

    let mut items = Vec::with_capacity(len);
    for i in 0..len {
        let word = read_word(data, offset + WORD + i * WORD)?;
        let mut item = [0u8; 32];
        item.copy_from_slice(word);
        items.push(item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(n: u128) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_uint(&mut buf, n);
        buf
    }

    #[test]
    fn test_uint_word() {
        let w = word(0x6553f100);
        assert_eq!(w.len(), 32);
        assert_eq!(&w[28..], &[0x65, 0x53, 0xf1, 0x00]);
        assert!(w[..28].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_single_string() {
        let out = encode(&[Token::String("hello".into())]);
        let mut expected = word(32);
        expected.extend(word(5));
        let mut data = b"hello".to_vec();
        data.resize(32, 0);
        expected.extend(data);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_empty_string_is_length_only() {
        let out = encode(&[Token::String(String::new())]);
        assert_eq!(out, [word(32), word(0)].concat());
    }

    #[test]
    fn test_string_exactly_one_word_not_padded() {
        let s = "a".repeat(32);
        let out = encode(&[Token::String(s.clone())]);
        assert_eq!(out.len(), 32 * 3);
        assert_eq!(&out[64..], s.as_bytes());
    }

    #[test]
    fn test_string_array_offsets() {
        let out = encode(&[Token::StringArray(vec!["ab".into(), "c".into()])]);
        let expected = [
            word(32), // offset of the array
            word(2),  // length
            word(64), // element 0, relative to the first offset word
            word(128), // element 1
            word(2),
            [b"ab".as_slice(), [0u8; 30].as_slice()].concat(),
            word(1),
            [b"c".as_slice(), [0u8; 31].as_slice()].concat(),
        ]
        .concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_mixed_head_offsets() {
        let out = encode(&[
            Token::String("x".into()),
            Token::Uint(7),
            Token::UintArray(vec![1, 2]),
        ]);
        // head: 3 words; "x" tail is 2 words
        assert_eq!(&out[..32], word(96).as_slice());
        assert_eq!(&out[32..64], word(7).as_slice());
        assert_eq!(&out[64..96], word(160).as_slice());
        assert_eq!(&out[160..], [word(2), word(1), word(2)].concat().as_slice());
    }

    #[test]
    fn test_packed_key_preimage_shape() {
        let out = encode_packed(&[
            Token::String("uid".into()),
            Token::String("C1".into()),
            Token::Uint(1),
        ]);
        assert_eq!(out.len(), 3 + 2 + 32);
        assert_eq!(&out[..5], b"uidC1");
        assert_eq!(out[36], 1);
    }

    #[test]
    fn test_selectors() {
        assert_eq!(hex::encode(function_selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(function_selector("getAllSkills()")), "ccc3bba8");
    }

    #[test]
    fn test_decode_pair() {
        let keys = vec![[0x11; 32], [0x22; 32]];
        let hashes = vec![[0xaa; 32], [0xbb; 32]];
        let data = encode(&[
            Token::FixedBytes32Array(keys.clone()),
            Token::FixedBytes32Array(hashes.clone()),
        ]);
        let (k, h) = decode_bytes32_array_pair(&data).unwrap();
        assert_eq!(k, keys);
        assert_eq!(h, hashes);
    }

    #[test]
    fn test_decode_empty_pair() {
        let data = [word(64), word(96), word(0), word(0)].concat();
        let (k, h) = decode_bytes32_array_pair(&data).unwrap();
        assert!(k.is_empty());
        assert!(h.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(decode_bytes32_array_pair(&[]).is_err());

        // Length claims more elements than present.
        let data = [word(64), word(96), word(5), word(0)].concat();
        assert!(decode_bytes32_array_pair(&data).is_err());

        // Offset past the end.
        let data = [word(4096), word(64), word(0)].concat();
        assert!(decode_bytes32_array_pair(&data).is_err());

        // Mismatched lengths.
        let data = encode(&[
            Token::FixedBytes32Array(vec![[1; 32]]),
            Token::FixedBytes32Array(vec![]),
        ]);
        assert!(decode_bytes32_array_pair(&data).is_err());

        // Huge length word.
        let mut huge = vec![0xff; 32];
        huge[0] = 0;
        let data = [word(64), word(96), huge, word(0)].concat();
        assert!(decode_bytes32_array_pair(&data).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn words() -> impl Strategy<Value = Vec<[u8; 32]>> {
            prop::collection::vec(any::<[u8; 32]>(), 0..16)
        }

        proptest! {
            #[test]
            fn test_getallskills_return_data_decodes(pairs in words().prop_flat_map(|keys| {
                let n = keys.len();
                (Just(keys), prop::collection::vec(any::<[u8; 32]>(), n))
            })) {
                let (keys, hashes) = pairs;
                let data = encode(&[
                    Token::FixedBytes32Array(keys.clone()),
                    Token::FixedBytes32Array(hashes.clone()),
                ]);
                prop_assert_eq!(data.len(), 32 * (4 + 2 * keys.len()));
                prop_assert_eq!(decode_bytes32_array_pair(&data).unwrap(), (keys, hashes));
            }

            #[test]
            fn test_truncated_return_data_rejected(keys in words(), cut in 1usize..64) {
                let data = encode(&[
                    Token::FixedBytes32Array(keys.clone()),
                    Token::FixedBytes32Array(keys),
                ]);
                let end = data.len().saturating_sub(cut);
                prop_assert!(decode_bytes32_array_pair(&data[..end]).is_err());
            }
        }
    }
}

