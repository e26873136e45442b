//! RLP encoder and decoder, transactions are encoded via rlp whereas contract calls are encoded with the Ethereum ABI
//! transactions include contract calls so this is the outer wrapper for any ABI encoded value
//!
//! https://ethereum.org/en/developers/docs/data-structures-and-encoding/rlp/
use crate::utils::trim_leading_zero_bytes;
use crate::{Address, Error};
use num256::Uint256;

const SHORT_STRING: u8 = 0x80;
const LONG_STRING: u8 = 0xb7;
const SHORT_LIST: u8 = 0xc0;
const LONG_LIST: u8 = 0xf7;
/// Payloads up to this length carry their length in the prefix byte
const MAX_SHORT_LEN: usize = 55;

/// Intermediate representation for RLP serialization and deserialization
///
/// There is no tag to tell a list holding a single empty string apart from the empty
/// string itself other than the position in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RlpToken {
    List(Vec<RlpToken>),
    /// conceptually a string is just an arbitrary set of data, integers are stored
    /// as their minimal big endian representation so zero is the empty string
    String(Vec<u8>),
}

impl RlpToken {
    /// Returns the byte content of the String variant
    /// returns an Error if the enum is the list variant
    pub fn get_byte_content(&self) -> Result<&[u8], Error> {
        match self {
            RlpToken::List(_) => Err(Error::DeserializeRlp),
            RlpToken::String(b) => Ok(b),
        }
    }

    /// Returns the list content of a List type RLP token, returns an Error
    /// for the String variant
    pub fn get_list_content(&self) -> Result<&[RlpToken], Error> {
        match self {
            RlpToken::List(v) => Ok(v),
            RlpToken::String(_) => Err(Error::DeserializeRlp),
        }
    }
}

impl From<Uint256> for RlpToken {
    fn from(value: Uint256) -> Self {
        RlpToken::String(trim_leading_zero_bytes(&value.to_be_bytes()).to_vec())
    }
}

impl From<&Uint256> for RlpToken {
    fn from(value: &Uint256) -> Self {
        (*value).into()
    }
}

impl From<u64> for RlpToken {
    fn from(value: u64) -> Self {
        RlpToken::String(trim_leading_zero_bytes(&value.to_be_bytes()).to_vec())
    }
}

impl From<&Address> for RlpToken {
    fn from(value: &Address) -> Self {
        RlpToken::String(value.as_bytes().to_vec())
    }
}

impl From<Option<Address>> for RlpToken {
    fn from(value: Option<Address>) -> Self {
        match value {
            Some(address) => (&address).into(),
            // contract creation
            None => RlpToken::String(Vec::new()),
        }
    }
}

impl From<Vec<u8>> for RlpToken {
    fn from(value: Vec<u8>) -> Self {
        RlpToken::String(value)
    }
}

impl From<&[u8]> for RlpToken {
    fn from(value: &[u8]) -> Self {
        RlpToken::String(value.to_vec())
    }
}

// writes the prefix for a payload of the given length using the short/long offsets
fn encode_length(len: usize, short_offset: u8, long_offset: u8, out: &mut Vec<u8>) {
    if len <= MAX_SHORT_LEN {
        out.push(short_offset + len as u8);
    } else {
        let len_bytes = len.to_be_bytes();
        let encoded_len = trim_leading_zero_bytes(&len_bytes);
        out.push(long_offset + encoded_len.len() as u8);
        out.extend_from_slice(encoded_len);
    }
}

fn encode_into(token: &RlpToken, out: &mut Vec<u8>) {
    match token {
        RlpToken::String(bytes) => {
            if bytes.len() == 1 && bytes[0] < SHORT_STRING {
                // a single low byte is its own encoding
                out.push(bytes[0]);
            } else {
                encode_length(bytes.len(), SHORT_STRING, LONG_STRING, out);
                out.extend_from_slice(bytes);
            }
        }
        RlpToken::List(list) => {
            let mut payload = Vec::new();
            for item in list {
                encode_into(item, &mut payload);
            }
            encode_length(payload.len(), SHORT_LIST, LONG_LIST, out);
            out.extend(payload);
        }
    }
}

/// Encodes a single RLP item, strings and lists of any depth
pub fn encode(token: &RlpToken) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(token, &mut out);
    out
}

/// Takes RLP token structs and packs the values into a single rlp
/// encoded byte array, one item after the other
pub fn pack_rlp(input: &[RlpToken]) -> Vec<u8> {
    let mut out = Vec::new();
    for token in input {
        encode_into(token, &mut out);
    }
    out
}

// bounds checked slice of the input
fn take(input: &[u8], start: usize, len: usize) -> Result<&[u8], Error> {
    let end = start.checked_add(len).ok_or(Error::RlpTooShort {
        needed: usize::MAX,
        available: input.len(),
    })?;
    if end > input.len() {
        return Err(Error::RlpTooShort {
            needed: end,
            available: input.len(),
        });
    }
    Ok(&input[start..end])
}

// reads a long form length of `len_of_len` bytes directly after the prefix byte
fn read_long_length(input: &[u8], len_of_len: usize) -> Result<usize, Error> {
    let len_bytes = take(input, 1, len_of_len)?;
    if len_bytes[0] == 0 {
        return Err(Error::RlpNonCanonical);
    }
    downcast(Uint256::from_be_bytes(len_bytes)).map_err(|_| Error::RlpTooShort {
        needed: usize::MAX,
        available: input.len(),
    })
}

/// Decodes the first RLP item found in the input, returning the item and the
/// number of bytes it consumed. Every length prefix is checked against the input
/// before it is used.
pub fn decode_item(input: &[u8]) -> Result<(RlpToken, usize), Error> {
    let prefix = match input.first() {
        Some(b) => *b,
        None => {
            return Err(Error::RlpTooShort {
                needed: 1,
                available: 0,
            })
        }
    };

    match prefix {
        d if d < SHORT_STRING => Ok((RlpToken::String(vec![d]), 1)),
        d if d <= LONG_STRING => {
            let len = (d - SHORT_STRING) as usize;
            let data = take(input, 1, len)?;
            Ok((RlpToken::String(data.to_vec()), 1 + len))
        }
        d if d < SHORT_LIST => {
            let len_of_len = (d - LONG_STRING) as usize;
            let len = read_long_length(input, len_of_len)?;
            let data = take(input, 1 + len_of_len, len)?;
            Ok((RlpToken::String(data.to_vec()), 1 + len_of_len + len))
        }
        d if d <= LONG_LIST => {
            let len = (d - SHORT_LIST) as usize;
            let payload = take(input, 1, len)?;
            Ok((RlpToken::List(decode_list_payload(payload)?), 1 + len))
        }
        d => {
            let len_of_len = (d - LONG_LIST) as usize;
            let len = read_long_length(input, len_of_len)?;
            let payload = take(input, 1 + len_of_len, len)?;
            Ok((
                RlpToken::List(decode_list_payload(payload)?),
                1 + len_of_len + len,
            ))
        }
    }
}

// children of a list must exactly fill the declared payload
fn decode_list_payload(mut payload: &[u8]) -> Result<Vec<RlpToken>, Error> {
    let mut out = Vec::new();
    while !payload.is_empty() {
        let (item, consumed) = decode_item(payload)?;
        out.push(item);
        payload = &payload[consumed..];
    }
    Ok(out)
}

/// Decodes exactly one RLP item, trailing bytes are an error
pub fn decode(input: &[u8]) -> Result<RlpToken, Error> {
    let (item, consumed) = decode_item(input)?;
    if consumed != input.len() {
        return Err(Error::RlpTrailingBytes(input.len() - consumed));
    }
    Ok(item)
}

/// Unpacks a stream of concatenated RLP items
pub fn unpack_rlp(mut input: &[u8]) -> Result<Vec<RlpToken>, Error> {
    if input.is_empty() {
        return Err(Error::RlpTooShort {
            needed: 1,
            available: 0,
        });
    }
    let mut out = Vec::new();
    while !input.is_empty() {
        let (item, consumed) = decode_item(input)?;
        out.push(item);
        input = &input[consumed..];
    }
    Ok(out)
}

/// Safely downcasts a Uint256 to system integer size, note that on systems with 32 bit integer size
/// this may return invalid for some otherwise valid RLP, but only in the case that the system doesn't have
/// enough memory to decode the value anyways.
pub fn downcast(input: Uint256) -> Result<usize, Error> {
    if input > usize::MAX.into() {
        Err(Error::DeserializeRlp)
    } else {
        const USIZE_BYTES: usize = (usize::BITS / 8) as usize;
        let bytes = input.to_le_bytes();
        let mut slice = [0; USIZE_BYTES];
        slice.copy_from_slice(&bytes[0..USIZE_BYTES]);
        Ok(usize::from_le_bytes(slice))
    }
}

/// Same as [downcast] for 64 bit values regardless of platform
pub fn downcast_u64(input: Uint256) -> Result<u64, Error> {
    if input > u64::MAX.into() {
        Err(Error::DeserializeRlp)
    } else {
        let bytes = input.to_le_bytes();
        let mut slice = [0; 8];
        slice.copy_from_slice(&bytes[0..8]);
        Ok(u64::from_le_bytes(slice))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::utils::{get_fuzz_bytes, hex_str_to_bytes};
    use rand::thread_rng;
    use std::time::{Duration, Instant};

    const FUZZ_TIME: Duration = Duration::from_secs(5);

    fn s(data: &[u8]) -> RlpToken {
        RlpToken::String(data.to_vec())
    }

    #[test]
    fn test_downcast() {
        assert_eq!(downcast(50u8.into()).unwrap(), 50);
        let max = Uint256::from(u32::MAX);
        #[cfg(target_pointer_width = "64")]
        assert_eq!(downcast(max + 1u8.into()).unwrap(), (u32::MAX as usize + 1));
        assert_eq!(downcast_u64(max).unwrap(), u32::MAX as u64);
        assert!(downcast_u64(Uint256::from(u64::MAX) + 1u8.into()).is_err());
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(encode(&Uint256::from(0u8).into()), vec![0x80]);
        assert_eq!(encode(&s(&[])), vec![0x80]);
        assert_eq!(encode(&RlpToken::List(vec![])), vec![0xc0]);
        for b in 0u8..0x80 {
            assert_eq!(encode(&s(&[b])), vec![b]);
        }
        assert_eq!(encode(&s(&[0x80])), vec![0x81, 0x80]);
        assert_eq!(encode(&Uint256::from(1024u32).into()), vec![0x82, 0x04, 0x00]);
        assert_eq!(encode(&15u64.into()), vec![0x0f]);
    }

    #[test]
    fn dog_and_cat() {
        assert_eq!(encode(&s(b"dog")), vec![0x83, b'd', b'o', b'g']);
        let list = RlpToken::List(vec![s(b"cat"), s(b"dog")]);
        let bytes = encode(&list);
        assert_eq!(
            bytes,
            vec![0xc8, 0x83, b'c', b'a', b't', 0x83, b'd', b'o', b'g']
        );
        assert_eq!(decode(&bytes).unwrap(), list);
    }

    #[test]
    fn long_string() {
        let lorem = b"Lorem ipsum dolor sit amet, consectetur adipisicing elit";
        let bytes = encode(&s(lorem));
        assert_eq!(bytes[0..2], [0xb8, 0x38]);
        assert_eq!(&bytes[2..], lorem);
        assert_eq!(decode(&bytes).unwrap(), s(lorem));
    }

    #[test]
    fn set_theoretical_representation() {
        // [ [], [[]], [ [], [[]] ] ]
        let empty = || RlpToken::List(vec![]);
        let tree = RlpToken::List(vec![
            empty(),
            RlpToken::List(vec![empty()]),
            RlpToken::List(vec![empty(), RlpToken::List(vec![empty()])]),
        ]);
        let bytes = encode(&tree);
        assert_eq!(
            bytes,
            hex_str_to_bytes("c7c0c1c0c3c0c1c0").unwrap()
        );
        assert_eq!(decode(&bytes).unwrap(), tree);
    }

    #[test]
    fn empty_string_vs_list_of_empty_string() {
        let a = s(&[]);
        let b = RlpToken::List(vec![s(&[])]);
        assert_eq!(decode(&encode(&a)).unwrap(), a);
        assert_eq!(decode(&encode(&b)).unwrap(), b);
        assert_ne!(encode(&a), encode(&b));
    }

    #[test]
    fn long_list_round_trip() {
        let items: Vec<RlpToken> = (0u64..100).map(|i| (i * 1000).into()).collect();
        let list = RlpToken::List(vec![RlpToken::List(items), s(&[0u8; 1024])]);
        let bytes = encode(&list);
        assert_eq!(bytes[0], 0xf9);
        let (decoded, consumed) = decode_item(&bytes).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(decoded, list);
    }

    #[test]
    fn malformed_inputs() {
        // empty
        assert_eq!(decode(&[]).unwrap_err().kind(), ErrorKind::BufferOverrun);
        // string claims 3 bytes, has 2
        assert_eq!(
            decode(&[0x83, 1, 2]).unwrap_err().kind(),
            ErrorKind::BufferOverrun
        );
        // long string with a length of length running off the end
        assert_eq!(decode(&[0xb9, 0x01]).unwrap_err().kind(), ErrorKind::BufferOverrun);
        // length of length with a leading zero
        let e = decode(&[0xb9, 0x00, 0x38]).unwrap_err();
        assert!(matches!(e, Error::RlpNonCanonical));
        let e = decode(&[0xf9, 0x00, 0x38]).unwrap_err();
        assert!(matches!(e, Error::RlpNonCanonical));
        // list child overruns the list payload
        assert_eq!(
            decode(&[0xc2, 0x83, b'a', b'b']).unwrap_err().kind(),
            ErrorKind::BufferOverrun
        );
        // trailing garbage
        assert!(matches!(
            decode(&[0x01, 0x02]).unwrap_err(),
            Error::RlpTrailingBytes(1)
        ));
        // absurd declared length
        assert_eq!(
            decode(&[0xbf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff])
                .unwrap_err()
                .kind(),
            ErrorKind::BufferOverrun
        );
    }

    #[test]
    fn stream_of_items() {
        let bytes = pack_rlp(&[s(b"cat"), RlpToken::List(vec![]), s(&[0x05])]);
        let items = unpack_rlp(&bytes).unwrap();
        assert_eq!(items, vec![s(b"cat"), RlpToken::List(vec![]), s(&[0x05])]);
    }

    #[test]
    fn fuzz_rlp_round_trip() {
        let start = Instant::now();
        let mut rng = thread_rng();
        while Instant::now() - start < FUZZ_TIME {
            let bytes = get_fuzz_bytes(&mut rng);
            // anything that decodes must re-encode to the same canonical bytes
            // unless it used a non minimal prefix
            if let Ok(item) = decode(&bytes) {
                assert_eq!(decode(&encode(&item)).unwrap(), item);
            }
        }
    }
}
