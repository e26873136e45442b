//! Hex text boundary helpers and small byte utilities shared by the codecs
use crate::error::Error;
use sha3::{Digest, Keccak256};

/// A function that takes a hexadecimal representation of bytes
/// back into a stream of bytes. The `0x` prefix is optional and both
/// cases are accepted, an odd number of digits is rejected.
pub fn hex_str_to_bytes(s: &str) -> Result<Vec<u8>, Error> {
    let s = match s.strip_prefix("0x") {
        Some(s) => s,
        None => s,
    };
    if s.len() % 2 != 0 {
        return Err(Error::OddHexLength(s.len()));
    }
    s.as_bytes()
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            let high = hex_digit(pair[0]).ok_or(Error::InvalidHex(i * 2))?;
            let low = hex_digit(pair[1]).ok_or(Error::InvalidHex(i * 2 + 1))?;
            Ok((high << 4) | low)
        })
        .collect()
}

// ascii hex digits only, no signs or whitespace
fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Lowercase hex without a prefix
pub fn bytes_to_hex_str(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:0>2x?}"))
        .fold(String::new(), |acc, x| acc + &x)
}

/// Lowercase `0x` prefixed hex, the format used at every text boundary of the crate
pub fn bytes_to_data(bytes: &[u8]) -> String {
    let mut val = "0x".to_string();
    val.push_str(&bytes_to_hex_str(bytes));
    val
}

/// Trim leading zero bytes of a provided slice, an all zero input becomes empty
pub fn trim_leading_zero_bytes(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| *b != 0) {
        Some(i) => &bytes[i..],
        None => &[],
    }
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

/// Random byte strings of random length for the fuzz tests
#[cfg(test)]
pub fn get_fuzz_bytes(rng: &mut rand::rngs::ThreadRng) -> Vec<u8> {
    use rand::Rng;
    let range = 0..2000;
    let size: usize = rng.gen_range(range);
    let event_bytes: Vec<u8> = (0..size).map(|_| rng.gen()).collect();
    event_bytes
}

#[test]
fn decode_bytes() {
    assert_eq!(
        hex_str_to_bytes("deadbeef").expect("Unable to decode"),
        [222, 173, 190, 239]
    );
}

#[test]
fn decode_odd_amount_of_bytes() {
    let e = hex_str_to_bytes("f").unwrap_err();
    assert!(matches!(e, Error::OddHexLength(1)));
}

#[test]
fn bytes_raises_decode_error() {
    let e = hex_str_to_bytes("\u{012345}deadbeef").unwrap_err();

    match e {
        Error::InvalidHex(0) => {}
        _ => panic!(),
    };
}

#[test]
fn bytes_raises_parse_error() {
    let e = hex_str_to_bytes("Lorem ipsum!").unwrap_err();
    match e {
        Error::InvalidHex(_) => {}
        _ => panic!(),
    }
}

#[test]
fn bytes_rejects_signs() {
    // each pair would parse on its own as a signed radix 16 number
    assert!(matches!(
        hex_str_to_bytes("0x+1+2").unwrap_err(),
        Error::InvalidHex(0)
    ));
    assert!(matches!(
        hex_str_to_bytes("ff-1").unwrap_err(),
        Error::InvalidHex(2)
    ));
    assert!(hex_str_to_bytes(" 1").is_err());
}

#[test]
fn parse_prefixed_empty() {
    assert_eq!(hex_str_to_bytes("0x").unwrap(), Vec::<u8>::new());
}

#[test]
fn parse_prefixed_upper_case() {
    assert_eq!(
        hex_str_to_bytes("0xDEADbeef").unwrap(),
        vec![0xde, 0xad, 0xbe, 0xef]
    );
}

#[test]
fn encode_bytes() {
    assert_eq!(bytes_to_hex_str(&[0xf]), "0f".to_owned());
    assert_eq!(bytes_to_hex_str(&[0xff]), "ff".to_owned());
    assert_eq!(bytes_to_data(&[0xde, 0xad, 0xbe, 0xef]), "0xdeadbeef");
    assert_eq!(bytes_to_data(&[]), "0x");
}

#[test]
fn verify_trim() {
    assert_eq!(trim_leading_zero_bytes(&[0, 0, 1, 0]), &[1, 0]);
    assert!(trim_leading_zero_bytes(&[0, 0]).is_empty());
}

#[test]
fn hash_empty() {
    assert_eq!(
        bytes_to_hex_str(&keccak256(&[])),
        "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
    );
}
