//! Contract ABI support
//!
//! Types are parsed out of signatures or the JSON ABI into [ParamType] trees,
//! values are [AbiToken]s and the [coder] lays them out in the head/tail form
//! contracts expect. An [Interface] ties functions and events to their
//! selectors and topics.
mod coder;
mod interface;
mod json;
mod param_type;
mod signature;
mod token;

pub use coder::{decode, decode_hex, encode, encode_hex, encode_value, SerializedToken};
pub use interface::{CallDescription, Indexed, Interface, LogDescription, LogValue};
pub use json::{Contract, Input, Item};
pub use param_type::{ParamKind, ParamType};
pub use signature::{parse_signature, Fragment, FragmentKind, StateMutability};
pub use token::AbiToken;

use crate::error::Error;

/// Selector of a function signature such as `transfer(address,uint256)`,
/// parameter names and whitespace are allowed and ignored
pub fn derive_method_id(signature: &str) -> Result<[u8; 4], Error> {
    Ok(parse_signature(signature)?.selector())
}

/// Full Keccak256 hash of the canonical form of `signature`, the topic of an
/// event with that signature
pub fn derive_signature(signature: &str) -> Result<[u8; 32], Error> {
    Ok(parse_signature(signature)?.topic())
}

/// Call data for a single function given by its signature, without building
/// an [Interface] first
pub fn encode_call(sig: &str, tokens: &[AbiToken]) -> Result<Vec<u8>, Error> {
    let fragment = parse_signature(sig)?;
    let mut wtr = fragment.selector().to_vec();
    wtr.extend(encode(fragment.inputs(), tokens)?);
    Ok(wtr)
}

#[test]
fn derive_baz() {
    use crate::utils::bytes_to_hex_str;
    assert_eq!(
        bytes_to_hex_str(&derive_method_id("baz(uint32,bool)").unwrap()),
        "cdcd77c0"
    );
}

#[test]
fn derive_bar() {
    use crate::utils::bytes_to_hex_str;
    assert_eq!(
        bytes_to_hex_str(&derive_method_id("bar(bytes3[2])").unwrap()),
        "fce353f6"
    );
}

#[test]
fn derive_sam() {
    use crate::utils::bytes_to_hex_str;
    assert_eq!(
        bytes_to_hex_str(&derive_method_id("sam(bytes,bool,uint256[])").unwrap()),
        "a5643bf2"
    );
}

#[test]
fn derive_f() {
    use crate::utils::bytes_to_hex_str;
    assert_eq!(
        bytes_to_hex_str(&derive_method_id("f(uint256,uint32[],bytes10,bytes)").unwrap()),
        "8be65246"
    );
}

#[test]
fn derive_with_names() {
    assert_eq!(
        derive_method_id("function balanceOf(address owner) view returns (uint256)").unwrap(),
        [0x70, 0xa0, 0x82, 0x31]
    );
    assert!(derive_method_id("balanceOf(address").is_err());
}

#[test]
fn encode_call_baz() {
    use crate::utils::bytes_to_hex_str;
    let result = encode_call("baz(uint32,bool)", &[69u32.into(), true.into()]).unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        concat!(
            "cdcd77c0",
            "0000000000000000000000000000000000000000000000000000000000000045",
            "0000000000000000000000000000000000000000000000000000000000000001"
        )
    );
}

#[test]
fn encode_call_sam() {
    use crate::utils::bytes_to_hex_str;
    let result = encode_call(
        "sam(bytes,bool,uint256[])",
        &[
            "dave".as_bytes().into(),
            true.into(),
            AbiToken::Dynamic(vec![1u8.into(), 2u8.into(), 3u8.into()]),
        ],
    )
    .unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        concat!(
            "a5643bf2",
            "0000000000000000000000000000000000000000000000000000000000000060",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "00000000000000000000000000000000000000000000000000000000000000a0",
            "0000000000000000000000000000000000000000000000000000000000000004",
            "6461766500000000000000000000000000000000000000000000000000000000",
            "0000000000000000000000000000000000000000000000000000000000000003",
            "0000000000000000000000000000000000000000000000000000000000000001",
            "0000000000000000000000000000000000000000000000000000000000000002",
            "0000000000000000000000000000000000000000000000000000000000000003"
        )
    );
}

#[test]
fn encode_call_f() {
    use crate::utils::bytes_to_hex_str;
    let result = encode_call(
        "f(uint256,uint32[],bytes10,bytes)",
        &[
            0x123u32.into(),
            AbiToken::Dynamic(vec![0x456u32.into(), 0x789u32.into()]),
            AbiToken::Bytes(b"1234567890".to_vec()),
            "Hello, world!".as_bytes().into(),
        ],
    )
    .unwrap();
    assert_eq!(
        bytes_to_hex_str(&result),
        concat!(
            "8be65246",
            "0000000000000000000000000000000000000000000000000000000000000123",
            "0000000000000000000000000000000000000000000000000000000000000080",
            "3132333435363738393000000000000000000000000000000000000000000000",
            "00000000000000000000000000000000000000000000000000000000000000e0",
            "0000000000000000000000000000000000000000000000000000000000000002",
            "0000000000000000000000000000000000000000000000000000000000000456",
            "0000000000000000000000000000000000000000000000000000000000000789",
            "000000000000000000000000000000000000000000000000000000000000000d",
            "48656c6c6f2c20776f726c642100000000000000000000000000000000000000"
        )
    );
}
