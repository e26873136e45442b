use crate::error::Error;
use crate::rlp::{encode, RlpToken};
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes, keccak256};
use num256::Uint256;
use serde::de::{Deserialize, Deserializer};
use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::str::FromStr;

/// Representation of an Ethereum address.
///
/// Address is usually derived from a `PrivateKey`, or converted from its
/// textual representation.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// Get raw bytes of the address.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; 20] {
        self.0
    }

    /// Creates an address from a slice that must be exactly 20 bytes long
    pub fn from_slice(data: &[u8]) -> Result<Address, Error> {
        if data.len() != 20 {
            return Err(Error::InvalidAddressLength {
                got: data.len(),
                expected: 20,
            });
        }
        let mut result: [u8; 20] = Default::default();
        result.copy_from_slice(data);
        Ok(Address(result))
    }

    /// Address of the contract created by a transaction sent from this address
    /// with the given nonce, the last 20 bytes of `keccak256(rlp([sender, nonce]))`
    pub fn contract_address(&self, nonce: Uint256) -> Address {
        let payload = encode(&RlpToken::List(vec![self.into(), nonce.into()]));
        let hash = keccak256(&payload);
        let mut result: [u8; 20] = Default::default();
        result.copy_from_slice(&hash[12..]);
        Address(result)
    }

    /// Renders the EIP-55 mixed case checksum form, without the `0x` prefix
    pub fn to_checksum_string(&self) -> String {
        let lower = bytes_to_hex_str(&self.0);
        let hash = keccak256(lower.as_bytes());
        lower
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let nibble = if i % 2 == 0 {
                    hash[i / 2] >> 4
                } else {
                    hash[i / 2] & 0x0f
                };
                if c.is_ascii_alphabetic() && nibble >= 8 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }
}

impl From<[u8; 20]> for Address {
    fn from(val: [u8; 20]) -> Address {
        Address(val)
    }
}

impl FromStr for Address {
    type Err = Error;

    /// Parses a string into a valid Ethereum address.
    ///
    /// # Supported formats
    ///
    /// * `0x` prefixed address
    /// * Raw bytes of an address represented by a bytes as an hexadecimal.
    ///
    /// Mixed case input must carry a valid EIP-55 checksum, all lower or all
    /// upper case input is accepted as is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use std::str::FromStr;
    /// use candor::Address;
    /// Address::from_str("0x0102030405060708090a0b0c0d0e0f1011121314").unwrap();
    /// let _address : Address = "14131211100f0e0d0c0b0a090807060504030201".parse().unwrap();
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.strip_prefix("0x") {
            Some(s) => s,
            None => s,
        };
        if s.len() != 40 {
            return Err(Error::InvalidAddressLength {
                got: s.len(),
                expected: 40,
            });
        }
        let address = Address::from_slice(&hex_str_to_bytes(s)?)?;

        let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && address.to_checksum_string() != s {
            return Err(Error::InvalidEip55);
        }
        Ok(address)
    }
}

impl fmt::Display for Address {
    /// Creates the checksummed, `0x` prefixed textual representation
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", self.to_checksum_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", self.to_checksum_string())
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.0))
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.0))
        }
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.0).to_uppercase())
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.0).to_uppercase())
        }
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[test]
#[should_panic]
fn decode_invalid_length() {
    "123".parse::<Address>().unwrap();
}

#[test]
#[should_panic]
fn decode_invalid_character() {
    "\u{012345}123456789012345678901234567890123456"
        .parse::<Address>()
        .unwrap();
}

#[test]
fn decode() {
    let address: Address = "1234567890123456789012345678901234567890"
        .parse::<Address>()
        .unwrap();

    assert_eq!(
        address,
        Address::from([
            0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78,
            0x90, 0x12, 0x34, 0x56, 0x78, 0x90
        ])
    );
}

#[test]
#[should_panic]
fn address_less_than_20_filler() {
    // Data found in AddressLessThan20Filler.json
    let _address: Address = "0b9331677e6ebf".parse().unwrap();
}

#[test]
fn eip55_vectors() {
    // https://eips.ethereum.org/EIPS/eip-55
    for checksummed in [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ] {
        let address: Address = checksummed.to_lowercase().parse().unwrap();
        assert_eq!(address.to_string(), checksummed);
        assert_eq!(checksummed.parse::<Address>().unwrap(), address);
    }
}

#[test]
fn bad_checksum() {
    let e = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAeD"
        .parse::<Address>()
        .unwrap_err();
    assert!(matches!(e, Error::InvalidEip55));
}

#[test]
fn rejects_signed_digits() {
    // 40 characters, but half of them are signs
    let e = "+1+2+3+4+5+6+7+8+9+a+b+c+d+e+f+1+2+3+4+5"
        .parse::<Address>()
        .unwrap_err();
    assert!(matches!(e, Error::InvalidHex(0)));
}

#[test]
fn ordered() {
    let a = Address::from_str("0x000000000000000000000000000000000000000a").unwrap();
    let b = Address::from_str("0x000000000000000000000000000000000000000b").unwrap();
    let c = Address::from_str("0x000000000000000000000000000000000000000c").unwrap();
    assert!(c > b);
    assert!(b > a);
    assert_ne!(a, c);
}

#[test]
fn to_hex() {
    let address: Address = "1234567890123456789abcdef678901234567890"
        .parse::<Address>()
        .unwrap();

    assert_eq!(
        format!("{address:x}"),
        "1234567890123456789abcdef678901234567890",
    );
    assert_eq!(
        format!("{address:#X}"),
        "0x1234567890123456789ABCDEF678901234567890",
    );
}

#[test]
fn contract_address() {
    // nonce 0 and 1 of a well known deployer
    let sender: Address = "0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0"
        .parse()
        .unwrap();
    assert_eq!(
        format!("{:#x}", sender.contract_address(0u8.into())),
        "0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"
    );
    assert_eq!(
        format!("{:#x}", sender.contract_address(1u8.into())),
        "0x343c43a37d37dff08ae8c4a11544c718abb4fcf8"
    );
}

#[test]
fn serde_round_trip() {
    let address: Address = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
        .parse()
        .unwrap();
    let j = serde_json::to_string(&address).unwrap();
    assert_eq!(j, r#""0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed""#);
    let back: Address = serde_json::from_str(&j).unwrap();
    assert_eq!(address, back);
}
