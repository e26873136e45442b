use crate::address::Address;
use crate::context::SECP256K1;
use crate::error::Error;
use crate::signature::{address_from_uncompressed, Signature};
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes, keccak256};
use num256::Uint256;
use secp256k1::ecdsa::RecoveryId;
use secp256k1::{Message, PublicKey, SecretKey};
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

// the standard Ethereum message signing salt, used to prevent any signed message
// from ever being a valid transaction. This prevents situations where an application
// contrives a collision between the message you need to sign and a valid transaction that
// can be submitted to spend your funds.
pub const ETHEREUM_SALT: &str = "\x19Ethereum Signed Message:\n32";

/// Representation of an Ethereum private key.
///
/// Private key can be created using a textual representation,
/// a raw binary form using array of bytes. Keys are validated on construction
/// and the address is derived once.
///
/// With PrivateKey you are able to sign messages, derive
/// public keys. Cryptography-related methods use
/// SECP256K1 elliptic curves.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash)]
pub struct PrivateKey {
    key: [u8; 32],
    address: Address,
}

impl FromStr for PrivateKey {
    type Err = Error;

    /// Parse a textual representation of a private key back into PrivateKey type.
    ///
    /// It has to be a string that represents 64 characters that are hexadecimal
    /// representation of 32 bytes. Optionally this string can be prefixed with `0x`
    /// at the start.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.strip_prefix("0x") {
            Some(s) => s,
            None => s,
        };
        if s.len() != 64 {
            return Err(Error::InvalidPrivKeyLength {
                got: s.len(),
                expected: 64,
            });
        }
        PrivateKey::from_slice(&hex_str_to_bytes(s)?)
    }
}

impl TryFrom<[u8; 32]> for PrivateKey {
    type Error = Error;
    fn try_from(val: [u8; 32]) -> Result<PrivateKey, Error> {
        PrivateKey::from_bytes(val)
    }
}

impl PrivateKey {
    /// Convert a given slice of bytes into a valid private key.
    ///
    /// Input bytes are validated and an Error is returned if they are invalid
    pub fn from_bytes(bytes: [u8; 32]) -> Result<PrivateKey, Error> {
        let sk = SecretKey::from_slice(&bytes).map_err(Error::DecodePrivKey)?;
        let pkey = SECP256K1.with(move |object| {
            let secp256k1 = object.borrow();
            PublicKey::from_secret_key(&secp256k1, &sk).serialize_uncompressed()
        });
        Ok(PrivateKey {
            key: bytes,
            address: address_from_uncompressed(&pkey)?,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<PrivateKey, Error> {
        if bytes.len() != 32 {
            return Err(Error::InvalidPrivKeyLength {
                got: bytes.len(),
                expected: 32,
            });
        }
        let mut res = [0x0u8; 32];
        res.copy_from_slice(bytes);
        PrivateKey::from_bytes(res)
    }

    /// Get bytes back from a PrivateKey
    pub fn to_bytes(self) -> [u8; 32] {
        self.key
    }

    fn secret_key(&self) -> Result<SecretKey, Error> {
        SecretKey::from_slice(&self.key).map_err(Error::DecodePrivKey)
    }

    /// Get the address key for a given private key.
    ///
    /// This is well explained in the Ethereum Yellow Paper Appendix F.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use candor::PrivateKey;
    /// let private_key : PrivateKey = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f1e".parse().unwrap();
    /// let public_key = private_key.to_address();
    /// ```
    pub fn to_address(self) -> Address {
        self.address
    }

    /// The uncompressed 65 byte SEC1 public key
    pub fn public_key(&self) -> Result<[u8; 65], Error> {
        let sk = self.secret_key()?;
        Ok(SECP256K1.with(move |object| {
            let secp256k1 = object.borrow();
            PublicKey::from_secret_key(&secp256k1, &sk).serialize_uncompressed()
        }))
    }

    /// Signs a message that is represented by a hash contained in a binary form.
    ///
    /// Requires the data buffer to be exactly 32 bytes in length. You can prepare
    /// an input using a hashing function such as `Keccak256` which will return
    /// a buffer of exact size.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use candor::PrivateKey;
    /// # use candor::utils::keccak256;
    /// let private_key : PrivateKey = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f1e".parse().unwrap();
    /// let hash = keccak256("Hello, world!".as_bytes());
    /// let signature = private_key.sign_hash(&hash).unwrap();
    /// ```
    pub fn sign_hash(&self, data: &[u8]) -> Result<Signature, Error> {
        let sk = self.secret_key()?;
        let digest: [u8; 32] = data
            .try_into()
            .map_err(|_| Error::InvalidHashLength(data.len()))?;
        let msg = Message::from_digest(digest);
        let (recovery_id, compact) = SECP256K1.with(move |object| {
            let context = object.borrow();
            let sig = context.sign_ecdsa_recoverable(&msg, &sk);
            // 64 bytes of r and s, the parity comes back separately
            sig.serialize_compact()
        });
        let recovery_param = match recovery_id {
            RecoveryId::Zero => 0,
            RecoveryId::One => 1,
            // secp256k1 never produces the overflow ids for a low-s signature
            RecoveryId::Two | RecoveryId::Three => return Err(Error::InvalidV),
        };
        let r = Uint256::from_be_bytes(&compact[0..32]);
        let s = Uint256::from_be_bytes(&compact[32..64]);
        Ok(Signature::new(r, s, recovery_param))
    }

    /// Signs any message represented by a slice of data.
    ///
    /// This method is provided on the assumption you know what you are doing, it does not prevent signed messages
    /// from being possibly valid transactions. No Ethereum signed message salt is appended. Use with Caution!
    pub fn sign_insecure_msg(&self, data: &[u8]) -> Result<Signature, Error> {
        self.sign_hash(&keccak256(data))
    }

    /// Signs any message represented by a slice of data.
    ///
    /// Remember this function appends \x19Ethereum Signed Message:\n32 to your hash! so
    /// you may need to take that into account when you go to verify
    ///
    /// # Example
    ///
    /// ```rust
    /// # use candor::PrivateKey;
    /// let private_key : PrivateKey = "0102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f1e".parse().unwrap();
    /// let signature = private_key.sign_ethereum_msg("Hello, world!".as_bytes()).unwrap();
    /// ```
    pub fn sign_ethereum_msg(&self, data: &[u8]) -> Result<Signature, Error> {
        let digest = keccak256(data);
        let digest = keccak256(&[ETHEREUM_SALT.as_bytes(), &digest].concat());
        self.sign_hash(&digest)
    }
}

impl Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey({})", self.address)
    }
}

impl Serialize for PrivateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PrivateKey {
    fn deserialize<D>(deserializer: D) -> Result<PrivateKey, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::LowerHex for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()))
        }
    }
}

#[test]
#[should_panic]
fn too_short() {
    PrivateKey::from_str("abcdef").unwrap();
}

#[test]
#[should_panic]
fn invalid_data() {
    let key = "\u{012345}c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438";
    assert_eq!(key.len(), 64);
    PrivateKey::from_str(key).unwrap();
}

#[test]
fn zero_private_key() {
    // A key full of zeros is not on the curve
    assert!(matches!(
        PrivateKey::from_bytes([0u8; 32]),
        Err(Error::DecodePrivKey(_))
    ));
}

#[test]
fn parse_address_1() {
    // https://github.com/ethereum/tests/blob/b44cea1cccf1e4b63a05d1ca9f70f2063f28da6d/BasicTests/txtest.json
    let key: PrivateKey = "c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4"
        .parse()
        .unwrap();
    assert_eq!(key.to_bytes()[..4], [0xc8, 0x5e, 0xf7, 0xd7]);

    // geth account import <(echo c85ef7d79691fe79573b1a7064c19c1a9819ebdbd1faaab1a8ec92344438aaf4)
    assert_eq!(
        bytes_to_hex_str(key.to_address().as_bytes()),
        "cd2a3d9f938e13cd947ec05abc7fe734df8dd826"
    );
}

#[test]
fn parse_address_2() {
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();
    // geth account import <(echo c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0)
    assert_eq!(
        bytes_to_hex_str(key.to_address().as_bytes()),
        "13978aee95f38490e9769c39b2773ed763d9cd5f"
    );
}

#[test]
fn to_lower_hex() {
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();
    assert_eq!(
        format!("{key:x}"),
        "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
    );
    assert_eq!(
        format!("{key:#x}"),
        "0xc87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
    );
}

#[test]
fn sign_message() {
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();

    let hash = keccak256(b"Hello, world!");

    let sig = key.sign_hash(&hash).unwrap();
    assert_eq!(sig.get_recovery_param(), 0);
    assert_eq!(
        sig.get_r(),
        "60846573560682549108588594828362990367411621835316234394067988873897934296519"
            .parse()
            .unwrap()
    );
    assert_eq!(
        sig.get_s(),
        "38796436849307511461301231459196686786518980571289303247679628937607287361713"
            .parse()
            .unwrap()
    );
    assert!(sig.is_valid());

    let sig_2 = key.sign_insecure_msg(b"Hello, world!").unwrap();
    assert_eq!(sig, sig_2);

    // Recover address using just a signature
    let recovered = sig
        .recover(&hash)
        .expect("Unable to recover address from a signature");
    assert_eq!(recovered, key.to_address());
}

#[test]
fn sign_hash_wrong_length() {
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();
    assert!(matches!(
        key.sign_hash(&[1, 2, 3]),
        Err(Error::InvalidHashLength(3))
    ));
    assert!(matches!(
        key.sign_hash(&[0u8; 33]),
        Err(Error::InvalidHashLength(33))
    ));
}

#[test]
fn serialize_to_json() {
    let unsafe_key: PrivateKey = "0101010101010101010101010101010101010101010101010101010101010101"
        .parse()
        .unwrap();
    let j = serde_json::to_string(&unsafe_key).unwrap();
    assert_eq!(
        j,
        r#""0x0101010101010101010101010101010101010101010101010101010101010101""#
    );
    let recovered_key: PrivateKey = serde_json::from_str(&j).unwrap();
    assert_eq!(unsafe_key, recovered_key);
}

#[test]
fn test_salt() {
    assert_eq!(
        hex_str_to_bytes("0x19457468657265756d205369676e6564204d6573736167653a0a3332").unwrap(),
        ETHEREUM_SALT.as_bytes()
    );
}
