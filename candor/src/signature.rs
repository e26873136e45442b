use crate::address::Address;
use crate::constants::{secpk1n, EIP155_V_OFFSET, LEGACY_V_OFFSET};
use crate::context::SECP256K1;
use crate::error::Error;
use crate::utils::{bytes_to_hex_str, hex_str_to_bytes, keccak256};
use num256::Uint256;
use num_traits::Zero;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey};
use serde::de::{Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::fmt::{self, Display};
use std::str::FromStr;

/// A recoverable secp256k1 signature, `r` and `s` plus the recovery param
/// (the parity of the curve point, 0 or 1).
///
/// The `v` value that travels inside a transaction depends on the chain the
/// transaction is bound to and is derived on demand with [Signature::get_v].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    r: Uint256,
    s: Uint256,
    recovery_param: u8,
}

impl Signature {
    pub fn new(r: Uint256, s: Uint256, recovery_param: u8) -> Signature {
        Signature {
            r,
            s,
            recovery_param,
        }
    }

    /// Builds a signature out of a transaction `v` value, undoing the EIP-155
    /// chain id encoding when `chain_id` is not zero
    pub fn from_v(v: Uint256, r: Uint256, s: Uint256, chain_id: u64) -> Result<Signature, Error> {
        let offset: Uint256 = if chain_id == 0 {
            LEGACY_V_OFFSET.into()
        } else {
            Uint256::from(chain_id) * 2u8.into() + EIP155_V_OFFSET.into()
        };
        if v < offset {
            return Err(Error::InvalidV);
        }
        let recovery_param = v - offset;
        if recovery_param > 1u8.into() {
            return Err(Error::InvalidV);
        }
        Ok(Signature::new(r, s, recovery_param.to_be_bytes()[31]))
    }

    pub fn get_r(&self) -> Uint256 {
        self.r
    }

    pub fn get_s(&self) -> Uint256 {
        self.s
    }

    pub fn get_recovery_param(&self) -> u8 {
        self.recovery_param
    }

    /// Gets the v value, encoded with the chain id when it is not zero
    pub fn get_v(&self, chain_id: u64) -> Uint256 {
        let param = Uint256::from(self.recovery_param);
        if chain_id == 0 {
            param + LEGACY_V_OFFSET.into()
        } else {
            param + Uint256::from(chain_id) * 2u8.into() + EIP155_V_OFFSET.into()
        }
    }

    /// Like is_valid() but returns a reason
    pub fn error_check(&self) -> Result<(), Error> {
        if self.r >= secpk1n() || self.r == Uint256::zero() {
            return Err(Error::InvalidR);
        } else if self.s > secpk1n() / 2u8.into() || self.s == Uint256::zero() {
            return Err(Error::InvalidS);
        }
        if self.recovery_param > 1 {
            return Err(Error::InvalidV);
        }
        Ok(())
    }

    /// Range checks r and s, including the low-s rule
    pub fn is_valid(&self) -> bool {
        self.error_check().is_ok()
    }

    /// Joins the signature into the 65 byte `r || s || v` form, v being 27 or 28
    pub fn to_bytes(&self) -> [u8; 65] {
        let r: [u8; 32] = self.r.into();
        let s: [u8; 32] = self.s.into();
        let mut result = [0x00u8; 65];
        result[0..32].copy_from_slice(&r);
        result[32..64].copy_from_slice(&s);
        result[64] = self.recovery_param + LEGACY_V_OFFSET as u8;
        result
    }

    /// Splits a 65 byte `r || s || v` signature, v may be given as 0, 1, 27 or 28
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != 65 {
            return Err(Error::InvalidSignatureLength);
        }
        let r = Uint256::from_be_bytes(&bytes[0..32]);
        let s = Uint256::from_be_bytes(&bytes[32..64]);
        let recovery_param = match bytes[64] {
            0 | 27 => 0,
            1 | 28 => 1,
            _ => return Err(Error::InvalidV),
        };
        Ok(Signature::new(r, s, recovery_param))
    }

    /// Recover an address from a signature
    ///
    /// This can be called with any arbitrary signature, and a hashed message.
    pub fn recover(&self, hash: &[u8]) -> Result<Address, Error> {
        let v = match self.recovery_param {
            0 => RecoveryId::Zero,
            1 => RecoveryId::One,
            _ => return Err(Error::InvalidV),
        };
        let digest: [u8; 32] = hash
            .try_into()
            .map_err(|_| Error::InvalidHashLength(hash.len()))?;
        let msg = Message::from_digest(digest);
        let compact = RecoverableSignature::from_compact(&self.to_bytes()[..64], v)
            .map_err(Error::ParseRecoverableSignature)?;
        let pkey = SECP256K1.with(move |object| -> Result<_, Error> {
            let secp256k1 = object.borrow();
            let pkey = secp256k1
                .recover_ecdsa(&msg, &compact)
                .map_err(Error::RecoverSignature)?;
            Ok(pkey.serialize_uncompressed())
        })?;
        address_from_uncompressed(&pkey)
    }
}

/// Recovers the address that produced `signature` over a 32 byte digest
pub fn recover_address(digest: &[u8], signature: &Signature) -> Result<Address, Error> {
    signature.recover(digest)
}

/// Derives the address of a public key given in compressed (33 byte) or
/// uncompressed (65 byte) SEC1 form
pub fn compute_address(public_key: &[u8]) -> Result<Address, Error> {
    let key = PublicKey::from_slice(public_key).map_err(Error::InvalidPublicKey)?;
    address_from_uncompressed(&key.serialize_uncompressed())
}

// an address is the last 20 bytes of the hash of the 64 byte point
pub(crate) fn address_from_uncompressed(pkey: &[u8; 65]) -> Result<Address, Error> {
    if pkey[1..] == [0x00u8; 64][..] {
        return Err(Error::ZeroPrivKey);
    }
    let hash = keccak256(&pkey[1..]);
    Address::from_slice(&hash[12..])
}

impl Display for Signature {
    // 0x followed by 130 hex characters, r then s then v
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
    }
}

impl FromStr for Signature {
    type Err = Error;
    /// Constructs a signature back from a string representation
    ///
    /// The input string's length should be exactly 130 not including
    /// optional "0x" prefix at the beggining.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex_str_to_bytes(s)?;
        Signature::from_bytes(&bytes)
    }
}

impl fmt::LowerHex for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()))
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()))
        }
    }
}

impl fmt::UpperHex for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            write!(f, "0x{}", bytes_to_hex_str(&self.to_bytes()).to_uppercase())
        } else {
            write!(f, "{}", bytes_to_hex_str(&self.to_bytes()).to_uppercase())
        }
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Signature, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[test]
fn new_signature() {
    let sig = Signature::new(2u32.into(), 3u32.into(), 0);
    assert_eq!(sig.get_v(0), 27u8.into());
    assert_eq!(sig.get_r(), 2u32.into());
    assert_eq!(sig.get_s(), 3u32.into());
}

#[test]
fn v_with_chain_id() {
    let sig = Signature::new(2u32.into(), 3u32.into(), 1);
    assert_eq!(sig.get_v(0), 28u8.into());
    assert_eq!(sig.get_v(1), 38u8.into());
    assert_eq!(sig.get_v(3), 42u8.into());
    assert_eq!(
        Signature::from_v(38u8.into(), 2u32.into(), 3u32.into(), 1).unwrap(),
        sig
    );
    assert_eq!(
        Signature::from_v(28u8.into(), 2u32.into(), 3u32.into(), 0).unwrap(),
        sig
    );
    assert!(Signature::from_v(29u8.into(), 2u32.into(), 3u32.into(), 0).is_err());
    assert!(Signature::from_v(36u8.into(), 2u32.into(), 3u32.into(), 1).is_err());
}

#[test]
fn to_string() {
    let sig = Signature::new(2u32.into(), 3u32.into(), 1);
    let sig_string = sig.to_string();
    assert_eq!(
        sig_string,
        concat!(
            "0x",
            "0000000000000000000000000000000000000000000000000000000000000002",
            "0000000000000000000000000000000000000000000000000000000000000003",
            "1c"
        )
    );
    let new_sig = Signature::from_str(&sig_string).expect("Unable to parse signature");
    assert_eq!(sig, new_sig);

    // Without 0x
    let new_sig = Signature::from_str(&sig_string[2..]).expect("Unable to parse signature");
    assert_eq!(sig, new_sig);
}

#[test]
fn to_upper_hex() {
    let sig = Signature::new(65450u32.into(), 32456u32.into(), 1);
    assert_eq!(
        format!("{sig:#X}"),
        concat!(
            "0x",
            "000000000000000000000000000000000000000000000000000000000000FFAA",
            "0000000000000000000000000000000000000000000000000000000000007EC8",
            "1C"
        )
    );
    assert_eq!(
        format!("{sig:x}"),
        concat!(
            "000000000000000000000000000000000000000000000000000000000000ffaa",
            "0000000000000000000000000000000000000000000000000000000000007ec8",
            "1c"
        )
    );
}

#[test]
fn split_accepts_zero_one() {
    let mut bytes = Signature::new(2u32.into(), 3u32.into(), 1).to_bytes();
    bytes[64] = 1;
    assert_eq!(Signature::from_bytes(&bytes).unwrap().get_recovery_param(), 1);
    bytes[64] = 0;
    assert_eq!(Signature::from_bytes(&bytes).unwrap().get_recovery_param(), 0);
    bytes[64] = 29;
    assert!(matches!(Signature::from_bytes(&bytes), Err(Error::InvalidV)));
    assert!(matches!(
        Signature::from_bytes(&bytes[..64]),
        Err(Error::InvalidSignatureLength)
    ));
}

#[test]
fn range_checks() {
    assert!(!Signature::new(0u8.into(), 3u32.into(), 0).is_valid());
    assert!(!Signature::new(secpk1n(), 3u32.into(), 0).is_valid());
    // high s
    let high_s = secpk1n() - 1u8.into();
    assert!(matches!(
        Signature::new(2u32.into(), high_s, 0).error_check(),
        Err(Error::InvalidS)
    ));
    assert!(Signature::new(2u32.into(), 3u32.into(), 1).is_valid());
}

#[test]
#[should_panic]
fn parse_invalid_signature() {
    let _sig: Signature = "deadbeef".parse().unwrap();
}

#[test]
fn parse_hex_signature() {
    let sig: Signature = "0xe108a7776de6b87183b0690484a74daef44aa6daf907e91abaf7bbfa426ae7706b12e0bd44ef7b0634710d99c2d81087a2f39e075158212343a3b2948ecf33d01c".parse().unwrap();
    let correct_r =
        hex_str_to_bytes("0xe108a7776de6b87183b0690484a74daef44aa6daf907e91abaf7bbfa426ae770")
            .unwrap();
    let correct_s =
        hex_str_to_bytes("0x6b12e0bd44ef7b0634710d99c2d81087a2f39e075158212343a3b2948ecf33d0")
            .unwrap();

    assert_eq!(sig.get_r(), Uint256::from_be_bytes(&correct_r));
    assert_eq!(sig.get_s(), Uint256::from_be_bytes(&correct_s));
    assert_eq!(sig.get_recovery_param(), 1);
}

#[test]
fn generate_ethereum_signature() {
    use crate::PrivateKey;
    let private_key: PrivateKey =
        "0xc5e8f61d1ab959b397eecc0a37a6517b8e67a0e7cf1f4bce5591f3ed80199122"
            .parse()
            .unwrap();
    let address: Address = "0xc783df8a850f42e7F7e57013759C285caa701eB6"
        .parse()
        .unwrap();
    let checkpoint =
        hex_str_to_bytes("0x666f6f0000000000000000000000000000000000000000000000000000000000636865636b706f696e7400000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000a000000000000000000000000000000000000000000000000000000000000001200000000000000000000000000000000000000000000000000000000000000003000000000000000000000000c783df8a850f42e7f7e57013759c285caa701eb6000000000000000000000000ead9c93b79ae7c1591b1fb5323bd777e86e150d4000000000000000000000000e5904695748fe4a84b40b3fc79de2277660bd1d300000000000000000000000000000000000000000000000000000000000000030000000000000000000000000000000000000000000000000000000000000d050000000000000000000000000000000000000000000000000000000000000d050000000000000000000000000000000000000000000000000000000000000d05")
            .unwrap();
    let sig: Signature = "0xe108a7776de6b87183b0690484a74daef44aa6daf907e91abaf7bbfa426ae7706b12e0bd44ef7b0634710d99c2d81087a2f39e075158212343a3b2948ecf33d01c".parse().unwrap();

    assert_eq!(private_key.to_address(), address);

    let generated_sig = private_key.sign_ethereum_msg(&checkpoint).unwrap();
    assert_eq!(sig, generated_sig)
}

#[test]
fn address_of_public_key() {
    use crate::PrivateKey;
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();
    let public = key.public_key().unwrap();
    assert_eq!(compute_address(&public).unwrap(), key.to_address());
    let digest = keccak256(b"candor");
    let sig = key.sign_hash(&digest).unwrap();
    assert_eq!(recover_address(&digest, &sig).unwrap(), key.to_address());
    assert!(matches!(
        compute_address(&public[..10]),
        Err(Error::InvalidPublicKey(_))
    ));
    assert!(matches!(
        recover_address(&digest[..31], &sig),
        Err(Error::InvalidHashLength(31))
    ));
}
