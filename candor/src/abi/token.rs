use crate::address::Address;
use num256::Uint256;
use num_bigint::BigInt;

/// A value of a parameter of a contract call, event or return value
///
/// Tokens carry no width information, the [ParamType](super::ParamType) they are
/// encoded against decides how many bits a number may use or how long a fixed
/// bytes value must be.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiToken {
    /// Unsigned integer of any width up to 256 bits
    Uint(Uint256),
    /// Signed integer of any width up to 256 bits
    Int(BigInt),
    Address(Address),
    Bool(bool),
    String(String),
    /// Fixed size array of bytes, `bytesN`
    Bytes(Vec<u8>),
    /// Dynamic array of bytes, `bytes`
    UnboundedBytes(Vec<u8>),
    /// Dynamic array of tokens, `T[]`
    Dynamic(Vec<AbiToken>),
    /// Fixed size array of tokens, `T[N]`
    FixedArray(Vec<AbiToken>),
    /// A tuple, `(T1,T2,...)`
    Struct(Vec<AbiToken>),
}

impl AbiToken {
    /// Short name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AbiToken::Uint(_) => "uint",
            AbiToken::Int(_) => "int",
            AbiToken::Address(_) => "address",
            AbiToken::Bool(_) => "bool",
            AbiToken::String(_) => "string",
            AbiToken::Bytes(_) => "bytesN",
            AbiToken::UnboundedBytes(_) => "bytes",
            AbiToken::Dynamic(_) => "array",
            AbiToken::FixedArray(_) => "fixed array",
            AbiToken::Struct(_) => "tuple",
        }
    }

    pub fn to_uint(&self) -> Option<Uint256> {
        match self {
            AbiToken::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_int(&self) -> Option<BigInt> {
        match self {
            AbiToken::Int(v) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn to_address(&self) -> Option<Address> {
        match self {
            AbiToken::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            AbiToken::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiToken::String(s) => Some(s),
            _ => None,
        }
    }

    /// Contents of either bytes variant
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiToken::Bytes(b) | AbiToken::UnboundedBytes(b) => Some(b),
            _ => None,
        }
    }

    /// Members of an array, fixed array or tuple
    pub fn as_list(&self) -> Option<&[AbiToken]> {
        match self {
            AbiToken::Dynamic(v) | AbiToken::FixedArray(v) | AbiToken::Struct(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! uint_token {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AbiToken {
                fn from(v: $t) -> AbiToken {
                    AbiToken::Uint(v.into())
                }
            }
        )*
    };
}

macro_rules! int_token {
    ($($t:ty),*) => {
        $(
            impl From<$t> for AbiToken {
                fn from(v: $t) -> AbiToken {
                    AbiToken::Int(v.into())
                }
            }
        )*
    };
}

uint_token!(u8, u16, u32, u64, u128, Uint256);
int_token!(i8, i16, i32, i64, i128, BigInt);

impl From<&Uint256> for AbiToken {
    fn from(v: &Uint256) -> AbiToken {
        AbiToken::Uint(*v)
    }
}

impl From<bool> for AbiToken {
    fn from(v: bool) -> AbiToken {
        AbiToken::Bool(v)
    }
}

impl From<Address> for AbiToken {
    fn from(v: Address) -> AbiToken {
        AbiToken::Address(v)
    }
}

impl From<&Address> for AbiToken {
    fn from(v: &Address) -> AbiToken {
        AbiToken::Address(*v)
    }
}

impl From<String> for AbiToken {
    fn from(v: String) -> AbiToken {
        AbiToken::String(v)
    }
}

impl From<&str> for AbiToken {
    fn from(v: &str) -> AbiToken {
        AbiToken::String(v.to_string())
    }
}

impl From<Vec<u8>> for AbiToken {
    fn from(v: Vec<u8>) -> AbiToken {
        AbiToken::UnboundedBytes(v)
    }
}

impl From<&[u8]> for AbiToken {
    fn from(v: &[u8]) -> AbiToken {
        AbiToken::UnboundedBytes(v.to_vec())
    }
}

impl From<[u8; 32]> for AbiToken {
    fn from(v: [u8; 32]) -> AbiToken {
        AbiToken::Bytes(v.to_vec())
    }
}

impl From<Vec<Address>> for AbiToken {
    fn from(v: Vec<Address>) -> AbiToken {
        AbiToken::Dynamic(v.into_iter().map(AbiToken::Address).collect())
    }
}

impl From<&[Address]> for AbiToken {
    fn from(v: &[Address]) -> AbiToken {
        AbiToken::Dynamic(v.iter().map(|a| AbiToken::Address(*a)).collect())
    }
}

impl From<Vec<Uint256>> for AbiToken {
    fn from(v: Vec<Uint256>) -> AbiToken {
        AbiToken::Dynamic(v.into_iter().map(AbiToken::Uint).collect())
    }
}

impl From<Vec<AbiToken>> for AbiToken {
    fn from(v: Vec<AbiToken>) -> AbiToken {
        AbiToken::Dynamic(v)
    }
}

#[test]
fn conversions() {
    assert_eq!(AbiToken::from(5u8), AbiToken::Uint(5u8.into()));
    assert_eq!(AbiToken::from(-5i32), AbiToken::Int(BigInt::from(-5)));
    assert_eq!(AbiToken::from("hi"), AbiToken::String("hi".to_string()));
    assert_eq!(
        AbiToken::from(vec![1u8, 2]).as_bytes(),
        Some(&[1u8, 2][..])
    );
    let list: AbiToken = vec![Uint256::from(1u8), Uint256::from(2u8)].into();
    assert_eq!(list.as_list().map(|l| l.len()), Some(2));
    assert_eq!(AbiToken::Bool(true).to_uint(), None);
}
