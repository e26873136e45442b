//! Contract ABI head/tail encoding
//!
//! Every value takes one or more 32 byte words in the head of its enclosing
//! tuple. Dynamic values (`bytes`, `string`, `T[]` and anything containing them)
//! leave an offset in the head instead and are appended to the tail, the offset
//! being relative to the start of the enclosing tuple.
//!
//! https://docs.soliditylang.org/en/latest/abi-spec.html
use super::param_type::{ParamKind, ParamType};
use super::token::AbiToken;
use crate::address::Address;
use crate::error::Error;
use crate::utils::{bytes_to_data, hex_str_to_bytes};
use num256::Uint256;
use num_bigint::{BigInt, Sign};
use num_traits::{One, Signed};

const WORD: usize = 32;

/// Representation of a serialized token.
pub enum SerializedToken {
    /// This data can be placed directly in the head
    Static(Vec<u8>),
    /// This data goes to the tail, an offset to it is written in the head
    Dynamic(Vec<u8>),
}

fn usize_word(value: usize) -> [u8; 32] {
    let mut res = [0u8; 32];
    res[24..].copy_from_slice(&(value as u64).to_be_bytes());
    res
}

// data right padded to a multiple of the word size
fn padded(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    let rem = out.len() % WORD;
    if rem != 0 {
        out.resize(out.len() + WORD - rem, 0);
    }
    out
}

fn length_prefixed(data: &[u8]) -> Vec<u8> {
    let mut out = usize_word(data.len()).to_vec();
    out.extend(padded(data));
    out
}

fn numeric_value(ty: &ParamType, value: &AbiToken) -> Result<BigInt, Error> {
    match value {
        AbiToken::Uint(v) => Ok(BigInt::from_bytes_be(Sign::Plus, &v.to_be_bytes())),
        AbiToken::Int(v) => Ok(v.clone()),
        _ => Err(mismatch(ty, value)),
    }
}

fn numeric_fault(ty: &ParamType, value: &BigInt) -> Error {
    Error::NumericFault {
        ty: ty.canonical(),
        value: value.to_string(),
    }
}

fn mismatch(ty: &ParamType, value: &AbiToken) -> Error {
    Error::TokenMismatch {
        expected: ty.canonical(),
        got: value.type_name().to_string(),
    }
}

// two's complement big endian word of a value already known to fit in 256 bits
fn signed_word(value: &BigInt) -> Vec<u8> {
    let bytes = value.to_signed_bytes_be();
    let fill = if value.is_negative() { 0xff } else { 0x00 };
    let mut word = vec![fill; WORD];
    word[WORD - bytes.len()..].copy_from_slice(&bytes);
    word
}

fn encode_uint(ty: &ParamType, bits: usize, value: &AbiToken) -> Result<Vec<u8>, Error> {
    if let AbiToken::Uint(v) = value {
        if bits == 256 {
            return Ok(v.to_be_bytes().to_vec());
        }
    }
    let v = numeric_value(ty, value)?;
    if v.is_negative() || v.bits() > bits as u64 {
        return Err(numeric_fault(ty, &v));
    }
    let (_, magnitude) = v.to_bytes_be();
    let mut word = vec![0u8; WORD];
    word[WORD - magnitude.len()..].copy_from_slice(&magnitude);
    Ok(word)
}

fn encode_int(ty: &ParamType, bits: usize, value: &AbiToken) -> Result<Vec<u8>, Error> {
    let v = numeric_value(ty, value)?;
    let bound = BigInt::one() << (bits - 1);
    if v < -bound.clone() || v >= bound {
        return Err(numeric_fault(ty, &v));
    }
    Ok(signed_word(&v))
}

fn list_items<'a>(ty: &ParamType, value: &'a AbiToken) -> Result<&'a [AbiToken], Error> {
    match value {
        AbiToken::Dynamic(v) | AbiToken::FixedArray(v) => Ok(v),
        _ => Err(mismatch(ty, value)),
    }
}

fn check_len(ty: &ParamType, expected: usize, got: usize) -> Result<(), Error> {
    if expected != got {
        return Err(Error::InvalidArrayLength {
            ty: ty.canonical(),
            expected,
            got,
        });
    }
    Ok(())
}

/// Serializes a single value against its type
pub fn encode_value(ty: &ParamType, value: &AbiToken) -> Result<SerializedToken, Error> {
    let token = match ty.kind() {
        ParamKind::Uint(bits) => SerializedToken::Static(encode_uint(ty, *bits, value)?),
        ParamKind::Int(bits) => SerializedToken::Static(encode_int(ty, *bits, value)?),
        ParamKind::Bool => match value {
            AbiToken::Bool(b) => SerializedToken::Static(usize_word(*b as usize).to_vec()),
            _ => return Err(mismatch(ty, value)),
        },
        ParamKind::Address => match value {
            AbiToken::Address(a) => {
                let mut res = vec![0u8; 12];
                res.extend_from_slice(a.as_bytes());
                SerializedToken::Static(res)
            }
            _ => return Err(mismatch(ty, value)),
        },
        ParamKind::FixedBytes(size) => match value {
            AbiToken::Bytes(b) | AbiToken::UnboundedBytes(b) => {
                if b.len() != *size {
                    return Err(Error::InvalidFixedBytesLength {
                        ty: ty.canonical(),
                        got: b.len(),
                    });
                }
                SerializedToken::Static(padded(b))
            }
            _ => return Err(mismatch(ty, value)),
        },
        ParamKind::Bytes => match value {
            AbiToken::Bytes(b) | AbiToken::UnboundedBytes(b) => {
                SerializedToken::Dynamic(length_prefixed(b))
            }
            _ => return Err(mismatch(ty, value)),
        },
        ParamKind::String => match value {
            AbiToken::String(s) => SerializedToken::Dynamic(length_prefixed(s.as_bytes())),
            _ => return Err(mismatch(ty, value)),
        },
        ParamKind::Array(inner) => {
            let items = list_items(ty, value)?;
            let mut res = usize_word(items.len()).to_vec();
            res.extend(encode_sequence(
                std::iter::repeat(inner.as_ref()).take(items.len()),
                items,
            )?);
            SerializedToken::Dynamic(res)
        }
        ParamKind::FixedArray(inner, size) => {
            let items = list_items(ty, value)?;
            check_len(ty, *size, items.len())?;
            let res = encode_sequence(std::iter::repeat(inner.as_ref()).take(*size), items)?;
            if ty.is_dynamic() {
                SerializedToken::Dynamic(res)
            } else {
                SerializedToken::Static(res)
            }
        }
        ParamKind::Tuple(components) => {
            if components.is_empty() {
                return Err(empty_tuple(ty));
            }
            let items = match value {
                AbiToken::Struct(v) => v,
                _ => return Err(mismatch(ty, value)),
            };
            check_len(ty, components.len(), items.len())?;
            let res = encode_sequence(components.iter(), items)?;
            if ty.is_dynamic() {
                SerializedToken::Dynamic(res)
            } else {
                SerializedToken::Static(res)
            }
        }
    };
    Ok(token)
}

// head/tail layout of a tuple, the caller guarantees matching lengths
fn encode_sequence<'t>(
    types: impl Iterator<Item = &'t ParamType>,
    values: &[AbiToken],
) -> Result<Vec<u8>, Error> {
    let parts = types
        .zip(values)
        .map(|(ty, value)| encode_value(ty, value))
        .collect::<Result<Vec<_>, _>>()?;
    let head_len: usize = parts
        .iter()
        .map(|p| match p {
            SerializedToken::Static(data) => data.len(),
            SerializedToken::Dynamic(_) => WORD,
        })
        .sum();

    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for part in parts {
        match part {
            SerializedToken::Static(data) => head.extend(data),
            SerializedToken::Dynamic(data) => {
                head.extend(usize_word(head_len + tail.len()));
                tail.extend(data);
            }
        }
    }
    head.extend(tail);
    Ok(head)
}

/// Encodes `values` against `types` as a tuple, the form used for call
/// arguments, return values and event data
pub fn encode(types: &[ParamType], values: &[AbiToken]) -> Result<Vec<u8>, Error> {
    if values.len() < types.len() {
        return Err(Error::MissingArgument {
            expected: types.len(),
            got: values.len(),
        });
    }
    if values.len() > types.len() {
        return Err(Error::UnexpectedArgument {
            expected: types.len(),
            got: values.len(),
        });
    }
    encode_sequence(types.iter(), values)
}

/// [encode] returning `0x` prefixed hex
pub fn encode_hex(types: &[ParamType], values: &[AbiToken]) -> Result<String, Error> {
    Ok(bytes_to_data(&encode(types, values)?))
}

/// Limit on the bytes a decode may read, as a multiple of the input length.
/// Offsets may point any number of values at the same region, so the output of
/// nested arrays can otherwise grow exponentially in the input size.
const MAX_INFLATION: usize = 1024;

fn overrun(offset: usize, length: usize, data: &[u8]) -> Error {
    Error::BufferOverrun {
        offset,
        length,
        available: data.len(),
    }
}

fn empty_tuple(ty: &ParamType) -> Error {
    Error::InvalidAbiType(ty.canonical())
}

/// Bounds checked reader over untrusted data, every byte handed out counts
/// against the inflation budget
struct Decoder<'a> {
    data: &'a [u8],
    read: usize,
    limit: usize,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Decoder<'a> {
        Decoder {
            data,
            read: 0,
            limit: data.len().saturating_mul(MAX_INFLATION),
        }
    }

    fn check_bounds(&self, offset: usize, length: usize) -> Result<usize, Error> {
        match offset.checked_add(length) {
            Some(end) if end <= self.data.len() => Ok(end),
            _ => Err(overrun(offset, length, self.data)),
        }
    }

    fn read_bytes(&mut self, offset: usize, length: usize) -> Result<&'a [u8], Error> {
        let end = self.check_bounds(offset, length)?;
        self.read = self.read.saturating_add(length);
        if self.read > self.limit {
            return Err(overrun(offset, length, self.data));
        }
        let data = self.data;
        Ok(&data[offset..end])
    }

    fn read_word(&mut self, offset: usize) -> Result<&'a [u8], Error> {
        self.read_bytes(offset, WORD)
    }

    // a length or offset word, anything that can not address memory is an overrun
    fn read_usize(&mut self, offset: usize) -> Result<usize, Error> {
        let word = self.read_word(offset)?;
        if word[..24].iter().any(|b| *b != 0) {
            return Err(overrun(offset, usize::MAX, self.data));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&word[24..]);
        usize::try_from(u64::from_be_bytes(buf)).map_err(|_| overrun(offset, usize::MAX, self.data))
    }

    fn decode_value(&mut self, ty: &ParamType, offset: usize) -> Result<AbiToken, Error> {
        let token = match ty.kind() {
            ParamKind::Uint(bits) => {
                let word = self.read_word(offset)?;
                AbiToken::Uint(Uint256::from_be_bytes(&word[WORD - bits / 8..]))
            }
            ParamKind::Int(bits) => {
                let word = self.read_word(offset)?;
                AbiToken::Int(BigInt::from_signed_bytes_be(&word[WORD - bits / 8..]))
            }
            ParamKind::Bool => {
                let word = self.read_word(offset)?;
                AbiToken::Bool(word.iter().any(|b| *b != 0))
            }
            ParamKind::Address => {
                let word = self.read_word(offset)?;
                AbiToken::Address(Address::from_slice(&word[12..])?)
            }
            ParamKind::FixedBytes(size) => {
                let word = self.read_word(offset)?;
                AbiToken::Bytes(word[..*size].to_vec())
            }
            ParamKind::Bytes => {
                let len = self.read_usize(offset)?;
                AbiToken::UnboundedBytes(self.read_bytes(offset + WORD, len)?.to_vec())
            }
            ParamKind::String => {
                let len = self.read_usize(offset)?;
                let bytes = self.read_bytes(offset + WORD, len)?;
                AbiToken::String(String::from_utf8(bytes.to_vec())?)
            }
            ParamKind::Array(inner) => {
                let count = self.read_usize(offset)?;
                let start = offset + WORD;
                // refuse counts the data can not possibly hold before looping
                let min_len = inner.head_words().saturating_mul(WORD);
                self.check_bounds(start, count.saturating_mul(min_len))?;
                AbiToken::Dynamic(
                    self.decode_sequence(std::iter::repeat(inner.as_ref()).take(count), start)?,
                )
            }
            ParamKind::FixedArray(inner, size) => {
                let min_len = inner.head_words().saturating_mul(WORD);
                self.check_bounds(offset, size.saturating_mul(min_len))?;
                AbiToken::FixedArray(
                    self.decode_sequence(std::iter::repeat(inner.as_ref()).take(*size), offset)?,
                )
            }
            ParamKind::Tuple(components) => {
                if components.is_empty() {
                    return Err(empty_tuple(ty));
                }
                AbiToken::Struct(self.decode_sequence(components.iter(), offset)?)
            }
        };
        Ok(token)
    }

    // reads a tuple whose encoding starts at `base`
    fn decode_sequence<'t>(
        &mut self,
        types: impl Iterator<Item = &'t ParamType>,
        base: usize,
    ) -> Result<Vec<AbiToken>, Error> {
        let mut out = Vec::new();
        let mut head = base;
        for ty in types {
            if ty.is_dynamic() {
                let relative = self.read_usize(head)?;
                let start = base
                    .checked_add(relative)
                    .ok_or_else(|| overrun(head, usize::MAX, self.data))?;
                out.push(self.decode_value(ty, start)?);
                head += WORD;
            } else {
                out.push(self.decode_value(ty, head)?);
                head = head
                    .checked_add(ty.head_words().saturating_mul(WORD))
                    .ok_or_else(|| overrun(head, usize::MAX, self.data))?;
            }
        }
        Ok(out)
    }
}

/// Decodes `data` as a tuple of `types`. Every offset and length read from
/// the data is checked against its size, and the total amount read is capped
/// at a fixed multiple of that size, failing with a buffer overrun past it.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<AbiToken>, Error> {
    Decoder::new(data).decode_sequence(types.iter(), 0)
}

/// [decode] of `0x` prefixed hex
pub fn decode_hex(types: &[ParamType], data: &str) -> Result<Vec<AbiToken>, Error> {
    decode(types, &hex_str_to_bytes(data)?)
}
