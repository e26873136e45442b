//! Legacy (pre EIP-2718) transactions, with and without EIP-155 replay protection
use crate::address::Address;
use crate::constants::EIP155_V_OFFSET;
use crate::error::Error;
use crate::private_key::PrivateKey;
use crate::rlp::{decode, encode, RlpToken};
use crate::signature::Signature;
use crate::utils::{bytes_to_hex_str, keccak256, trim_leading_zero_bytes};
use num256::Uint256;
use num_traits::Zero;
use std::fmt;

/// The fields of a legacy transaction, the signature travels separately
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Transaction {
    /// Replay prevention counter, this must be the last nonce successfully on the
    /// chain plus one
    pub nonce: Uint256,
    /// The price of gas for this transaction, total spend will be price * limit with no
    /// refund for actual utilization
    pub gas_price: Uint256,
    /// The maximum amount of gas that can be used by this transaction
    pub gas_limit: Uint256,
    /// The destination address, `None` deploys the contract contained in `data`
    pub to: Option<Address>,
    /// The amount of Ether to send with this transaction
    pub value: Uint256,
    /// Encoded contract call or contract creation
    pub data: Vec<u8>,
    /// Chain the transaction is bound to, zero for an unprotected transaction
    pub chain_id: u64,
}

/// What [Transaction::parse_with] does when the sender can not be recovered
/// from an otherwise well formed signed transaction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecoveryMode {
    /// log the failure and return the transaction without `from` and `hash`
    #[default]
    BestEffort,
    /// return the recovery error
    Strict,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub recovery: RecoveryMode,
}

/// A transaction read back from its raw bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub transaction: Transaction,
    pub v: Option<Uint256>,
    pub r: Option<Uint256>,
    pub s: Option<Uint256>,
    /// Recovered sender
    pub from: Option<Address>,
    /// keccak256 of the raw bytes, set together with `from`
    pub hash: Option<[u8; 32]>,
}

impl ParsedTransaction {
    /// The signature carried by the transaction, if there is one that decodes
    pub fn signature(&self) -> Option<Signature> {
        match (self.v, self.r, self.s) {
            (Some(v), Some(r), Some(s)) => {
                Signature::from_v(v, r, s, self.transaction.chain_id).ok()
            }
            _ => None,
        }
    }
}

// the six fields shared by every form of the transaction
fn core_fields(tx: &Transaction) -> Vec<RlpToken> {
    vec![
        (&tx.nonce).into(),
        (&tx.gas_price).into(),
        (&tx.gas_limit).into(),
        tx.to.into(),
        (&tx.value).into(),
        RlpToken::String(tx.data.clone()),
    ]
}

// appends the EIP-155 [chain_id, "", ""] suffix to a set of core fields
fn with_chain_id(mut fields: Vec<RlpToken>, chain_id: u64) -> Vec<RlpToken> {
    if chain_id != 0 {
        fields.push(chain_id.into());
        fields.push(RlpToken::String(Vec::new()));
        fields.push(RlpToken::String(Vec::new()));
    }
    fields
}

impl Transaction {
    /// Serializes the transaction, without a signature this is the payload that
    /// gets hashed for signing: the six core fields followed by `[chain_id, "", ""]`
    /// when a chain id is set. With a signature the nine field form is produced.
    pub fn serialize(&self, signature: Option<&Signature>) -> Vec<u8> {
        let fields = match signature {
            None => with_chain_id(core_fields(self), self.chain_id),
            Some(sig) => {
                let r: [u8; 32] = sig.get_r().into();
                let s: [u8; 32] = sig.get_s().into();
                let mut fields = core_fields(self);
                fields.push(sig.get_v(self.chain_id).into());
                fields.push(trim_leading_zero_bytes(&r).into());
                fields.push(trim_leading_zero_bytes(&s).into());
                fields
            }
        };
        encode(&RlpToken::List(fields))
    }

    /// The digest a signer signs
    pub fn signing_hash(&self) -> [u8; 32] {
        keccak256(&self.serialize(None))
    }

    /// Signs the transaction and returns the raw signed bytes
    pub fn sign(&self, key: &PrivateKey) -> Result<Vec<u8>, Error> {
        let sig = key.sign_hash(&self.signing_hash())?;
        Ok(self.serialize(Some(&sig)))
    }

    /// The transaction hash of some raw signed bytes
    pub fn hash_of(raw: &[u8]) -> [u8; 32] {
        keccak256(raw)
    }

    /// Parses raw bytes with the default [ParseOptions]
    pub fn parse(raw: &[u8]) -> Result<ParsedTransaction, Error> {
        Transaction::parse_with(raw, ParseOptions::default())
    }

    /// Parses the 6 field unsigned form or the 9 field form, for a signed
    /// transaction the sender is recovered from the signature
    pub fn parse_with(raw: &[u8], options: ParseOptions) -> Result<ParsedTransaction, Error> {
        let decoded = decode(raw)?;
        let fields = decoded.get_list_content()?;
        if fields.len() != 6 && fields.len() != 9 {
            return Err(Error::InvalidTransactionLength(fields.len()));
        }

        let mut transaction = Transaction {
            nonce: read_number(&fields[0], "nonce")?,
            gas_price: read_number(&fields[1], "gasPrice")?,
            gas_limit: read_number(&fields[2], "gasLimit")?,
            to: read_address(&fields[3])?,
            value: read_number(&fields[4], "value")?,
            data: fields[5].get_byte_content()?.to_vec(),
            chain_id: 0,
        };
        if fields.len() == 6 {
            return Ok(ParsedTransaction {
                transaction,
                v: None,
                r: None,
                s: None,
                from: None,
                hash: None,
            });
        }

        let v = read_number(&fields[6], "v")?;
        let r = read_number(&fields[7], "r")?;
        let s = read_number(&fields[8], "s")?;

        if r.is_zero() && s.is_zero() {
            // EIP-155 signing payload, v carries the chain id
            transaction.chain_id = to_u64(v, "v")?;
            return Ok(ParsedTransaction {
                transaction,
                v: Some(Uint256::zero()),
                r: Some(r),
                s: Some(s),
                from: None,
                hash: None,
            });
        }

        let eip155_offset: Uint256 = EIP155_V_OFFSET.into();
        if v >= eip155_offset {
            transaction.chain_id = to_u64((v - eip155_offset) / 2u8.into(), "v")?;
        }

        // the digest is built from the fields as they were received
        let unsigned = with_chain_id(fields[..6].to_vec(), transaction.chain_id);
        let digest = keccak256(&encode(&RlpToken::List(unsigned)));

        let recovered = Signature::from_v(v, r, s, transaction.chain_id)
            .and_then(|sig| sig.recover(&digest));
        let (from, hash) = match recovered {
            Ok(address) => (Some(address), Some(keccak256(raw))),
            Err(e) => match options.recovery {
                RecoveryMode::Strict => return Err(e),
                RecoveryMode::BestEffort => {
                    warn!(
                        "Could not recover sender of transaction 0x{}: {}",
                        bytes_to_hex_str(&keccak256(raw)),
                        e
                    );
                    (None, None)
                }
            },
        };

        Ok(ParsedTransaction {
            transaction,
            v: Some(v),
            r: Some(r),
            s: Some(s),
            from,
            hash,
        })
    }
}

impl fmt::Display for Transaction {
    /// The unsigned serialization as `0x` hex
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", bytes_to_hex_str(&self.serialize(None)))
    }
}

fn read_number(token: &RlpToken, field: &'static str) -> Result<Uint256, Error> {
    let bytes = token.get_byte_content()?;
    if bytes.len() > 32 {
        return Err(Error::InvalidTransactionField(field));
    }
    Ok(Uint256::from_be_bytes(bytes))
}

fn read_address(token: &RlpToken) -> Result<Option<Address>, Error> {
    let bytes = token.get_byte_content()?;
    if bytes.is_empty() {
        return Ok(None);
    }
    if bytes.len() != 20 {
        return Err(Error::InvalidTransactionField("to"));
    }
    Ok(Some(Address::from_slice(bytes)?))
}

fn to_u64(value: Uint256, field: &'static str) -> Result<u64, Error> {
    crate::rlp::downcast_u64(value).map_err(|_| Error::InvalidTransactionField(field))
}
