//! # Introduction
//! Candor is a low-level Ethereum codec library written in pure Rust. It covers
//! the byte level formats a client has to get exactly right and nothing above
//! them: no transport, no keystores.
//!
//! ## Features
//! * RLP encoding and decoding with strict bounds checking
//! * Legacy and EIP-155 transaction signing, serialization and parsing with sender recovery
//! * Contract ABI type parsing from human readable signatures or the JSON ABI
//! * ABI head/tail encoding and decoding of every Solidity type, nested arrays and tuples included
//! * Function selectors, event topics and log decoding through [abi::Interface]
//!
//! ## Getting started
//! Here's an example lifetime of an ERC20 transfer made with Candor:
//! ```rust
//! use candor::abi::{AbiToken, Interface};
//! use candor::{Address, PrivateKey, Transaction};
//!
//! let erc20 = Interface::from_signatures(&[
//!     "function transfer(address to, uint256 amount) returns (bool)",
//!     "event Transfer(address indexed from, address indexed to, uint256 value)",
//! ])
//! .unwrap();
//!
//! let alice: PrivateKey = "c87509a1c067bbde78beb793e6fa76530b6382a4c0241e5e4a9ec0a0f44dc0d3"
//!     .parse()
//!     .unwrap();
//! let bob: Address = "0xFB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".parse().unwrap();
//! let token: Address = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed".parse().unwrap();
//!
//! let tx = Transaction {
//!     nonce: 0u32.into(),
//!     gas_price: 1_000_000_000u32.into(),
//!     gas_limit: 60_000u32.into(),
//!     to: Some(token),
//!     value: 0u32.into(),
//!     data: erc20
//!         .encode_function_data("transfer", &[bob.into(), 100u32.into()])
//!         .unwrap(),
//!     chain_id: 1,
//! };
//!
//! let raw = tx.sign(&alice).unwrap();
//!
//! // the sender is recovered from the signature
//! let parsed = Transaction::parse(&raw).unwrap();
//! assert_eq!(parsed.from, Some(alice.to_address()));
//! assert_eq!(parsed.transaction, tx);
//!
//! let call = erc20.decode_function_data(&parsed.transaction.data).unwrap();
//! assert_eq!(call.args[1], AbiToken::Uint(100u32.into()));
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

extern crate num_traits;
extern crate secp256k1;
extern crate serde;
extern crate sha3;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;
extern crate num256;

pub mod abi;
pub mod address;
pub mod constants;
mod context;
pub mod error;
pub mod private_key;
pub mod rlp;
pub mod signature;
pub mod transaction;
pub mod utils;

pub use address::Address;
pub use error::{Error, ErrorKind};
pub use num256::Uint256;
pub use private_key::PrivateKey;
pub use signature::Signature;
pub use transaction::{ParseOptions, ParsedTransaction, RecoveryMode, Transaction};
