//! Global context of Secp256k1
//!
//! Kept thread local so every thread pays the context setup cost once, on the
//! first key derivation, signature or recovery it performs.
use secp256k1::{All, Secp256k1};
use std::cell::RefCell;

thread_local! {
    pub(crate) static SECP256K1: RefCell<Secp256k1<All>> = RefCell::new(Secp256k1::new());
}
