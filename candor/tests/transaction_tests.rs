extern crate candor;
extern crate serde_json;
#[macro_use]
extern crate serde_derive;

use candor::utils::{bytes_to_hex_str, hex_str_to_bytes, keccak256};
use candor::{ErrorKind, ParseOptions, PrivateKey, RecoveryMode, Transaction, Uint256};
use env_logger::{Builder, Env};
use std::collections::HashMap;

/// Raw transactions from the Ethereum test suite and the EIP-155 document
const FIXTURES: &str = r#"{
    "eip155_example": {
        "txbytes": "0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83",
        "sender": "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f",
        "chainId": 1,
        "nonce": 9
    },
    "Vitalik_12": {
        "txbytes": "0xf8610e80830493e080809560f2ff61000080610011600039610011565b6000f31ca0a310f4d0b26207db76ba4e1e6e7cf1857ee3aa8559bcbc399a6b09bfea2d30b4a06dff38c645a1486651a717ddf3daccb4fd9a630871ecea0758ddfcf2774f9bc6",
        "sender": "0x874b54a8bd152966d63f706bae1ffeb0411921e5",
        "nonce": 14
    },
    "Vitalik_1": {
        "txbytes": "0xf864808504a817c800825208943535353535353535353535353535353535353535808025a0044852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116da0044852b2a670ade5407e78fb2863c51de9fcb96542a07186fe3aeda6bb8a116d",
        "chainId": 1
    },
    "eip155_unsigned": {
        "txbytes": "0xec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080",
        "chainId": 1,
        "nonce": 9
    },
    "seven_fields": {
        "txbytes": "0xc780808080808080",
        "exception": "INVALID_ARGUMENT"
    },
    "empty_list": {
        "txbytes": "0xc0",
        "exception": "INVALID_ARGUMENT"
    },
    "not_a_list": {
        "txbytes": "0x80",
        "exception": "INVALID_ARGUMENT"
    },
    "truncated": {
        "txbytes": "0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a7640000",
        "exception": "BUFFER_OVERRUN"
    }
}"#;

#[derive(Deserialize, Debug)]
struct TestFixture {
    txbytes: String,
    #[serde(default)]
    sender: Option<String>,
    #[serde(rename = "chainId", default)]
    chain_id: u64,
    #[serde(default)]
    nonce: u64,
    #[serde(default)]
    exception: Option<String>,
}

fn init_logging() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .try_init();
}

fn run_fixture(name: &str, fixture: &TestFixture) {
    let raw = hex_str_to_bytes(&fixture.txbytes).unwrap();
    let res = Transaction::parse_with(
        &raw,
        ParseOptions {
            recovery: RecoveryMode::Strict,
        },
    );

    let parsed = match (&fixture.exception, res) {
        (Some(expected), Err(e)) => {
            assert_eq!(&e.kind().to_string(), expected, "{name}: {e}");
            return;
        }
        (Some(expected), Ok(tx)) => panic!("{name}: expected {expected}, parsed {tx:?}"),
        (None, Err(e)) => panic!("{name}: {e}"),
        (None, Ok(tx)) => tx,
    };

    assert_eq!(parsed.transaction.chain_id, fixture.chain_id, "{name}");
    assert_eq!(parsed.transaction.nonce, Uint256::from(fixture.nonce), "{name}");
    if let Some(sender) = &fixture.sender {
        assert_eq!(
            format!("{:#x}", parsed.from.unwrap()),
            sender.to_lowercase(),
            "{name}"
        );
        assert_eq!(parsed.hash, Some(keccak256(&raw)), "{name}");
    }
    // anything signed serializes back to the exact same bytes
    if let Some(sig) = parsed.signature() {
        assert_eq!(
            bytes_to_hex_str(&parsed.transaction.serialize(Some(&sig))),
            &fixture.txbytes[2..],
            "{name}"
        );
    }
}

#[test]
fn transaction_fixtures() {
    init_logging();
    let fixtures: HashMap<String, TestFixture> = serde_json::from_str(FIXTURES).unwrap();
    assert_eq!(fixtures.len(), 8);
    for (name, fixture) in fixtures.iter() {
        run_fixture(name, fixture);
    }
}

#[test]
fn random_keys_round_trip() {
    init_logging();
    for chain_id in [0u64, 1, 10, 56, 42161] {
        let key_buf: [u8; 32] = rand::random();
        let key = match PrivateKey::from_bytes(key_buf) {
            Ok(key) => key,
            // out of range for the curve, vanishingly rare
            Err(_) => continue,
        };
        let to_buf: [u8; 32] = rand::random();
        let to = PrivateKey::from_bytes(to_buf).ok().map(|k| k.to_address());

        let tx = Transaction {
            nonce: rand::random::<u64>().into(),
            gas_price: rand::random::<u64>().into(),
            gas_limit: 21_000u32.into(),
            to,
            value: rand::random::<u128>().into(),
            data: (0..rand::random::<u8>()).collect(),
            chain_id,
        };
        let raw = tx.sign(&key).unwrap();
        let parsed = Transaction::parse(&raw).unwrap();
        assert_eq!(parsed.transaction, tx);
        assert_eq!(parsed.from, Some(key.to_address()));
        assert_eq!(parsed.hash, Some(Transaction::hash_of(&raw)));
        assert!(parsed.signature().unwrap().is_valid());
    }
}

#[test]
fn best_effort_keeps_transaction() {
    init_logging();
    // Vitalik_12 with the s value replaced by the curve order, unrecoverable
    let raw = hex_str_to_bytes("0xf8610e80830493e080809560f2ff61000080610011600039610011565b6000f31ca0a310f4d0b26207db76ba4e1e6e7cf1857ee3aa8559bcbc399a6b09bfea2d30b4a0fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141").unwrap();
    let parsed = Transaction::parse(&raw).unwrap();
    assert_eq!(parsed.transaction.nonce, Uint256::from(14u8));
    assert_eq!(parsed.from, None);
    assert_eq!(parsed.hash, None);

    let e = Transaction::parse_with(
        &raw,
        ParseOptions {
            recovery: RecoveryMode::Strict,
        },
    )
    .unwrap_err();
    assert_eq!(e.kind(), ErrorKind::InvalidArgument);
}
