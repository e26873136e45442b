#[macro_use]
extern crate criterion;
extern crate candor;
extern crate num256;

use candor::abi::{decode, encode, AbiToken, Interface, ParamType};
use candor::rlp::{decode as rlp_decode, encode as rlp_encode, RlpToken};
use candor::{PrivateKey, Transaction};
use criterion::Criterion;

fn tx_bench(c: &mut Criterion) {
    let key: PrivateKey = "c87f65ff3f271bf5dc8643484f66b200109caffe4bf98c4cb393dc35740b28c0"
        .parse()
        .unwrap();
    let tx = Transaction {
        nonce: 0u32.into(),
        gas_price: "1000000000000".parse().unwrap(),
        gas_limit: "10000".parse().unwrap(),
        to: Some("13978aee95f38490e9769c39b2773ed763d9cd5f".parse().unwrap()),
        value: "10000000000000000".parse().unwrap(),
        data: Vec::new(),
        chain_id: 1,
    };

    let signed_tx = tx.sign(&key).unwrap();

    c.bench_function("sign tx with chain id", move |b| {
        b.iter(|| tx.sign(&key).unwrap())
    });

    c.bench_function("parse tx and recover sender", move |b| {
        b.iter(|| {
            Transaction::parse(&signed_tx).unwrap().from.unwrap();
        })
    });
}

fn private_key_to_public(c: &mut Criterion) {
    let key: PrivateKey = "0102010201020102010201020102010201020102010201020102010201020102"
        .parse()
        .unwrap();

    c.bench_function("private key to public", move |b| {
        b.iter(|| key.public_key().unwrap())
    });
}

fn abi_bench(c: &mut Criterion) {
    let types: Vec<ParamType> = ["uint256[][]", "string[]", "(address,bytes)"]
        .iter()
        .map(|t| ParamType::parse(t).unwrap())
        .collect();
    let values = vec![
        AbiToken::Dynamic(vec![
            AbiToken::Dynamic(vec![1u8.into(), 2u8.into()]),
            AbiToken::Dynamic(vec![3u8.into()]),
        ]),
        AbiToken::Dynamic(vec!["one".into(), "two".into(), "three".into()]),
        AbiToken::Struct(vec![
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed"
                .parse::<candor::Address>()
                .unwrap()
                .into(),
            vec![0xabu8; 100].into(),
        ]),
    ];
    let encoded = encode(&types, &values).unwrap();

    let encode_types = types.clone();
    c.bench_function("abi encode nested", move |b| {
        b.iter(|| encode(&encode_types, &values).unwrap())
    });
    c.bench_function("abi decode nested", move |b| {
        b.iter(|| decode(&types, &encoded).unwrap())
    });

    c.bench_function("parse signature", |b| {
        b.iter(|| {
            Interface::from_signatures(&[
                "function exactInputSingle((address,address,uint24,address,uint256,uint256,uint256,uint160) params) payable returns (uint256)",
            ])
            .unwrap()
        })
    });
}

fn rlp_bench(c: &mut Criterion) {
    let token = RlpToken::List(
        (0..64u64)
            .map(|i| {
                RlpToken::List(vec![
                    i.into(),
                    RlpToken::String(vec![i as u8; (i as usize) * 2]),
                ])
            })
            .collect(),
    );
    let encoded = rlp_encode(&token);

    c.bench_function("rlp encode", move |b| b.iter(|| rlp_encode(&token)));
    c.bench_function("rlp decode", move |b| {
        b.iter(|| rlp_decode(&encoded).unwrap())
    });
}

criterion_group!(
    benches,
    tx_bench,
    private_key_to_public,
    abi_bench,
    rlp_bench
);
criterion_main!(benches);
