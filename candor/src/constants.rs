use num256::Uint256;

/// Order of the secp256k1 curve group
const SECPK1N: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// Offset added to the recovery param of an unprotected signature
pub const LEGACY_V_OFFSET: u64 = 27;
/// Offset added to the recovery param of an EIP-155 signature, on top of chain_id * 2
pub const EIP155_V_OFFSET: u64 = 35;

pub fn secpk1n() -> Uint256 {
    SECPK1N.into()
}

#[test]
fn curve_order() {
    assert_eq!(
        secpk1n().to_string(),
        "115792089237316195423570985008687907852837564279074904382605163141518161494337"
    );
}
