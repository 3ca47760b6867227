// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Fixed-width integers modulo the 4096-bit prime $p$ and the 256-bit prime $q$.
//!
//! The group is a Schnorr group: $p = qr + 1$ and $g = 2^r \mod p$ generates the subgroup of
//! $\mathbb{Z}_p^*$ of order $q$. Every ElGamal ciphertext, public key and proof commitment
//! lives in that subgroup, while nonces, secret keys, challenges and responses live in
//! $\mathbb{Z}_q$.

use std::sync::OnceLock;

use crypto_bigint::{
    modular::runtime_mod::{DynResidue, DynResidueParams},
    Encoding, NonZero, Uint, U256, U4096,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, GroupKind},
    Result,
};

pub use mod_p::{g_pow_p, ModP};
pub use mod_q::{rand_q, rand_range_q, ModQ};

mod mod_p;
mod mod_q;

pub type ModPNumber = U4096;
pub type ModQNumber = U256;

pub(crate) type ModPResidue = DynResidue<{ ModPNumber::LIMBS }>;
pub(crate) type ModQResidue = DynResidue<{ ModQNumber::LIMBS }>;

/// The large prime $p$.
pub const P: ModPNumber = ModPNumber::from_be_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFBAFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFE0175E30B1B0E791DB502994F24DFB1");

/// The small prime $q = 2^{256} - 189$.
pub const Q: ModQNumber = ModQNumber::from_be_hex("FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF43");

/// The cofactor $r = (p - 1) / q$.
pub const R: ModPNumber = ModPNumber::from_be_hex("000000000000000000000000000000000000000000000000000000000000000100000000000000000000000000000000000000000000000000000000000000BD0000000000000000000000000000000000000000000000000000000000008B890000000000000000000000000000000000000000000000000000000000670425000000000000000000000000000000000000000000000000000000004C0E0F510000000000000000000000000000000000000000000000000000003826614ECD0000000000000000000000000000000000000000000000000000297455D72D59000000000000000000000000000000000000000000000000001E9AE35FDC7AB5000000000000000000000000000000000000000000000000169859DDC5C697A1000000000000000000000000000000000000000000000010AE7A58BB039DF1DD000000000000000000000000000000000000000000000C50D0538211AB9B90290000000000000000000000000000000000000000000917A9CDA7070BB1D96E45000000000000000000000000000000000000000006B6785CD45033A24D8668F10000000000000000000000000000000000000004F4B6DC88BF361ED33C3B79ED00000000000000000000000000000000000003A8AB00D0F52AF4C1F377E903F9000000000000000000000000000000000002B3863F9A4500B6B330BF8707EE90");

/// The generator $g = 2^r \mod p$.
pub const G: ModPNumber = ModPNumber::from_be_hex("9B61C275E06F3E38372F9A9ADE0CDC4C82F4CE5337B3EF0ED28BEDBC01342EB89977C8116D741270D45B0EBE12D96C5AEE997FEFDEA18569018AFE1284E702BB9B8C78E03E697F378D25BCBCB94FEFD12B7F97047F63423268881C3B96B389E134CB3162CB73ED8052F7946C7E72907FD8B96862D443B5C26F7B0E3FDC9F035CBF0F5AAB670B79011A8BCDEBCF421CC9CBBE12C788E50328041EB59D81079497B667B96049DA04C79D60F527B1C02F7ECBA66849179CB5CFBE7C990CD888B69C44171E4F54C21A8CFE9D821F195F7553B73A705707263EAEA3B7AFA7DED79ACF5A64F3BFB939B815C52085F40714F4C6460B0B0C3598E31746A06C2A3457676CB345C8A390EBB9428CEECEFA6FCB1C27A9E527A6C55B8D6B2B1868D6EC719E189A799605C540F8641F135D5DC7FB62D58E0DE0B6AE3AB90E91FB996505D7D9283DA833FF0CB6CC8CA7BAFA0E90BB1ADB81545A801F0016DC7088A4DF2CFB7D6DD876A2A5807BDAA4000DAFA2DFB6FBB0ED9D775589156DDBFC24FF2203FFF9C5CF7C85C68F66DE94C98331F50FEF59CF8E7CE9D95FA008F7C1672D269C163751012826C4C8F5B5F4C11EDB62550F3CF93D86F3CC6E22B0E769AC659157F40383B5DF9DB9F8414F6CB5FA7D17BDDD3BC90DC7BDC39BAF3BE602A99E2A37CE3A5C098A8C1EFD3CD28A6B79306CA2C20C55174218A3935F697E813628D2D861BE54");

pub(crate) const Q_NON_ZERO: NonZero<ModQNumber> = NonZero::<ModQNumber>::from_uint(Q);

/// Montgomery parameters for $\mathbb{Z}_p$, computed once per process.
pub(crate) fn p_params() -> DynResidueParams<{ ModPNumber::LIMBS }> {
    static PARAMS: OnceLock<DynResidueParams<{ ModPNumber::LIMBS }>> = OnceLock::new();

    *PARAMS.get_or_init(|| DynResidueParams::new(&P))
}

/// Montgomery parameters for $\mathbb{Z}_q$, computed once per process.
pub(crate) fn q_params() -> DynResidueParams<{ ModQNumber::LIMBS }> {
    static PARAMS: OnceLock<DynResidueParams<{ ModQNumber::LIMBS }>> = OnceLock::new();

    *PARAMS.get_or_init(|| DynResidueParams::new(&Q))
}

/// The published parameters of the group, as they appear in an election record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConstants {
    #[serde(with = "hex_uint")]
    pub large_prime: ModPNumber,
    #[serde(with = "hex_uint")]
    pub small_prime: ModQNumber,
    #[serde(with = "hex_uint")]
    pub cofactor: ModPNumber,
    #[serde(with = "hex_uint")]
    pub generator: ModPNumber,
}

impl Default for ElectionConstants {
    fn default() -> Self {
        Self {
            large_prime: P,
            small_prime: Q,
            cofactor: R,
            generator: G,
        }
    }
}

/// Uppercase big-endian hex with leading zero bytes trimmed; zero encodes as `"00"`.
pub(crate) fn to_hex<const LIMBS: usize>(value: &Uint<LIMBS>) -> String
where
    Uint<LIMBS>: Encoding,
{
    let bytes = value.to_be_bytes();
    let bytes = bytes.as_ref();
    let first = bytes
        .iter()
        .position(|byte| *byte != 0)
        .unwrap_or(bytes.len() - 1);

    hex::encode_upper(&bytes[first..])
}

/// Parses big-endian hex of any length up to the width of `Uint<LIMBS>`, in either case.
pub(crate) fn from_hex<const LIMBS: usize>(value: &str, group: GroupKind) -> Result<Uint<LIMBS>>
where
    Uint<LIMBS>: Encoding,
{
    if value.is_empty() {
        return Err(Error::InvalidArgument("empty hex string".to_string()));
    }

    let decoded = if value.len() % 2 == 1 {
        hex::decode(format!("0{value}"))
    } else {
        hex::decode(value)
    }
    .map_err(|err| Error::InvalidArgument(format!("malformed hex string: {err}")))?;

    let first = decoded
        .iter()
        .position(|byte| *byte != 0)
        .unwrap_or(decoded.len());
    let significant = &decoded[first..];

    if significant.len() > Uint::<LIMBS>::BYTES {
        return Err(Error::OutOfRange {
            group,
            value: value.to_string(),
        });
    }

    let mut padded = vec![0u8; Uint::<LIMBS>::BYTES];
    padded[Uint::<LIMBS>::BYTES - significant.len()..].copy_from_slice(significant);

    Ok(Uint::<LIMBS>::from_be_slice(&padded))
}

/// Serde adapter that writes a `Uint` in the same hex form as group elements.
pub(crate) mod hex_uint {
    use crypto_bigint::{Encoding, Uint};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use crate::error::GroupKind;

    pub fn serialize<S, const LIMBS: usize>(
        value: &Uint<LIMBS>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        Uint<LIMBS>: Encoding,
    {
        serializer.serialize_str(&super::to_hex(value))
    }

    pub fn deserialize<'de, D, const LIMBS: usize>(deserializer: D) -> Result<Uint<LIMBS>, D::Error>
    where
        D: Deserializer<'de>,
        Uint<LIMBS>: Encoding,
    {
        let value = String::deserialize(deserializer)?;
        let group = if Uint::<LIMBS>::BITS > super::ModQNumber::BITS {
            GroupKind::ModP
        } else {
            GroupKind::ModQ
        };

        super::from_hex(&value, group).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn group_parameters_are_consistent() {
        // $p = qr + 1$
        let (lo, hi) = R.mul_wide(&Q);
        assert_eq!(hi, ModQNumber::ZERO);
        assert_eq!(lo.wrapping_add(&ModPNumber::ONE), P);

        assert_eq!(P.bits(), 4096);
        assert_eq!(Q.bits(), 256);

        // $g$ has order $q$.
        let generator = DynResidue::new(&G, p_params());
        assert_ne!(G, ModPNumber::ONE);
        assert_eq!(generator.pow(&Q).retrieve(), ModPNumber::ONE);
    }

    #[rstest]
    #[case::zero(U256::ZERO, "00")]
    #[case::one(U256::ONE, "01")]
    #[case::single_nibble(U256::from_u64(0xA), "0A")]
    #[case::two_bytes(U256::from_u64(0x1234), "1234")]
    #[case::q(Q, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF43")]
    fn formats_hex(#[case] value: U256, #[case] expected: &str) {
        assert_eq!(to_hex(&value), expected);
        assert_eq!(from_hex::<{ U256::LIMBS }>(expected, GroupKind::ModQ), Ok(value));
    }

    #[test]
    fn parses_odd_length_and_lowercase_hex() {
        assert_eq!(
            from_hex::<{ U256::LIMBS }>("abc", GroupKind::ModQ),
            Ok(U256::from_u64(0xABC))
        );
        assert_eq!(
            from_hex::<{ U256::LIMBS }>(&("00".repeat(40) + "01"), GroupKind::ModQ),
            Ok(U256::ONE)
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::not_hex("XYZ")]
    fn rejects_malformed_hex(#[case] value: &str) {
        assert!(matches!(
            from_hex::<{ U256::LIMBS }>(value, GroupKind::ModQ),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_hex_wider_than_the_group() {
        let too_wide = "01".to_string() + &"00".repeat(32);

        assert!(matches!(
            from_hex::<{ U256::LIMBS }>(&too_wide, GroupKind::ModQ),
            Err(Error::OutOfRange { group: GroupKind::ModQ, .. })
        ));
    }

    #[test]
    fn election_constants_serialize_as_hex() {
        let constants = ElectionConstants::default();
        let json = serde_json::to_value(&constants).unwrap();

        assert_eq!(json["small_prime"], to_hex(&Q));
        assert_eq!(
            serde_json::from_value::<ElectionConstants>(json).unwrap(),
            constants
        );
    }
}
