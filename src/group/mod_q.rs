// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub},
};

use crypto_bigint::{Encoding, NonZero, RandomMod};
use rand_core::{CryptoRngCore, OsRng};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroize;

use super::{from_hex, q_params, to_hex, ModQNumber, ModQResidue, Q, Q_NON_ZERO};
use crate::{
    error::{Error, GroupKind},
    Result,
};

/// An element of $\mathbb{Z}_q$, canonically reduced into $[0, q)$.
///
/// Nonces, secret keys, challenges and proof responses are all `ModQ` values; the type zeroizes
/// through [`Zeroize`] so that owners of secret material can wipe it explicitly.
#[derive(Clone, Copy, Debug, Default, Zeroize)]
pub struct ModQ(ModQNumber);

impl ModQ {
    pub const ZERO: Self = Self(ModQNumber::ZERO);
    pub const ONE: Self = Self(ModQNumber::ONE);
    pub const TWO: Self = Self(ModQNumber::from_u64(2));

    /// Wraps `value`, failing with [`Error::OutOfRange`] unless $0 \le value < q$.
    pub fn new(value: ModQNumber) -> Result<Self> {
        if value >= Q {
            return Err(Error::OutOfRange {
                group: GroupKind::ModQ,
                value: to_hex(&value),
            });
        }

        Ok(Self(value))
    }

    /// Wraps `value` without checking it against $q$. Only for values already known to be reduced.
    pub const fn new_unchecked(value: ModQNumber) -> Self {
        Self(value)
    }

    pub const fn from_u64(value: u64) -> Self {
        Self(ModQNumber::from_u64(value))
    }

    pub fn from_hex(value: &str) -> Result<Self> {
        Self::new(from_hex(value, GroupKind::ModQ)?)
    }

    /// Reduces an arbitrary 256-bit big-endian digest into $\mathbb{Z}_q$.
    pub(crate) fn from_digest(digest: &[u8; ModQNumber::BYTES]) -> Self {
        Self(ModQNumber::from_be_bytes(*digest) % Q_NON_ZERO)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn value(&self) -> &ModQNumber {
        &self.0
    }

    pub(crate) fn to_be_bytes(self) -> [u8; ModQNumber::BYTES] {
        self.0.to_be_bytes()
    }

    pub fn is_zero(&self) -> bool {
        bool::from(self.0.ct_eq(&ModQNumber::ZERO))
    }

    /// Samples uniformly from $[0, q)$.
    pub fn random(rng: &mut impl CryptoRngCore) -> Self {
        Self(ModQNumber::random_mod(rng, &Q_NON_ZERO))
    }

    /// Samples uniformly from $[1, q)$.
    pub fn random_non_zero(rng: &mut impl CryptoRngCore) -> Self {
        // Classic rejection-sampling technique.
        loop {
            let sampled = Self::random(rng);
            if !sampled.is_zero() {
                return sampled;
            }
        }
    }

    /// Samples uniformly from $[start, q)$.
    pub fn random_from(start: &ModQ, rng: &mut impl CryptoRngCore) -> Self {
        let width = Q.wrapping_sub(&start.0);

        // `start` is reduced, so `width` is at least one.
        let width = NonZero::from_uint(width);

        Self(ModQNumber::random_mod(rng, &width).wrapping_add(&start.0))
    }

    /// The multiplicative inverse, failing for zero.
    pub fn invert(&self) -> Result<Self> {
        if self.is_zero() {
            return Err(Error::InvalidArgument(
                "zero has no inverse mod q".to_string(),
            ));
        }

        Ok(Self(self.residue().invert().0.retrieve()))
    }

    fn residue(&self) -> ModQResidue {
        ModQResidue::new(&self.0, q_params())
    }
}

/// A fresh nonce in $[1, q)$ drawn from the operating system's CSPRNG.
pub fn rand_q() -> ModQ {
    ModQ::random_non_zero(&mut OsRng)
}

/// A fresh element of $[start, q)$ drawn from the operating system's CSPRNG.
pub fn rand_range_q(start: u64) -> ModQ {
    ModQ::random_from(&ModQ::from_u64(start), &mut OsRng)
}

impl ConstantTimeEq for ModQ {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for ModQ {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for ModQ {}

impl Add for ModQ {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.add_mod(&rhs.0, &Q))
    }
}

impl<'r> Add<&'r ModQ> for ModQ {
    type Output = Self;

    fn add(self, rhs: &'r ModQ) -> Self::Output {
        Self(self.0.add_mod(&rhs.0, &Q))
    }
}

impl AddAssign for ModQ {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs
    }
}

impl Sub for ModQ {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0.sub_mod(&rhs.0, &Q))
    }
}

impl Neg for ModQ {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(ModQNumber::ZERO.sub_mod(&self.0, &Q))
    }
}

impl Mul for ModQ {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self((self.residue() * rhs.residue()).retrieve())
    }
}

impl<'r> Mul<&'r ModQ> for ModQ {
    type Output = Self;

    fn mul(self, rhs: &'r ModQ) -> Self::Output {
        Self((self.residue() * rhs.residue()).retrieve())
    }
}

impl Sum for ModQ {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(ModQ::ZERO, |acc, element| acc + element)
    }
}

impl<'a> Sum<&'a ModQ> for ModQ {
    fn sum<I: Iterator<Item = &'a ModQ>>(iter: I) -> Self {
        iter.fold(ModQ::ZERO, |acc, element| acc + element)
    }
}

impl fmt::Display for ModQ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ModQ {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ModQ {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;

        ModQ::from_hex(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn rejects_values_outside_the_group() {
        assert!(ModQ::new(Q.wrapping_sub(&ModQNumber::ONE)).is_ok());
        assert_eq!(
            ModQ::new(Q),
            Err(Error::OutOfRange {
                group: GroupKind::ModQ,
                value: to_hex(&Q)
            })
        );
        assert!(ModQ::from_hex(&"FF".repeat(32)).is_err());
    }

    #[rstest]
    #[case::small(3, 4, 7, 12)]
    #[case::zero(0, 9, 9, 0)]
    #[case::one(1, 1, 2, 1)]
    fn arithmetic_matches_integers(
        #[case] a: u64,
        #[case] b: u64,
        #[case] sum: u64,
        #[case] product: u64,
    ) {
        let (a, b) = (ModQ::from_u64(a), ModQ::from_u64(b));

        assert_eq!(a + b, ModQ::from_u64(sum));
        assert_eq!(a * b, ModQ::from_u64(product));
        assert_eq!((a + b) - b, a);
    }

    #[test]
    fn arithmetic_wraps_around_q() {
        let q_minus_one = -ModQ::ONE;

        assert_eq!(q_minus_one + ModQ::ONE, ModQ::ZERO);
        assert_eq!(ModQ::ZERO - ModQ::ONE, q_minus_one);
        assert_eq!(q_minus_one * q_minus_one, ModQ::ONE);
        assert_eq!(-ModQ::ZERO, ModQ::ZERO);
    }

    #[test]
    fn inverts() {
        let x = rand_q();

        assert_eq!(x * x.invert().unwrap(), ModQ::ONE);
        assert!(ModQ::ZERO.invert().is_err());
    }

    #[test]
    fn samples_within_range() {
        for _ in 0..32 {
            assert!(!rand_q().is_zero());
            assert!(rand_range_q(5).value() >= &ModQNumber::from_u64(5));
        }

        let top = -ModQ::ONE;
        assert_eq!(ModQ::random_from(&top, &mut OsRng), top);
    }

    #[test]
    fn sums_iterators() {
        let values = [ModQ::from_u64(1), ModQ::from_u64(2), -ModQ::ONE];

        assert_eq!(values.iter().sum::<ModQ>(), ModQ::TWO);
        assert_eq!(values.into_iter().sum::<ModQ>(), ModQ::TWO);
    }

    #[test]
    fn serializes_as_hex_string() {
        let x = ModQ::from_u64(0xBEEF);

        assert_eq!(serde_json::to_string(&x).unwrap(), "\"BEEF\"");
        assert_eq!(serde_json::from_str::<ModQ>("\"beef\"").unwrap(), x);
        assert!(serde_json::from_str::<ModQ>(&format!("\"{}\"", to_hex(&Q))).is_err());
    }
}
