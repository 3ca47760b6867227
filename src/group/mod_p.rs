// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use std::{
    fmt,
    ops::{Add, Mul, MulAssign},
};

use crypto_bigint::{Encoding, U64};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use subtle::{Choice, ConstantTimeEq};

use super::{from_hex, p_params, to_hex, ModPNumber, ModPResidue, ModQ, G, P, Q};
use crate::{
    error::{Error, GroupKind},
    Result,
};

/// An element of $\mathbb{Z}_p$, canonically reduced into $[0, p)$.
///
/// Multiplication and exponentiation go through Montgomery form with parameters shared
/// process-wide (see [`super::p_params`]). Exponents are always elements of $\mathbb{Z}_q$, which
/// is all the order-$q$ subgroup needs and keeps every exponentiation at 256 bits.
#[derive(Clone, Copy, Debug)]
pub struct ModP(ModPNumber);

impl ModP {
    pub const ZERO: Self = Self(ModPNumber::ZERO);
    pub const ONE: Self = Self(ModPNumber::ONE);
    pub const TWO: Self = Self(ModPNumber::from_u64(2));
    pub const GENERATOR: Self = Self(G);

    /// Wraps `value`, failing with [`Error::OutOfRange`] unless $0 \le value < p$.
    pub fn new(value: ModPNumber) -> Result<Self> {
        if value >= P {
            return Err(Error::OutOfRange {
                group: GroupKind::ModP,
                value: to_hex(&value),
            });
        }

        Ok(Self(value))
    }

    /// Wraps `value` without checking it against $p$. Only for values already known to be reduced.
    pub const fn new_unchecked(value: ModPNumber) -> Self {
        Self(value)
    }

    pub const fn from_u64(value: u64) -> Self {
        Self(ModPNumber::from_u64(value))
    }

    pub fn from_hex(value: &str) -> Result<Self> {
        Self::new(from_hex(value, GroupKind::ModP)?)
    }

    pub fn to_hex(&self) -> String {
        to_hex(&self.0)
    }

    pub fn value(&self) -> &ModPNumber {
        &self.0
    }

    pub(crate) fn to_be_bytes(self) -> [u8; ModPNumber::BYTES] {
        self.0.to_be_bytes()
    }

    pub fn is_zero(&self) -> bool {
        bool::from(self.0.ct_eq(&ModPNumber::ZERO))
    }

    /// $self^{exponent} \mod p$
    pub fn pow(&self, exponent: &ModQ) -> Self {
        Self::from_residue(self.residue().pow(exponent.value()))
    }

    /// $self^{exponent} \mod p$ for small, public exponents such as a vote.
    pub fn pow_u64(&self, exponent: u64) -> Self {
        Self::from_residue(
            self.residue()
                .pow_bounded_exp(&U64::from_u64(exponent), U64::BITS),
        )
    }

    /// The multiplicative inverse, failing for zero.
    pub fn invert(&self) -> Result<Self> {
        if self.is_zero() {
            return Err(Error::InvalidArgument(
                "zero has no inverse mod p".to_string(),
            ));
        }

        Ok(Self::from_residue(self.residue().invert().0))
    }

    /// Whether `self` belongs to the order-$q$ subgroup: $0 < self < p$ and $self^q = 1$.
    pub fn is_valid_residue(&self) -> bool {
        if self.is_zero() || self.0 >= P {
            return false;
        }

        self.residue().pow(&Q).retrieve() == ModPNumber::ONE
    }

    pub(crate) fn residue(&self) -> ModPResidue {
        ModPResidue::new(&self.0, p_params())
    }

    pub(crate) fn from_residue(residue: ModPResidue) -> Self {
        Self(residue.retrieve())
    }
}

/// $g^{exponent} \mod p$
pub fn g_pow_p(exponent: &ModQ) -> ModP {
    ModP::GENERATOR.pow(exponent)
}

impl ConstantTimeEq for ModP {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl PartialEq for ModP {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for ModP {}

impl Add for ModP {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.add_mod(&rhs.0, &P))
    }
}

impl Mul for ModP {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::from_residue(self.residue() * rhs.residue())
    }
}

impl<'r> Mul<&'r ModP> for ModP {
    type Output = Self;

    fn mul(self, rhs: &'r ModP) -> Self::Output {
        Self::from_residue(self.residue() * rhs.residue())
    }
}

impl<'l, 'r> Mul<&'r ModP> for &'l ModP {
    type Output = ModP;

    fn mul(self, rhs: &'r ModP) -> Self::Output {
        ModP::from_residue(self.residue() * rhs.residue())
    }
}

impl MulAssign for ModP {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs
    }
}

impl fmt::Display for ModP {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ModP {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ModP {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;

        ModP::from_hex(&value).map_err(D::Error::custom)
    }
}
