// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

use crypto_bigint::{
    modular::runtime_mod::{DynResidue, DynResidueParams},
    Limb, Uint, Word,
};

use crate::group::{p_params, ModP, ModQ, ModQNumber};

const WINDOW: usize = 4;
const WINDOW_MASK: Word = (1 << WINDOW) - 1;

/// Computes $\prod_i b_i^{e_i} \mod p$.
///
/// Used by proof verification, where every identity has the shape $x^a y^b$ and sharing the
/// squarings between the bases halves the cost of checking it.
pub(crate) fn multi_exponentiate(bases_and_exponents: &[(ModP, ModQ)]) -> ModP {
    let bases_and_exponents: Vec<_> = bases_and_exponents
        .iter()
        .map(|(base, exponent)| (base.residue(), *exponent.value()))
        .collect();

    ModP::from_residue(straus(&bases_and_exponents, ModQNumber::BITS, p_params()))
}

/// Simultaneous fixed-window exponentiation.
/// `exponent_bits` is the number of low bits of each exponent to take into account.
///
/// See: Straus, E. G. Problems and solutions: Addition chains of vectors. American Mathematical Monthly 71 (1964), 806–808.
///
/// Runs in variable time with respect to the exponents, which are public in every caller.
fn straus<const LIMBS: usize, const RHS_LIMBS: usize>(
    bases_and_exponents: &[(DynResidue<LIMBS>, Uint<RHS_LIMBS>)],
    exponent_bits: usize,
    residue_params: DynResidueParams<LIMBS>,
) -> DynResidue<LIMBS> {
    let one = DynResidue::one(residue_params);

    // tables[j][i] contains $b_j^i$
    let tables: Vec<[DynResidue<LIMBS>; 1 << WINDOW]> = bases_and_exponents
        .iter()
        .map(|(base, _)| {
            let mut powers = [one; 1 << WINDOW];
            for i in 1..powers.len() {
                powers[i] = powers[i - 1] * base;
            }
            powers
        })
        .collect();

    let windows = (exponent_bits + WINDOW - 1) / WINDOW;
    let mut accumulator = one;

    for window in (0..windows).rev() {
        if window + 1 != windows {
            for _ in 0..WINDOW {
                accumulator = accumulator.square();
            }
        }

        let bit = window * WINDOW;
        for (powers, (_, exponent)) in tables.iter().zip(bases_and_exponents) {
            let limb = exponent.as_limbs()[bit / Limb::BITS].0;
            let digit = (limb >> (bit % Limb::BITS)) & WINDOW_MASK;

            if digit != 0 {
                accumulator *= powers[digit as usize];
            }
        }
    }

    accumulator
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{g_pow_p, rand_q};

    #[test]
    fn matches_separate_exponentiations() {
        let bases: Vec<ModP> = (0..3).map(|_| g_pow_p(&rand_q())).collect();
        let exponents: Vec<ModQ> = (0..3).map(|_| rand_q()).collect();

        let expected = bases
            .iter()
            .zip(&exponents)
            .fold(ModP::ONE, |acc, (base, exponent)| acc * base.pow(exponent));

        let bases_and_exponents: Vec<_> = bases.into_iter().zip(exponents).collect();

        assert_eq!(multi_exponentiate(&bases_and_exponents), expected);
    }

    #[test]
    fn handles_edge_exponents() {
        let base = g_pow_p(&rand_q());

        assert_eq!(multi_exponentiate(&[]), ModP::ONE);
        assert_eq!(multi_exponentiate(&[(base, ModQ::ZERO)]), ModP::ONE);
        assert_eq!(multi_exponentiate(&[(base, ModQ::ONE)]), base);
        assert_eq!(
            multi_exponentiate(&[(base, -ModQ::ONE), (base, ModQ::ONE)]),
            ModP::ONE
        );
    }
}
