// Author: dWallet Labs, Ltd.
// SPDX-License-Identifier: BSD-3-Clause-Clear

//! Canonical hashing of election objects into $\mathbb{Z}_q$.
//!
//! Every element is rendered to text (hex for group elements, decimal for integers, `null` for
//! absent values, the hash of the members for sequences), each rendering is terminated by `|`,
//! and the SHA-256 digest of the result is reduced mod $q$.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::group::{ModP, ModQ};

/// A value that can be fed to [`hash_elems`].
pub trait HashElement {
    /// The canonical text of `self`.
    fn hash_text(&self) -> String;
}

/// An election object with a deterministic hash over its canonical field encoding.
pub trait CryptoHashable {
    fn crypto_hash(&self) -> ModQ;
}

/// Lets [`CryptoHashable`] types appear directly (and inside collections) in [`hash_elems`].
macro_rules! hash_element_by_crypto_hash {
    ($($hashable:ty),+ $(,)?) => {
        $(
            impl $crate::hash::HashElement for $hashable {
                fn hash_text(&self) -> String {
                    $crate::hash::CryptoHashable::crypto_hash(self).to_hex()
                }
            }
        )+
    };
}
pub(crate) use hash_element_by_crypto_hash;

/// Hashes `elements` in order.
pub fn hash_elems(elements: &[&dyn HashElement]) -> ModQ {
    let mut hasher = Sha256::new();
    hasher.update(b"|");

    for element in elements {
        hasher.update(element.hash_text().as_bytes());
        hasher.update(b"|");
    }

    let digest: [u8; 32] = hasher.finalize().into();

    ModQ::from_digest(&digest)
}

impl HashElement for ModP {
    fn hash_text(&self) -> String {
        self.to_hex()
    }
}

impl HashElement for ModQ {
    fn hash_text(&self) -> String {
        self.to_hex()
    }
}

impl HashElement for &str {
    fn hash_text(&self) -> String {
        self.to_string()
    }
}

impl HashElement for String {
    fn hash_text(&self) -> String {
        self.clone()
    }
}

impl HashElement for bool {
    fn hash_text(&self) -> String {
        self.to_string()
    }
}

impl HashElement for u32 {
    fn hash_text(&self) -> String {
        self.to_string()
    }
}

impl HashElement for u64 {
    fn hash_text(&self) -> String {
        self.to_string()
    }
}

impl HashElement for i64 {
    fn hash_text(&self) -> String {
        self.to_string()
    }
}

impl<T: HashElement> HashElement for Option<T> {
    fn hash_text(&self) -> String {
        match self {
            Some(value) => value.hash_text(),
            None => "null".to_string(),
        }
    }
}

impl<T: HashElement> HashElement for [T] {
    fn hash_text(&self) -> String {
        if self.is_empty() {
            return "null".to_string();
        }

        let elements: Vec<&dyn HashElement> =
            self.iter().map(|element| element as &dyn HashElement).collect();

        hash_elems(&elements).to_hex()
    }
}

impl<T: HashElement> HashElement for &[T] {
    fn hash_text(&self) -> String {
        (**self).hash_text()
    }
}

impl<T: HashElement> HashElement for Vec<T> {
    fn hash_text(&self) -> String {
        self.as_slice().hash_text()
    }
}

/// A deterministic sequence of nonces.
///
/// The `i`-th nonce is $H(seed, i)$, where the seed is itself $H(seed, headers)$ whenever headers
/// are supplied. Two sequences built from the same seed and headers agree everywhere, and
/// different headers give unrelated sequences.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Nonces {
    seed: ModQ,
}

impl Nonces {
    pub fn new(seed: &ModQ, headers: &[&dyn HashElement]) -> Self {
        if headers.is_empty() {
            return Self { seed: *seed };
        }

        let mut elements: Vec<&dyn HashElement> = Vec::with_capacity(headers.len() + 1);
        elements.push(seed);
        elements.extend_from_slice(headers);

        Self {
            seed: hash_elems(&elements),
        }
    }

    pub fn get(&self, index: u64) -> ModQ {
        hash_elems(&[&self.seed, &index])
    }

    /// The first `count` nonces of the sequence.
    pub fn take(&self, count: u64) -> Vec<ModQ> {
        (0..count).map(|index| self.get(index)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{g_pow_p, rand_q};

    #[test]
    fn hashes_deterministically_and_order_sensitively() {
        let x = rand_q();
        let y = g_pow_p(&x);

        assert_eq!(hash_elems(&[&x, &y, &"label"]), hash_elems(&[&x, &y, &"label"]));
        assert_ne!(hash_elems(&[&x, &y]), hash_elems(&[&y, &x]));
        assert_ne!(hash_elems(&[&"a", &"bc"]), hash_elems(&[&"ab", &"c"]));
    }

    #[test]
    fn renders_absent_values_and_empty_sequences_as_null() {
        let absent: Option<String> = None;
        let empty: Vec<u64> = Vec::new();

        assert_eq!(hash_elems(&[&absent]), hash_elems(&[&"null"]));
        assert_eq!(hash_elems(&[&empty]), hash_elems(&[&"null"]));
        assert_eq!(
            hash_elems(&[&Some("present".to_string())]),
            hash_elems(&[&"present"])
        );
    }

    #[test]
    fn hashes_sequences_by_the_hash_of_their_members() {
        let members = vec![1u64, 2, 3];

        assert_eq!(
            hash_elems(&[&members]),
            hash_elems(&[&hash_elems(&[&1u64, &2u64, &3u64])])
        );
    }

    #[test]
    fn nonce_sequences_are_reproducible() {
        let seed = rand_q();

        let nonces = Nonces::new(&seed, &[&"header"]);
        let again = Nonces::new(&seed, &[&"header"]);
        let other = Nonces::new(&seed, &[&"other header"]);

        assert_eq!(nonces.take(4), again.take(4));
        assert_ne!(nonces.get(0), other.get(0));
        assert_ne!(nonces.get(0), nonces.get(1));
        assert_eq!(Nonces::new(&seed, &[]).get(7), hash_elems(&[&seed, &7u64]));
    }
}
