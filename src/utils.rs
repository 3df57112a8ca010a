use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// Arithmetic wraps, so the result is only injective for small arguments.
/// Table lookups compare keys exactly, the pairing is used as a bucket index.
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing_szudzik(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// [Pairing function][pairing] for two `u64` values.
///
/// [pairing]: https://en.wikipedia.org/wiki/Pairing_function
pub fn pairing2(a: u64, b: u64) -> u64 {
    pairing_szudzik(a, b)
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Pairing function for four `u64` values.
pub fn pairing4(a: u64, b: u64, c: u64, d: u64) -> u64 {
    pairing2(pairing2(a, b), pairing2(c, d))
}

/// Hash of an arbitrary `Hash` value with a fixed-key hasher.
pub fn fingerprint<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

pub trait MyHash {
    /// Hash used to pick a bucket in the node table.
    fn hash(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_szudzik() {
        // a\b  0  1  2  3
        // ----------------
        //  0 | 0  1  4  9
        //  1 | 2  3  5 10
        //  2 | 6  7  8 11
        //  3 |12 13 14 15
        assert_eq!(pairing_szudzik(0, 0), 0);
        assert_eq!(pairing_szudzik(0, 1), 1);
        assert_eq!(pairing_szudzik(1, 0), 2);
        assert_eq!(pairing_szudzik(1, 1), 3);
        assert_eq!(pairing_szudzik(0, 2), 4);
        assert_eq!(pairing_szudzik(2, 1), 7);
        assert_eq!(pairing_szudzik(3, 3), 15);
    }

    #[test]
    fn test_pairing_does_not_overflow() {
        let big = u64::MAX - 1;
        let _ = pairing4(big, big, big, big);
    }

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(fingerprint("field"), fingerprint("field"));
        assert_ne!(fingerprint("field"), fingerprint("other"));
    }
}
