#![forbid(unsafe_code)]

//! Fixed-time byte comparison.

/// Compare two byte strings without branching on their content.
///
/// Lengths are compared first; for equal lengths every byte pair is XORed
/// and OR-accumulated, so the running time does not depend on where the
/// first difference is.
pub fn fixed_time_eq(a: &[u8], b: &[u8]) -> bool {
    compare_with(a, b, |_| {})
}

fn compare_with(a: &[u8], b: &[u8], mut visit: impl FnMut(usize)) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        visit(i);
        acc |= x ^ y;
    }
    std::hint::black_box(acc) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_and_unequal() {
        assert!(fixed_time_eq(b"", b""));
        assert!(fixed_time_eq(b"digest", b"digest"));
        assert!(!fixed_time_eq(b"digest", b"digesT"));
        assert!(!fixed_time_eq(b"digest", b"diges"));
    }

    #[test]
    fn visits_every_byte_whatever_the_mismatch() {
        let reference = [0x5au8; 32];
        for position in 0..reference.len() {
            let mut candidate = reference;
            candidate[position] ^= 0xff;
            let mut visited = 0;
            assert!(!compare_with(&reference, &candidate, |_| visited += 1));
            assert_eq!(visited, reference.len(), "mismatch at {position}");
        }
        let mut visited = 0;
        assert!(compare_with(&reference, &reference, |_| visited += 1));
        assert_eq!(visited, reference.len());
    }

    #[test]
    fn length_mismatch_visits_nothing() {
        let mut visited = 0;
        assert!(!compare_with(b"ab", b"abc", |_| visited += 1));
        assert_eq!(visited, 0);
    }
}
