//! Nucleotide helpers shared by segments and path rendering.
//!
//! Sequences are ASCII; [`Segment`](super::Segment) construction enforces
//! it, so every byte maps to one `char` on output.

use bio::alphabets::dna;

/// Returns the IUPAC complement of a nucleotide, preserving case.
///
/// Symbols outside the IUPAC alphabet are returned unchanged.
pub fn complement(base: u8) -> u8 {
    dna::complement(base)
}

/// Appends `data[beg..end]` to `out`, reverse complemented when `rc` is set.
pub(crate) fn push_forward(out: &mut String, data: &[u8], beg: usize, end: usize, rc: bool) {
    let slice = &data[beg..end];
    out.reserve(slice.len());
    if rc {
        out.extend(slice.iter().rev().map(|&b| char::from(complement(b))));
    } else {
        out.extend(slice.iter().map(|&b| char::from(b)));
    }
}

/// Reverse complement of a whole sequence.
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    dna::revcomp(seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complement_is_an_involution_on_iupac() {
        for &b in b"ACGTRYKMBVDHSWNacgtrykmbvdhswn" {
            assert_eq!(complement(complement(b)), b, "base {}", b as char);
        }
        assert_eq!(complement(b'R'), b'Y');
        assert_eq!(complement(b'g'), b'c');
    }

    #[test]
    fn unknown_symbols_pass_through() {
        assert_eq!(complement(b'X'), b'X');
        assert_eq!(complement(b'*'), b'*');
    }

    #[test]
    fn push_forward_slices_and_reverses() {
        let mut out = String::new();
        push_forward(&mut out, b"TAGCATACG", 3, 9, true);
        assert_eq!(out, "CGTATG");
        out.clear();
        push_forward(&mut out, b"TAGCATACG", 1, 4, false);
        assert_eq!(out, "AGC");
    }

    #[test]
    fn reverse_complement_of_palindrome() {
        assert_eq!(reverse_complement(b"ACGT"), b"ACGT".to_vec());
        assert_eq!(reverse_complement(b"AACG"), b"CGTT".to_vec());
    }
}
