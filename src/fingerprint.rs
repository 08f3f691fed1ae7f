//! User-defined-glyph content fingerprint (spec §1, §4.4; Open Question
//! resolved in spec.md §9 and DESIGN.md: XXH3-64 over a stable key, not a
//! bit-for-bit match of the original tool's hash).

use crate::surface::TypefaceId;

/// Builds the cache key [`crate::surface::UserDefinedStore`] is keyed on:
/// the typeface, whether the active pitch is proportional, and the
/// current print mode (bit-image density or 0 for text), hashed with
/// XXH3-64 and rendered as 16 lowercase hex digits.
pub fn fingerprint(typeface: TypefaceId, proportional: bool, mode: u8) -> String {
    let key = format!("{}|{}|{}", typeface.0, proportional, mode);
    let hash = twox_hash::xxh3::hash64(key.as_bytes());
    format!("{hash:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_for_the_same_inputs() {
        let a = fingerprint(TypefaceId::ROMAN, false, 0);
        let b = fingerprint(TypefaceId::ROMAN, false, 0);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn fingerprint_differs_across_typefaces() {
        let a = fingerprint(TypefaceId::ROMAN, false, 0);
        let b = fingerprint(TypefaceId::SANS_SERIF, false, 0);
        assert_ne!(a, b);
    }
}
