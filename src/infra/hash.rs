use std::hash::Hasher;

use twox_hash::XxHash64;

/// Fingerprint of a document's text, used to key reusable edit scripts.
pub fn text_fingerprint(text: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(text.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_tracks_content() {
        assert_eq!(text_fingerprint("fn a() {}"), text_fingerprint("fn a() {}"));
        assert_ne!(text_fingerprint("fn a() {}"), text_fingerprint("fn b() {}"));
    }
}
