// Base62 random code generation for share tokens and short codes

use rand::Rng;

pub const BASE62_ALPHABET: &[u8; 62] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generate a random base62 string of the given length
pub fn random_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..BASE62_ALPHABET.len());
            BASE62_ALPHABET[idx] as char
        })
        .collect()
}

/// Whether a string is valid base62
pub fn is_base62(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| BASE62_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_code_length_and_alphabet() {
        for len in [8, 16, 32] {
            let code = random_code(len);
            assert_eq!(code.len(), len);
            assert!(is_base62(&code));
        }
    }

    #[test]
    fn test_codes_are_not_repeated() {
        // 32 chars of base62 never realistically collide across two draws
        assert_ne!(random_code(32), random_code(32));
    }

    #[test]
    fn test_is_base62() {
        assert!(is_base62("aB3xK9mQ"));
        assert!(!is_base62("has-dash"));
        assert!(!is_base62(""));
        assert!(!is_base62("white space"));
    }
}
