// Share code generation: alphabet, lengths, reserved words

use prodshot_backend_core::services::share_code::{
    ShareCodeGenerator, SHORT_CODE_LENGTH, TOKEN_LENGTH,
};
use prodshot_backend_core::utils::base62::{is_base62, random_code};
use std::collections::HashSet;

#[test]
fn short_codes_use_the_base62_alphabet() {
    for _ in 0..100 {
        let code = ShareCodeGenerator::candidate_code();
        assert_eq!(code.len(), SHORT_CODE_LENGTH);
        assert!(is_base62(&code), "non-base62 code: {}", code);
    }
}

#[test]
fn tokens_are_long_and_opaque() {
    let token = ShareCodeGenerator::generate_token();
    assert_eq!(token.len(), TOKEN_LENGTH);
    assert!(is_base62(&token));
}

#[test]
fn codes_do_not_collide_in_practice() {
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        assert!(seen.insert(ShareCodeGenerator::candidate_code()));
    }
}

#[test]
fn reserved_route_names_are_rejected() {
    for reserved in ["api", "admin", "health", "docs", "static", "showcase"] {
        assert!(ShareCodeGenerator::is_reserved(reserved));
        assert!(ShareCodeGenerator::is_reserved(&reserved.to_uppercase()));
    }
    assert!(!ShareCodeGenerator::is_reserved("aB3xK9mQ"));
}

#[test]
fn random_code_respects_requested_length() {
    for len in [1, 8, 16, 32, 64] {
        assert_eq!(random_code(len).len(), len);
    }
}
