// JWT validation against a fixed test configuration

use prodshot_backend_core::services::jwt::{JwtConfig, JwtService};
use uuid::Uuid;

fn service(secret: &str) -> JwtService {
    JwtService::with_config(JwtConfig {
        access_secret: secret.to_string(),
        audience: "prodshot.io".to_string(),
        issuer: "prodshot-backend".to_string(),
    })
}

#[test]
fn minted_tokens_validate_and_carry_claims() {
    let svc = service("integration-test-secret");
    let user_id = Uuid::new_v4();

    let token = svc
        .generate_access_token(user_id, "owner@acme.example", "pro", 900)
        .unwrap();
    let claims = svc.validate_access_token(&token).unwrap();

    assert_eq!(claims.email, "owner@acme.example");
    assert_eq!(claims.tier, "pro");
    assert_eq!(claims.aud, "prodshot.io");
    assert_eq!(claims.iss, "prodshot-backend");
    assert_eq!(JwtService::user_id_from_claims(&claims).unwrap(), user_id);
}

#[test]
fn tokens_from_another_key_are_rejected() {
    let issuer = service("key-one");
    let verifier = service("key-two");

    let token = issuer
        .generate_access_token(Uuid::new_v4(), "a@b.c", "free", 900)
        .unwrap();
    assert!(verifier.validate_access_token(&token).is_err());
}

#[test]
fn malformed_tokens_are_rejected() {
    let svc = service("integration-test-secret");
    assert!(svc.validate_access_token("").is_err());
    assert!(svc.validate_access_token("abc.def").is_err());
    assert!(svc.validate_access_token("not a jwt at all").is_err());
}
