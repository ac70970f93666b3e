// Request validation: URLs, sizes, pagination, session naming

use prodshot_backend_core::models::generated_image::{
    GenerateImageRequest, SUPPORTED_IMAGE_SIZES,
};
use prodshot_backend_core::models::product::{validate_source_url, ProductPagination};
use prodshot_backend_core::models::studio_session::CreateSessionRequest;
use validator::Validate;

#[test]
fn only_http_and_https_product_urls_pass() {
    assert!(validate_source_url("https://shop.example.com/products/mug").is_ok());
    assert!(validate_source_url("http://shop.example.com/products/mug").is_ok());

    assert!(validate_source_url("ftp://shop.example.com/file").is_err());
    assert!(validate_source_url("javascript:alert(1)").is_err());
    assert!(validate_source_url("shop.example.com/products/mug").is_err());
}

#[test]
fn loopback_hosts_are_blocked() {
    assert!(validate_source_url("https://localhost/admin").is_err());
    assert!(validate_source_url("http://127.0.0.1:8080/internal").is_err());
    assert!(validate_source_url("http://0.0.0.0/x").is_err());
    assert!(validate_source_url("http://[::1]/x").is_err());
}

#[test]
fn every_supported_size_validates() {
    for size in SUPPORTED_IMAGE_SIZES {
        let request = GenerateImageRequest {
            prompt: "hero shot".to_string(),
            recommendation: None,
            size: Some(size.to_string()),
            parent_image_id: None,
        };
        assert!(request.validate_custom().is_ok(), "size {} rejected", size);
    }
}

#[test]
fn unsupported_sizes_are_rejected_with_the_size_named() {
    let request = GenerateImageRequest {
        prompt: "hero shot".to_string(),
        recommendation: None,
        size: Some("2048x2048".to_string()),
        parent_image_id: None,
    };
    let err = request.validate_custom().unwrap_err();
    assert!(err.contains("2048x2048"));
}

#[test]
fn missing_size_defaults_to_square() {
    let request = GenerateImageRequest {
        prompt: "hero shot".to_string(),
        recommendation: None,
        size: None,
        parent_image_id: None,
    };
    assert!(request.validate_custom().is_ok());
    assert_eq!(request.size_or_default(), "1024x1024");
}

#[test]
fn empty_prompt_fails_derive_validation() {
    let request = GenerateImageRequest {
        prompt: String::new(),
        recommendation: None,
        size: None,
        parent_image_id: None,
    };
    assert!(request.validate().is_err());
}

#[test]
fn pagination_clamps_page_and_per_page() {
    let p = ProductPagination {
        page: 2,
        per_page: 25,
    };
    assert_eq!(p.offset(), 25);
    assert_eq!(p.limit(), 25);

    let wild = ProductPagination {
        page: -5,
        per_page: 10_000,
    };
    assert_eq!(wild.offset(), 0);
    assert_eq!(wild.limit(), 100);

    let zero = ProductPagination {
        page: 1,
        per_page: 0,
    };
    assert_eq!(zero.limit(), 1);
}

#[test]
fn session_names_fall_back_to_the_product() {
    let unnamed = CreateSessionRequest { name: None };
    assert_eq!(
        unnamed.name_for("Ceramic Mug"),
        "Studio Session - Ceramic Mug"
    );

    let named = CreateSessionRequest {
        name: Some("Holiday shoot".to_string()),
    };
    assert_eq!(named.name_for("Ceramic Mug"), "Holiday shoot");
}
