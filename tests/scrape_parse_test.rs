// Scrape payload parsing: extraction block into product data

use prodshot_backend_core::services::scrape::parse_scrape_response;
use serde_json::json;

#[test]
fn full_payload_parses() {
    let data = json!({
        "markdown": "# Walnut Desk Organizer",
        "extract": {
            "title": "Walnut Desk Organizer",
            "description": "Solid walnut organizer with five compartments.",
            "price": "$49.00",
            "images": [
                "https://cdn.shop.example/organizer-front.jpg",
                "https://cdn.shop.example/organizer-top.jpg"
            ]
        }
    });

    let product = parse_scrape_response(&data).unwrap();
    assert_eq!(product.name, "Walnut Desk Organizer");
    assert_eq!(product.images.len(), 2);
    assert!(product.description.is_some());
    // The raw payload is preserved for reprocessing
    assert_eq!(product.raw["extract"]["price"], "$49.00");
}

#[test]
fn duplicate_images_are_removed_keeping_first_seen_order() {
    let data = json!({
        "extract": {
            "title": "Mug",
            "images": [
                "https://cdn.example.com/b.jpg",
                "https://cdn.example.com/a.jpg",
                "https://cdn.example.com/b.jpg"
            ]
        }
    });

    let product = parse_scrape_response(&data).unwrap();
    assert_eq!(
        product.images,
        vec!["https://cdn.example.com/b.jpg", "https://cdn.example.com/a.jpg"]
    );
}

#[test]
fn non_http_image_entries_are_dropped() {
    let data = json!({
        "extract": {
            "title": "Mug",
            "images": ["data:image/png;base64,AAA", "//cdn.example.com/x.jpg", "https://ok.example/x.jpg"]
        }
    });

    let product = parse_scrape_response(&data).unwrap();
    assert_eq!(product.images, vec!["https://ok.example/x.jpg"]);
}

#[test]
fn missing_or_blank_title_yields_nothing() {
    assert!(parse_scrape_response(&json!({"markdown": "# x"})).is_none());
    assert!(parse_scrape_response(&json!({"extract": {"images": []}})).is_none());
    assert!(parse_scrape_response(&json!({"extract": {"title": "  ", "images": []}})).is_none());
}

#[test]
fn blank_description_becomes_none() {
    let data = json!({"extract": {"title": "Mug", "description": "   ", "images": []}});
    let product = parse_scrape_response(&data).unwrap();
    assert!(product.description.is_none());
}
