use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::Map;
use storefront_rs::models::{
    total_pages, validate_cart_quantity, AvailabilityStatus, Cart, CreateProductRequest, Product,
    ProductListParams, ProductQuery, MAX_PAGE_LIMIT,
};

prop_compose! {
    fn arb_availability()(status in prop_oneof![
        Just(AvailabilityStatus::Available),
        Just(AvailabilityStatus::OutOfStock),
        Just(AvailabilityStatus::Discontinued),
        Just(AvailabilityStatus::PreOrder),
    ]) -> AvailabilityStatus {
        status
    }
}

prop_compose! {
    fn arb_product()(
        name in "[a-zA-Z0-9 ]{3,40}",
        category in prop_oneof![Just("tools"), Just("Garden"), Just("LIGHTING")],
        availability in arb_availability(),
        cents in 0u32..1_000_000,
    ) -> Product {
        Product::new(CreateProductRequest {
            name,
            description: None,
            category: category.to_string(),
            availability,
            price: Decimal::from_parts(cents, 0, 0, false, 2),
            stock: 1,
            attributes: Map::new(),
        })
    }
}

proptest! {
    #[test]
    fn total_pages_is_ceiling(total in 0usize..10_000, limit in 1u32..=MAX_PAGE_LIMIT) {
        let pages = total_pages(total, limit) as usize;
        let limit = limit as usize;

        prop_assert!(pages * limit >= total);
        if total > 0 {
            prop_assert!((pages - 1) * limit < total);
        } else {
            prop_assert_eq!(pages, 0);
        }
    }

    #[test]
    fn page_flags_follow_page_position(
        products in prop::collection::vec(arb_product(), 0..60),
        limit in 1u32..20,
        page in 1u32..10,
    ) {
        let query = ProductQuery::from_params(&ProductListParams {
            limit: Some(limit.to_string()),
            page: Some(page.to_string()),
            ..Default::default()
        });
        let total = products.len();
        let result = query.apply(products);

        prop_assert_eq!(result.total_count, total);
        prop_assert_eq!(result.total_pages, total_pages(total, limit));
        prop_assert_eq!(result.has_next_page, page < result.total_pages);
        prop_assert_eq!(result.has_prev_page, page > 1);
        prop_assert_eq!(result.next_link.is_some(), result.has_next_page);
        prop_assert!(result.payload.len() <= limit as usize);
    }

    #[test]
    fn filter_is_case_insensitive(
        products in prop::collection::vec(arb_product(), 0..40),
        needle in prop_oneof![Just("TOOLS"), Just("garden"), Just("Lighting"), Just("STOCK")],
    ) {
        let lower = needle.to_lowercase();
        let expected = products
            .iter()
            .filter(|p| {
                p.category.to_lowercase().contains(&lower)
                    || p.availability.as_str().contains(&lower)
            })
            .count();

        let query = ProductQuery::from_params(&ProductListParams {
            query: Some(needle.to_string()),
            limit: Some(MAX_PAGE_LIMIT.to_string()),
            ..Default::default()
        });

        prop_assert_eq!(query.apply(products).total_count, expected);
    }

    #[test]
    fn sorted_listing_is_ordered(products in prop::collection::vec(arb_product(), 0..50)) {
        let query = ProductQuery::from_params(&ProductListParams {
            sort: Some("asc".to_string()),
            limit: Some(MAX_PAGE_LIMIT.to_string()),
            ..Default::default()
        });

        let page = query.apply(products);
        prop_assert!(page.payload.windows(2).all(|w| w[0].price <= w[1].price));
    }

    #[test]
    fn adding_merges_line_items(ids in prop::collection::vec(0usize..5, 0..50)) {
        let mut cart = Cart::new();
        for id in &ids {
            cart.add_product(&format!("p-{}", id)).unwrap();
        }

        let mut distinct = ids.clone();
        distinct.sort_unstable();
        distinct.dedup();

        prop_assert_eq!(cart.products.len(), distinct.len());
        prop_assert_eq!(cart.total_items() as usize, ids.len());
        for id in distinct {
            let expected = ids.iter().filter(|i| **i == id).count() as u32;
            prop_assert_eq!(cart.quantity_of(&format!("p-{}", id)), expected);
        }
    }

    #[test]
    fn removing_absent_product_is_noop(ids in prop::collection::vec(0usize..5, 0..20)) {
        let mut cart = Cart::new();
        for id in &ids {
            cart.add_product(&format!("p-{}", id)).unwrap();
        }
        let before = cart.clone();

        prop_assert!(!cart.remove_product("p-absent"));
        prop_assert_eq!(cart, before);
    }

    #[test]
    fn cart_quantity_bounds(quantity in -5000i64..5000) {
        let result = validate_cart_quantity(quantity);
        prop_assert_eq!(result.is_ok(), (1..=1000).contains(&quantity));
    }
}
