mod common;

use storehub_auth::SecurityContext;
use storehub_infra::{EntityStore, ServiceError, StoreError};
use storehub_products::{Category, Product, ProductDraft};
use storehub_query::{FilterCriterion, FilterOperator, PageFilter, NOT_ASSIGNED};

use common::*;

fn names(rows: &[Product]) -> Vec<&str> {
    let mut names: Vec<&str> = rows.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    names
}

fn by_price(filter: FilterCriterion) -> PageFilter {
    PageFilter::new(0, 20, "price", "asc").with_filter(filter)
}

#[test]
fn category_equals_returns_the_single_fruit() {
    let app = app();
    seed_products(
        &app,
        &[
            ("apple", Category::Fruits, 1.0, None),
            ("carrot", Category::Vegetables, 2.0, None),
            ("milk", Category::Dairy, 3.0, None),
        ],
    );
    let page = app
        .products
        .search(
            &admin(&app),
            &by_price(FilterCriterion::new("category", FilterOperator::Equals, ["FRUITS"])),
        )
        .unwrap();
    assert_eq!(names(&page.content), vec!["apple"]);
    assert_eq!(page.total, 1);
    assert!(page.last);
}

#[test]
fn price_between_is_inclusive_and_excludes_outliers() {
    let app = app();
    seed_products(
        &app,
        &[
            ("five", Category::Fruits, 5.0, None),
            ("fifteen", Category::Fruits, 15.0, None),
            ("twentyfive", Category::Fruits, 25.0, None),
        ],
    );
    let page = app
        .products
        .search(
            &admin(&app),
            &by_price(FilterCriterion::new("price", FilterOperator::Between, ["10", "20"])),
        )
        .unwrap();
    assert_eq!(names(&page.content), vec!["fifteen"]);
}

#[test]
fn in_with_not_assigned_matches_nulls_and_listed_values() {
    let app = app();
    seed_products(
        &app,
        &[
            ("none", Category::Fruits, 1.0, None),
            ("five", Category::Fruits, 2.0, Some(5.0)),
            ("seven", Category::Fruits, 3.0, Some(7.0)),
        ],
    );
    let page = app
        .products
        .search(
            &admin(&app),
            &by_price(FilterCriterion::new("discount", FilterOperator::In, [NOT_ASSIGNED, "5"])),
        )
        .unwrap();
    assert_eq!(names(&page.content), vec!["five", "none"]);
}

#[test]
fn paging_envelope_and_sort() {
    let app = app();
    seed_products(
        &app,
        &[
            ("a", Category::Fruits, 3.0, None),
            ("b", Category::Fruits, 1.0, None),
            ("c", Category::Fruits, 2.0, None),
        ],
    );
    let page = app
        .products
        .list(&admin(&app), &PageFilter::new(1, 2, "price", "desc"))
        .unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.size, 2);
    assert_eq!(page.total, 3);
    assert_eq!(page.total_pages, 2);
    assert!(page.last);
    assert_eq!(names(&page.content), vec!["b"]);

    let json = serde_json::to_value(&page).unwrap();
    assert_eq!(json["totalPages"], 2);
    assert_eq!(json["content"][0]["Name"], "b");
}

#[test]
fn duplicate_names_conflict_only_with_other_products() {
    let app = app();
    let ctx = admin(&app);
    let rows = seed_products(
        &app,
        &[
            ("apple", Category::Fruits, 1.0, None),
            ("pear", Category::Fruits, 1.0, None),
        ],
    );

    let err = app
        .products
        .create(&ctx, ProductDraft::new("apple", Category::Fruits, 2.0, 1))
        .unwrap_err();
    assert_eq!(err, ServiceError::already_exists("Product", "name", "apple"));
    assert_eq!(err.status_code(), 409);

    let renamed = app
        .products
        .update(&ctx, rows[0].id, ProductDraft::new("apple", Category::Fruits, 9.0, 1))
        .unwrap();
    assert_eq!(renamed.price, 9.0);

    let clash = app
        .products
        .update(&ctx, rows[1].id, ProductDraft::new("apple", Category::Fruits, 1.0, 1))
        .unwrap_err();
    assert!(matches!(clash, ServiceError::AlreadyExists { .. }));
}

#[test]
fn store_rejects_duplicate_names_without_the_service_check() {
    let app = app();
    let store = &app.stores().products;
    store
        .save(Product::from_draft(ProductDraft::new("apple", Category::Fruits, 1.0, 1)).unwrap())
        .unwrap();
    let err = store
        .save(Product::from_draft(ProductDraft::new("apple", Category::Fruits, 2.0, 1)).unwrap())
        .unwrap_err();
    assert!(matches!(err, StoreError::UniqueViolation { field: "name", .. }));
}

#[test]
fn missing_products_are_not_found() {
    let app = app();
    let ctx = admin(&app);
    let ghost = storehub_core::ProductId::new();

    assert_eq!(
        app.products.get(&ctx, ghost).unwrap_err().status_code(),
        404
    );
    assert!(matches!(
        app.products.delete(&ctx, ghost),
        Err(ServiceError::NotFound { kind: "Product", .. })
    ));
    assert!(matches!(
        app.products.change_price(&ctx, ghost, 1.0),
        Err(ServiceError::NotFound { .. })
    ));
    assert_eq!(app.cache().len(), 0);
}

#[test]
fn price_change_refreshes_by_id_entry_but_leaves_listings_stale() {
    let app = app();
    let ctx = admin(&app);
    let apple = seed_products(&app, &[("apple", Category::Fruits, 1.0, None)]).remove(0);
    let filter = PageFilter::new(0, 10, "name", "asc");

    assert_eq!(app.products.get(&ctx, apple.id).unwrap().price, 1.0);
    assert_eq!(app.products.list(&ctx, &filter).unwrap().content[0].price, 1.0);
    assert_eq!(app.products.by_category(&ctx, Category::Fruits).unwrap()[0].price, 1.0);

    app.products.change_price(&ctx, apple.id, 4.0).unwrap();

    assert_eq!(app.products.get(&ctx, apple.id).unwrap().price, 4.0);
    assert_eq!(app.products.list(&ctx, &filter).unwrap().content[0].price, 1.0);
    assert_eq!(app.products.by_category(&ctx, Category::Fruits).unwrap()[0].price, 1.0);
    assert_eq!(app.products.search(&ctx, &filter).unwrap().content[0].price, 4.0);

    // Any full write evicts the namespace.
    app.products.increase_quantity(&ctx, apple.id, 5).unwrap();
    seed_products(&app, &[("pear", Category::Fruits, 2.0, None)]);
    let refreshed = app.products.list(&ctx, &filter).unwrap();
    assert_eq!(refreshed.content[0].price, 4.0);
    assert_eq!(refreshed.content[0].quantity, 15);
}

#[test]
fn stock_cannot_go_negative() {
    let app = app();
    let ctx = admin(&app);
    let apple = seed_products(&app, &[("apple", Category::Fruits, 1.0, None)]).remove(0);
    let err = app.products.increase_quantity(&ctx, apple.id, -11).unwrap_err();
    assert_eq!(err.code(), "validation_error");
    assert_eq!(app.products.increase_quantity(&ctx, apple.id, -10).unwrap().quantity, 0);
}

#[test]
fn disabled_cache_always_reads_through() {
    let config = storehub_infra::AppConfig {
        cache_enabled: false,
        ..Default::default()
    };
    let app = app_with(config);
    let ctx = admin(&app);
    let apple = seed_products(&app, &[("apple", Category::Fruits, 1.0, None)]).remove(0);
    let filter = PageFilter::new(0, 10, "name", "asc");
    app.products.list(&ctx, &filter).unwrap();
    app.products.change_price(&ctx, apple.id, 2.0).unwrap();
    assert_eq!(app.products.list(&ctx, &filter).unwrap().content[0].price, 2.0);
    assert!(app.cache().is_empty());
}

#[test]
fn distinct_listings_do_not_grow_the_cache_past_its_capacity() {
    let config = storehub_infra::AppConfig {
        cache_capacity: 32,
        ..Default::default()
    };
    let app = app_with(config);
    let ctx = admin(&app);
    seed_products(&app, &[("apple", Category::Fruits, 1.0, None)]);

    for size in 1..=200 {
        let filter = PageFilter::new(0, size, "price", "asc");
        assert_eq!(app.products.list(&ctx, &filter).unwrap().content.len(), 1);
    }
    assert!(app.cache().len() <= 32, "cache holds {} entries", app.cache().len());
}

#[test]
fn readers_can_browse_but_not_write() {
    let app = app();
    let bob: SecurityContext = reader(&app, "bob");
    seed_products(&app, &[("apple", Category::Fruits, 1.0, None)]);

    assert_eq!(app.products.by_category(&bob, Category::Fruits).unwrap().len(), 1);
    assert_eq!(app.products.categories(&bob).unwrap().len(), Category::ALL.len());
    let denied = app
        .products
        .create(&bob, ProductDraft::new("kiwi", Category::Fruits, 1.0, 1))
        .unwrap_err();
    assert_eq!(denied.status_code(), 403);
}
