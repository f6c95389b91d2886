//! End-to-end coverage of the single-key service surface: the read
//! pipeline, the write paths, and the cache wiring between them.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use strata_cache::CacheService;
use strata_core::{PageRequest, ServiceError};
use strata_data::{EntityStore, InMemoryStore};
use strata_service::{CacheMode, GenericService, KeyedRoles, ServiceOptions, ServiceRoles};
use strata_test_utils::{
    order_store, Order, OrderCreate, OrderDetail, OrderSummary, OrderUpdate,
};
use uuid::Uuid;

struct OrderRoles;

impl ServiceRoles for OrderRoles {
    type Entity = Order;
    type Request = PageRequest;
    type List = OrderSummary;
    type Detail = OrderDetail;
    type Create = OrderCreate;
    type Update = OrderUpdate;
}

impl KeyedRoles for OrderRoles {
    type Key = i64;
}

type OrderService = GenericService<OrderRoles, InMemoryStore<Order>>;

fn service(store: Arc<InMemoryStore<Order>>, options: ServiceOptions<OrderRoles>) -> OrderService {
    GenericService::new(store, Arc::new(CacheService::default()), options)
}

fn create_input(id: i64) -> OrderCreate {
    OrderCreate {
        id,
        number: format!("ORD-{id:05}"),
        customer: "new customer".into(),
        total: Decimal::from(25),
        status: 0,
    }
}

#[tokio::test]
async fn second_page_of_1500_is_the_oldest_500_newest_first() {
    let svc = service(order_store(1500), ServiceOptions::new());
    let request = PageRequest {
        page_index: 2,
        page_size: 1000,
        ..Default::default()
    };

    let page = svc.list(&request).await.unwrap();

    assert_eq!(page.len(), 500);
    assert_eq!(page.first().map(|o| o.id), Some(500));
    assert_eq!(page.last().map(|o| o.id), Some(1));
}

#[tokio::test]
async fn sort_spec_resolves_storage_column_names() {
    let svc = service(order_store(5), ServiceOptions::new());
    let request = PageRequest {
        sorting: Some("order_number desc".into()),
        ..Default::default()
    };

    let page = svc.list(&request).await.unwrap();
    let ids: Vec<i64> = page.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![5, 4, 3, 2, 1]);
}

#[tokio::test]
async fn filter_hook_narrows_every_read() {
    let options = ServiceOptions::new().with_filter(|_request: &PageRequest| {
        strata_data::equality::<Order>(&[("Status".into(), strata_core::FieldValue::I32(0))])
            .unwrap_or_else(|_| strata_data::never())
    });
    let svc = service(order_store(9), options);

    let page = svc.list(&PageRequest::default()).await.unwrap();
    assert_eq!(page.len(), 3);

    let count = svc.count_filtered(&PageRequest::default()).await.unwrap();
    assert_eq!(count, 3);
}

#[tokio::test]
async fn get_returns_detail_or_none() {
    let svc = service(order_store(3), ServiceOptions::new());

    let detail = svc.get(2).await.unwrap().unwrap();
    assert_eq!(detail.number, "ORD-00002");
    assert_eq!(detail.customer, "customer-2");

    assert!(svc.get(99).await.unwrap().is_none());
}

#[tokio::test]
async fn create_persists_and_stamps_the_actor() {
    let actor = Uuid::now_v7();
    let store = order_store(0);
    let options = ServiceOptions::new().with_current_actor(move || Some(actor));
    let svc = service(Arc::clone(&store), options);

    assert!(svc.create(create_input(1)).await.unwrap());

    let rows = store.scan().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].created_by, actor);
    assert!(rows[0].updated_at.is_none());
}

#[tokio::test]
async fn create_validation_failure_is_bad_request_without_a_write() {
    let store = order_store(0);
    let options = ServiceOptions::new().with_validate_create(|_: &OrderCreate| false);
    let svc = service(Arc::clone(&store), options);

    let err = svc.create(create_input(1)).await.unwrap_err();
    assert!(matches!(err, ServiceError::BadRequest(_)));
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn extend_create_hook_runs_after_mapping() {
    let store = order_store(0);
    let options = ServiceOptions::new().with_extend_create(|order: &mut Order| {
        order.status = 7;
    });
    let svc = service(Arc::clone(&store), options);

    svc.create(create_input(1)).await.unwrap();
    assert_eq!(store.scan().await.unwrap()[0].status, 7);
}

#[tokio::test]
async fn update_merges_only_supplied_fields() {
    let store = order_store(3);
    let svc = service(Arc::clone(&store), ServiceOptions::new());

    let input = OrderUpdate {
        customer: Some("renamed".into()),
        ..Default::default()
    };
    assert!(svc.update(2, input).await.unwrap());

    let rows = store.scan().await.unwrap();
    let updated = rows.iter().find(|o| o.id == 2).unwrap();
    assert_eq!(updated.customer, "renamed");
    assert_eq!(updated.number, "ORD-00002");
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn update_missing_identity_is_not_found_without_a_write() {
    let store = order_store(3);
    let svc = service(Arc::clone(&store), ServiceOptions::new());

    let err = svc.update(42, OrderUpdate::default()).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn patch_resolves_columns_and_coerces_values() {
    let store = order_store(1);
    let svc = service(Arc::clone(&store), ServiceOptions::new());

    // Storage column names, with the status arriving as text.
    let input = vec![
        ("customer_name".to_string(), json!("alice")),
        ("status".to_string(), json!("2")),
        ("unknown_field".to_string(), json!("ignored")),
    ];
    assert!(svc.patch(1, &input).await.unwrap());

    let rows = store.scan().await.unwrap();
    assert_eq!(rows[0].customer, "alice");
    assert_eq!(rows[0].status, 2);
}

#[tokio::test]
async fn patch_never_writes_identity_fields() {
    let store = order_store(1);
    let svc = service(Arc::clone(&store), ServiceOptions::new());

    let input = vec![("id".to_string(), json!(99))];
    svc.patch(1, &input).await.unwrap();

    assert_eq!(store.scan().await.unwrap()[0].id, 1);
}

#[tokio::test]
async fn patch_coercion_failure_rejects_the_whole_patch() {
    let store = order_store(1);
    let svc = service(Arc::clone(&store), ServiceOptions::new());

    let input = vec![("status".to_string(), json!("not a number"))];
    let err = svc.patch(1, &input).await.unwrap_err();
    assert!(matches!(err, ServiceError::Schema(_)));
    assert_eq!(store.scan().await.unwrap()[0].status, 1 % 3);
}

#[tokio::test]
async fn delete_removes_or_reports_not_found() {
    let store = order_store(2);
    let svc = service(Arc::clone(&store), ServiceOptions::new());

    assert!(svc.delete(1).await.unwrap());
    assert_eq!(store.scan().await.unwrap().len(), 1);

    let err = svc.delete(1).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn cached_list_is_served_without_rescanning_until_a_write() {
    let store = order_store(3);
    let svc = service(
        Arc::clone(&store),
        ServiceOptions::new().with_cache_mode(CacheMode::Full),
    );
    let request = PageRequest::default();

    let first = svc.list(&request).await.unwrap();
    let scans_after_first = store.scan_count();
    let second = svc.list(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.scan_count(), scans_after_first);

    svc.create(create_input(10)).await.unwrap();
    let third = svc.list(&request).await.unwrap();
    assert_eq!(third.len(), 4);
    assert!(store.scan_count() > scans_after_first);
}

#[tokio::test]
async fn count_only_mode_caches_counts_but_not_lists() {
    let store = order_store(3);
    let svc = service(
        Arc::clone(&store),
        ServiceOptions::new().with_cache_mode(CacheMode::CountOnly),
    );

    assert_eq!(svc.count().await.unwrap(), 3);
    let scans_after_count = store.scan_count();
    assert_eq!(svc.count().await.unwrap(), 3);
    assert_eq!(store.scan_count(), scans_after_count);

    svc.list(&PageRequest::default()).await.unwrap();
    svc.list(&PageRequest::default()).await.unwrap();
    assert_eq!(store.scan_count(), scans_after_count + 2);

    // A write invalidates the count scope, so the next count recomputes.
    svc.create(create_input(10)).await.unwrap();
    assert_eq!(svc.count().await.unwrap(), 4);
}

#[tokio::test]
async fn writes_invalidate_related_scopes_too() {
    let store = order_store(1);
    let cache = Arc::new(CacheService::default());
    let options = ServiceOptions::new()
        .with_cache_mode(CacheMode::Full)
        .with_related_scope("Shipment");
    let svc = OrderService::new(Arc::clone(&store), Arc::clone(&cache), options);

    cache
        .get_or_create::<i64, std::convert::Infallible, _, _>(
            &["Shipment".to_string(), "Count".to_string()],
            || async { Ok(11) },
        )
        .await
        .unwrap();
    svc.list(&PageRequest::default()).await.unwrap();
    assert!(cache.keys().iter().any(|k| k.starts_with("Shipment")));

    svc.create(create_input(5)).await.unwrap();

    assert!(cache.keys().iter().all(|k| !k.starts_with("Shipment")));
    assert!(cache.keys().iter().all(|k| !k.starts_with("Order")));
}

#[tokio::test]
async fn list_as_projects_to_an_alternate_shape() {
    let svc = service(order_store(2), ServiceOptions::new());
    let details: Vec<OrderDetail> = svc.list_as(&PageRequest::default()).await.unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].customer, "customer-2");
}

#[tokio::test]
async fn list_all_is_newest_first() {
    let svc = service(order_store(4), ServiceOptions::new());
    let all = svc.list_all().await.unwrap();
    let ids: Vec<i64> = all.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![4, 3, 2, 1]);
}
