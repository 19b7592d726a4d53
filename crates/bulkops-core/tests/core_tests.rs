use bulkops_core::{BulkConfig, BulkItem, BulkProgress, BulkResult, ItemStatus};
use chrono::Utc;
use strum::IntoEnumIterator;

#[test]
fn test_item_serialization_shape() {
    let mut item = BulkItem::new("course-7", "Intro to Rust");
    item.mark_error("boom");

    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["id"], "course-7");
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"], "boom");

    item.mark_success();
    let json = serde_json::to_value(&item).unwrap();
    assert_eq!(json["status"], "success");
    assert!(json.get("error").is_none());
}

#[test]
fn test_every_status_counted_once() {
    let items: Vec<BulkItem> = ItemStatus::iter()
        .enumerate()
        .map(|(i, status)| {
            let mut item = BulkItem::new(i.to_string(), format!("Item {i}"));
            item.status = status;
            if status == ItemStatus::Error {
                item.error = Some("failed".into());
            }
            item
        })
        .collect();

    let progress = BulkProgress::from_items(&items);
    assert_eq!(
        progress.total,
        progress.successful + progress.failed + progress.pending + progress.processing
    );
    assert!((0.0..=100.0).contains(&progress.percentage));
}

#[test]
fn test_result_success_requires_all_settled() {
    let mut items = vec![BulkItem::new("a", "A"), BulkItem::new("b", "B")];
    items[0].mark_success();
    items[1].mark_success();

    let result = BulkResult::from_items(items, false, Utc::now());
    assert!(result.is_success());
    assert_eq!(result.summary(), "2 succeeded");
    assert!(result.finished_at >= result.started_at);
}

#[test]
fn test_config_from_toml() {
    let config: BulkConfig = toml::from_str("batch_size = 3").unwrap();
    assert_eq!(config.batch_size, 3);
    assert_eq!(config.delay_between_batches_ms, 100);
    assert!(config.validate().is_ok());

    let config: BulkConfig = toml::from_str("batch_size = 0").unwrap();
    assert!(config.validate().is_err());
}
