use orders_schema::{descriptor_pool, order_descriptor, sample_orders};
use protorow_core::arrow::array::{
    Array, BinaryArray, BooleanArray, Float64Array, Int32Array, ListArray, MapArray, RecordBatch,
    StringArray, StructArray, TimestampNanosecondArray, UInt64Array,
};
use protorow_core::messages_to_record_batch;

fn sample_batch() -> RecordBatch {
    let pool = descriptor_pool();
    let descriptor = order_descriptor(&pool);
    let orders = sample_orders(&pool);
    messages_to_record_batch(&orders, &descriptor).expect("samples convert cleanly")
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> &'a T {
    batch
        .column_by_name(name)
        .expect("column exists")
        .as_any()
        .downcast_ref::<T>()
        .expect("column has the mapped array type")
}

#[test]
fn test_scalars_and_proto3_defaults() {
    let batch = sample_batch();
    assert_eq!(batch.num_rows(), 3);

    let ids = column::<UInt64Array>(&batch, "id");
    assert_eq!(ids.values().as_ref(), &[1, 2, 3]);

    // Unset scalars without presence surface defaults, not nulls
    let totals = column::<Float64Array>(&batch, "total");
    assert_eq!(totals.value(0), 99.5);
    assert_eq!(totals.value(1), 12.25);
    assert!(totals.is_valid(2));
    assert_eq!(totals.value(2), 0.0);

    let express = column::<BooleanArray>(&batch, "express");
    assert!(express.value(0));
    assert!(express.is_valid(1));
    assert!(!express.value(1));

    let payloads = column::<BinaryArray>(&batch, "payload");
    assert_eq!(payloads.value(0), b"\x01\x02");
    assert!(payloads.is_valid(1));
    assert_eq!(payloads.value(1), b"");
}

#[test]
fn test_enum_values_surface_as_names() {
    let batch = sample_batch();
    let statuses = column::<StringArray>(&batch, "status");
    assert_eq!(statuses.value(0), "SHIPPED");
    assert_eq!(statuses.value(1), "DELIVERED");
    // Numbers with no named value fall back to their decimal rendering
    assert_eq!(statuses.value(2), "42");
}

#[test]
fn test_presence_fields_are_null_when_unset() {
    let batch = sample_batch();

    let shipping = column::<StructArray>(&batch, "shipping");
    assert!(shipping.is_valid(0));
    assert!(shipping.is_null(1));
    assert!(shipping.is_null(2));
    let cities = shipping
        .column_by_name("city")
        .expect("struct keeps subfields")
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("city is utf8");
    assert_eq!(cities.value(0), "Zurich");

    let priorities = column::<Int32Array>(&batch, "priority");
    assert_eq!(priorities.value(0), 7);
    assert!(priorities.is_null(1));
    assert!(priorities.is_null(2));

    let created = column::<TimestampNanosecondArray>(&batch, "created_at");
    assert_eq!(created.value(0), 1_700_000_000 * 1_000_000_000 + 500);
    assert!(created.is_null(1));
}

#[test]
fn test_repeated_fields_are_empty_not_null() {
    let batch = sample_batch();
    let tags = column::<ListArray>(&batch, "tags");

    let first = tags.value(0);
    let first = first
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("tags items are utf8");
    assert_eq!(first.value(0), "new");
    assert_eq!(first.value(1), "priority");

    assert!(tags.is_valid(1));
    assert_eq!(tags.value(1).len(), 0);

    let third = tags.value(2);
    let third = third
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("tags items are utf8");
    assert_eq!(third.value(0), "vip");
}

#[test]
fn test_repeated_messages() {
    let batch = sample_batch();
    let previous = column::<ListArray>(&batch, "previous_addresses");

    let first = previous.value(0);
    let first = first
        .as_any()
        .downcast_ref::<StructArray>()
        .expect("items are structs");
    assert_eq!(first.len(), 2);
    let cities = first
        .column_by_name("city")
        .expect("struct keeps subfields")
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("city is utf8");
    assert_eq!(cities.value(0), "Bern");
    assert_eq!(cities.value(1), "Basel");

    assert_eq!(previous.value(1).len(), 0);
}

#[test]
fn test_map_entries_are_sorted_by_key() {
    let batch = sample_batch();
    let attributes = column::<MapArray>(&batch, "attributes");

    let first = attributes.value(0);
    let first = first
        .as_any()
        .downcast_ref::<StructArray>()
        .expect("map entries are structs");
    let keys = first
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("keys are utf8");
    let values = first
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .expect("values are utf8");
    assert_eq!(keys.value(0), "source");
    assert_eq!(keys.value(1), "tier");
    assert_eq!(values.value(0), "web");
    assert_eq!(values.value(1), "gold");

    assert!(attributes.is_valid(1));
    assert_eq!(attributes.value(1).len(), 0);
}

#[test]
fn test_batch_schema_matches_mapping() {
    let pool = descriptor_pool();
    let descriptor = order_descriptor(&pool);
    let batch = sample_batch();
    let expected = protorow_core::message_schema(&descriptor).expect("Order maps to a schema");
    assert_eq!(batch.schema().as_ref(), &expected);
}
