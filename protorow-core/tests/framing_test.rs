use orders_schema::{descriptor_pool, order_descriptor, sample_orders};
use protorow_core::BatchDecoder;
use protorow_core::framing::{DelimitedReader, DelimitedWriter, FramingError};
use protorow_core::prost_reflect::DynamicMessage;

fn delimited_samples() -> Vec<u8> {
    let pool = descriptor_pool();
    let mut writer = DelimitedWriter::new(Vec::new());
    for order in sample_orders(&pool) {
        writer.write(&order).expect("writing to a Vec cannot fail");
    }
    writer.into_inner()
}

#[test]
fn test_write_then_read_records() {
    let pool = descriptor_pool();
    let descriptor = order_descriptor(&pool);
    let bytes = delimited_samples();

    let reader = DelimitedReader::new(bytes.as_slice(), descriptor.clone());
    let records: Vec<DynamicMessage> = reader
        .collect::<Result<_, _>>()
        .expect("stream reads back cleanly");
    assert_eq!(records.len(), 3);

    let id = descriptor.get_field_by_name("id").expect("field exists");
    let ids: Vec<_> = records
        .iter()
        .map(|record| record.get_field(&id).as_u64().expect("id is uint64"))
        .collect();
    assert_eq!(ids, [1, 2, 3]);
}

#[test]
fn test_empty_stream_yields_nothing() {
    let pool = descriptor_pool();
    let empty: &[u8] = &[];
    let mut reader = DelimitedReader::new(empty, order_descriptor(&pool));
    assert!(reader.next().is_none());
}

#[test]
fn test_zero_length_record_is_a_default_message() {
    let pool = descriptor_pool();
    let descriptor = order_descriptor(&pool);

    let mut writer = DelimitedWriter::new(Vec::new());
    writer
        .write(&DynamicMessage::new(descriptor.clone()))
        .expect("writing to a Vec cannot fail");
    let bytes = writer.into_inner();
    assert_eq!(bytes, [0x00]);

    let mut reader = DelimitedReader::new(bytes.as_slice(), descriptor.clone());
    let record = reader
        .next()
        .expect("one record present")
        .expect("record decodes");
    let id = descriptor.get_field_by_name("id").expect("field exists");
    assert_eq!(record.get_field(&id).as_u64(), Some(0));
    assert!(reader.next().is_none());
}

#[test]
fn test_truncated_stream_errors() {
    let pool = descriptor_pool();
    let descriptor = order_descriptor(&pool);
    let mut bytes = delimited_samples();
    bytes.truncate(bytes.len() - 3);

    let results: Vec<_> = DelimitedReader::new(bytes.as_slice(), descriptor).collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(results[1].is_ok());
    assert!(matches!(results[2], Err(FramingError::Io(_))));
}

#[test]
fn test_overlong_length_prefix_rejected() {
    let pool = descriptor_pool();
    let bytes = [0xffu8; 10];
    let mut reader = DelimitedReader::new(&bytes[..], order_descriptor(&pool));
    match reader.next() {
        Some(Err(FramingError::InvalidLength)) => {}
        other => panic!("Expected InvalidLength, got {other:?}"),
    }
}

#[test]
fn test_batch_decoder_chunks_by_batch_size() {
    let pool = descriptor_pool();
    let descriptor = order_descriptor(&pool);
    let orders = sample_orders(&pool);

    let mut writer = DelimitedWriter::new(Vec::new());
    for order in orders.iter().chain(orders.iter().take(2)) {
        writer.write(order).expect("writing to a Vec cannot fail");
    }
    let bytes = writer.into_inner();

    let decoder = BatchDecoder::new(bytes.as_slice(), descriptor.clone(), 2)
        .expect("Order maps to a schema");
    assert_eq!(
        decoder.schema().as_ref(),
        &protorow_core::message_schema(&descriptor).expect("Order maps to a schema")
    );

    let batches: Vec<_> = decoder
        .collect::<Result<_, _>>()
        .expect("all batches decode");
    let sizes: Vec<_> = batches.iter().map(|batch| batch.num_rows()).collect();
    assert_eq!(sizes, [2, 2, 1]);
}
