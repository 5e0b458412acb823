//! # Protobuf -> Arrow (read path)
//!
//! This module turns decoded `DynamicMessage`s into Arrow `RecordBatch`es.
//!
//! ## How it works
//!
//! Arrays are built column-wise and recursively: for every protobuf field the
//! values of all rows are collected, then the corresponding Arrow array is
//! assembled (nested messages recurse per subfield, repeated fields flatten
//! into a child array plus offsets, maps flatten into sorted key/value pairs).
//!
//! ## Value semantics
//!
//! * Enum values surface as their *names*; a number with no descriptor entry
//!   falls back to its decimal rendering (proto3 open enums).
//! * Fields with explicit presence (messages, `optional`, oneof members) are
//!   null when unset; scalar fields without presence surface proto3 defaults.
//! * Unset repeated fields are empty lists, unset maps are empty maps — never
//!   null.
//! * Map entries are emitted in ascending key order so output is deterministic.
//! * `google.protobuf.Timestamp` becomes nanoseconds since the epoch.
use crate::framing::{DelimitedReader, FramingError};
use crate::schema::{self, SchemaError, TIMESTAMP_MESSAGE};
use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    ListArray, MapArray, RecordBatch, RecordBatchOptions, StringArray, StructArray,
    TimestampNanosecondArray, UInt32Array, UInt64Array,
};
use arrow::buffer::{NullBuffer, OffsetBuffer};
use arrow::datatypes::{DataType, Field, Fields, Schema};
use arrow::error::ArrowError;
use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, MapKey, MessageDescriptor, Value};
use std::cmp::Ordering;
use std::io::Read;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Schema mapping failed: '{0}'")]
    Schema(#[from] SchemaError),
    #[error("Arrow error: '{0}'")]
    Arrow(#[from] ArrowError),
    #[error("Record stream error: '{0}'")]
    Framing(#[from] FramingError),
}

/// Converts a slice of messages of one type into a single `RecordBatch`.
pub fn messages_to_record_batch(
    messages: &[DynamicMessage],
    descriptor: &MessageDescriptor,
) -> Result<RecordBatch, DecodeError> {
    let schema = Arc::new(schema::message_schema(descriptor)?);
    let rows: Vec<Option<&DynamicMessage>> = messages.iter().map(Some).collect();

    let mut columns = Vec::with_capacity(schema.fields().len());
    for field in descriptor.fields() {
        columns.push(field_array(&field, collect_values(&field, &rows))?);
    }

    debug!(
        rows = messages.len(),
        message = descriptor.full_name(),
        "built record batch"
    );
    let options = RecordBatchOptions::new().with_row_count(Some(messages.len()));
    Ok(RecordBatch::try_new_with_options(schema, columns, &options)?)
}

/// Iterator adapter that reads a length-delimited protobuf stream and yields
/// `RecordBatch`es of at most `batch_size` rows.
pub struct BatchDecoder<R> {
    reader: DelimitedReader<R>,
    descriptor: MessageDescriptor,
    schema: Arc<Schema>,
    batch_size: usize,
    failed: bool,
}

impl<R: Read> BatchDecoder<R> {
    /// Validates the schema mapping up front and wraps `reader`.
    pub fn new(
        reader: R,
        descriptor: MessageDescriptor,
        batch_size: usize,
    ) -> Result<Self, SchemaError> {
        let schema = Arc::new(schema::message_schema(&descriptor)?);
        Ok(Self {
            reader: DelimitedReader::new(reader, descriptor.clone()),
            descriptor,
            schema,
            batch_size: batch_size.max(1),
            failed: false,
        })
    }

    /// The Arrow schema every yielded batch conforms to.
    pub fn schema(&self) -> Arc<Schema> {
        self.schema.clone()
    }
}

impl<R: Read> Iterator for BatchDecoder<R> {
    type Item = Result<RecordBatch, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut messages = Vec::with_capacity(self.batch_size);
        while messages.len() < self.batch_size {
            match self.reader.next() {
                Some(Ok(message)) => messages.push(message),
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
                None => break,
            }
        }
        if messages.is_empty() {
            return None;
        }
        Some(messages_to_record_batch(&messages, &self.descriptor))
    }
}

/// Collects one field's value for every row. `None` marks a null slot: the row
/// itself is absent (nested under a null parent) or the field has presence and
/// is unset.
fn collect_values(
    field: &FieldDescriptor,
    rows: &[Option<&DynamicMessage>],
) -> Vec<Option<Value>> {
    rows.iter()
        .map(|row| match row {
            Some(message) => {
                if field.supports_presence() && !message.has_field(field) {
                    None
                } else {
                    Some(message.get_field(field).into_owned())
                }
            }
            None => None,
        })
        .collect()
}

fn field_array(
    field: &FieldDescriptor,
    values: Vec<Option<Value>>,
) -> Result<ArrayRef, DecodeError> {
    if field.is_map() {
        map_array(field, values)
    } else if field.is_list() {
        list_array(field, values)
    } else {
        kind_array(&field.kind(), values)
    }
}

fn kind_array(kind: &Kind, values: Vec<Option<Value>>) -> Result<ArrayRef, DecodeError> {
    Ok(match kind {
        Kind::Double => Arc::new(Float64Array::from(scalars(&values, Value::as_f64))),
        Kind::Float => Arc::new(Float32Array::from(scalars(&values, Value::as_f32))),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            Arc::new(Int32Array::from(scalars(&values, Value::as_i32)))
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            Arc::new(Int64Array::from(scalars(&values, Value::as_i64)))
        }
        Kind::Uint32 | Kind::Fixed32 => Arc::new(UInt32Array::from(scalars(&values, Value::as_u32))),
        Kind::Uint64 | Kind::Fixed64 => Arc::new(UInt64Array::from(scalars(&values, Value::as_u64))),
        Kind::Bool => Arc::new(BooleanArray::from(scalars(&values, Value::as_bool))),
        Kind::String => Arc::new(StringArray::from_iter(scalars(&values, |value| {
            value.as_str().map(str::to_owned)
        }))),
        Kind::Bytes => Arc::new(BinaryArray::from_iter(scalars(&values, |value| {
            value.as_bytes().map(|bytes| bytes.to_vec())
        }))),
        Kind::Enum(descriptor) => {
            let names = values
                .iter()
                .map(|value| {
                    value.as_ref().and_then(Value::as_enum_number).map(|number| {
                        match descriptor.get_value(number) {
                            Some(value) => value.name().to_string(),
                            None => {
                                warn!(
                                    enum_name = descriptor.full_name(),
                                    number, "enum number has no named value"
                                );
                                number.to_string()
                            }
                        }
                    })
                })
                .collect::<Vec<_>>();
            Arc::new(StringArray::from_iter(names))
        }
        Kind::Message(message) if message.full_name() == TIMESTAMP_MESSAGE => {
            let nanos = scalars(&values, |value| {
                value.as_message().map(timestamp_nanos)
            });
            Arc::new(TimestampNanosecondArray::from(nanos))
        }
        Kind::Message(message) => struct_array(message, &values)?,
    })
}

fn scalars<T>(
    values: &[Option<Value>],
    get: impl Fn(&Value) -> Option<T>,
) -> Vec<Option<T>> {
    values
        .iter()
        .map(|value| value.as_ref().and_then(&get))
        .collect()
}

fn timestamp_nanos(message: &DynamicMessage) -> i64 {
    let seconds = message
        .get_field_by_name("seconds")
        .and_then(|value| value.as_i64())
        .unwrap_or(0);
    let nanos = message
        .get_field_by_name("nanos")
        .and_then(|value| value.as_i32())
        .unwrap_or(0);
    seconds * 1_000_000_000 + i64::from(nanos)
}

fn struct_array(
    descriptor: &MessageDescriptor,
    values: &[Option<Value>],
) -> Result<ArrayRef, DecodeError> {
    let rows: Vec<Option<&DynamicMessage>> = values
        .iter()
        .map(|value| value.as_ref().and_then(Value::as_message))
        .collect();
    let validity = NullBuffer::from(rows.iter().map(Option::is_some).collect::<Vec<_>>());

    let fields: Fields = schema::message_schema(descriptor)?.fields().clone();
    if fields.is_empty() {
        return Ok(Arc::new(StructArray::new_empty_fields(
            rows.len(),
            Some(validity),
        )));
    }

    let mut arrays = Vec::with_capacity(fields.len());
    for field in descriptor.fields() {
        arrays.push(field_array(&field, collect_values(&field, &rows))?);
    }
    Ok(Arc::new(StructArray::new(fields, arrays, Some(validity))))
}

fn list_array(
    field: &FieldDescriptor,
    values: Vec<Option<Value>>,
) -> Result<ArrayRef, DecodeError> {
    let kind = field.kind();
    let item_type = schema::kind_data_type(&kind)?;

    let mut lengths = Vec::with_capacity(values.len());
    let mut validity = Vec::with_capacity(values.len());
    let mut items: Vec<Option<Value>> = Vec::new();
    for value in values {
        match value {
            Some(Value::List(elements)) => {
                validity.push(true);
                lengths.push(elements.len());
                items.extend(elements.into_iter().map(Some));
            }
            _ => {
                validity.push(false);
                lengths.push(0);
            }
        }
    }

    let child = kind_array(&kind, items)?;
    let item_field = Arc::new(Field::new("item", item_type, true));
    Ok(Arc::new(ListArray::new(
        item_field,
        OffsetBuffer::from_lengths(lengths),
        child,
        Some(NullBuffer::from(validity)),
    )))
}

fn map_array(
    field: &FieldDescriptor,
    values: Vec<Option<Value>>,
) -> Result<ArrayRef, DecodeError> {
    let Kind::Message(entry) = field.kind() else {
        unreachable!("map fields always have an entry message type");
    };
    let key_field = entry.map_entry_key_field();
    let value_field = entry.map_entry_value_field();

    let mut lengths = Vec::with_capacity(values.len());
    let mut validity = Vec::with_capacity(values.len());
    let mut keys: Vec<Option<Value>> = Vec::new();
    let mut vals: Vec<Option<Value>> = Vec::new();
    for value in values {
        match value {
            Some(Value::Map(map)) => {
                validity.push(true);
                lengths.push(map.len());
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|left, right| compare_map_keys(left.0, right.0));
                for (key, val) in entries {
                    keys.push(Some(map_key_value(key)));
                    vals.push(Some(val.clone()));
                }
            }
            _ => {
                validity.push(false);
                lengths.push(0);
            }
        }
    }

    let keys_array = kind_array(&key_field.kind(), keys)?;
    let values_array = kind_array(&value_field.kind(), vals)?;
    let entry_fields = Fields::from(vec![
        Field::new("keys", schema::kind_data_type(&key_field.kind())?, false),
        Field::new("values", schema::kind_data_type(&value_field.kind())?, true),
    ]);
    let entries = StructArray::new(entry_fields.clone(), vec![keys_array, values_array], None);
    let entries_field = Arc::new(Field::new(
        "entries",
        DataType::Struct(entry_fields),
        false,
    ));
    Ok(Arc::new(MapArray::new(
        entries_field,
        OffsetBuffer::from_lengths(lengths),
        entries,
        Some(NullBuffer::from(validity)),
        false,
    )))
}

fn map_key_value(key: &MapKey) -> Value {
    match key {
        MapKey::Bool(value) => Value::Bool(*value),
        MapKey::I32(value) => Value::I32(*value),
        MapKey::I64(value) => Value::I64(*value),
        MapKey::U32(value) => Value::U32(*value),
        MapKey::U64(value) => Value::U64(*value),
        MapKey::String(value) => Value::String(value.clone()),
    }
}

// All keys of one map share a kind, so cross-kind comparisons never happen.
fn compare_map_keys(left: &MapKey, right: &MapKey) -> Ordering {
    match (left, right) {
        (MapKey::Bool(left), MapKey::Bool(right)) => left.cmp(right),
        (MapKey::I32(left), MapKey::I32(right)) => left.cmp(right),
        (MapKey::I64(left), MapKey::I64(right)) => left.cmp(right),
        (MapKey::U32(left), MapKey::U32(right)) => left.cmp(right),
        (MapKey::U64(left), MapKey::U64(right)) => left.cmp(right),
        (MapKey::String(left), MapKey::String(right)) => left.cmp(right),
        _ => Ordering::Equal,
    }
}
