//! # Arrow -> Protobuf (write path)
//!
//! Rebuilds protobuf messages from Arrow record batches, one message per row.
//!
//! Columns are matched to protobuf fields by name. A null cell leaves its field
//! unset; fields with no matching column are likewise left unset, so a batch
//! may carry any subset of a message's fields. Enum columns carry value names
//! (or the decimal fallback the read path emits for unknown numbers).
use crate::schema::TIMESTAMP_MESSAGE;
use arrow::array::{
    Array, BinaryArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    ListArray, MapArray, RecordBatch, StringArray, StructArray, TimestampNanosecondArray,
    UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use prost::bytes::Bytes;
use prost_reflect::{DynamicMessage, FieldDescriptor, Kind, MapKey, MessageDescriptor, Value};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Column '{column}' does not match any field of message '{message}'")]
    UnknownColumn { column: String, message: String },
    #[error("Field '{field}' expects a {expected} column, got '{actual}'")]
    ColumnType {
        field: String,
        expected: &'static str,
        actual: DataType,
    },
    #[error("Unknown value '{value}' for enum '{enum_name}'")]
    UnknownEnumValue { enum_name: String, value: String },
}

/// Converts a record batch into one message per row.
pub fn record_batch_to_messages(
    batch: &RecordBatch,
    descriptor: &MessageDescriptor,
) -> Result<Vec<DynamicMessage>, EncodeError> {
    let mut messages = vec![DynamicMessage::new(descriptor.clone()); batch.num_rows()];
    let schema = batch.schema();
    for (schema_field, column) in schema.fields().iter().zip(batch.columns()) {
        let field = descriptor
            .get_field_by_name(schema_field.name())
            .ok_or_else(|| EncodeError::UnknownColumn {
                column: schema_field.name().clone(),
                message: descriptor.full_name().to_string(),
            })?;
        for (row, message) in messages.iter_mut().enumerate() {
            if let Some(value) = field_value(&field, column.as_ref(), row)? {
                message.set_field(&field, value);
            }
        }
    }
    Ok(messages)
}

fn field_value(
    field: &FieldDescriptor,
    array: &dyn Array,
    row: usize,
) -> Result<Option<Value>, EncodeError> {
    if array.is_null(row) {
        return Ok(None);
    }
    if field.is_map() {
        map_value(field, array, row).map(Some)
    } else if field.is_list() {
        list_value(field, array, row).map(Some)
    } else {
        kind_value(&field.kind(), field.name(), array, row)
    }
}

fn list_value(
    field: &FieldDescriptor,
    array: &dyn Array,
    row: usize,
) -> Result<Value, EncodeError> {
    let list = downcast::<ListArray>(field.name(), array, "list")?;
    let values = list.value(row);
    let kind = field.kind();
    let mut items = Vec::with_capacity(values.len());
    for index in 0..values.len() {
        let item = kind_value(&kind, field.name(), values.as_ref(), index)?
            .unwrap_or_else(|| default_for_kind(&kind));
        items.push(item);
    }
    Ok(Value::List(items))
}

fn map_value(
    field: &FieldDescriptor,
    array: &dyn Array,
    row: usize,
) -> Result<Value, EncodeError> {
    let map = downcast::<MapArray>(field.name(), array, "map")?;
    let Kind::Message(entry) = field.kind() else {
        unreachable!("map fields always have an entry message type");
    };
    let key_field = entry.map_entry_key_field();
    let value_field = entry.map_entry_value_field();
    let value_kind = value_field.kind();

    let offsets = map.value_offsets();
    let start = offsets[row] as usize;
    let end = offsets[row + 1] as usize;
    let keys = map.keys();
    let vals = map.values();

    let mut out = HashMap::with_capacity(end - start);
    for index in start..end {
        let key = map_key(&key_field, field.name(), keys.as_ref(), index)?;
        let value = kind_value(&value_kind, field.name(), vals.as_ref(), index)?
            .unwrap_or_else(|| default_for_kind(&value_kind));
        out.insert(key, value);
    }
    Ok(Value::Map(out))
}

fn map_key(
    key_field: &FieldDescriptor,
    field_name: &str,
    array: &dyn Array,
    index: usize,
) -> Result<MapKey, EncodeError> {
    Ok(match key_field.kind() {
        Kind::Bool => MapKey::Bool(downcast::<BooleanArray>(field_name, array, "bool")?.value(index)),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            MapKey::I32(downcast::<Int32Array>(field_name, array, "int32")?.value(index))
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            MapKey::I64(downcast::<Int64Array>(field_name, array, "int64")?.value(index))
        }
        Kind::Uint32 | Kind::Fixed32 => {
            MapKey::U32(downcast::<UInt32Array>(field_name, array, "uint32")?.value(index))
        }
        Kind::Uint64 | Kind::Fixed64 => {
            MapKey::U64(downcast::<UInt64Array>(field_name, array, "uint64")?.value(index))
        }
        Kind::String => {
            MapKey::String(downcast::<StringArray>(field_name, array, "utf8")?.value(index).to_string())
        }
        _ => {
            return Err(EncodeError::ColumnType {
                field: field_name.to_string(),
                expected: "map key",
                actual: array.data_type().clone(),
            });
        }
    })
}

fn kind_value(
    kind: &Kind,
    field_name: &str,
    array: &dyn Array,
    index: usize,
) -> Result<Option<Value>, EncodeError> {
    if array.is_null(index) {
        return Ok(None);
    }
    Ok(Some(match kind {
        Kind::Double => Value::F64(downcast::<Float64Array>(field_name, array, "float64")?.value(index)),
        Kind::Float => Value::F32(downcast::<Float32Array>(field_name, array, "float32")?.value(index)),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => {
            Value::I32(downcast::<Int32Array>(field_name, array, "int32")?.value(index))
        }
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => {
            Value::I64(downcast::<Int64Array>(field_name, array, "int64")?.value(index))
        }
        Kind::Uint32 | Kind::Fixed32 => {
            Value::U32(downcast::<UInt32Array>(field_name, array, "uint32")?.value(index))
        }
        Kind::Uint64 | Kind::Fixed64 => {
            Value::U64(downcast::<UInt64Array>(field_name, array, "uint64")?.value(index))
        }
        Kind::Bool => Value::Bool(downcast::<BooleanArray>(field_name, array, "bool")?.value(index)),
        Kind::String => {
            Value::String(downcast::<StringArray>(field_name, array, "utf8")?.value(index).to_string())
        }
        Kind::Bytes => Value::Bytes(Bytes::copy_from_slice(
            downcast::<BinaryArray>(field_name, array, "binary")?.value(index),
        )),
        Kind::Enum(descriptor) => {
            let name = downcast::<StringArray>(field_name, array, "utf8")?.value(index);
            match descriptor.get_value_by_name(name) {
                Some(value) => Value::EnumNumber(value.number()),
                // The read path renders unknown enum numbers as decimal strings.
                None => match name.parse::<i32>() {
                    Ok(number) => Value::EnumNumber(number),
                    Err(_) => {
                        return Err(EncodeError::UnknownEnumValue {
                            enum_name: descriptor.full_name().to_string(),
                            value: name.to_string(),
                        });
                    }
                },
            }
        }
        Kind::Message(message) if message.full_name() == TIMESTAMP_MESSAGE => {
            let nanos_total =
                downcast::<TimestampNanosecondArray>(field_name, array, "timestamp[ns]")?
                    .value(index);
            Value::Message(timestamp_message(message, nanos_total))
        }
        Kind::Message(message) => {
            let array = downcast::<StructArray>(field_name, array, "struct")?;
            Value::Message(struct_message(message, array, index)?)
        }
    }))
}

fn struct_message(
    descriptor: &MessageDescriptor,
    array: &StructArray,
    row: usize,
) -> Result<DynamicMessage, EncodeError> {
    let mut message = DynamicMessage::new(descriptor.clone());
    for (name, column) in array.column_names().iter().zip(array.columns()) {
        let field = descriptor
            .get_field_by_name(name)
            .ok_or_else(|| EncodeError::UnknownColumn {
                column: name.to_string(),
                message: descriptor.full_name().to_string(),
            })?;
        if let Some(value) = field_value(&field, column.as_ref(), row)? {
            message.set_field(&field, value);
        }
    }
    Ok(message)
}

fn timestamp_message(descriptor: &MessageDescriptor, nanos_total: i64) -> DynamicMessage {
    let mut message = DynamicMessage::new(descriptor.clone());
    if let Some(seconds) = descriptor.get_field_by_name("seconds") {
        message.set_field(&seconds, Value::I64(nanos_total.div_euclid(1_000_000_000)));
    }
    if let Some(nanos) = descriptor.get_field_by_name("nanos") {
        message.set_field(
            &nanos,
            Value::I32(nanos_total.rem_euclid(1_000_000_000) as i32),
        );
    }
    message
}

fn default_for_kind(kind: &Kind) -> Value {
    match kind {
        Kind::Double => Value::F64(0.0),
        Kind::Float => Value::F32(0.0),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(0),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(0),
        Kind::Uint32 | Kind::Fixed32 => Value::U32(0),
        Kind::Uint64 | Kind::Fixed64 => Value::U64(0),
        Kind::Bool => Value::Bool(false),
        Kind::String => Value::String(String::new()),
        Kind::Bytes => Value::Bytes(Bytes::new()),
        Kind::Enum(descriptor) => Value::EnumNumber(descriptor.default_value().number()),
        Kind::Message(descriptor) => Value::Message(DynamicMessage::new(descriptor.clone())),
    }
}

fn downcast<'a, T: Array + 'static>(
    field: &str,
    array: &'a dyn Array,
    expected: &'static str,
) -> Result<&'a T, EncodeError> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| EncodeError::ColumnType {
            field: field.to_string(),
            expected,
            actual: array.data_type().clone(),
        })
}
