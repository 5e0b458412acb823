//! # Schema Mapping
//!
//! This module maps Protobuf message descriptors onto Arrow schemas. It is the
//! type-system half of the bridge: given a `MessageDescriptor`, it decides what
//! column type every protobuf field surfaces as.
//!
//! ## Mapping rules
//!
//! * `double`/`float` map to `Float64`/`Float32`.
//! * The signed kinds (`int32`, `sint32`, `sfixed32`, and the 64-bit variants)
//!   collapse onto `Int32`/`Int64`; the unsigned kinds onto `UInt32`/`UInt64`.
//! * `bool`, `string` and `bytes` map to `Boolean`, `Utf8` and `Binary`.
//! * Enums map to `Utf8`: the engine sees value *names*, not numbers.
//! * Messages map to `Struct`, recursively, except `google.protobuf.Timestamp`
//!   which maps to a nanosecond `Timestamp`.
//! * `repeated` fields map to `List`; map fields map to `Map` with non-null keys.
//!
//! Every mapped field is nullable (except map keys and entries): the columnar
//! side treats nullability as "may contain nulls", and presence information is
//! only known per record.
//!
//! Recursive message types have no finite columnar shape and are rejected with
//! [`SchemaError::RecursiveMessage`] rather than looping forever.
use arrow::datatypes::{DataType, Field, Fields, Schema, TimeUnit};
use prost_reflect::{FieldDescriptor, Kind, MessageDescriptor};
use std::sync::Arc;
use thiserror::Error;

pub(crate) const TIMESTAMP_MESSAGE: &str = "google.protobuf.Timestamp";

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Recursive message type '{0}' cannot be mapped to a columnar schema")]
    RecursiveMessage(String),
}

/// Maps a message descriptor to an Arrow schema, one field per protobuf field,
/// in declaration order.
pub fn message_schema(message: &MessageDescriptor) -> Result<Schema, SchemaError> {
    Ok(Schema::new(message_fields(message, &mut Vec::new())?))
}

/// Renders the compact type signature of a whole message, e.g.
/// `struct<id:uint64,tags:list<utf8>>`.
pub fn message_signature(message: &MessageDescriptor) -> Result<String, SchemaError> {
    let fields = message_fields(message, &mut Vec::new())?;
    Ok(type_signature(&DataType::Struct(fields)))
}

/// Maps a single protobuf field to an Arrow field.
pub fn field_to_arrow(field: &FieldDescriptor) -> Result<Field, SchemaError> {
    map_field(field, &mut Vec::new())
}

/// Renders a mapped Arrow type as a compact, deterministic string.
pub fn type_signature(data_type: &DataType) -> String {
    match data_type {
        DataType::Boolean => "bool".to_string(),
        DataType::Int32 => "int32".to_string(),
        DataType::Int64 => "int64".to_string(),
        DataType::UInt32 => "uint32".to_string(),
        DataType::UInt64 => "uint64".to_string(),
        DataType::Float32 => "float32".to_string(),
        DataType::Float64 => "float64".to_string(),
        DataType::Utf8 => "utf8".to_string(),
        DataType::Binary => "binary".to_string(),
        DataType::Timestamp(unit, _) => {
            let unit = match unit {
                TimeUnit::Second => "s",
                TimeUnit::Millisecond => "ms",
                TimeUnit::Microsecond => "us",
                TimeUnit::Nanosecond => "ns",
            };
            format!("timestamp[{unit}]")
        }
        DataType::List(item) => format!("list<{}>", type_signature(item.data_type())),
        DataType::Struct(fields) => {
            let inner = fields
                .iter()
                .map(|field| format!("{}:{}", field.name(), type_signature(field.data_type())))
                .collect::<Vec<_>>()
                .join(",");
            format!("struct<{inner}>")
        }
        DataType::Map(entries, _) => match entries.data_type() {
            DataType::Struct(entry) if entry.len() == 2 => format!(
                "map<{},{}>",
                type_signature(entry[0].data_type()),
                type_signature(entry[1].data_type())
            ),
            other => format!("map<{}>", type_signature(other)),
        },
        other => other.to_string().to_lowercase(),
    }
}

pub(crate) fn kind_data_type(kind: &Kind) -> Result<DataType, SchemaError> {
    kind_type(kind, &mut Vec::new())
}

fn message_fields(
    message: &MessageDescriptor,
    stack: &mut Vec<String>,
) -> Result<Fields, SchemaError> {
    if stack.iter().any(|name| name == message.full_name()) {
        return Err(SchemaError::RecursiveMessage(
            message.full_name().to_string(),
        ));
    }
    stack.push(message.full_name().to_string());
    let fields = message
        .fields()
        .map(|field| map_field(&field, stack))
        .collect::<Result<Vec<_>, _>>()?;
    stack.pop();
    Ok(Fields::from(fields))
}

fn map_field(field: &FieldDescriptor, stack: &mut Vec<String>) -> Result<Field, SchemaError> {
    if field.is_map() {
        let Kind::Message(entry) = field.kind() else {
            unreachable!("map fields always have an entry message type");
        };
        let key = entry.map_entry_key_field();
        let value = entry.map_entry_value_field();
        let entry_fields = Fields::from(vec![
            Field::new("keys", kind_type(&key.kind(), stack)?, false),
            Field::new("values", kind_type(&value.kind(), stack)?, true),
        ]);
        let entries = Field::new("entries", DataType::Struct(entry_fields), false);
        Ok(Field::new(
            field.name(),
            DataType::Map(Arc::new(entries), false),
            true,
        ))
    } else if field.is_list() {
        let item = Field::new("item", kind_type(&field.kind(), stack)?, true);
        Ok(Field::new(
            field.name(),
            DataType::List(Arc::new(item)),
            true,
        ))
    } else {
        Ok(Field::new(
            field.name(),
            kind_type(&field.kind(), stack)?,
            true,
        ))
    }
}

fn kind_type(kind: &Kind, stack: &mut Vec<String>) -> Result<DataType, SchemaError> {
    Ok(match kind {
        Kind::Double => DataType::Float64,
        Kind::Float => DataType::Float32,
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => DataType::Int32,
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => DataType::Int64,
        Kind::Uint32 | Kind::Fixed32 => DataType::UInt32,
        Kind::Uint64 | Kind::Fixed64 => DataType::UInt64,
        Kind::Bool => DataType::Boolean,
        Kind::String => DataType::Utf8,
        Kind::Bytes => DataType::Binary,
        Kind::Enum(_) => DataType::Utf8,
        Kind::Message(message) if message.full_name() == TIMESTAMP_MESSAGE => {
            DataType::Timestamp(TimeUnit::Nanosecond, None)
        }
        Kind::Message(message) => DataType::Struct(message_fields(message, stack)?),
    })
}
