//! # Orders Schema
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a descriptor set
//! and sample records for testing the `protorow` workspace. It is not intended
//! for production use.
//!
//! The `shop.v1.Order` message exercises every mapping the bridge supports:
//! scalars, bytes, an enum, a nested message, repeated scalars and messages, a
//! map, `google.protobuf.Timestamp`, and a proto3 `optional` field.
//! `shop.v1.TreeNode` is self-referential and exists to exercise recursion
//! rejection.
//!
//! The `FileDescriptorSet` is constructed programmatically with `prost-types`,
//! so no `protoc` invocation happens at build time.
use prost::Message;
use prost_reflect::{DescriptorPool, DynamicMessage, MapKey, MessageDescriptor, Value};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
    field_descriptor_proto::{Label, Type},
};
use std::collections::HashMap;

/// The descriptor set containing `shop.v1.Order` and its dependencies.
pub fn file_descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![timestamp_file(), orders_file()],
    }
}

/// The descriptor set in its serialized form, as `protoc --descriptor_set_out`
/// would emit it.
pub fn descriptor_set_bytes() -> Vec<u8> {
    file_descriptor_set().encode_to_vec()
}

pub fn descriptor_pool() -> DescriptorPool {
    DescriptorPool::from_file_descriptor_set(file_descriptor_set())
        .expect("fixture descriptor set is valid")
}

pub fn order_descriptor(pool: &DescriptorPool) -> MessageDescriptor {
    pool.get_message_by_name("shop.v1.Order")
        .expect("shop.v1.Order is defined")
}

pub fn tree_descriptor(pool: &DescriptorPool) -> MessageDescriptor {
    pool.get_message_by_name("shop.v1.TreeNode")
        .expect("shop.v1.TreeNode is defined")
}

/// Three orders covering the interesting value shapes:
///
/// 1. Every field populated.
/// 2. Mostly defaults: no shipping address, no timestamp, no priority.
/// 3. An enum number with no named value (proto3 open enums).
pub fn sample_orders(pool: &DescriptorPool) -> Vec<DynamicMessage> {
    let order = order_descriptor(pool);
    let address = pool
        .get_message_by_name("shop.v1.Address")
        .expect("shop.v1.Address is defined");
    let timestamp = pool
        .get_message_by_name("google.protobuf.Timestamp")
        .expect("google.protobuf.Timestamp is defined");

    let mut first = DynamicMessage::new(order.clone());
    first.set_field_by_name("id", Value::U64(1));
    first.set_field_by_name("customer", Value::String("ada".to_string()));
    first.set_field_by_name("total", Value::F64(99.5));
    first.set_field_by_name("express", Value::Bool(true));
    first.set_field_by_name("status", Value::EnumNumber(2));
    first.set_field_by_name("payload", Value::Bytes(prost::bytes::Bytes::from_static(b"\x01\x02")));
    first.set_field_by_name(
        "tags",
        Value::List(vec![
            Value::String("new".to_string()),
            Value::String("priority".to_string()),
        ]),
    );
    first.set_field_by_name(
        "shipping",
        Value::Message(make_address(&address, "Zurich", "Main Street 1", 8001)),
    );
    first.set_field_by_name(
        "previous_addresses",
        Value::List(vec![
            Value::Message(make_address(&address, "Bern", "Old Lane 2", 3000)),
            Value::Message(make_address(&address, "Basel", "River Road 3", 4000)),
        ]),
    );
    first.set_field_by_name(
        "attributes",
        Value::Map(HashMap::from([
            (
                MapKey::String("source".to_string()),
                Value::String("web".to_string()),
            ),
            (
                MapKey::String("tier".to_string()),
                Value::String("gold".to_string()),
            ),
        ])),
    );
    first.set_field_by_name(
        "created_at",
        Value::Message(make_timestamp(&timestamp, 1_700_000_000, 500)),
    );
    first.set_field_by_name("priority", Value::I32(7));

    let mut second = DynamicMessage::new(order.clone());
    second.set_field_by_name("id", Value::U64(2));
    second.set_field_by_name("customer", Value::String("grace".to_string()));
    second.set_field_by_name("total", Value::F64(12.25));
    second.set_field_by_name("status", Value::EnumNumber(3));

    let mut third = DynamicMessage::new(order);
    third.set_field_by_name("id", Value::U64(3));
    third.set_field_by_name("customer", Value::String("bo".to_string()));
    third.set_field_by_name("status", Value::EnumNumber(42));
    third.set_field_by_name("tags", Value::List(vec![Value::String("vip".to_string())]));

    vec![first, second, third]
}

fn make_address(
    descriptor: &MessageDescriptor,
    city: &str,
    street: &str,
    zip: u32,
) -> DynamicMessage {
    let mut message = DynamicMessage::new(descriptor.clone());
    message.set_field_by_name("city", Value::String(city.to_string()));
    message.set_field_by_name("street", Value::String(street.to_string()));
    message.set_field_by_name("zip", Value::U32(zip));
    message
}

fn make_timestamp(descriptor: &MessageDescriptor, seconds: i64, nanos: i32) -> DynamicMessage {
    let mut message = DynamicMessage::new(descriptor.clone());
    message.set_field_by_name("seconds", Value::I64(seconds));
    message.set_field_by_name("nanos", Value::I32(nanos));
    message
}

fn timestamp_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/timestamp.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Timestamp".to_string()),
            field: vec![
                field("seconds", 1, Type::Int64),
                field("nanos", 2, Type::Int32),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn orders_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("shop/v1/orders.proto".to_string()),
        package: Some("shop.v1".to_string()),
        dependency: vec!["google/protobuf/timestamp.proto".to_string()],
        syntax: Some("proto3".to_string()),
        enum_type: vec![order_status_enum()],
        message_type: vec![address_message(), order_message(), tree_node_message()],
        ..Default::default()
    }
}

fn order_status_enum() -> EnumDescriptorProto {
    let value = |name: &str, number: i32| EnumValueDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        ..Default::default()
    };
    EnumDescriptorProto {
        name: Some("OrderStatus".to_string()),
        value: vec![
            value("ORDER_STATUS_UNSPECIFIED", 0),
            value("PENDING", 1),
            value("SHIPPED", 2),
            value("DELIVERED", 3),
        ],
        ..Default::default()
    }
}

fn address_message() -> DescriptorProto {
    DescriptorProto {
        name: Some("Address".to_string()),
        field: vec![
            field("city", 1, Type::String),
            field("street", 2, Type::String),
            field("zip", 3, Type::Uint32),
        ],
        ..Default::default()
    }
}

fn order_message() -> DescriptorProto {
    let mut priority = field("priority", 12, Type::Int32);
    priority.proto3_optional = Some(true);
    priority.oneof_index = Some(0);

    DescriptorProto {
        name: Some("Order".to_string()),
        field: vec![
            field("id", 1, Type::Uint64),
            field("customer", 2, Type::String),
            field("total", 3, Type::Double),
            field("express", 4, Type::Bool),
            typed_field("status", 5, Type::Enum, ".shop.v1.OrderStatus"),
            field("payload", 6, Type::Bytes),
            repeated(field("tags", 7, Type::String)),
            typed_field("shipping", 8, Type::Message, ".shop.v1.Address"),
            repeated(typed_field(
                "previous_addresses",
                9,
                Type::Message,
                ".shop.v1.Address",
            )),
            repeated(typed_field(
                "attributes",
                10,
                Type::Message,
                ".shop.v1.Order.AttributesEntry",
            )),
            typed_field("created_at", 11, Type::Message, ".google.protobuf.Timestamp"),
            priority,
        ],
        nested_type: vec![map_entry("AttributesEntry", Type::String, Type::String)],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("_priority".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn tree_node_message() -> DescriptorProto {
    DescriptorProto {
        name: Some("TreeNode".to_string()),
        field: vec![
            field("label", 1, Type::String),
            repeated(typed_field("children", 2, Type::Message, ".shop.v1.TreeNode")),
        ],
        ..Default::default()
    }
}

fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn typed_field(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    let mut proto = field(name, number, ty);
    proto.type_name = Some(type_name.to_string());
    proto
}

fn repeated(mut proto: FieldDescriptorProto) -> FieldDescriptorProto {
    proto.label = Some(Label::Repeated as i32);
    proto
}

fn map_entry(name: &str, key: Type, value: Type) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: vec![field("key", 1, key), field("value", 2, value)],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    }
}
