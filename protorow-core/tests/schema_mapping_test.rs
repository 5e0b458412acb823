use orders_schema::{descriptor_pool, order_descriptor, tree_descriptor};
use protorow_core::arrow::datatypes::{DataType, TimeUnit};
use protorow_core::schema::{SchemaError, message_schema, message_signature};

#[test]
fn test_order_schema_mapping() {
    let pool = descriptor_pool();
    let schema = message_schema(&order_descriptor(&pool)).expect("Order maps to a schema");

    // 1. One column per protobuf field, in declaration order
    let names: Vec<_> = schema
        .fields()
        .iter()
        .map(|field| field.name().as_str())
        .collect();
    assert_eq!(
        names,
        [
            "id",
            "customer",
            "total",
            "express",
            "status",
            "payload",
            "tags",
            "shipping",
            "previous_addresses",
            "attributes",
            "created_at",
            "priority",
        ]
    );

    // 2. Scalar kinds
    let data_type = |name: &str| {
        schema
            .field_with_name(name)
            .expect("field exists")
            .data_type()
            .clone()
    };
    assert_eq!(data_type("id"), DataType::UInt64);
    assert_eq!(data_type("customer"), DataType::Utf8);
    assert_eq!(data_type("total"), DataType::Float64);
    assert_eq!(data_type("express"), DataType::Boolean);
    assert_eq!(data_type("payload"), DataType::Binary);
    assert_eq!(data_type("priority"), DataType::Int32);

    // 3. Enums surface as value names
    assert_eq!(data_type("status"), DataType::Utf8);

    // 4. Nested shapes
    match data_type("tags") {
        DataType::List(item) => assert_eq!(item.data_type(), &DataType::Utf8),
        other => panic!("Expected List for tags, got {other}"),
    }
    match data_type("shipping") {
        DataType::Struct(fields) => {
            assert_eq!(fields.len(), 3);
            assert_eq!(fields[0].name(), "city");
            assert_eq!(fields[2].data_type(), &DataType::UInt32);
        }
        other => panic!("Expected Struct for shipping, got {other}"),
    }
    assert!(matches!(data_type("attributes"), DataType::Map(_, _)));
    assert_eq!(
        data_type("created_at"),
        DataType::Timestamp(TimeUnit::Nanosecond, None)
    );

    // 5. Everything is nullable on the columnar side
    assert!(schema.fields().iter().all(|field| field.is_nullable()));
}

#[test]
fn test_message_signature() {
    let pool = descriptor_pool();
    let signature = message_signature(&order_descriptor(&pool)).expect("Order has a signature");
    assert_eq!(
        signature,
        "struct<\
         id:uint64,customer:utf8,total:float64,express:bool,status:utf8,payload:binary,\
         tags:list<utf8>,shipping:struct<city:utf8,street:utf8,zip:uint32>,\
         previous_addresses:list<struct<city:utf8,street:utf8,zip:uint32>>,\
         attributes:map<utf8,utf8>,created_at:timestamp[ns],priority:int32>"
    );
}

#[test]
fn test_recursive_message_rejected() {
    let pool = descriptor_pool();
    let err = message_schema(&tree_descriptor(&pool)).expect_err("recursion cannot be mapped");
    let SchemaError::RecursiveMessage(name) = err;
    assert_eq!(name, "shop.v1.TreeNode");
}
