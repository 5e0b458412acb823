use orders_schema::descriptor_set_bytes;
use protorow_core::SchemaRegistry;
use protorow_core::registry::RegistryError;

#[test]
fn test_load_and_list_messages() {
    let registry =
        SchemaRegistry::from_bytes(&descriptor_set_bytes()).expect("fixture set decodes");
    let mut messages = registry.list_messages();
    messages.sort();

    // Map entry messages are synthetic and must not be listed
    assert_eq!(
        messages,
        [
            "google.protobuf.Timestamp",
            "shop.v1.Address",
            "shop.v1.Order",
            "shop.v1.TreeNode",
        ]
    );
}

#[test]
fn test_lookup_by_full_name() {
    let registry =
        SchemaRegistry::from_bytes(&descriptor_set_bytes()).expect("fixture set decodes");

    let descriptor = registry
        .get_message("shop.v1.Order")
        .expect("Order resolves");
    assert_eq!(descriptor.name(), "Order");

    match registry.get_message("shop.v1.Ghost") {
        Err(RegistryError::MessageNotFound(name)) => assert_eq!(name, "shop.v1.Ghost"),
        other => panic!("Expected MessageNotFound, got {other:?}"),
    }
}

#[test]
fn test_invalid_descriptor_bytes_rejected() {
    assert!(matches!(
        SchemaRegistry::from_bytes(b"not a descriptor set"),
        Err(RegistryError::Decode(_))
    ));
}
