//! # Protorow Core
//!
//! `protorow-core` is the foundational library powering the Protorow CLI. It bridges
//! Protobuf message schemas to Apache Arrow, so that columnar engines can read and
//! write protobuf-encoded records as native rows without compile-time knowledge of
//! the Protobuf schema.
//!
//! ## Key Components
//!
//! * **[`SchemaRegistry`]:** Loads an encoded `FileDescriptorSet` and resolves fully
//!   qualified message names into `MessageDescriptor`s.
//! * **[`schema`]:** The descriptor-to-Arrow mapping. [`message_schema`] turns a
//!   `MessageDescriptor` into an `arrow::datatypes::Schema`; [`type_signature`]
//!   renders a mapped type as a compact string such as `struct<id:uint64,tags:list<utf8>>`.
//! * **[`proto_to_arrow`]:** The read path. Decodes `DynamicMessage`s into Arrow
//!   `RecordBatch`es, either from an in-memory slice or incrementally from a
//!   length-delimited record stream via [`BatchDecoder`].
//! * **[`arrow_to_proto`]:** The write path. Rebuilds protobuf messages from Arrow
//!   record batches, one message per row.
//! * **[`framing`]:** Varint length-delimited record I/O, the framing used by
//!   `writeDelimitedTo`-style protobuf record files.
//!
//! Both conversion paths transcode through `prost_reflect::DynamicMessage`, so the
//! only schema input ever needed is a serialized descriptor set.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `arrow` to ensure that
//! consumers use compatible versions of these underlying dependencies.
pub mod arrow_to_proto;
pub mod framing;
pub mod proto_to_arrow;
pub mod registry;
pub mod schema;

pub use arrow_to_proto::record_batch_to_messages;
pub use proto_to_arrow::{BatchDecoder, messages_to_record_batch};
pub use registry::SchemaRegistry;
pub use schema::{message_schema, message_signature, type_signature};

// Re-exports
pub use arrow;
pub use prost;
pub use prost_reflect;
