use colored::*;
use protorow_core::{
    arrow::datatypes::Schema,
    prost_reflect::{EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor},
    registry::RegistryError,
    schema::{SchemaError, type_signature},
};
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct MessageList(pub Vec<String>);

/// A message descriptor together with every message and enum it depends on.
pub struct ExpandedMessage(pub MessageDescriptor);

/// The Arrow schema a message maps to.
pub struct SchemaView(pub MessageDescriptor, pub Schema);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<RegistryError> for FormattedString {
    fn from(err: RegistryError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Descriptor error:".red().bold(), err))
    }
}

impl From<SchemaError> for FormattedString {
    fn from(err: SchemaError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Schema mapping failed:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<MessageList> for FormattedString {
    fn from(MessageList(messages): MessageList) -> Self {
        if messages.is_empty() {
            return FormattedString("No messages found.".yellow().to_string());
        }

        let mut out = String::new();
        out.push_str("Available Messages:\n");
        for message in messages {
            out.push_str(&format!("  - {}\n", message.green()));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<MessageDescriptor> for FormattedString {
    fn from(message: MessageDescriptor) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "message".cyan(),
            message.full_name().green()
        ));
        for field in message.fields() {
            out.push_str(&format!("  {};\n", field_line(&field)));
        }
        out.push('}');
        FormattedString(out)
    }
}

impl From<EnumDescriptor> for FormattedString {
    fn from(descriptor: EnumDescriptor) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "enum".cyan(),
            descriptor.full_name().green()
        ));
        for value in descriptor.values() {
            out.push_str(&format!(
                "  {} = {};\n",
                value.name(),
                value.number().to_string().purple()
            ));
        }
        out.push('}');
        FormattedString(out)
    }
}

impl From<ExpandedMessage> for FormattedString {
    fn from(ExpandedMessage(root): ExpandedMessage) -> Self {
        let mut out = String::new();
        let mut seen = BTreeSet::new();
        let mut enums = BTreeMap::new();
        let mut queue = VecDeque::from([root]);

        while let Some(message) = queue.pop_front() {
            if !seen.insert(message.full_name().to_string()) {
                continue;
            }
            for field in message.fields() {
                match dependency_kind(&field) {
                    Kind::Message(dependency) => queue.push_back(dependency),
                    Kind::Enum(dependency) => {
                        enums.insert(dependency.full_name().to_string(), dependency);
                    }
                    _ => {}
                }
            }
            out.push_str(&FormattedString::from(message).0);
            out.push_str("\n\n");
        }

        for descriptor in enums.into_values() {
            out.push_str(&FormattedString::from(descriptor).0);
            out.push_str("\n\n");
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<SchemaView> for FormattedString {
    fn from(SchemaView(message, schema): SchemaView) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {}\n",
            "arrow schema for".cyan(),
            message.full_name().green()
        ));
        for field in schema.fields() {
            out.push_str(&format!(
                "  {}: {}\n",
                field.name().green(),
                type_signature(field.data_type()).yellow()
            ));
        }
        let signature = type_signature(&protorow_core::arrow::datatypes::DataType::Struct(
            schema.fields().clone(),
        ));
        out.push_str(&format!("\n{} {}", "signature:".cyan(), signature));
        FormattedString(out)
    }
}

/// The kind a field pulls into scope: for map fields that is the kind of the
/// map *value*, since the entry message itself is rendered inline.
fn dependency_kind(field: &FieldDescriptor) -> Kind {
    if field.is_map() {
        if let Kind::Message(entry) = field.kind() {
            return entry.map_entry_value_field().kind();
        }
    }
    field.kind()
}

fn field_line(field: &FieldDescriptor) -> String {
    if field.is_map() {
        let Kind::Message(entry) = field.kind() else {
            return format!("{} {} = {}", "map".cyan(), field.name(), field.number());
        };
        let key = entry.map_entry_key_field();
        let value = entry.map_entry_value_field();
        return format!(
            "{}<{}, {}> {} = {}",
            "map".cyan(),
            kind_name(&key.kind()),
            kind_name(&value.kind()),
            field.name(),
            field.number()
        );
    }

    let label = if field.is_list() {
        format!("{} ", "repeated".cyan())
    } else if field.supports_presence() && !matches!(field.kind(), Kind::Message(_)) {
        format!("{} ", "optional".cyan())
    } else {
        String::new()
    };
    format!(
        "{}{} {} = {}",
        label,
        kind_name(&field.kind()),
        field.name(),
        field.number()
    )
}

fn kind_name(kind: &Kind) -> ColoredString {
    match kind {
        Kind::Double => "double".yellow(),
        Kind::Float => "float".yellow(),
        Kind::Int32 => "int32".yellow(),
        Kind::Int64 => "int64".yellow(),
        Kind::Uint32 => "uint32".yellow(),
        Kind::Uint64 => "uint64".yellow(),
        Kind::Sint32 => "sint32".yellow(),
        Kind::Sint64 => "sint64".yellow(),
        Kind::Fixed32 => "fixed32".yellow(),
        Kind::Fixed64 => "fixed64".yellow(),
        Kind::Sfixed32 => "sfixed32".yellow(),
        Kind::Sfixed64 => "sfixed64".yellow(),
        Kind::Bool => "bool".yellow(),
        Kind::String => "string".yellow(),
        Kind::Bytes => "bytes".yellow(),
        Kind::Message(message) => message.full_name().yellow(),
        Kind::Enum(descriptor) => descriptor.full_name().yellow(),
    }
}
