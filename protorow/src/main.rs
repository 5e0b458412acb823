//! # Protorow CLI Entry Point
//!
//! The main executable for the Protorow tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`].
//! 2. **Schema loading**: Builds a [`SchemaRegistry`] from the given descriptor set.
//! 3. **Execution**: Delegates introspection and conversion work to `protorow_core`.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.

mod cli;
mod formatter;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands, ConvertCommands, DescribeCommands, ListCommands};
use formatter::{ExpandedMessage, FormattedString, GenericError, MessageList, SchemaView};
use protorow_core::arrow::ipc::reader::FileReader;
use protorow_core::arrow::ipc::writer::FileWriter;
use protorow_core::arrow_to_proto::record_batch_to_messages;
use protorow_core::framing::{DelimitedReader, DelimitedWriter};
use protorow_core::proto_to_arrow::BatchDecoder;
use protorow_core::registry::SchemaRegistry;
use protorow_core::schema::message_schema;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::process;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    let registry = match SchemaRegistry::from_file(&args.file_descriptor_set) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    };

    match args.command {
        Commands::List { sub } => match sub {
            ListCommands::Messages => list_messages(&registry),
        },
        Commands::Describe { sub } => match sub {
            DescribeCommands::Message { message, recursive } => {
                describe_message(&registry, &message, recursive)
            }
            DescribeCommands::Schema { message } => describe_schema(&registry, &message),
        },
        Commands::Convert { sub } => {
            let result = match sub {
                ConvertCommands::ToArrow {
                    input,
                    output,
                    message,
                    batch_size,
                } => convert_to_arrow(&registry, &input, &output, &message, batch_size),
                ConvertCommands::ToProto {
                    input,
                    output,
                    message,
                } => convert_to_proto(&registry, &input, &output, &message),
            };
            if let Err(err) = result {
                eprintln!(
                    "{}",
                    FormattedString::from(GenericError("Conversion failed:", err))
                );
                process::exit(1);
            }
        }
        Commands::Cat {
            input,
            message,
            limit,
        } => {
            if let Err(err) = cat(&registry, &input, &message, limit) {
                eprintln!(
                    "{}",
                    FormattedString::from(GenericError("Cat failed:", err))
                );
                process::exit(1);
            }
        }
    }
}

fn resolve_or_exit(
    registry: &SchemaRegistry,
    message: &str,
) -> protorow_core::prost_reflect::MessageDescriptor {
    match registry.get_message(message) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

fn list_messages(registry: &SchemaRegistry) {
    let mut messages = registry.list_messages();
    messages.sort();
    println!("{}", FormattedString::from(MessageList(messages)));
}

fn describe_message(registry: &SchemaRegistry, message: &str, recursive: bool) {
    let descriptor = resolve_or_exit(registry, message);
    if recursive {
        println!("{}", FormattedString::from(ExpandedMessage(descriptor)));
    } else {
        println!("{}", FormattedString::from(descriptor));
    }
}

fn describe_schema(registry: &SchemaRegistry, message: &str) {
    let descriptor = resolve_or_exit(registry, message);
    match message_schema(&descriptor) {
        Ok(schema) => println!("{}", FormattedString::from(SchemaView(descriptor, schema))),
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

fn convert_to_arrow(
    registry: &SchemaRegistry,
    input: &Path,
    output: &Path,
    message: &str,
    batch_size: usize,
) -> anyhow::Result<()> {
    let descriptor = registry.get_message(message)?;
    let input_file =
        File::open(input).with_context(|| format!("failed to open '{}'", input.display()))?;
    let decoder = BatchDecoder::new(BufReader::new(input_file), descriptor, batch_size)?;
    let schema = decoder.schema();

    let output_file =
        File::create(output).with_context(|| format!("failed to create '{}'", output.display()))?;
    let mut writer = FileWriter::try_new(BufWriter::new(output_file), schema.as_ref())?;

    let mut total = 0usize;
    for batch in decoder {
        let batch = batch?;
        total += batch.num_rows();
        writer.write(&batch)?;
    }
    writer.finish()?;
    println!("Wrote {total} rows to '{}'", output.display());
    Ok(())
}

fn convert_to_proto(
    registry: &SchemaRegistry,
    input: &Path,
    output: &Path,
    message: &str,
) -> anyhow::Result<()> {
    let descriptor = registry.get_message(message)?;
    let input_file =
        File::open(input).with_context(|| format!("failed to open '{}'", input.display()))?;
    let reader = FileReader::try_new(input_file, None)?;

    let output_file =
        File::create(output).with_context(|| format!("failed to create '{}'", output.display()))?;
    let mut writer = DelimitedWriter::new(BufWriter::new(output_file));

    let mut total = 0usize;
    for batch in reader {
        let batch = batch?;
        let messages = record_batch_to_messages(&batch, &descriptor)?;
        for message in &messages {
            writer.write(message)?;
        }
        total += messages.len();
    }
    writer.flush()?;
    println!("Wrote {total} records to '{}'", output.display());
    Ok(())
}

fn cat(
    registry: &SchemaRegistry,
    input: &Path,
    message: &str,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let descriptor = registry.get_message(message)?;
    let input_file =
        File::open(input).with_context(|| format!("failed to open '{}'", input.display()))?;
    let reader = DelimitedReader::new(BufReader::new(input_file), descriptor);

    for record in reader.take(limit.unwrap_or(usize::MAX)) {
        let record = record?;
        let value = serde_json::to_value(&record)?;
        println!("{value}");
    }
    Ok(())
}
