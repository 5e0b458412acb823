//! # CLI
//!
//! This module defines the command-line interface of `protorow` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g.
//! ensuring message names are fully qualified and batch sizes are non-zero);
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "protorow", version, about = "Dynamic Protobuf to Arrow bridge")]
pub struct Cli {
    /// Path to the encoded FileDescriptorSet (.bin) describing the records
    pub file_descriptor_set: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List resources defined in the descriptor set
    List {
        #[command(subcommand)]
        sub: ListCommands,
    },

    /// Describe a message or its mapped Arrow schema
    Describe {
        #[command(subcommand)]
        sub: DescribeCommands,
    },

    /// Convert between record formats
    ///
    /// Record inputs/outputs are length-delimited protobuf streams
    /// (`writeDelimitedTo` framing); columnar files use the Arrow IPC file
    /// format.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// protorow descriptors.bin convert to-arrow orders.pb -o orders.arrow -m shop.v1.Order
    /// ```
    Convert {
        #[command(subcommand)]
        sub: ConvertCommands,
    },

    /// Print length-delimited records as JSON lines
    Cat {
        /// Input file of length-delimited records
        input: PathBuf,

        /// Fully qualified message name (e.g. my.package.Message)
        #[arg(short, long, value_parser = parse_message_name)]
        message: String,

        /// Stop after this many records
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// List all message types in the descriptor set
    Messages,
}

#[derive(Subcommand)]
pub enum DescribeCommands {
    /// Describe a specific message (show its protobuf definition)
    Message {
        /// Fully qualified message name (e.g. my.package.Message)
        #[arg(value_parser = parse_message_name)]
        message: String,
        /// Recursively describe all dependencies (nested messages and enums)
        #[arg(short, long)]
        recursive: bool,
    },
    /// Describe the Arrow schema a message maps to
    Schema {
        /// Fully qualified message name (e.g. my.package.Message)
        #[arg(value_parser = parse_message_name)]
        message: String,
    },
}

#[derive(Subcommand)]
pub enum ConvertCommands {
    /// Length-delimited protobuf records -> Arrow IPC file
    ToArrow {
        /// Input file of length-delimited records
        input: PathBuf,

        /// Output Arrow IPC file
        #[arg(short, long)]
        output: PathBuf,

        /// Fully qualified message name (e.g. my.package.Message)
        #[arg(short, long, value_parser = parse_message_name)]
        message: String,

        /// Maximum number of rows per record batch
        #[arg(long, default_value_t = 1024, value_parser = parse_batch_size)]
        batch_size: usize,
    },

    /// Arrow IPC file -> length-delimited protobuf records
    ToProto {
        /// Input Arrow IPC file
        input: PathBuf,

        /// Output file of length-delimited records
        #[arg(short, long)]
        output: PathBuf,

        /// Fully qualified message name (e.g. my.package.Message)
        #[arg(short, long, value_parser = parse_message_name)]
        message: String,
    },
}

fn parse_message_name(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Message name cannot be empty".to_string());
    }
    if trimmed.contains('/') {
        return Err(format!(
            "Invalid message name: '{trimmed}'. Expected 'package.Message'"
        ));
    }
    Ok(trimmed.to_string())
}

fn parse_batch_size(value: &str) -> Result<usize, String> {
    let size: usize = value
        .parse()
        .map_err(|e| format!("Invalid batch size: {e}"))?;
    if size == 0 {
        return Err("Batch size must be greater than zero".to_string());
    }
    Ok(size)
}
