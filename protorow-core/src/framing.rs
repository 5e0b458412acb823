//! # Length-Delimited Record Framing
//!
//! Protobuf record files carry one varint length prefix per record, followed by
//! that many message bytes (the `writeDelimitedTo` convention). This module
//! reads and writes that framing over `std::io` streams, producing and
//! consuming `DynamicMessage`s so no generated types are required.
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use std::io::{self, Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FramingError {
    #[error("I/O error while framing records: '{0}'")]
    Io(#[from] io::Error),
    #[error("Malformed record length prefix")]
    InvalidLength,
    #[error("Failed to decode record: '{0}'")]
    Decode(#[from] prost::DecodeError),
}

/// Iterator over the records of a length-delimited protobuf stream.
///
/// Iteration ends cleanly when the stream is exhausted at a record boundary.
/// A stream that ends in the middle of a length prefix or a record body yields
/// an error instead.
pub struct DelimitedReader<R> {
    reader: R,
    descriptor: MessageDescriptor,
}

impl<R: Read> DelimitedReader<R> {
    pub fn new(reader: R, descriptor: MessageDescriptor) -> Self {
        Self { reader, descriptor }
    }

    /// Reads one varint length prefix. `Ok(None)` means clean end of stream.
    fn read_length(&mut self) -> Result<Option<usize>, FramingError> {
        let mut length: u64 = 0;
        for index in 0..10 {
            let mut byte = [0u8; 1];
            if self.reader.read(&mut byte)? == 0 {
                if index == 0 {
                    return Ok(None);
                }
                return Err(FramingError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended inside a record length prefix",
                )));
            }
            length |= u64::from(byte[0] & 0x7f) << (index * 7);
            if byte[0] & 0x80 == 0 {
                return Ok(Some(length as usize));
            }
        }
        Err(FramingError::InvalidLength)
    }
}

impl<R: Read> Iterator for DelimitedReader<R> {
    type Item = Result<DynamicMessage, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        let length = match self.read_length() {
            Ok(Some(length)) => length,
            Ok(None) => return None,
            Err(err) => return Some(Err(err)),
        };
        let mut buf = vec![0u8; length];
        if let Err(err) = self.reader.read_exact(&mut buf) {
            return Some(Err(err.into()));
        }
        Some(
            DynamicMessage::decode(self.descriptor.clone(), buf.as_slice())
                .map_err(FramingError::from),
        )
    }
}

/// Writes length-delimited protobuf records to an `std::io` sink.
pub struct DelimitedWriter<W> {
    writer: W,
}

impl<W: Write> DelimitedWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Appends one record, varint length prefix included.
    pub fn write(&mut self, message: &DynamicMessage) -> Result<(), FramingError> {
        let buf = message.encode_length_delimited_to_vec();
        self.writer.write_all(&buf)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), FramingError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
