//! Transport layer for MCP JSON-RPC communication.
//!
//! MCP uses newline-delimited JSON over stdin/stdout. Stdout carries
//! protocol traffic only; logging goes to stderr.

use std::io::{self, BufRead, Write};

use serde_json::Value;

use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId};

/// Message that can be received from the client.
#[derive(Debug)]
pub enum IncomingMessage {
    Request(JsonRpcRequest),
    Notification(JsonRpcNotification),
    /// Well-formed JSON that is not a JSON-RPC message.
    Invalid { id: RequestId, reason: String },
}

/// Transport for reading/writing JSON-RPC messages.
pub struct StdioTransport {
    reader: Box<dyn BufRead + Send>,
    writer: Box<dyn Write + Send>,
}

impl StdioTransport {
    /// Create a transport using stdin/stdout.
    pub fn stdio() -> Self {
        Self::new(
            Box::new(io::BufReader::new(io::stdin())),
            Box::new(io::stdout()),
        )
    }

    /// Create a transport over any reader/writer pair.
    pub fn new(reader: Box<dyn BufRead + Send>, writer: Box<dyn Write + Send>) -> Self {
        Self { reader, writer }
    }

    /// Read the next JSON-RPC message, skipping blank lines.
    ///
    /// Returns `Ok(None)` on EOF. A line that is not JSON is reported as an
    /// `InvalidData` error; JSON that is not a JSON-RPC message comes back as
    /// [`IncomingMessage::Invalid`]. Either way the stream stays usable.
    pub fn read_message(&mut self) -> io::Result<Option<IncomingMessage>> {
        let mut line = String::new();

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        let line = line.trim();
        tracing::debug!("Received: {}", line);

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse message: {}", line);
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("{}: {}", e, line),
                ));
            }
        };

        // Requests carry an id, notifications don't
        if let Ok(request) = serde_json::from_value::<JsonRpcRequest>(value.clone()) {
            return Ok(Some(IncomingMessage::Request(request)));
        }
        if let Ok(notification) = serde_json::from_value::<JsonRpcNotification>(value.clone()) {
            return Ok(Some(IncomingMessage::Notification(notification)));
        }

        tracing::warn!("Not a JSON-RPC message: {}", line);
        let id = value
            .get("id")
            .cloned()
            .and_then(|id| serde_json::from_value(id).ok())
            .unwrap_or(RequestId::Null);
        Ok(Some(IncomingMessage::Invalid {
            id,
            reason: "not a JSON-RPC 2.0 request or notification".to_string(),
        }))
    }

    /// Write a JSON-RPC response as a single line.
    pub fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        let json = serde_json::to_string(response).map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("Serialization error: {}", e))
        })?;

        tracing::debug!("Sending: {}", json);

        writeln!(self.writer, "{}", json)?;
        self.writer.flush()
    }
}
