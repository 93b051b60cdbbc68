//! MCP server implementation.
//!
//! The server handles the MCP protocol lifecycle:
//! 1. Initialize - exchange capabilities
//! 2. Handle tool calls - one message at a time, in arrival order
//! 3. Shutdown - on EOF

use std::io;

use serde_json::Value;

use crate::handlers::ToolHandler;
use crate::protocol::{
    InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, RequestId,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolsCapability, ToolsListResult, MCP_VERSION,
};
use crate::transport::{IncomingMessage, StdioTransport};

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "linear-bridge";

/// MCP server for linear-bridge.
pub struct McpServer {
    handler: ToolHandler,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server around a configured tool handler.
    pub fn new(handler: ToolHandler) -> Self {
        Self {
            handler,
            initialized: false,
        }
    }

    /// Run the server on stdin/stdout until EOF.
    pub async fn run(&mut self) -> bridge_core::Result<()> {
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    /// Run the server main loop on the given transport until EOF.
    pub async fn serve(&mut self, transport: &mut StdioTransport) -> bridge_core::Result<()> {
        tracing::info!(
            "Starting MCP server with {} tools",
            self.handler.available_tools().len()
        );

        loop {
            match transport.read_message() {
                Ok(Some(msg)) => {
                    if let Some(resp) = self.handle_message(msg).await {
                        transport.write_response(&resp).map_err(|e| {
                            tracing::error!("Failed to write response: {}", e);
                            bridge_core::Error::Other(e.into())
                        })?;
                    }
                }
                Ok(None) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    let error_resp = JsonRpcResponse::error(
                        RequestId::Null,
                        JsonRpcError::parse_error(&e.to_string()),
                    );
                    transport
                        .write_response(&error_resp)
                        .map_err(|e| bridge_core::Error::Other(e.into()))?;
                }
                Err(e) => {
                    tracing::error!("Transport error: {}", e);
                    return Err(bridge_core::Error::Other(e.into()));
                }
            }
        }

        tracing::info!("MCP server stopped");
        Ok(())
    }

    /// Handle an incoming message.
    async fn handle_message(&mut self, msg: IncomingMessage) -> Option<JsonRpcResponse> {
        match msg {
            IncomingMessage::Request(req) => Some(self.handle_request(req).await),
            IncomingMessage::Notification(notif) => {
                self.handle_notification(&notif.method);
                None
            }
            IncomingMessage::Invalid { id, reason } => {
                tracing::warn!("Invalid request: {}", reason);
                Some(JsonRpcResponse::error(id, JsonRpcError::invalid_request(&reason)))
            }
        }
    }

    /// Handle a JSON-RPC request.
    async fn handle_request(&mut self, req: JsonRpcRequest) -> JsonRpcResponse {
        tracing::debug!("Handling request: {} (id: {:?})", req.method, req.id);

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req.id, req.params),
            "tools/list" => self.handle_tools_list(req.id),
            "tools/call" => self.handle_tools_call(req.id, req.params).await,
            "ping" => JsonRpcResponse::success(req.id, serde_json::json!({})),
            method => {
                tracing::warn!("Unknown method: {}", method);
                JsonRpcResponse::error(req.id, JsonRpcError::method_not_found(method))
            }
        }
    }

    /// Handle notifications (no response).
    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                tracing::info!("Client initialized");
            }
            "notifications/cancelled" => {
                tracing::debug!("Request cancelled by client");
            }
            _ => {
                tracing::debug!("Ignoring notification: {}", method);
            }
        }
    }

    fn handle_initialize(&mut self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        if self.initialized {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_request("Server already initialized"),
            );
        }

        if let Some(params) = params {
            match serde_json::from_value::<InitializeParams>(params) {
                Ok(init) => tracing::info!(
                    "Client: {} v{} (protocol: {})",
                    init.client_info.name,
                    init.client_info.version,
                    init.protocol_version
                ),
                Err(e) => tracing::warn!("Failed to parse initialize params: {}", e),
            }
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        respond(id, &result)
    }

    fn handle_tools_list(&self, id: RequestId) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: self.handler.available_tools(),
        };
        respond(id, &result)
    }

    async fn handle_tools_call(&self, id: RequestId, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        JsonRpcError::invalid_params(&e.to_string()),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, JsonRpcError::invalid_params("Missing params"));
            }
        };

        tracing::info!("Calling tool: {}", params.name);

        let result = self.handler.execute(&params.name, params.arguments).await;
        respond(id, &result)
    }
}

fn respond<T: serde::Serialize>(id: RequestId, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, JsonRpcError::internal_error(&e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fakes::FakeTracker;
    use crate::protocol::JSONRPC_VERSION;
    use serde_json::json;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    fn server() -> McpServer {
        McpServer::new(ToolHandler::new(Arc::new(FakeTracker::default())))
    }

    fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: RequestId::Number(id),
            method: method.to_string(),
            params,
        }
    }

    struct SharedWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Feed `input` through a full session and return the response lines.
    async fn session(input: &str) -> Vec<Value> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let mut transport = StdioTransport::new(
            Box::new(Cursor::new(input.to_string())),
            Box::new(SharedWriter(buffer.clone())),
        );

        server().serve(&mut transport).await.unwrap();

        let output = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_response() {
        let mut server = server();
        let resp = server
            .handle_request(request(
                1,
                "initialize",
                Some(json!({
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test-client", "version": "1.0.0"}
                })),
            ))
            .await;

        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
        assert_eq!(result["protocolVersion"], MCP_VERSION);
        assert!(server.initialized);
    }

    #[test]
    fn test_double_initialize_error() {
        let mut server = server();
        assert!(server.handle_initialize(RequestId::Number(1), None).error.is_none());
        let resp = server.handle_initialize(RequestId::Number(2), None);
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_REQUEST);
    }

    #[test]
    fn test_tools_list() {
        let resp = server().handle_tools_list(RequestId::Number(1));
        let result: ToolsListResult = serde_json::from_value(resp.result.unwrap()).unwrap();
        assert!(result.tools.iter().any(|t| t.name == "create-issue"));
        assert!(result.tools.iter().all(|t| t.name != "create-feature-pr"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let resp = server()
            .handle_request(request(1, "resources/list", None))
            .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let resp = server().handle_request(request(1, "tools/call", None)).await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_malformed_params() {
        let resp = server()
            .handle_request(request(1, "tools/call", Some(json!({"arguments": {}}))))
            .await;
        assert_eq!(resp.error.unwrap().code, JsonRpcError::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tool_error_is_a_successful_response() {
        let resp = server()
            .handle_request(request(
                1,
                "tools/call",
                Some(json!({"name": "create-issue", "arguments": {"teamId": "t"}})),
            ))
            .await;

        assert!(resp.error.is_none());
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let mut server = server();
        let msg = IncomingMessage::Notification(crate::protocol::JsonRpcNotification {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: "notifications/cancelled".to_string(),
            params: None,
        });
        assert!(server.handle_message(msg).await.is_none());
    }

    #[tokio::test]
    async fn test_session_continues_after_parse_error() {
        let responses = session(concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "{this is not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":"list","method":"tools/list"}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["code"], -32700);
        assert_eq!(responses[2]["id"], 2);
        assert_eq!(responses[2]["result"], json!({}));
        assert_eq!(responses[3]["id"], "list");
        assert!(responses[3]["result"]["tools"].is_array());
    }

    #[tokio::test]
    async fn test_session_answers_non_jsonrpc_with_invalid_request() {
        let responses = session(concat!(
            r#"{"foo":1}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":7,"params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":8,"method":"ping"}"#,
            "\n",
        ))
        .await;

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32600);
        assert_eq!(responses[1]["id"], 7);
        assert_eq!(responses[1]["error"]["code"], -32600);
        assert_eq!(responses[2]["id"], 8);
        assert_eq!(responses[2]["result"], json!({}));
    }

    #[tokio::test]
    async fn test_session_ends_cleanly_on_eof() {
        assert!(session("").await.is_empty());
    }
}
