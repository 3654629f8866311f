//! Client ↔ tool host sessions over in-process streams and a real socket.

use std::time::Duration;

use mcp::{
    Client, Error, ServerConfig, Tool, ToolFailure, ToolHandler, ToolRegistry, ToolServer,
    first_text, schema,
};
use serde_json::{Map, Value, json};

struct Add;

impl ToolHandler for Add {
    fn descriptor(&self) -> Tool {
        Tool::new(
            "add",
            "Add two numbers",
            schema(json!({
                "type": "object",
                "properties": {"a": {"type": "integer"}, "b": {"type": "integer"}},
                "required": ["a", "b"]
            })),
        )
    }

    fn call(&self, arguments: &Map<String, Value>) -> Result<String, ToolFailure> {
        let a = arguments["a"].as_i64().unwrap_or_default();
        let b = arguments["b"].as_i64().unwrap_or_default();
        Ok((a + b).to_string())
    }
}

struct Explode;

impl ToolHandler for Explode {
    fn descriptor(&self) -> Tool {
        Tool::new("explode", "Always fails", schema(json!({"type": "object"})))
    }

    fn call(&self, _arguments: &Map<String, Value>) -> Result<String, ToolFailure> {
        Err(ToolFailure::new("kaboom"))
    }
}

fn tool_server() -> ToolServer {
    let registry = ToolRegistry::new().with(Add).unwrap().with(Explode).unwrap();
    ToolServer::new("test-host", registry)
}

fn args(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

/// Client wired to an in-process host through a duplex pipe.
async fn in_process_client() -> Client {
    let (client_end, server_end) = tokio::io::duplex(64 * 1024);
    tokio::spawn(tool_server().serve_transport(server_end));
    Client::from_transport("test-host", client_end, Duration::from_secs(5))
        .await
        .unwrap()
}

async fn spawn_http(server: ToolServer) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { server.serve_http(listener, "/mcp").await });
    format!("http://{addr}")
}

#[tokio::test]
async fn list_then_call_listed_tool() {
    let client = in_process_client().await;

    let tools = client.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.to_string()).collect();
    assert_eq!(names, ["add", "explode"]);
    assert_eq!(client.catalog().await.len(), 2);

    let result = client.call_tool("add", args(json!({"a": 2, "b": 3}))).await.unwrap();
    assert_eq!(first_text(&result), Some("5"));
}

#[tokio::test]
async fn unlisted_tool_is_not_found() {
    let client = in_process_client().await;

    // No catalog fetched yet.
    assert!(matches!(
        client.call_tool("add", args(json!({"a": 1, "b": 1}))).await,
        Err(Error::ToolNotFound(name)) if name == "add"
    ));

    client.list_tools().await.unwrap();
    assert!(matches!(
        client.call_tool("sub", Map::new()).await,
        Err(Error::ToolNotFound(name)) if name == "sub"
    ));
}

#[tokio::test]
async fn host_rejections_and_failures_are_typed() {
    let client = in_process_client().await;
    client.list_tools().await.unwrap();

    let err = client
        .call_tool("add", args(json!({"a": "two", "b": 3})))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArguments { ref tool, .. } if tool == "add"));

    let err = client.call_tool("explode", Map::new()).await.unwrap_err();
    assert!(matches!(err, Error::ToolCallFailed(ref text) if text == "kaboom"));

    // The session survives both.
    let result = client.call_tool("add", args(json!({"a": 1, "b": 1}))).await.unwrap();
    assert_eq!(first_text(&result), Some("2"));
}

#[tokio::test]
async fn close_is_idempotent_and_final() {
    let client = in_process_client().await;

    client.close().await.unwrap();
    client.close().await.unwrap();
    assert!(client.is_closed());
    assert!(matches!(client.list_tools().await, Err(Error::Closed)));
}

#[tokio::test]
async fn silent_host_times_out_the_handshake() {
    let (client_end, _server_end) = tokio::io::duplex(1024);
    let outcome = Client::from_transport("mute", client_end, Duration::from_millis(100)).await;
    assert!(matches!(outcome, Err(Error::Timeout)));
}

#[tokio::test]
async fn streamable_http_session() {
    let base = spawn_http(tool_server()).await;

    let client = Client::connect(ServerConfig::http("http-host", format!("{base}/mcp")))
        .await
        .unwrap();

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.len(), 2);

    let result = client.call_tool("add", args(json!({"a": 20, "b": 22}))).await.unwrap();
    assert_eq!(first_text(&result), Some("42"));

    let err = client.call_tool("explode", Map::new()).await.unwrap_err();
    assert!(matches!(err, Error::ToolCallFailed(_)));

    client.close().await.unwrap();
}

#[tokio::test]
async fn http_sessions_run_side_by_side() {
    let base = spawn_http(tool_server()).await;
    let url = format!("{base}/mcp");

    let first = Client::connect(ServerConfig::http("one", &url)).await.unwrap();
    let second = Client::connect(ServerConfig::http("two", &url)).await.unwrap();
    first.list_tools().await.unwrap();
    second.list_tools().await.unwrap();

    let (a, b) = tokio::join!(
        first.call_tool("add", args(json!({"a": 1, "b": 2}))),
        second.call_tool("add", args(json!({"a": 3, "b": 4}))),
    );
    assert_eq!(first_text(&a.unwrap()), Some("3"));
    assert_eq!(first_text(&b.unwrap()), Some("7"));

    // Ending one session leaves the other usable.
    first.close().await.unwrap();
    assert_eq!(second.list_tools().await.unwrap().len(), 2);
    second.close().await.unwrap();
}

const ACCEPT: &str = "application/json, text/event-stream";

async fn post(
    http: &reqwest::Client,
    url: &str,
    session: Option<&str>,
    body: Value,
) -> reqwest::Response {
    let mut request = http.post(url).header("accept", ACCEPT).json(&body);
    if let Some(id) = session {
        request = request.header("mcp-session-id", id);
    }
    request.send().await.unwrap()
}

#[tokio::test]
async fn idle_http_sessions_expire() {
    let server = tool_server().with_session_idle(Duration::from_millis(300));
    let base = spawn_http(server).await;
    let url = format!("{base}/mcp");
    let http = reqwest::Client::new();

    let init = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "raw", "version": "0"}
        }
    });
    let response = post(&http, &url, None, init).await;
    assert!(response.status().is_success());
    let session = response
        .headers()
        .get("mcp-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap();
    // Drain the initialize response before moving on.
    response.text().await.unwrap();

    let ready = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    let response = post(&http, &url, Some(&session), ready).await;
    assert!(response.status().is_success());

    let list = json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"});
    let response = post(&http, &url, Some(&session), list.clone()).await;
    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("explode"));

    tokio::time::sleep(Duration::from_millis(1200)).await;

    let response = post(&http, &url, Some(&session), list).await;
    assert!(!response.status().is_success());
}

#[tokio::test]
async fn http_requests_need_a_known_session() {
    let base = spawn_http(tool_server()).await;
    let url = format!("{base}/mcp");
    let http = reqwest::Client::new();

    let list = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
    let unknown = post(&http, &url, Some("nope"), list).await;
    assert!(!unknown.status().is_success());

    let health = http.get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "OK");
}
