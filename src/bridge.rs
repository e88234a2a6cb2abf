// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Line-delimited JSON-RPC bridge for the web layer
//!
//! This is the seam where the hybrid app's `exec` marshalling used to sit:
//! the WebView side sends one JSON request per line and reads one JSON
//! response per line. Two methods exist, `requestPermissions` and
//! `getExerciseData`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tracing::info;

use crate::constants::protocol::JSONRPC_VERSION;
use crate::errors::PipelineError;
use crate::logging::AppLogger;
use crate::pipeline::ExercisePipeline;

// JSON-RPC error codes (per the JSON-RPC 2.0 specification)
const ERROR_METHOD_NOT_FOUND: i32 = -32601;
const ERROR_INVALID_PARAMS: i32 = -32602;
const ERROR_INTERNAL_ERROR: i32 = -32603;

pub struct BridgeServer {
    pipeline: Arc<ExercisePipeline>,
}

impl BridgeServer {
    pub fn new(pipeline: Arc<ExercisePipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn run(self, port: u16) -> Result<()> {
        let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
        info!("Bridge server listening on port {}", port);
        self.serve(listener).await
    }

    /// Accept loop over an already-bound listener (tests bind port 0).
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        loop {
            let (socket, addr) = listener.accept().await?;
            info!("New connection from {}", addr);

            let pipeline = self.pipeline.clone();

            tokio::spawn(async move {
                let (reader, mut writer) = socket.into_split();
                let mut reader = BufReader::new(reader);
                let mut line = String::new();

                while reader.read_line(&mut line).await.unwrap_or(0) > 0 {
                    if let Ok(request) = serde_json::from_str::<BridgeRequest>(&line) {
                        let response = handle_request(request, &pipeline).await;
                        if let Ok(response_str) = serde_json::to_string(&response) {
                            writer.write_all(response_str.as_bytes()).await.ok();
                            writer.write_all(b"\n").await.ok();
                        }
                    }
                    line.clear();
                }
            });
        }
    }
}

#[derive(Debug, Deserialize)]
struct BridgeRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    method: String,
    params: Option<Value>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct BridgeResponse {
    jsonrpc: String,
    result: Option<Value>,
    error: Option<BridgeError>,
    id: Value,
}

#[derive(Debug, Serialize)]
struct BridgeError {
    code: i32,
    message: String,
}

impl BridgeResponse {
    fn ok(result: Value, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    fn err(code: i32, message: String, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(BridgeError { code, message }),
            id,
        }
    }

    fn from_pipeline_error(error: PipelineError, id: Value) -> Self {
        let code = match error {
            PipelineError::InvalidArgument(_) => ERROR_INVALID_PARAMS,
            _ => ERROR_INTERNAL_ERROR,
        };
        Self::err(code, error.to_string(), id)
    }
}

async fn handle_request(
    request: BridgeRequest,
    pipeline: &Arc<ExercisePipeline>,
) -> BridgeResponse {
    let started = Instant::now();
    let method = request.method.clone();

    let response = match request.method.as_str() {
        "requestPermissions" => match pipeline.request_permissions().await {
            Ok(()) => BridgeResponse::ok(Value::String("Authorization requested".into()), request.id),
            Err(e) => BridgeResponse::from_pipeline_error(e, request.id),
        },
        "getExerciseData" => {
            let params = request.params.unwrap_or_default();
            let start = params["startTime"].as_str();
            let end = params["endTime"].as_str();

            match (start, end) {
                (Some(start), Some(end)) => {
                    match pipeline.get_exercise_data(start, end).await {
                        Ok(json) => BridgeResponse::ok(Value::String(json), request.id),
                        Err(e) => BridgeResponse::from_pipeline_error(e, request.id),
                    }
                }
                _ => BridgeResponse::err(
                    ERROR_INVALID_PARAMS,
                    "startTime and endTime string params required".to_string(),
                    request.id,
                ),
            }
        }
        _ => BridgeResponse::err(
            ERROR_METHOD_NOT_FOUND,
            "Method not found".to_string(),
            request.id,
        ),
    };

    AppLogger::log_bridge_call(
        &method,
        response.error.is_none(),
        started.elapsed().as_millis() as u64,
    );
    response
}
