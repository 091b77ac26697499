//! Invocation boundary.
//!
//! Every invocation produces an [`InvocationResult`], never an error: storage
//! and serialization failures are logged here once and turned into a 500
//! response whose body carries the message.
//!
//! ```json
//! {"statusCode": 200, "body": "{\"message\":\"Manifest generated\",\"imageCount\":3}"}
//! {"statusCode": 500, "body": "{\"error\":\"failed to write photos/gallery/manifest.json: ...\"}"}
//! ```
//!
//! `body` is a JSON document encoded as a string, the shape API-style invokers
//! expect.

use crate::generator::{GenerateSummary, ManifestGenerator};
use crate::storage::ObjectStore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

pub const SUCCESS_MESSAGE: &str = "Manifest generated";

/// 200 body. Field order is the serialized key order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody<'a> {
    message: &'a str,
    image_count: usize,
}

/// 500 body.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

// Neither body holds a map or a non-string key, so encoding cannot fail.
fn encode<T: Serialize>(body: &T) -> String {
    serde_json::to_string(body).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub body: String,
}

impl InvocationResult {
    pub fn success(image_count: usize) -> Self {
        Self {
            status_code: 200,
            body: encode(&SuccessBody {
                message: SUCCESS_MESSAGE,
                image_count,
            }),
        }
    }

    pub fn failure(message: impl AsRef<str>) -> Self {
        Self {
            status_code: 500,
            body: encode(&ErrorBody {
                error: message.as_ref(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    /// Decoded `body`, or `Value::Null` if it is not JSON.
    pub fn body_json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

impl From<&GenerateSummary> for InvocationResult {
    fn from(summary: &GenerateSummary) -> Self {
        Self::success(summary.image_count)
    }
}

/// Run one invocation. The event payload is logged and otherwise ignored.
pub async fn handle<S: ObjectStore>(
    generator: &ManifestGenerator<S>,
    event: &Value,
) -> (InvocationResult, Option<GenerateSummary>) {
    info!(event = %event, "Received invocation");

    match generator.run().await {
        Ok(summary) => (InvocationResult::from(&summary), Some(summary)),
        Err(e) => {
            error!(error = %e, "Manifest generation failed");
            (InvocationResult::failure(e.to_string()), None)
        }
    }
}
