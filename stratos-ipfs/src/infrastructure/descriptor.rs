use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{IpfsError, IpfsResult};

/// Result of an `add` call as reported by the gateway.
///
/// Only the content identifier (`Hash`) is relied upon. Anything else the
/// gateway sends back is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDescriptor {
    #[serde(rename = "Hash")]
    hash: String,

    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    // Kubo reports the size as a string, other gateways as a number
    #[serde(rename = "Size", default, skip_serializing_if = "Option::is_none")]
    size: Option<Value>,

    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl ContentDescriptor {
    pub fn new(hash: impl Into<String>, name: Option<String>, size: Option<u64>) -> Self {
        Self {
            hash: hash.into(),
            name,
            size: size.map(|s| Value::String(s.to_string())),
            extra: Map::new(),
        }
    }

    /// Parse the body of an `add` response.
    ///
    /// Kubo streams one JSON object per line; the last one describes the
    /// added content.
    pub fn from_response_body(body: &str) -> IpfsResult<Self> {
        let line = body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .ok_or_else(|| IpfsError::InvalidResponse("empty add response".into()))?;

        let descriptor: Self = serde_json::from_str(line)
            .map_err(|e| IpfsError::InvalidResponse(format!("failed to parse add response: {e}")))?;

        if descriptor.hash.trim().is_empty() {
            return Err(IpfsError::InvalidResponse(
                "add response carries an empty content identifier".into(),
            ));
        }

        Ok(descriptor)
    }

    /// Content identifier assigned by the gateway.
    pub fn cid(&self) -> &str {
        &self.hash
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn size(&self) -> Option<u64> {
        match self.size.as_ref()? {
            Value::String(s) => s.parse().ok(),
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    /// Gateway metadata other than `Hash`, `Name` and `Size`.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.extra.get(field)
    }

    pub fn into_cid(self) -> String {
        self.hash
    }
}
