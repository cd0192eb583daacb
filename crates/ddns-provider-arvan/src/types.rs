//! ArvanCloud CDN API v4 wire types

use ddns_core::traits::{RecordType, RemoteRecord};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::net::IpAddr;

/// TTL applied to every record written by the client
pub const RECORD_TTL: u32 = 120;

/// Body of a create or update request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DnsRecordPayload {
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    pub value: Vec<IpValue>,
    pub ttl: u32,
    pub cloud: bool,
    pub upstream_https: String,
    pub ip_filter_mode: IpFilterMode,
}

impl DnsRecordPayload {
    /// Build the payload for one record pointing at `ip`
    ///
    /// TTL, proxying and filtering are fixed policy.
    pub fn new(record: &str, record_type: RecordType, ip: IpAddr) -> Self {
        Self {
            record_type,
            name: record.to_string(),
            value: vec![IpValue { ip: ip.to_string() }],
            ttl: RECORD_TTL,
            cloud: false,
            upstream_https: "default".to_string(),
            ip_filter_mode: IpFilterMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpValue {
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpFilterMode {
    pub count: String,
    pub order: String,
    pub geo_filter: String,
}

impl Default for IpFilterMode {
    fn default() -> Self {
        Self {
            count: "single".to_string(),
            order: "none".to_string(),
            geo_filter: "none".to_string(),
        }
    }
}

/// `GET /domains/{domain}/dns-records` response
///
/// `data` is required: a body without it says nothing about the zone,
/// and reading it as empty would create duplicates.
#[derive(Debug, Deserialize)]
pub struct DnsRecordList {
    pub data: Vec<RemoteRecordEntry>,
}

/// One entry of a record listing; fields the client does not use are ignored
#[derive(Debug, Deserialize)]
pub struct RemoteRecordEntry {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
}

impl From<RemoteRecordEntry> for RemoteRecord {
    fn from(entry: RemoteRecordEntry) -> Self {
        RemoteRecord {
            id: entry.id,
            name: entry.name,
            record_type: entry.record_type,
        }
    }
}

/// `POST` / `PUT` response; only the id of the written record is read
#[derive(Debug, Deserialize)]
pub struct DnsRecordResponse {
    pub data: Option<WrittenRecord>,
}

#[derive(Debug, Deserialize)]
pub struct WrittenRecord {
    #[serde(default, deserialize_with = "optional_id_as_string")]
    pub id: Option<String>,
}

// Record ids are UUID strings, but accept numbers too
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn optional_id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}
