use serde::{Deserialize, Serialize};

/// The envelope every Proxy server response is wrapped in, matching
/// `csoproxy/proxy_message.go`'s `Response`. `data` is left as raw JSON and
/// re-parsed into the call-specific struct once `return_code == 1`, the same
/// two-step unmarshal the Go client performs through `interface{}`.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "returncode")]
    pub return_code: i32,
    #[allow(dead_code)]
    #[serde(rename = "timestamp")]
    pub timestamp: u64,
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ExchangeKeyRequest<'a> {
    pub project_id: &'a str,
    pub unique_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ExchangeKeyResponse {
    pub g_key: String,
    pub n_key: String,
    pub pub_key: String,
    pub sign: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterConnectionRequest<'a> {
    pub project_id: &'a str,
    pub project_token: String,
    pub unique_name: &'a str,
    pub public_key: String,
    pub iv: String,
    pub authen_tag: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterConnectionResponse {
    pub hub_address: String,
    pub ticket_id: u32,
    pub ticket_token: String,
    pub pub_key: String,
    pub iv: String,
    pub auth_tag: String,
}
