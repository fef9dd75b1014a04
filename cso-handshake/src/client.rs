use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use num_bigint::BigUint;

use crate::config::Config;
use crate::error::HandshakeError;
use crate::messages::{
    Envelope, ExchangeKeyRequest, ExchangeKeyResponse, RegisterConnectionRequest,
    RegisterConnectionResponse,
};

/// Triple `(G, N, PubServer)` returned by `/exchange-key`, matching
/// `csoproxy.ServerKey`.
#[derive(Debug, Clone)]
pub struct ServerKey {
    pub g_key: BigUint,
    pub n_key: BigUint,
    pub pub_key: BigUint,
}

/// The activation material produced by a successful handshake, matching
/// `csoproxy.ServerTicket`. Lives from successful handshake to the next
/// reconnect.
#[derive(Debug, Clone)]
pub struct ServerTicket {
    pub hub_address: String,
    pub ticket_id: u32,
    pub ticket_bytes: [u8; 34],
    pub server_secret_key: [u8; 32],
}

/// Talks `exchange-key` and `register-connection` to the Proxy server over
/// blocking HTTP, mirroring `csoproxy::proxyImpl`. Holds no mutable state
/// between calls — unlike the Go `proxyImpl`, which reuses scratch response
/// structs across calls, this allocates a fresh response per request, which
/// is the idiomatic Rust shape and costs nothing at handshake frequency.
pub struct HandshakeClient {
    http: reqwest::blocking::Client,
}

impl HandshakeClient {
    pub fn new() -> HandshakeClient {
        HandshakeClient {
            http: reqwest::blocking::Client::new(),
        }
    }

    /// Runs the full handshake: `exchange-key` then `register-connection`.
    pub fn handshake(&self, config: &Config) -> Result<ServerTicket, HandshakeError> {
        let server_key = self.exchange_key(config)?;
        self.register_connection(config, &server_key)
    }

    /// `ExchangeKey`: fetches and RSA-verifies the DH parameters and server
    /// public key.
    pub fn exchange_key(&self, config: &Config) -> Result<ServerKey, HandshakeError> {
        let url = format!("{}/exchange-key", config.cso_address);
        let req = ExchangeKeyRequest {
            project_id: &config.project_id,
            unique_name: &config.connection_name,
        };

        let envelope: Envelope = self.http.post(&url).json(&req).send()?.json()?;
        if envelope.return_code != 1 {
            return Err(HandshakeError::ServerRejected(rejection_message(
                &envelope,
            )));
        }
        let resp: ExchangeKeyResponse = serde_json::from_value(envelope.data)
            .map_err(|e| HandshakeError::Decode(e.to_string()))?;

        let sign = BASE64
            .decode(&resp.sign)
            .map_err(|e| HandshakeError::Decode(e.to_string()))?;

        let mut signed = Vec::with_capacity(
            resp.g_key.len() + resp.n_key.len() + resp.pub_key.len(),
        );
        signed.extend_from_slice(resp.g_key.as_bytes());
        signed.extend_from_slice(resp.n_key.as_bytes());
        signed.extend_from_slice(resp.pub_key.as_bytes());
        cso_crypto::verify_rsa_sign(&config.cso_public_key, &sign, &signed)?;

        let g_key = parse_decimal(&resp.g_key, "g_key")?;
        let n_key = parse_decimal(&resp.n_key, "n_key")?;
        let pub_key = parse_decimal(&resp.pub_key, "pub_key")?;

        Ok(ServerKey {
            g_key,
            n_key,
            pub_key,
        })
    }

    /// `RegisterConnection`: runs the client side of the DH agreement,
    /// encrypts the project token, and decrypts the returned activation
    /// ticket.
    pub fn register_connection(
        &self,
        config: &Config,
        server_key: &ServerKey,
    ) -> Result<ServerTicket, HandshakeError> {
        let client_priv_key = cso_crypto::generate_dh_private_key();
        let client_pub_key =
            cso_crypto::calc_dh_key(&server_key.g_key, &server_key.n_key, &client_priv_key);
        let client_secret_key = cso_crypto::calc_secret_key(
            &server_key.n_key,
            &client_priv_key,
            &server_key.pub_key,
        );

        let decoded_token = BASE64
            .decode(&config.project_token)
            .map_err(|e| HandshakeError::Decode(e.to_string()))?;

        let client_pub_key_str = client_pub_key.to_str_radix(10);
        let mut client_aad = Vec::with_capacity(
            config.project_id.len() + config.connection_name.len() + client_pub_key_str.len(),
        );
        client_aad.extend_from_slice(config.project_id.as_bytes());
        client_aad.extend_from_slice(config.connection_name.as_bytes());
        client_aad.extend_from_slice(client_pub_key_str.as_bytes());

        let (iv, authen_tag, cipher_token) =
            cso_crypto::encrypt(&client_secret_key, &decoded_token, &client_aad)?;

        let url = format!("{}/register-connection", config.cso_address);
        let req = RegisterConnectionRequest {
            project_id: &config.project_id,
            project_token: BASE64.encode(cipher_token),
            unique_name: &config.connection_name,
            public_key: client_pub_key_str,
            iv: BASE64.encode(iv),
            authen_tag: BASE64.encode(authen_tag),
        };

        let envelope: Envelope = self.http.post(&url).json(&req).send()?.json()?;
        if envelope.return_code != 1 {
            return Err(HandshakeError::ServerRejected(rejection_message(
                &envelope,
            )));
        }
        let resp: RegisterConnectionResponse = serde_json::from_value(envelope.data)
            .map_err(|e| HandshakeError::Decode(e.to_string()))?;

        let hub_pub_key = parse_decimal(&resp.pub_key, "pub_key")?;
        let server_secret_key =
            cso_crypto::calc_secret_key(&server_key.n_key, &client_priv_key, &hub_pub_key);

        let mut server_aad = Vec::with_capacity(2 + resp.hub_address.len() + resp.pub_key.len());
        server_aad.extend_from_slice(&(resp.ticket_id as u16).to_le_bytes());
        server_aad.extend_from_slice(resp.hub_address.as_bytes());
        server_aad.extend_from_slice(resp.pub_key.as_bytes());

        let server_iv = BASE64
            .decode(&resp.iv)
            .map_err(|e| HandshakeError::Decode(e.to_string()))?;
        let server_authen_tag = BASE64
            .decode(&resp.auth_tag)
            .map_err(|e| HandshakeError::Decode(e.to_string()))?;
        let server_ticket_token = BASE64
            .decode(&resp.ticket_token)
            .map_err(|e| HandshakeError::Decode(e.to_string()))?;

        let server_iv: [u8; cso_crypto::IV_SIZE] = server_iv
            .try_into()
            .map_err(|_| HandshakeError::Decode("iv must be 12 bytes".into()))?;
        let server_authen_tag: [u8; cso_crypto::AUTHEN_TAG_SIZE] = server_authen_tag
            .try_into()
            .map_err(|_| HandshakeError::Decode("authen_tag must be 16 bytes".into()))?;

        let ticket_token = cso_crypto::decrypt(
            &server_secret_key,
            &server_iv,
            &server_authen_tag,
            &server_ticket_token,
            &server_aad,
        )?;

        let ticket = cso_wire::Ticket::parse(&build_ticket_buffer(
            resp.ticket_id as u16,
            &ticket_token,
        )?)?;

        Ok(ServerTicket {
            hub_address: resp.hub_address,
            ticket_id: resp.ticket_id,
            ticket_bytes: ticket.into_bytes(),
            server_secret_key,
        })
    }
}

impl Default for HandshakeClient {
    fn default() -> Self {
        HandshakeClient::new()
    }
}

fn build_ticket_buffer(ticket_id: u16, token: &[u8]) -> Result<Vec<u8>, HandshakeError> {
    if token.len() != 32 {
        return Err(HandshakeError::Decode(format!(
            "ticket token must be 32 bytes, got {}",
            token.len()
        )));
    }
    let mut buffer = Vec::with_capacity(34);
    buffer.extend_from_slice(&ticket_id.to_le_bytes());
    buffer.extend_from_slice(token);
    Ok(buffer)
}

fn parse_decimal(value: &str, field: &str) -> Result<BigUint, HandshakeError> {
    value
        .parse::<BigUint>()
        .map_err(|_| HandshakeError::Decode(format!("invalid decimal integer in {field}")))
}

fn rejection_message(envelope: &Envelope) -> String {
    envelope
        .data
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| envelope.data.to_string())
}
