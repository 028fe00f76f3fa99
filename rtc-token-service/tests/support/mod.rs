#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use rtc_token_service::config::RtcConfig;
use rtc_token_service::signer::AccessTokenSigner;
use rtc_token_service::{build_router, AppState};
use serde_json::Value;
use tower::util::ServiceExt;

pub const APP_ID: &str = "970CA35de60c44645bbae8a215061b33";
pub const APP_CERTIFICATE: &str = "5CFd2fd1755d40ecb72977518be15d3b";

pub fn test_config(extra: &[(&str, &str)]) -> Result<RtcConfig> {
    let mut pairs = extra.to_vec();
    pairs.extend([("APP_ID", APP_ID), ("APP_CERTIFICATE", APP_CERTIFICATE)]);
    RtcConfig::from_lookup(|key| {
        pairs
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    })
}

pub fn test_app(extra: &[(&str, &str)]) -> Result<Router> {
    let state = AppState::new(test_config(extra)?, Arc::new(AccessTokenSigner::new()))?;
    Ok(build_router(state))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn text(&self) -> Result<String> {
        Ok(String::from_utf8(self.body.clone())?)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub async fn get(app: &Router, uri: &str) -> Result<TestResponse> {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await?.to_bytes().to_vec();
    Ok(TestResponse {
        status,
        headers,
        body,
    })
}

/// Fields recovered from a version 006 token.
#[derive(Debug)]
pub struct DecodedToken {
    pub app_id: String,
    pub signature: Vec<u8>,
    pub crc_channel: u32,
    pub crc_uid: u32,
    pub salt: u32,
    pub ts: u32,
    pub privileges: Vec<(u16, u32)>,
}

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < len {
            return Err(anyhow!("token truncated"));
        }
        let (head, tail) = self.bytes.split_at(len);
        self.bytes = tail;
        Ok(head)
    }

    fn u16(&mut self) -> Result<u16> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn bytes(&mut self) -> Result<&'a [u8]> {
        let len = self.u16()? as usize;
        self.take(len)
    }
}

pub fn decode_token(token: &str) -> Result<DecodedToken> {
    let rest = token
        .strip_prefix("006")
        .ok_or_else(|| anyhow!("unexpected token version"))?;
    if rest.len() < 32 {
        return Err(anyhow!("token missing app id"));
    }
    let (app_id, encoded) = rest.split_at(32);
    let content = STANDARD.decode(encoded)?;

    let mut reader = Reader { bytes: &content };
    let signature = reader.bytes()?.to_vec();
    let crc_channel = reader.u32()?;
    let crc_uid = reader.u32()?;
    let message = reader.bytes()?;

    let mut message = Reader { bytes: message };
    let salt = message.u32()?;
    let ts = message.u32()?;
    let count = message.u16()?;
    let mut privileges = Vec::with_capacity(count as usize);
    for _ in 0..count {
        privileges.push((message.u16()?, message.u32()?));
    }

    Ok(DecodedToken {
        app_id: app_id.to_string(),
        signature,
        crc_channel,
        crc_uid,
        salt,
        ts,
        privileges,
    })
}
