//! Version `006` access token encoding.
//!
//! Layout (all integers little-endian, `bytes` = u16 length + raw bytes):
//! - message: `u32 salt | u32 ts | u16 count | (u16 privilege | u32 expire_ts)*`
//! - signature: HMAC-SHA256 keyed by the app certificate over `app_id | channel | uid | message`
//! - content: `bytes signature | u32 crc32(channel) | u32 crc32(uid) | bytes message`
//! - token: `"006" | app_id | base64(content)`

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha2::Sha256;

pub const VERSION: &str = "006";

/// Validity of the token envelope itself, separate from privilege expiry.
pub const MESSAGE_TTL_SECONDS: u32 = 24 * 3600;

const MAX_SALT: u32 = 99_999_999;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Privilege {
    JoinChannel = 1,
    PublishAudioStream = 2,
    PublishVideoStream = 3,
    PublishDataStream = 4,
}

#[derive(Debug, Clone)]
pub struct AccessToken {
    app_id: String,
    app_certificate: String,
    channel_name: String,
    uid: String,
    pub salt: u32,
    pub ts: u32,
    privileges: BTreeMap<u16, u32>,
}

impl AccessToken {
    /// `issued_at` is the unix time the envelope is stamped from.
    pub fn new(
        app_id: &str,
        app_certificate: &str,
        channel_name: &str,
        uid: &str,
        issued_at: u32,
    ) -> Self {
        Self {
            app_id: app_id.to_string(),
            app_certificate: app_certificate.to_string(),
            channel_name: channel_name.to_string(),
            uid: uid.to_string(),
            salt: OsRng.next_u32() % MAX_SALT + 1,
            ts: issued_at.saturating_add(MESSAGE_TTL_SECONDS),
            privileges: BTreeMap::new(),
        }
    }

    /// Numeric uid `0` is the wildcard and encodes as an empty uid.
    pub fn with_uid(
        app_id: &str,
        app_certificate: &str,
        channel_name: &str,
        uid: u32,
        issued_at: u32,
    ) -> Self {
        let uid = if uid == 0 {
            String::new()
        } else {
            uid.to_string()
        };
        Self::new(app_id, app_certificate, channel_name, &uid, issued_at)
    }

    pub fn add_privilege(&mut self, privilege: Privilege, expire_ts: u32) {
        self.privileges.insert(privilege as u16, expire_ts);
    }

    pub fn build(&self) -> String {
        let message = self.pack_message();

        let mut mac = HmacSha256::new_from_slice(self.app_certificate.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(self.app_id.as_bytes());
        mac.update(self.channel_name.as_bytes());
        mac.update(self.uid.as_bytes());
        mac.update(&message);
        let signature = mac.finalize().into_bytes();

        let mut content = ByteBuf::default();
        content.put_bytes(&signature);
        content.put_u32(crc32fast::hash(self.channel_name.as_bytes()));
        content.put_u32(crc32fast::hash(self.uid.as_bytes()));
        content.put_bytes(&message);

        format!("{VERSION}{}{}", self.app_id, STANDARD.encode(content.into_inner()))
    }

    fn pack_message(&self) -> Vec<u8> {
        let mut buf = ByteBuf::default();
        buf.put_u32(self.salt);
        buf.put_u32(self.ts);
        buf.put_u16(self.privileges.len() as u16);
        for (privilege, expire_ts) in &self.privileges {
            buf.put_u16(*privilege);
            buf.put_u32(*expire_ts);
        }
        buf.into_inner()
    }
}

#[derive(Default)]
struct ByteBuf(Vec<u8>);

impl ByteBuf {
    fn put_u16(&mut self, value: u16) {
        self.0.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.0.extend_from_slice(&value.to_le_bytes());
    }

    fn put_bytes(&mut self, bytes: &[u8]) {
        self.put_u16(bytes.len() as u16);
        self.0.extend_from_slice(bytes);
    }

    fn into_inner(self) -> Vec<u8> {
        self.0
    }
}
