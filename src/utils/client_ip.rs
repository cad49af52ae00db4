//! Visitor identification from request metadata.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::net::{IpAddr, SocketAddr};

type HmacSha256 = Hmac<Sha256>;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Resolves the client address of a request.
///
/// When `behind_proxy` is set, the first entry of `X-Forwarded-For` wins,
/// then `X-Real-IP`; a header value that is not an IP address is ignored.
/// Otherwise, and as the fallback, the socket peer address is used.
///
/// Only enable `behind_proxy` behind a trusted reverse proxy: the headers are
/// client-controlled.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> IpAddr {
    if behind_proxy {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|first| first.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ip;
        }

        let real_ip = headers
            .get(X_REAL_IP)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = real_ip {
            return ip;
        }
    }

    peer.ip()
}

/// Turns a raw client address into the id stored in the visitor set.
///
/// Without a secret the address is stored as-is. With one, the id is the
/// hex HMAC-SHA256 of the address.
#[derive(Clone)]
pub struct VisitorFingerprinter {
    mac: Option<HmacSha256>,
}

impl VisitorFingerprinter {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            mac: secret
                .filter(|s| !s.is_empty())
                .and_then(|s| HmacSha256::new_from_slice(s.as_bytes()).ok()),
        }
    }

    pub fn is_hashing(&self) -> bool {
        self.mac.is_some()
    }

    pub fn fingerprint(&self, ip: IpAddr) -> String {
        match &self.mac {
            None => ip.to_string(),
            Some(mac) => {
                let mut mac = mac.clone();
                mac.update(ip.to_string().as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
        }
    }
}
