use std::{net::IpAddr, str::FromStr};

use actix_web::HttpRequest;
use hmac::{Hmac, Mac};
use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::Sha256;

static FORWARDED_FOR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"for=(?P<ip>[^;,]+)"#).expect("Invalid regex"));

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the configuration.
/// 2. The `Forwarded` header, iif `use_forwarded` is set to true in the configuration.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req
            .headers()
            .get("Forwarded")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| FORWARDED_FOR.captures(v))
            .and_then(|caps| caps.name("ip"))
            .map(|m| m.as_str().trim_matches('"'))
            .and_then(|s| IpAddr::from_str(s).ok());
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

/// The base64-encoded HMAC-SHA256 of `data`, keyed with `secret`.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::default(),
    };
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}

/// Checks a base64-encoded HMAC-SHA256 `signature` of `data` in constant time.
pub fn verify_hmac(secret: &str, data: &[u8], signature: &str) -> bool {
    let Ok(expected) = base64::decode(signature) else {
        trace!("HMAC signature is not valid base64");
        return false;
    };
    match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mut mac) => {
            mac.update(data);
            mac.verify_slice(&expected).is_ok()
        },
        Err(_) => false,
    }
}
