use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted clock skew between the sender's timestamp and ours.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Generate the HMAC-SHA256 webhook signature.
///
/// The signed payload is `"{timestamp}.{body}"`, hex-encoded.
pub fn sign_payload(secret: &str, timestamp: i64, body: &str) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;

    mac.update(format!("{}.{}", timestamp, body).as_bytes());
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Build a signature header value of the form `t=<unix>&s=<hex>`.
pub fn signature_header(secret: &str, timestamp: i64, body: &str) -> Result<String, anyhow::Error> {
    let sig = sign_payload(secret, timestamp, body)?;
    Ok(format!("t={}&s={}", timestamp, sig))
}

/// Parse a `t=<unix>&s=<hex>` header into its timestamp and signature parts.
pub fn parse_signature_header(header: &str) -> Result<(i64, String), anyhow::Error> {
    let mut timestamp = None;
    let mut signature = None;

    for part in header.split('&') {
        match part.split_once('=') {
            Some(("t", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("s", v)) => signature = Some(v.to_string()),
            _ => {}
        }
    }

    match (timestamp, signature) {
        (Some(t), Some(s)) => Ok((t, s)),
        _ => Err(anyhow::anyhow!("Malformed signature header")),
    }
}

/// Verify a `t=<unix>&s=<hex>` signature header against the raw body.
///
/// Rejects timestamps further than `tolerance_secs` from `now` before doing
/// the constant-time signature comparison.
pub fn verify_signature_header(
    secret: &str,
    header: &str,
    body: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<bool, anyhow::Error> {
    let (timestamp, signature) = parse_signature_header(header)?;

    if (now - timestamp).abs() > tolerance_secs {
        return Ok(false);
    }

    let expected = sign_payload(secret, timestamp, body)?;

    let expected_bytes = expected.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(signature_bytes).into())
}
