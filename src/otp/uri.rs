//! `otpauth://` URI parsing and generation, per the Google Authenticator
//! key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Parsing covers what QR codes for this vault can actually hold: TOTP,
//! SHA-1, 6 digits, 30-second period. URIs asking for anything else are
//! rejected up front; accepting them and then deriving codes under the
//! default parameters would silently produce codes no service accepts.

use crate::error::{Result, VaultError};

/// Account fields extracted from an `otpauth://totp/` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAccount {
    pub name: String,
    pub issuer: Option<String>,
    /// Base32 secret text exactly as carried in the URI (not yet decoded).
    pub secret: String,
}

/// Parse an `otpauth://totp/...` URI.
///
/// The label may be bare (`alice@example.com`) or issuer-prefixed
/// (`GitHub:alice@example.com`); an `issuer` query parameter wins over the
/// label prefix.
pub fn parse(uri: &str) -> Result<ParsedAccount> {
    let url = url::Url::parse(uri.trim())
        .map_err(|e| VaultError::InvalidSecretFormat(format!("invalid otpauth URI: {}", e)))?;

    if url.scheme() != "otpauth" {
        return Err(VaultError::InvalidSecretFormat(format!(
            "expected an otpauth:// URI, got scheme '{}'",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some("totp") => {}
        Some("hotp") => {
            return Err(VaultError::InvalidSecretFormat(
                "counter-based (hotp) URIs are not supported".into(),
            ))
        }
        other => {
            return Err(VaultError::InvalidSecretFormat(format!(
                "unknown otpauth type: {:?}",
                other
            )))
        }
    }

    // Path is "/LABEL" or "/ISSUER:LABEL", percent-encoded
    let label = percent_decode(url.path().trim_start_matches('/'));
    let (label_issuer, name) = match label.split_once(':') {
        Some((issuer, account)) => (
            Some(issuer.trim().to_string()),
            account.trim().to_string(),
        ),
        None => (None, label.trim().to_string()),
    };

    let mut secret = None;
    let mut param_issuer = None;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.to_string()),
            "issuer" => param_issuer = Some(value.to_string()),
            "algorithm" => {
                if !value.eq_ignore_ascii_case("SHA1") {
                    return Err(VaultError::InvalidSecretFormat(format!(
                        "unsupported algorithm '{}'",
                        value
                    )));
                }
            }
            "digits" => {
                if value != "6" {
                    return Err(VaultError::InvalidSecretFormat(format!(
                        "unsupported digit count '{}'",
                        value
                    )));
                }
            }
            "period" => {
                if value != "30" {
                    return Err(VaultError::InvalidSecretFormat(format!(
                        "unsupported period '{}'",
                        value
                    )));
                }
            }
            _ => {} // ignore unknown params
        }
    }

    let secret = secret.ok_or_else(|| {
        VaultError::InvalidSecretFormat("otpauth URI has no 'secret' parameter".into())
    })?;

    if name.is_empty() {
        return Err(VaultError::InvalidSecretFormat(
            "otpauth URI has an empty account label".into(),
        ));
    }

    let issuer = param_issuer.or(label_issuer).filter(|s| !s.is_empty());

    Ok(ParsedAccount {
        name,
        issuer,
        secret,
    })
}

/// Build a manual-entry URI for an account, suitable for re-import into
/// any authenticator.
pub fn build(name: &str, issuer: Option<&str>, secret_b32: &str) -> String {
    let label = match issuer {
        Some(iss) if !iss.is_empty() => {
            format!("{}:{}", percent_encode(iss), percent_encode(name))
        }
        _ => percent_encode(name),
    };

    match issuer {
        Some(iss) if !iss.is_empty() => format!(
            "otpauth://totp/{}?secret={}&issuer={}",
            label,
            secret_b32,
            percent_encode(iss)
        ),
        _ => format!("otpauth://totp/{}?secret={}", label, secret_b32),
    }
}

fn percent_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn percent_decode(s: &str) -> String {
    let mut out = Vec::with_capacity(s.len());
    let mut bytes = s.bytes();
    while let Some(b) = bytes.next() {
        if b == b'%' {
            let hi = bytes.next();
            let lo = bytes.next();
            match (hi, lo) {
                (Some(h), Some(l)) => {
                    let hex = [h, l];
                    match u8::from_str_radix(std::str::from_utf8(&hex).unwrap_or("!"), 16) {
                        Ok(decoded) => out.push(decoded),
                        Err(_) => {
                            out.push(b'%');
                            out.push(h);
                            out.push(l);
                        }
                    }
                }
                _ => out.push(b'%'),
            }
        } else {
            out.push(b);
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}
