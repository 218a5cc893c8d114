//! Authentication and authorization at the gateway boundary.
//!
//! The gate runs before any backend is contacted: [`Authenticator`]
//! establishes who the caller is, [`Authorizer`] decides whether that
//! identity may touch the resolved route, and a deny at either step is
//! answered immediately with 401/403 — no backend sees a byte. Both
//! sides are trait objects so deployments can plug in their own
//! decision logic; the in-tree implementations cover anonymous access
//! and config-driven HTTP Basic credentials.

use axum::http::{header, HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};

/// Established caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
}

/// What a request is trying to do, for authorization purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Write,
}

impl Action {
    #[must_use]
    pub fn from_method(method: &Method) -> Self {
        match *method {
            Method::GET | Method::HEAD | Method::OPTIONS => Self::Read,
            _ => Self::Write,
        }
    }
}

/// The route-level resource an identity is authorized against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub prefix: String,
    pub action: Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    Unauthenticated,
    Forbidden,
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"querygate\"")],
            )
                .into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AccessDenied>;
}

pub trait Authorizer: Send + Sync {
    fn authorize(&self, identity: &Identity, resource: &Resource) -> bool;
}

/// Run both halves of the gate. Must be called before the first byte
/// is forwarded.
pub fn enforce(
    authenticator: &dyn Authenticator,
    authorizer: &dyn Authorizer,
    headers: &HeaderMap,
    resource: &Resource,
) -> Result<Identity, AccessDenied> {
    let identity = authenticator.authenticate(headers)?;
    if authorizer.authorize(&identity, resource) {
        Ok(identity)
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Accepts every request as the anonymous identity. Used when no
/// credentials are configured.
pub struct AnonymousAuthenticator;

impl Authenticator for AnonymousAuthenticator {
    fn authenticate(&self, _headers: &HeaderMap) -> Result<Identity, AccessDenied> {
        Ok(Identity {
            name: "anonymous".into(),
        })
    }
}

/// HTTP Basic credentials from the gateway config (RFC 7617).
pub struct BasicAuthenticator {
    username: String,
    password: String,
}

impl BasicAuthenticator {
    #[must_use]
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl Authenticator for BasicAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AccessDenied> {
        let header_str = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AccessDenied::Unauthenticated)?;

        let encoded = header_str
            .strip_prefix("Basic ")
            .ok_or(AccessDenied::Unauthenticated)?;

        let decoded = base64_decode(encoded).ok_or(AccessDenied::Unauthenticated)?;

        let (user, pass) = decoded.split_once(':').ok_or(AccessDenied::Unauthenticated)?;

        if user == self.username && pass == self.password {
            Ok(Identity {
                name: user.to_string(),
            })
        } else {
            Err(AccessDenied::Unauthenticated)
        }
    }
}

/// Grants every identity access to every resource.
pub struct AllowAllAuthorizer;

impl Authorizer for AllowAllAuthorizer {
    fn authorize(&self, _identity: &Identity, _resource: &Resource) -> bool {
        true
    }
}

/// Minimal base64 decoder for Basic auth (RFC 7617).
/// Avoids pulling in the `base64` crate for a single use.
fn base64_decode(input: &str) -> Option<String> {
    const TABLE: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let input = input.trim_end_matches('=');
    let mut buf: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(input.len() * 3 / 4);

    for byte in input.bytes() {
        let val = TABLE.iter().position(|&b| b == byte)? as u32;
        buf = (buf << 6) | val;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push((buf >> bits) as u8);
            buf &= (1 << bits) - 1;
        }
    }

    String::from_utf8(out).ok()
}
