//! Synthetic client identity and keyed-hash signing.

use md5::{Digest, Md5};
use serde::Serialize;

/// A per-run device identity and its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    id: String,
    signature: String,
}

impl ClientIdentity {
    /// Generate a fresh identity from a random v4 UUID.
    pub fn generate(secret: &str) -> Self {
        let id = uuid::Uuid::new_v4().to_string().to_uppercase();
        Self::from_id(id, secret)
    }

    /// Build an identity for a known device id.
    pub fn from_id(id: impl Into<String>, secret: &str) -> Self {
        let id = id.into();
        let signature = sign(&id, secret);
        Self { id, signature }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Check that the signature still matches the id under `secret`.
    pub fn verify(&self, secret: &str) -> bool {
        self.signature == sign(&self.id, secret)
    }
}

/// MD5 over `id + secret`, lowercase hex.
pub fn sign(id: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(id.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Identity plus challenge token: everything an authenticated call needs.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub identity: ClientIdentity,
    pub challenge_token: String,
}

impl SessionContext {
    pub fn new(identity: ClientIdentity, challenge_token: impl Into<String>) -> Self {
        Self {
            identity,
            challenge_token: challenge_token.into(),
        }
    }

    /// The signed body sent with every POST.
    pub fn signed_body(&self) -> SignedBody<'_> {
        SignedBody {
            king: self.identity.id(),
            hash: self.identity.signature(),
            queen: &self.challenge_token,
        }
    }
}

/// Wire form of [`SessionContext`].
#[derive(Debug, Serialize)]
pub struct SignedBody<'a> {
    pub king: &'a str,
    pub hash: &'a str,
    pub queen: &'a str,
}
