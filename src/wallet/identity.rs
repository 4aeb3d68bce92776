use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub const IDENTITY_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentityType {
    #[serde(rename = "X509")]
    X509,
}

/// PEM encoded private key, wiped from memory on drop
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct PrivateKeyPem(String);

impl PrivateKeyPem {
    pub fn new(pem: impl Into<String>) -> Self {
        PrivateKeyPem(pem.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKeyPem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKeyPem(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub certificate: String,
    pub private_key: PrivateKeyPem,
}

/// X.509 identity as stored in a wallet
///
/// Serialized in the Fabric wallet layout:
/// `{"type":"X509","mspId":..,"credentials":{"certificate":..,"privateKey":..},"version":1}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct X509Identity {
    #[serde(rename = "type")]
    pub kind: IdentityType,
    pub version: u32,
    pub msp_id: String,
    pub credentials: Credentials,
}

impl X509Identity {
    pub fn new(
        msp_id: impl Into<String>,
        certificate: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        X509Identity {
            kind: IdentityType::X509,
            version: IDENTITY_VERSION,
            msp_id: msp_id.into(),
            credentials: Credentials {
                certificate: certificate.into(),
                private_key: PrivateKeyPem::new(private_key),
            },
        }
    }
}
