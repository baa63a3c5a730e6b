use serde::{Deserialize, Serialize};

/// A permission an identity carries within its MSP. Fabric itself
/// treats roles as free-form strings in the NodeOUs config; this
/// client only needs the common ones for local decisions (e.g. which
/// identities may sign a channel-config update).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Member,
    Admin,
    Client,
    Peer,
    Orderer,
}

/// The enrollment material a user carries: an X.509 certificate and
/// the private key it was issued against.
#[derive(Clone)]
pub struct Enrollment {
    pub cert_pem: String,
    pub key: fabric_crypto::KeyPair,
}

/// A user identity, immutable once bound into a [`crate::SigningContext`].
#[derive(Clone)]
pub struct Identity {
    pub name: String,
    pub msp_id: String,
    pub enrollment: Enrollment,
    pub roles: Vec<Role>,
    pub affiliation: String,
    pub account: String,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        msp_id: impl Into<String>,
        enrollment: Enrollment,
    ) -> Self {
        Self {
            name: name.into(),
            msp_id: msp_id.into(),
            enrollment,
            roles: Vec::new(),
            affiliation: String::new(),
            account: String::new(),
        }
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }
}
