//! The server's long-lived challenge-signing keypair.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{AuthError, AuthResult};

/// Ed25519 keypair used to sign challenge envelopes.
///
/// The private key never leaves this type. Seed material handed in from
/// configuration is zeroized after the key is derived.
pub struct ServerKeypair {
    signing_key: SigningKey,
    key_id: String,
}

impl ServerKeypair {
    /// Generate an ephemeral keypair.
    ///
    /// Sessions signed by an ephemeral key do not survive a restart; load a
    /// configured seed for production use.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);

        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        let key_id = Self::derive_key_id(&signing_key.verifying_key());
        Self {
            signing_key,
            key_id,
        }
    }

    /// Load the keypair from a hex-encoded 32-byte seed.
    pub fn from_seed_hex(seed_hex: &str) -> AuthResult<Self> {
        let mut decoded = hex::decode(seed_hex)
            .map_err(|_| AuthError::Validation("signing key seed is not valid hex".to_string()))?;
        if decoded.len() != 32 {
            decoded.zeroize();
            return Err(AuthError::Validation(format!(
                "signing key seed must be 32 bytes, got {}",
                decoded.len()
            )));
        }

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&decoded);
        decoded.zeroize();

        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();

        let key_id = Self::derive_key_id(&signing_key.verifying_key());
        Ok(Self {
            signing_key,
            key_id,
        })
    }

    /// Stable identifier for the public key, for logs and diagnostics.
    fn derive_key_id(verifying_key: &VerifyingKey) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(verifying_key.as_bytes());
        let hash = hasher.finalize();
        hex::encode(&hash.as_bytes()[..16])
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}
