//! Solana keypairs on top of ed25519-dalek

use crate::types::{Pubkey, Signature};
use ed25519_dalek::{Signer, SigningKey, SECRET_KEY_LENGTH};

/// Length of a Solana secret key: 32-byte seed followed by the 32-byte public key
pub const KEYPAIR_LENGTH: usize = 64;

/// Why a secret key was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeypairError {
    #[error("secret key must be {KEYPAIR_LENGTH} bytes, got {0}")]
    WrongLength(usize),
    #[error("secret key does not derive its embedded public key")]
    PublicKeyMismatch,
}

/// An ed25519 keypair in Solana's layout
#[derive(Clone)]
pub struct WalletKeypair {
    signing_key: SigningKey,
}

impl WalletKeypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    /// Rebuild a keypair from the 64-byte secret key array
    pub fn from_secret_key(bytes: &[u8]) -> Result<Self, KeypairError> {
        let bytes: &[u8; KEYPAIR_LENGTH] = bytes
            .try_into()
            .map_err(|_| KeypairError::WrongLength(bytes.len()))?;

        let mut seed = [0u8; SECRET_KEY_LENGTH];
        seed.copy_from_slice(&bytes[..SECRET_KEY_LENGTH]);
        let signing_key = SigningKey::from_bytes(&seed);

        if signing_key.verifying_key().as_bytes()[..] != bytes[SECRET_KEY_LENGTH..] {
            return Err(KeypairError::PublicKeyMismatch);
        }

        Ok(Self { signing_key })
    }

    pub fn pubkey(&self) -> Pubkey {
        Pubkey(self.signing_key.verifying_key().to_bytes())
    }

    /// The 64-byte secret key array as stored in wallet records
    pub fn secret_key_bytes(&self) -> [u8; KEYPAIR_LENGTH] {
        self.signing_key.to_keypair_bytes()
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for WalletKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret half
        f.debug_struct("WalletKeypair").field("pubkey", &self.pubkey()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Verifier, VerifyingKey};

    #[test]
    fn test_generate_and_restore() {
        let keypair = WalletKeypair::generate();
        let secret = keypair.secret_key_bytes();
        assert_eq!(secret.len(), 64);
        assert_eq!(&secret[32..], keypair.pubkey().as_bytes());

        let restored = WalletKeypair::from_secret_key(&secret).unwrap();
        assert_eq!(restored.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = WalletKeypair::from_secret_key(&[1u8; 32]).unwrap_err();
        assert_eq!(err, KeypairError::WrongLength(32));
    }

    #[test]
    fn test_tampered_public_half_rejected() {
        let mut secret = WalletKeypair::generate().secret_key_bytes();
        secret[63] ^= 0xff;
        let err = WalletKeypair::from_secret_key(&secret).unwrap_err();
        assert_eq!(err, KeypairError::PublicKeyMismatch);
    }

    #[test]
    fn test_signature_verifies() {
        let keypair = WalletKeypair::generate();
        let sig = keypair.sign(b"hello");

        let verifying = VerifyingKey::from_bytes(keypair.pubkey().as_bytes()).unwrap();
        let sig = ed25519_dalek::Signature::from_bytes(&sig.to_bytes());
        assert!(verifying.verify(b"hello", &sig).is_ok());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = WalletKeypair::generate();
        let printed = format!("{:?}", keypair);
        assert!(printed.contains(&keypair.pubkey().to_string()));
        assert!(!printed.contains("signing_key"));
    }
}
