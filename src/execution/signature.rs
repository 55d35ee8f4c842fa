//! Single-key ed25519 signing for Stellar transactions

use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use std::fmt;
use stellar_xdr::curr::{
    DecoratedSignature, Hash, Limits, Signature, SignatureHint, Transaction,
    TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction, WriteXdr,
};

use crate::error::{AppResult, ValidationError};
use crate::ledger::models::encode_public_key;

/// Holder of a signing secret. Held in memory for the run, never persisted.
pub struct Keypair {
    signing: SigningKey,
    public_id: String,
}

impl Keypair {
    /// Parse an `S...` secret seed
    pub fn from_secret(secret: &str) -> Result<Self, ValidationError> {
        let seed = stellar_strkey::ed25519::PrivateKey::from_string(secret.trim())
            .map_err(|_| ValidationError::InvalidSecretKey)?;
        Ok(Self::from_seed(seed.0))
    }

    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing = SigningKey::from_bytes(&seed);
        let public_id = encode_public_key(&signing.verifying_key().to_bytes());
        Self { signing, public_id }
    }

    pub fn random() -> Self {
        Self::from_seed(rand::random::<[u8; 32]>())
    }

    pub fn public_key(&self) -> &str {
        &self.public_id
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    pub fn secret_seed(&self) -> String {
        stellar_strkey::ed25519::PrivateKey(self.signing.to_bytes()).to_string()
    }

    /// Last four bytes of the public key, as the network expects
    pub fn hint(&self) -> SignatureHint {
        let public = self.public_key_bytes();
        let mut hint = [0u8; 4];
        hint.copy_from_slice(&public[28..]);
        SignatureHint(hint)
    }

    pub fn sign_hash(&self, payload_hash: &[u8; 32]) -> AppResult<DecoratedSignature> {
        let signature = self.signing.sign(payload_hash);
        Ok(DecoratedSignature {
            hint: self.hint(),
            signature: Signature(signature.to_bytes().to_vec().try_into()?),
        })
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public_id", &self.public_id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Network id: sha256 of the network passphrase
pub fn network_id(passphrase: &str) -> Hash {
    Hash(Sha256::digest(passphrase.as_bytes()).into())
}

/// Hash that gets signed, which is also the transaction's id on the network
pub fn transaction_hash(tx: &Transaction, network_id: &Hash) -> AppResult<[u8; 32]> {
    let payload = TransactionSignaturePayload {
        network_id: network_id.clone(),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload.to_xdr(Limits::none())?;
    Ok(Sha256::digest(&bytes).into())
}
