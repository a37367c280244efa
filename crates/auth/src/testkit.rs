//! Shared in-memory fixtures for this crate's tests.

use ed25519_dalek::Signer;
use std::sync::{Arc, RwLock};

use crate::assertion::{canonical_digest, IdentityAssertion};
use crate::envelope::{Base64JsonCodec, EnvelopeCodec};
use capstream_core::time::unix_now;
use capstream_domain::{
    Investor, InvestorDirectory, InvestorId, InvestorUpdate, KeyKind, NewInvestor, StoreError,
    StoreResult,
};

/// Minimal in-memory investor directory.
pub(crate) struct MemoryDirectory {
    investors: RwLock<Vec<Investor>>,
}

impl MemoryDirectory {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            investors: RwLock::new(Vec::new()),
        })
    }

    pub fn with_account_investor(account_key: &str) -> Arc<Self> {
        let directory = Self::empty();
        directory.push(Investor {
            id: InvestorId::generate(),
            assertion_key: None,
            account_key: Some(account_key.to_string()),
            name: Some("Account Investor".to_string()),
            email: Some("account@example.com".to_string()),
            investment_amount: 50_000.0,
            investment_date: "2024-01-15".to_string(),
            created_at: unix_now(),
        });
        directory
    }

    pub fn with_assertion_investor(assertion_key: &str) -> Arc<Self> {
        let directory = Self::empty();
        directory.push(Investor {
            id: InvestorId::generate(),
            assertion_key: Some(assertion_key.to_string()),
            account_key: None,
            name: Some("Assertion Investor".to_string()),
            email: Some("assertion@example.com".to_string()),
            investment_amount: 75_000.0,
            investment_date: "2024-02-01".to_string(),
            created_at: unix_now(),
        });
        directory
    }

    pub fn push(&self, investor: Investor) {
        self.investors.write().unwrap().push(investor);
    }

    pub fn first_investor(&self) -> Investor {
        self.investors.read().unwrap()[0].clone()
    }

    pub fn rename_first(&self, name: &str) {
        self.investors.write().unwrap()[0].name = Some(name.to_string());
    }

    pub fn clear(&self) {
        self.investors.write().unwrap().clear();
    }
}

impl InvestorDirectory for MemoryDirectory {
    fn investor_by_key(&self, kind: KeyKind, key: &str) -> StoreResult<Option<Investor>> {
        let investors = self.investors.read().unwrap();
        Ok(investors
            .iter()
            .find(|investor| match kind {
                KeyKind::Assertion => investor.assertion_key.as_deref() == Some(key),
                KeyKind::Account => investor.account_key.as_deref() == Some(key),
            })
            .cloned())
    }

    fn investor_by_id(&self, id: &InvestorId) -> StoreResult<Option<Investor>> {
        let investors = self.investors.read().unwrap();
        Ok(investors.iter().find(|investor| &investor.id == id).cloned())
    }

    fn list_investors(&self) -> StoreResult<Vec<Investor>> {
        Ok(self.investors.read().unwrap().clone())
    }

    fn create_investor(&self, investor: NewInvestor) -> StoreResult<Investor> {
        investor.validate().map_err(StoreError::Validation)?;
        let record = Investor {
            id: InvestorId::generate(),
            assertion_key: investor.assertion_key,
            account_key: investor.account_key,
            name: investor.name,
            email: investor.email,
            investment_amount: investor.investment_amount,
            investment_date: investor.investment_date,
            created_at: unix_now(),
        };
        self.push(record.clone());
        Ok(record)
    }

    fn update_investor(&self, id: &InvestorId, update: InvestorUpdate) -> StoreResult<Investor> {
        let mut investors = self.investors.write().unwrap();
        let investor = investors
            .iter_mut()
            .find(|investor| &investor.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("investor {id}")))?;
        if let Some(name) = update.name {
            investor.name = Some(name);
        }
        if let Some(email) = update.email {
            investor.email = Some(email);
        }
        if let Some(amount) = update.investment_amount {
            investor.investment_amount = amount;
        }
        if let Some(date) = update.investment_date {
            investor.investment_date = date;
        }
        Ok(investor.clone())
    }
}

/// Client-side ed25519 keypair for the challenge protocol.
pub(crate) fn client_keypair(seed: [u8; 32]) -> (ed25519_dalek::SigningKey, String) {
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
    let public_hex = hex::encode(signing_key.verifying_key().to_bytes());
    (signing_key, public_hex)
}

/// Client-side secp256k1 keypair for the assertion protocol.
pub(crate) fn assertion_keypair(seed: [u8; 32]) -> (k256::schnorr::SigningKey, String) {
    let signing_key = k256::schnorr::SigningKey::from_bytes(&seed).unwrap();
    let public_hex = hex::encode(signing_key.verifying_key().to_bytes());
    (signing_key, public_hex)
}

/// Counter-sign an encoded challenge envelope with the client's account key.
pub(crate) fn counter_sign(encoded: &str, client_key: &ed25519_dalek::SigningKey) -> String {
    let codec = Base64JsonCodec;
    let mut envelope = codec.decode(encoded).unwrap();
    let bytes = envelope.signing_bytes().unwrap();
    envelope.subject_signature = Some(hex::encode(client_key.sign(&bytes).to_bytes()));
    codec.encode(&envelope).unwrap()
}

/// Produce a fully signed identity assertion for the given key.
pub(crate) fn signed_assertion_for(
    signing_key: &k256::schnorr::SigningKey,
    created_at: u64,
    kind: u32,
) -> IdentityAssertion {
    let pubkey = hex::encode(signing_key.verifying_key().to_bytes());
    let tags = vec![vec!["u".to_string(), "https://portal.test/login".to_string()]];
    let content = String::new();

    let digest = canonical_digest(&pubkey, created_at, kind, &tags, &content).unwrap();
    let signature = signing_key.sign_raw(&digest, &[0u8; 32]).unwrap();

    IdentityAssertion {
        id: hex::encode(digest),
        pubkey,
        created_at,
        kind,
        tags,
        content,
        sig: hex::encode(signature.to_bytes()),
    }
}
