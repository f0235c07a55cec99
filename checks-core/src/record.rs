use crate::id::Identity;
use serde::{Deserialize, Serialize};

/// Sequential token identifier
pub type TokenId = u64;

/// TokenRecord is a minted token: who owns it and what content it points at.
///
/// Records are created once by a mint and never change afterwards, so the
/// fields are only reachable through read accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    id: TokenId,
    owner: Identity,
    content_reference: String,
}

impl TokenRecord {
    pub fn new(id: TokenId, owner: Identity, content_reference: String) -> Self {
        Self {
            id,
            owner,
            content_reference,
        }
    }

    pub fn id(&self) -> TokenId {
        self.id
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// Opaque locator of the externally stored content, e.g. `ipfs://Qm...`
    pub fn content_reference(&self) -> &str {
        &self.content_reference
    }
}
