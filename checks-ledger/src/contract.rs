use log::info;

use checks_core::config::LedgerConfig;
use checks_core::error::LedgerError;
use checks_core::events::{EventLog, EventRecord};
use checks_core::id::Identity;
use checks_core::record::{TokenId, TokenRecord};
use checks_core::roles::Role;

use crate::access_control::AccessControl;
use crate::issuance::IssuanceLedger;

/// One deployed Checks contract.
///
/// Owns its role state, its token records and the event stream written on
/// every successful mutation. Mutations take `&mut self`, so they are applied
/// one at a time; queries only need `&self`.
///
/// A contract cannot be cloned, so two copies can never hand out the same
/// token identifier:
///
/// ```compile_fail
/// use checks_core::{Identity, LedgerConfig};
/// use checks_ledger::ChecksContract;
///
/// let contract = ChecksContract::deploy(Identity::new([1; 32]), &LedgerConfig::default()).unwrap();
/// let fork = contract.clone();
/// ```
#[derive(Debug)]
pub struct ChecksContract {
    identity: Identity,
    access: AccessControl,
    ledger: IssuanceLedger,
    events: EventLog,
}

impl ChecksContract {
    /// Create a contract at a known identity, with `deployer` as admin and minter
    pub fn new(identity: Identity, deployer: Identity) -> Result<Self, LedgerError> {
        if identity.is_null() {
            return Err(LedgerError::InvalidContract);
        }

        let mut events = EventLog::new();
        let access = AccessControl::initialize(deployer, &mut events)?;

        info!("Checks contract {} deployed by {}", identity, deployer);
        Ok(Self {
            identity,
            access,
            ledger: IssuanceLedger::new(identity),
            events,
        })
    }

    /// Deploy a contract whose identity is derived from the config and the deployer
    pub fn deploy(deployer: Identity, config: &LedgerConfig) -> Result<Self, LedgerError> {
        let (identity, _) = Self::derive_identity(&deployer, config)?;
        Self::new(identity, deployer)
    }

    /// The identity `deploy` would assign, with the bump that produced it
    pub fn derive_identity(
        deployer: &Identity,
        config: &LedgerConfig,
    ) -> Result<(Identity, u8), LedgerError> {
        Identity::derive_contract(&[
            config.contract_seed.as_bytes(),
            deployer.bytes(),
            &config.contract_nonce.to_le_bytes(),
        ])
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn has_role(&self, identity: &Identity, role: Role) -> bool {
        self.access.has_role(identity, role)
    }

    pub fn set_minter(&mut self, caller: &Identity, target: &Identity) -> Result<(), LedgerError> {
        self.access.set_minter(caller, target, &mut self.events)
    }

    pub fn remove_minter(&mut self, caller: &Identity, target: &Identity) -> Result<(), LedgerError> {
        self.access.remove_minter(caller, target, &mut self.events)
    }

    pub fn role_member_count(&self, role: Role) -> usize {
        self.access.role_member_count(role)
    }

    pub fn role_member(&self, role: Role, index: usize) -> Result<Identity, LedgerError> {
        self.access.role_member(role, index)
    }

    pub fn role_members(&self, role: Role) -> Vec<Identity> {
        self.access.role_members(role)
    }

    /// Mint a token to `recipient`, returning its identifier
    pub fn mint(
        &mut self,
        caller: &Identity,
        recipient: &Identity,
        content_reference: &str,
    ) -> Result<TokenId, LedgerError> {
        self.ledger.mint(
            &self.access,
            caller,
            recipient,
            content_reference,
            &mut self.events,
        )
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Identity, LedgerError> {
        self.ledger.owner_of(token_id)
    }

    pub fn content_reference_of(&self, token_id: TokenId) -> Result<&str, LedgerError> {
        self.ledger.content_reference_of(token_id)
    }

    pub fn record(&self, token_id: TokenId) -> Option<&TokenRecord> {
        self.ledger.record(token_id)
    }

    pub fn balance_of(&self, owner: &Identity) -> Result<u64, LedgerError> {
        self.ledger.balance_of(owner)
    }

    pub fn tokens_of(&self, owner: &Identity) -> Vec<TokenId> {
        self.ledger.tokens_of(owner)
    }

    pub fn total_minted(&self) -> u64 {
        self.ledger.total_minted()
    }

    /// Every event emitted so far
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Events at or after `sequence`, for observers resuming from a cursor
    pub fn events_since(&self, sequence: u64) -> &[EventRecord] {
        self.events.since(sequence)
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }
}
