use std::collections::{BTreeMap, HashMap};

use log::{info, warn};

use checks_core::error::LedgerError;
use checks_core::events::{EventSink, LedgerEvent};
use checks_core::id::Identity;
use checks_core::record::{TokenId, TokenRecord};
use checks_core::roles::Role;

use crate::access_control::RoleAuthority;

/// Append-only store of minted token records.
///
/// Identifiers are handed out densely from 0; the next identifier always
/// equals the number of records minted so far. Only a `ChecksContract` builds
/// and mints into one, so the minter check always runs against its own roles.
#[derive(Debug)]
pub struct IssuanceLedger {
    /// Identity of the contract that owns this ledger; never a valid recipient
    contract: Identity,

    records: BTreeMap<TokenId, TokenRecord>,

    /// Number of tokens held per owner
    balances: HashMap<Identity, u64>,

    next_token_id: TokenId,
}

impl IssuanceLedger {
    pub(crate) fn new(contract: Identity) -> Self {
        Self {
            contract,
            records: BTreeMap::new(),
            balances: HashMap::new(),
            next_token_id: 0,
        }
    }

    pub fn contract_identity(&self) -> &Identity {
        &self.contract
    }

    /// Mint a new token record for `recipient`
    ///
    /// Every check runs before anything is written, so a failed mint leaves
    /// no trace. The first failing check decides the error.
    ///
    /// # Errors
    /// * `CallerNotMinter` - `caller` does not hold Minter
    /// * `InvalidRecipient` - `recipient` is the null identity
    /// * `MintToContract` - `recipient` is the contract itself
    /// * `EmptyUri` - `content_reference` is empty
    /// * `CounterOverflow` - no identifier is left to allocate
    pub(crate) fn mint(
        &mut self,
        authority: &impl RoleAuthority,
        caller: &Identity,
        recipient: &Identity,
        content_reference: &str,
        events: &mut impl EventSink,
    ) -> Result<TokenId, LedgerError> {
        let next = match self.check_mint(authority, caller, recipient, content_reference) {
            Ok(next) => next,
            Err(err) => {
                warn!("mint by {} rejected: {}", caller, err);
                return Err(err);
            }
        };

        let token_id = self.next_token_id;
        self.records.insert(
            token_id,
            TokenRecord::new(token_id, *recipient, content_reference.to_string()),
        );
        *self.balances.entry(*recipient).or_insert(0) += 1;
        self.next_token_id = next;

        info!("Token {} minted to {} by {}", token_id, recipient, caller);
        events.emit(LedgerEvent::Transfer {
            from: Identity::NULL,
            to: *recipient,
            token_id,
        });

        Ok(token_id)
    }

    /// Validate a mint and return the counter value that follows it
    fn check_mint(
        &self,
        authority: &impl RoleAuthority,
        caller: &Identity,
        recipient: &Identity,
        content_reference: &str,
    ) -> Result<TokenId, LedgerError> {
        if !authority.has_role(caller, Role::Minter) {
            return Err(LedgerError::CallerNotMinter);
        }
        if recipient.is_null() {
            return Err(LedgerError::InvalidRecipient);
        }
        if *recipient == self.contract {
            return Err(LedgerError::MintToContract);
        }
        if content_reference.is_empty() {
            return Err(LedgerError::EmptyUri);
        }
        self.next_token_id
            .checked_add(1)
            .ok_or(LedgerError::CounterOverflow)
    }

    pub fn owner_of(&self, token_id: TokenId) -> Result<Identity, LedgerError> {
        self.get(token_id).map(|record| *record.owner())
    }

    pub fn content_reference_of(&self, token_id: TokenId) -> Result<&str, LedgerError> {
        self.get(token_id).map(|record| record.content_reference())
    }

    pub fn record(&self, token_id: TokenId) -> Option<&TokenRecord> {
        self.records.get(&token_id)
    }

    fn get(&self, token_id: TokenId) -> Result<&TokenRecord, LedgerError> {
        self.records
            .get(&token_id)
            .ok_or(LedgerError::TokenNotFound(token_id))
    }

    /// Number of tokens owned by `owner`
    pub fn balance_of(&self, owner: &Identity) -> Result<u64, LedgerError> {
        if owner.is_null() {
            return Err(LedgerError::InvalidOwner);
        }
        Ok(self.balances.get(owner).copied().unwrap_or(0))
    }

    /// Identifiers owned by `owner`, ascending
    pub fn tokens_of(&self, owner: &Identity) -> Vec<TokenId> {
        self.records
            .values()
            .filter(|record| record.owner() == owner)
            .map(|record| record.id())
            .collect()
    }

    pub fn total_minted(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn next_token_id(&self) -> TokenId {
        self.next_token_id
    }

    pub fn records(&self) -> impl Iterator<Item = &TokenRecord> {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::AccessControl;
    use checks_core::error::ErrorKind;

    const URI: &str = "ipfs://QmRAQB6YaC91dP37UdDnjFY5vQuiBrcqdyoW1Cu321wxkD4";

    fn account(byte: u8) -> Identity {
        Identity::new([byte; 32])
    }

    struct Fixture {
        access: AccessControl,
        ledger: IssuanceLedger,
        events: Vec<LedgerEvent>,
        minter: Identity,
        contract: Identity,
    }

    fn setup() -> Fixture {
        let admin = account(1);
        let minter = account(2);
        let contract = account(0xcc);
        let mut events: Vec<LedgerEvent> = Vec::new();
        let mut access = AccessControl::initialize(admin, &mut events).unwrap();
        access.set_minter(&admin, &minter, &mut events).unwrap();
        events.clear();

        Fixture {
            access,
            ledger: IssuanceLedger::new(contract),
            events,
            minter,
            contract,
        }
    }

    impl Fixture {
        fn mint(&mut self, caller: Identity, recipient: Identity, uri: &str) -> Result<TokenId, LedgerError> {
            self.ledger
                .mint(&self.access, &caller, &recipient, uri, &mut self.events)
        }

        fn assert_untouched(&self, expected_next: TokenId) {
            assert_eq!(self.ledger.next_token_id(), expected_next);
            assert_eq!(self.ledger.total_minted(), expected_next);
            assert_eq!(self.events.len() as u64, expected_next);
        }
    }

    #[test]
    fn test_minter_mints_token() {
        let mut f = setup();
        let user = account(3);

        let id = f.mint(f.minter, user, URI).unwrap();

        assert_eq!(id, 0);
        assert_eq!(f.ledger.owner_of(0).unwrap(), user);
        assert_eq!(f.ledger.content_reference_of(0).unwrap(), URI);
        assert_eq!(f.ledger.next_token_id(), 1);
        assert_eq!(
            f.events,
            vec![LedgerEvent::Transfer {
                from: Identity::NULL,
                to: user,
                token_id: 0
            }]
        );
    }

    #[test]
    fn test_identifiers_are_sequential() {
        let mut f = setup();
        let user = account(3);

        let first = f.mint(f.minter, user, "ipfs://first").unwrap();
        let second = f.mint(f.minter, user, "ipfs://second").unwrap();
        let third = f.mint(f.minter, account(4), "ipfs://third").unwrap();

        assert_eq!((first, second, third), (0, 1, 2));
        assert_eq!(f.ledger.content_reference_of(1).unwrap(), "ipfs://second");
        assert_eq!(f.ledger.total_minted(), 3);
    }

    #[test]
    fn test_non_minter_cannot_mint() {
        let mut f = setup();

        let err = f.mint(account(9), account(3), URI).unwrap_err();

        assert_eq!(err, LedgerError::CallerNotMinter);
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        f.assert_untouched(0);
    }

    #[test]
    fn test_authorization_checked_before_arguments() {
        let mut f = setup();

        // Every argument is invalid, but the missing role wins
        let err = f.mint(account(9), Identity::NULL, "").unwrap_err();
        assert_eq!(err, LedgerError::CallerNotMinter);
    }

    #[test]
    fn test_rejects_null_recipient() {
        let mut f = setup();

        let err = f.mint(f.minter, Identity::NULL, "x").unwrap_err();

        assert_eq!(err.to_string(), "Invalid recipient address");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        f.assert_untouched(0);
        assert!(f.ledger.owner_of(0).is_err());
    }

    #[test]
    fn test_rejects_contract_as_recipient() {
        let mut f = setup();

        let err = f.mint(f.minter, f.contract, URI).unwrap_err();

        assert_eq!(err, LedgerError::MintToContract);
        assert_eq!(err.to_string(), "Cannot mint to the contract itself");
        f.assert_untouched(0);
    }

    #[test]
    fn test_rejects_empty_uri() {
        let mut f = setup();

        let err = f.mint(f.minter, account(3), "").unwrap_err();

        assert_eq!(err, LedgerError::EmptyUri);
        assert_eq!(err.to_string(), "URI cannot be empty");
        f.assert_untouched(0);
    }

    #[test]
    fn test_recipient_checked_before_uri() {
        let mut f = setup();

        assert_eq!(
            f.mint(f.minter, Identity::NULL, ""),
            Err(LedgerError::InvalidRecipient)
        );
        assert_eq!(f.mint(f.minter, f.contract, ""), Err(LedgerError::MintToContract));
    }

    #[test]
    fn test_failed_mint_does_not_consume_identifier() {
        let mut f = setup();
        let user = account(3);

        f.mint(f.minter, user, URI).unwrap();
        assert!(f.mint(f.minter, Identity::NULL, URI).is_err());
        let next = f.mint(f.minter, user, URI).unwrap();

        assert_eq!(next, 1);
    }

    #[test]
    fn test_counter_overflow_is_fatal() {
        let mut f = setup();
        f.ledger.next_token_id = TokenId::MAX;

        let err = f.mint(f.minter, account(3), URI).unwrap_err();

        assert_eq!(err, LedgerError::CounterOverflow);
        assert_eq!(err.kind(), ErrorKind::Fatal);
        assert_eq!(f.ledger.next_token_id(), TokenId::MAX);
        assert_eq!(f.ledger.total_minted(), 0);
        assert!(f.events.is_empty());
    }

    #[test]
    fn test_lookups_on_unknown_token() {
        let f = setup();

        assert_eq!(f.ledger.owner_of(0), Err(LedgerError::TokenNotFound(0)));
        assert_eq!(
            f.ledger.content_reference_of(7).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert!(f.ledger.record(0).is_none());
    }

    #[test]
    fn test_balances_and_tokens_of() {
        let mut f = setup();
        let alice = account(3);
        let bob = account(4);

        f.mint(f.minter, alice, "ipfs://a").unwrap();
        f.mint(f.minter, bob, "ipfs://b").unwrap();
        f.mint(f.minter, alice, "ipfs://c").unwrap();

        assert_eq!(f.ledger.balance_of(&alice).unwrap(), 2);
        assert_eq!(f.ledger.balance_of(&bob).unwrap(), 1);
        assert_eq!(f.ledger.balance_of(&account(5)).unwrap(), 0);
        assert_eq!(f.ledger.balance_of(&Identity::NULL), Err(LedgerError::InvalidOwner));
        assert_eq!(f.ledger.tokens_of(&alice), vec![0, 2]);
        assert_eq!(f.ledger.records().count(), 3);
    }

    #[test]
    fn test_revoked_minter_cannot_mint() {
        let mut f = setup();
        let admin = account(1);
        f.access
            .remove_minter(&admin, &f.minter, &mut f.events)
            .unwrap();
        f.events.clear();

        assert_eq!(f.mint(f.minter, account(3), URI), Err(LedgerError::CallerNotMinter));
    }
}
