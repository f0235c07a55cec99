use crate::record::TokenId;
use crate::roles::Role;
use thiserror::Error;

/// Broad category of a ledger failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks the required role
    Unauthorized,
    /// Structurally invalid input
    InvalidArgument,
    /// Query against something that does not exist
    NotFound,
    /// Internal invariant violation
    Fatal,
}

/// Represents all possible errors returned by ledger operations.
///
/// The display strings are stable and are part of the public contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Caller is not an admin")]
    CallerNotAdmin,

    #[error("Caller is not a minter")]
    CallerNotMinter,

    #[error("Invalid minter address")]
    InvalidMinter,

    #[error("Invalid recipient address")]
    InvalidRecipient,

    #[error("Cannot mint to the contract itself")]
    MintToContract,

    #[error("URI cannot be empty")]
    EmptyUri,

    #[error("Invalid owner address")]
    InvalidOwner,

    #[error("Invalid deployer address")]
    InvalidDeployer,

    #[error("Invalid contract address")]
    InvalidContract,

    /// Identity could not be parsed or derived
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Token {0} does not exist")]
    TokenNotFound(TokenId),

    #[error("No {role} member at index {index}")]
    RoleMemberNotFound { role: Role, index: usize },

    /// The identifier counter cannot advance any further
    #[error("Token identifier counter overflow")]
    CounterOverflow,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::CallerNotAdmin | LedgerError::CallerNotMinter => ErrorKind::Unauthorized,
            LedgerError::InvalidMinter
            | LedgerError::InvalidRecipient
            | LedgerError::MintToContract
            | LedgerError::EmptyUri
            | LedgerError::InvalidOwner
            | LedgerError::InvalidDeployer
            | LedgerError::InvalidContract
            | LedgerError::InvalidIdentity(_) => ErrorKind::InvalidArgument,
            LedgerError::TokenNotFound(_) | LedgerError::RoleMemberNotFound { .. } => {
                ErrorKind::NotFound
            }
            LedgerError::CounterOverflow => ErrorKind::Fatal,
        }
    }

    /// Everything except a fatal invariant violation can be retried with corrected input
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Fatal
    }
}
