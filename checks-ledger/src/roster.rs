use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use checks_core::error::LedgerError;
use checks_core::id::Identity;
use checks_core::roles::Role;

use crate::contract::ChecksContract;

/// Desired state of a minter in an off-ledger roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinterStatus {
    /// Should hold the minter role
    Active,
    /// Should not hold the minter role
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinterEntry {
    pub identity: Identity,
    pub status: MinterStatus,
}

impl MinterEntry {
    pub fn active(identity: Identity) -> Self {
        Self {
            identity,
            status: MinterStatus::Active,
        }
    }

    pub fn archived(identity: Identity) -> Self {
        Self {
            identity,
            status: MinterStatus::Archived,
        }
    }
}

/// Outcome of reconciling a roster against the contract
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub granted: Vec<Identity>,
    pub revoked: Vec<Identity>,
    /// Entries whose role already matched their status
    pub unchanged: usize,
    pub failed: Vec<(Identity, LedgerError)>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn changes(&self) -> usize {
        self.granted.len() + self.revoked.len()
    }
}

/// Current minters of `contract`, all marked active
pub fn snapshot_minters(contract: &ChecksContract) -> Vec<MinterEntry> {
    contract
        .role_members(Role::Minter)
        .into_iter()
        .map(MinterEntry::active)
        .collect()
}

/// Bring the minter role on `contract` in line with `entries`, acting as `admin`.
///
/// A failing entry is recorded in the report and does not stop the rest.
pub fn sync_minters(
    contract: &mut ChecksContract,
    admin: &Identity,
    entries: &[MinterEntry],
) -> SyncReport {
    let mut report = SyncReport::default();

    for entry in entries {
        let has_role = contract.has_role(&entry.identity, Role::Minter);
        let result = match (entry.status, has_role) {
            (MinterStatus::Active, false) => contract
                .set_minter(admin, &entry.identity)
                .map(|()| report.granted.push(entry.identity)),
            (MinterStatus::Archived, true) => contract
                .remove_minter(admin, &entry.identity)
                .map(|()| report.revoked.push(entry.identity)),
            _ => {
                debug!("{} already {:?}", entry.identity, entry.status);
                report.unchanged += 1;
                Ok(())
            }
        };

        if let Err(err) = result {
            warn!("Failed to sync minter {}: {}", entry.identity, err);
            report.failed.push((entry.identity, err));
        }
    }

    info!(
        "Minter sync finished: {} granted, {} revoked, {} unchanged, {} failed",
        report.granted.len(),
        report.revoked.len(),
        report.unchanged,
        report.failed.len()
    );
    report
}
