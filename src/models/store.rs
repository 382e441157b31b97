use serde::{Deserialize, Serialize};

use crate::models::contract::{Contract, ContractStatus};

/// Current schema version
pub const CURRENT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug)]
pub struct Store {
    pub version: u32,
    pub contracts: Vec<Contract>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            contracts: vec![],
        }
    }
}

/// Number of contracts per status
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub draft: usize,
    pub sent_for_signing: usize,
    pub signed: usize,
}

impl Store {
    pub fn add_contract(&mut self, contract: Contract) {
        self.contracts.push(contract);
    }

    /// Most recently created first. Contracts created in the same instant keep
    /// the later insertion first.
    pub fn contracts_newest_first(&self) -> Vec<&Contract> {
        let mut contracts: Vec<&Contract> = self.contracts.iter().rev().collect();
        contracts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        contracts
    }

    pub fn contracts_with_status(&self, status: ContractStatus) -> Vec<&Contract> {
        self.contracts_newest_first()
            .into_iter()
            .filter(|c| c.status == status)
            .collect()
    }

    /// Lookup by human identifier, ignoring case
    pub fn get_contract(&self, contract_id: &str) -> Option<&Contract> {
        self.contracts
            .iter()
            .find(|c| c.contract_id.eq_ignore_ascii_case(contract_id))
    }

    pub fn get_contract_mut(&mut self, contract_id: &str) -> Option<&mut Contract> {
        self.contracts
            .iter_mut()
            .find(|c| c.contract_id.eq_ignore_ascii_case(contract_id))
    }

    pub fn contains_contract_id(&self, contract_id: &str) -> bool {
        self.get_contract(contract_id).is_some()
    }

    pub fn remove_contract(&mut self, contract_id: &str) -> Option<Contract> {
        let index = self
            .contracts
            .iter()
            .position(|c| c.contract_id.eq_ignore_ascii_case(contract_id))?;
        Some(self.contracts.remove(index))
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.contracts
            .iter()
            .fold(StatusCounts::default(), |mut counts, contract| {
                match contract.status {
                    ContractStatus::Draft => counts.draft += 1,
                    ContractStatus::SentForSigning => counts.sent_for_signing += 1,
                    ContractStatus::Signed => counts.signed += 1,
                }
                counts
            })
    }
}
