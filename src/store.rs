use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{LendingError, Result};
use crate::state::{LoanRecord, LoanSnapshot};
use crate::types::{AccountId, BlockHeight, LoanId};

/// owns every loan record; records are never deleted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanStore {
    next_id: LoanId,
    records: BTreeMap<LoanId, LoanRecord>,
    history: Vec<LoanSnapshot>,
}

impl LoanStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            records: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// identifier the next insert will take; only consumed once a record is stored
    pub fn next_id(&self) -> LoanId {
        self.next_id.max(1)
    }

    pub fn insert(&mut self, record: LoanRecord) -> Result<LoanId> {
        let id = record.id;
        if self.records.contains_key(&id) {
            return Err(LendingError::DuplicateLoanId { loan_id: id });
        }
        self.next_id = self.next_id().max(id + 1);
        self.records.insert(id, record);
        Ok(id)
    }

    pub fn get(&self, id: LoanId) -> Result<&LoanRecord> {
        self.records
            .get(&id)
            .ok_or(LendingError::LoanNotFound { loan_id: id })
    }

    /// apply `mutation` to a copy and swap it in only if it returns `Ok`
    pub fn update<T, F>(&mut self, id: LoanId, mutation: F) -> Result<T>
    where
        F: FnOnce(&mut LoanRecord) -> Result<T>,
    {
        let slot = self
            .records
            .get_mut(&id)
            .ok_or(LendingError::LoanNotFound { loan_id: id })?;

        let mut draft = slot.clone();
        let out = mutation(&mut draft)?;
        debug_assert_eq!(draft.id, id);
        *slot = draft;
        Ok(out)
    }

    /// append the current state of `id` to the audit history
    pub fn audit(&mut self, id: LoanId, height: BlockHeight, trigger: &str) -> Result<()> {
        let snapshot = LoanSnapshot::capture(self.get(id)?, height, trigger);
        self.history.push(snapshot);
        Ok(())
    }

    /// audit trail for one loan, oldest first
    pub fn history(&self, id: LoanId) -> Vec<&LoanSnapshot> {
        self.history.iter().filter(|s| s.loan_id == id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LoanRecord> {
        self.records.values()
    }

    pub fn by_borrower(&self, account: &AccountId) -> impl Iterator<Item = &LoanRecord> + '_ {
        let account = account.clone();
        self.iter().filter(move |r| r.borrower == account)
    }

    pub fn by_lender(&self, account: &AccountId) -> impl Iterator<Item = &LoanRecord> + '_ {
        let account = account.clone();
        self.iter().filter(move |r| r.lender.as_ref() == Some(&account))
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
