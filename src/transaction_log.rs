// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The mutual-credit-rs authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Append-only, thread-safe transaction trail.
//!
//! Combines a [`DashMap`] for O(1) lookup by entry id with a per-account
//! index for statement reads. Entry ids are allocated monotonically, so
//! global append order is the id order. Entries are only ever appended in
//! pairs, one per side of a balance mutation.

use crate::base::{AccountId, TransactionId};
use crate::transaction::TransactionEntry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Draft of one leg of a paired append; the log assigns the entry id.
#[derive(Debug)]
pub(crate) struct EntryDraft {
    pub(crate) account_id: AccountId,
    pub(crate) currency_id: crate::base::CurrencyId,
    pub(crate) amount: rust_decimal::Decimal,
    pub(crate) kind: crate::transaction::EntryKind,
    pub(crate) description: String,
    pub(crate) created_at: chrono::DateTime<chrono::Utc>,
}

/// Append-only transaction trail with monotonic id allocation.
#[derive(Debug, Default)]
pub struct TransactionLog {
    /// Entries indexed by id for O(1) audit lookup.
    entries: DashMap<TransactionId, Arc<TransactionEntry>>,
    /// Statement index: entries tagged to each account, in append order.
    by_account: DashMap<AccountId, Vec<Arc<TransactionEntry>>>,
    /// Next entry id.
    next_id: AtomicU64,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the two legs of one balance mutation.
    ///
    /// Callers hold both account row locks while this runs, so the pair
    /// lands in the trail before either balance becomes observable with
    /// the mutation applied but unlogged. The append itself cannot fail:
    /// the atomic unit has passed every check by the time it logs.
    pub(crate) fn append_pair(
        &self,
        first: EntryDraft,
        second: EntryDraft,
    ) -> (TransactionId, TransactionId) {
        (self.append(first), self.append(second))
    }

    fn append(&self, draft: EntryDraft) -> TransactionId {
        let id = TransactionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let entry = Arc::new(TransactionEntry {
            id,
            account_id: draft.account_id,
            currency_id: draft.currency_id,
            amount: draft.amount,
            kind: draft.kind,
            description: draft.description,
            status: crate::transaction::EntryStatus::Completed,
            created_at: draft.created_at,
        });

        let previous = self.entries.insert(id, Arc::clone(&entry));
        // Ids are allocator-unique; a collision means the store is corrupt.
        debug_assert!(previous.is_none(), "duplicate transaction id {id}");
        self.by_account
            .entry(draft.account_id)
            .or_default()
            .push(entry);
        id
    }

    /// Looks up a single entry by id.
    pub fn get(&self, id: TransactionId) -> Option<Arc<TransactionEntry>> {
        self.entries.get(&id).map(|entry| Arc::clone(&entry))
    }

    /// All entries tagged to an account, in append order.
    pub fn for_account(&self, account_id: AccountId) -> Vec<Arc<TransactionEntry>> {
        self.by_account
            .get(&account_id)
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Total number of entries in the trail.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::CurrencyId;
    use crate::transaction::EntryKind;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn draft(account: u32, counterparty: u32, outbound: bool) -> EntryDraft {
        EntryDraft {
            account_id: AccountId(account),
            currency_id: CurrencyId(1),
            amount: dec!(5.00),
            kind: if outbound {
                EntryKind::TransferTo {
                    counterparty: AccountId(counterparty),
                }
            } else {
                EntryKind::ReceivedFrom {
                    counterparty: AccountId(counterparty),
                }
            },
            description: "test".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn append_pair_writes_exactly_two_entries() {
        let log = TransactionLog::new();
        let (out_id, in_id) = log.append_pair(draft(1, 2, true), draft(2, 1, false));

        assert_eq!(log.len(), 2);
        assert_ne!(out_id, in_id);
        assert_eq!(log.for_account(AccountId(1)).len(), 1);
        assert_eq!(log.for_account(AccountId(2)).len(), 1);
    }

    #[test]
    fn entry_ids_are_monotonic() {
        let log = TransactionLog::new();
        let (a, b) = log.append_pair(draft(1, 2, true), draft(2, 1, false));
        let (c, d) = log.append_pair(draft(1, 2, true), draft(2, 1, false));
        assert!(a < b && b < c && c < d);
    }

    #[test]
    fn statement_index_preserves_append_order() {
        // Global order is recoverable from the monotonic ids; the
        // per-account index must agree with it.
        let log = TransactionLog::new();
        for _ in 0..5 {
            log.append_pair(draft(1, 2, true), draft(2, 1, false));
        }

        let statement = log.for_account(AccountId(1));
        assert_eq!(statement.len(), 5);
        for pair in statement.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    #[test]
    fn lookup_by_id_returns_the_entry() {
        let log = TransactionLog::new();
        let (out_id, _) = log.append_pair(draft(1, 2, true), draft(2, 1, false));
        let entry = log.get(out_id).unwrap();
        assert_eq!(entry.account_id, AccountId(1));
        assert_eq!(entry.signed_amount(), dec!(-5.00));
    }

    #[test]
    fn unknown_account_has_empty_statement() {
        let log = TransactionLog::new();
        assert!(log.for_account(AccountId(99)).is_empty());
        assert!(log.is_empty());
    }
}
