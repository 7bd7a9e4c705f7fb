//! Copy-on-write table and write transactions.
//!
//! The committed table sits behind an `Arc`. Readers clone the `Arc` and
//! iterate a snapshot that no writer can touch. A writer takes the single
//! writer lock and stages its changes against the table it started from.
//! Commit applies them in place when no snapshot is outstanding, and to a
//! copy otherwise, so a commit of `k` changes costs `O(k log n)` unless a
//! reader still holds an older view.
//! Dropping a [`WriteTxn`] without committing discards every staged change.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use faucet_ledger_core::{FundRequest, LedgerSummary, RequestId, Timestamp};
use tokio::sync::MutexGuard;

use crate::error::{Result, StoreError};

/// Fund requests indexed by id, with a secondary creation-time index.
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    by_id: BTreeMap<RequestId, FundRequest>,
    by_created: BTreeSet<(Timestamp, RequestId)>,
}

impl Table {
    fn put(&mut self, request: FundRequest) {
        if let Some(old) = self.by_id.remove(request.id()) {
            self.by_created.remove(&(old.created_at(), old.id().clone()));
        }
        self.by_created
            .insert((request.created_at(), request.id().clone()));
        self.by_id.insert(request.id().clone(), request);
    }

    fn remove(&mut self, id: &RequestId) -> Option<FundRequest> {
        let old = self.by_id.remove(id)?;
        self.by_created.remove(&(old.created_at(), old.id().clone()));
        Some(old)
    }

    pub(crate) fn get(&self, id: &RequestId) -> Option<&FundRequest> {
        self.by_id.get(id)
    }

    /// Records in id order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &FundRequest> {
        self.by_id.values()
    }

    /// Ids of records created strictly before `cutoff` (Unix seconds),
    /// oldest first.
    pub(crate) fn created_before(&self, cutoff: i64) -> impl Iterator<Item = &RequestId> {
        self.by_created
            .iter()
            .take_while(move |(created, _)| created.as_secs() < cutoff)
            .map(|(_, id)| id)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }
}

/// A read-only view of committed data.
#[derive(Debug, Clone)]
pub struct Snapshot {
    table: Arc<Table>,
}

impl Snapshot {
    pub fn get(&self, id: &RequestId) -> Option<&FundRequest> {
        self.table.get(id)
    }

    /// Records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &FundRequest> {
        self.table.iter()
    }

    pub fn summary(&self) -> LedgerSummary {
        self.table.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }
}

/// The committed table plus the lock that serializes writers.
#[derive(Debug, Default)]
pub(crate) struct Committed {
    table: RwLock<Arc<Table>>,
    writer: tokio::sync::Mutex<()>,
}

impl Committed {
    pub(crate) fn snapshot(&self) -> Result<Snapshot> {
        let table = self.table.read().map_err(|_| StoreError::poisoned())?;
        Ok(Snapshot {
            table: Arc::clone(&table),
        })
    }

    /// Open a write transaction, waiting for any other writer to finish.
    pub(crate) async fn begin(&self) -> Result<WriteTxn<'_>> {
        let guard = self.writer.lock().await;
        let base = self.snapshot()?.table;
        Ok(WriteTxn {
            _writer: guard,
            committed: &self.table,
            base,
            staged: BTreeMap::new(),
        })
    }
}

/// A staged change to one record: `Some` writes it, `None` deletes it.
type Staged = BTreeMap<RequestId, Option<FundRequest>>;

/// A write transaction.
///
/// Holds the writer lock for its whole lifetime, so the table it started from
/// is also the committed table when it commits.
pub(crate) struct WriteTxn<'a> {
    _writer: MutexGuard<'a, ()>,
    committed: &'a RwLock<Arc<Table>>,
    base: Arc<Table>,
    staged: Staged,
}

impl<'a> WriteTxn<'a> {
    /// The table as it was when the transaction opened, in id order.
    ///
    /// Staged changes are not visible here; lifecycle operations scan first
    /// and write afterwards.
    pub(crate) fn base(&self) -> &Table {
        &self.base
    }

    /// Current value of a record, including staged changes.
    pub(crate) fn get(&self, id: &RequestId) -> Option<&FundRequest> {
        match self.staged.get(id) {
            Some(staged) => staged.as_ref(),
            None => self.base.get(id),
        }
    }

    /// Add a record that must not exist yet.
    pub(crate) fn insert(&mut self, request: FundRequest) -> Result<()> {
        if self.get(request.id()).is_some() {
            return Err(StoreError::DuplicateKey(request.id().clone()));
        }
        self.staged.insert(request.id().clone(), Some(request));
        Ok(())
    }

    /// Swap a stored record for a new value with the same id.
    pub(crate) fn replace(&mut self, request: FundRequest) -> Result<()> {
        if self.get(request.id()).is_none() {
            return Err(StoreError::Internal(format!(
                "replace of missing request {}",
                request.id()
            )));
        }
        self.staged.insert(request.id().clone(), Some(request));
        Ok(())
    }

    /// Delete a record. Returns whether it existed.
    pub(crate) fn delete(&mut self, id: &RequestId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.staged.insert(id.clone(), None);
        true
    }

    /// Publish every staged change at once.
    ///
    /// Returns the number of records written or deleted.
    pub(crate) fn commit(self) -> Result<usize> {
        let WriteTxn {
            _writer,
            committed,
            base,
            staged,
        } = self;
        let changes = staged.len();
        if changes == 0 {
            return Ok(0);
        }

        // Our own reference would force `make_mut` to copy.
        drop(base);
        let mut committed = committed.write().map_err(|_| StoreError::poisoned())?;
        let table = Arc::make_mut(&mut *committed);
        for (id, change) in staged {
            match change {
                Some(request) => table.put(request),
                None => {
                    table.remove(&id);
                }
            }
        }
        Ok(changes)
    }

    /// Discard every staged change.
    pub(crate) fn abort(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use faucet_ledger_core::{Address, TxId};

    fn request(id: &str, created: i64) -> FundRequest {
        FundRequest::new(
            RequestId::new(id).unwrap(),
            Timestamp::from_secs(created).unwrap(),
            Address::new("0x0334995e2CFc53CF785C554839F6e845A3A09e79").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let committed = Committed::default();

        let mut txn = committed.begin().await.unwrap();
        txn.insert(request("b", 20)).unwrap();
        txn.insert(request("a", 10)).unwrap();
        assert_eq!(txn.commit().unwrap(), 2);

        let snapshot = committed.snapshot().unwrap();
        let ids: Vec<&str> = snapshot.iter().map(|r| r.id().as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_abort_discards_changes() {
        let committed = Committed::default();

        let mut txn = committed.begin().await.unwrap();
        txn.insert(request("a", 10)).unwrap();
        txn.abort();

        assert!(committed.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_discards_changes() {
        let committed = Committed::default();
        {
            let mut txn = committed.begin().await.unwrap();
            txn.insert(request("a", 10)).unwrap();
        }
        assert!(committed.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated_from_later_commits() {
        let committed = Committed::default();
        let mut txn = committed.begin().await.unwrap();
        txn.insert(request("a", 10)).unwrap();
        txn.commit().unwrap();

        let before = committed.snapshot().unwrap();

        let mut txn = committed.begin().await.unwrap();
        assert!(txn.delete(&RequestId::new("a").unwrap()));
        txn.insert(request("b", 10)).unwrap();
        txn.commit().unwrap();

        assert_eq!(before.len(), 1);
        assert!(before.get(&RequestId::new("a").unwrap()).is_some());

        let after = committed.snapshot().unwrap();
        assert_eq!(after.len(), 1);
        assert!(after.get(&RequestId::new("b").unwrap()).is_some());
    }

    fn table_ptr(committed: &Committed) -> *const Table {
        Arc::as_ptr(&*committed.table.read().unwrap())
    }

    #[tokio::test]
    async fn test_commit_updates_unshared_table_in_place() {
        let committed = Committed::default();
        let mut txn = committed.begin().await.unwrap();
        for i in 0..1_000 {
            txn.insert(request(&format!("r{i:04}"), i)).unwrap();
        }
        txn.commit().unwrap();
        let table = table_ptr(&committed);

        for i in 1_000..1_200 {
            let mut txn = committed.begin().await.unwrap();
            txn.insert(request(&format!("r{i:04}"), i)).unwrap();
            assert_eq!(txn.commit().unwrap(), 1);
            assert_eq!(table_ptr(&committed), table);
        }
        assert_eq!(committed.snapshot().unwrap().len(), 1_200);
    }

    #[tokio::test]
    async fn test_commit_copies_while_a_snapshot_is_held() {
        let committed = Committed::default();
        let mut txn = committed.begin().await.unwrap();
        txn.insert(request("a", 10)).unwrap();
        txn.commit().unwrap();

        let held = committed.snapshot().unwrap();
        let mut txn = committed.begin().await.unwrap();
        txn.insert(request("b", 20)).unwrap();
        txn.commit().unwrap();

        assert_ne!(table_ptr(&committed), Arc::as_ptr(&held.table));
        assert_eq!(held.len(), 1);
        drop(held);

        // With the old view gone, commits are in place again.
        let table = table_ptr(&committed);
        let mut txn = committed.begin().await.unwrap();
        assert!(txn.delete(&RequestId::new("a").unwrap()));
        txn.commit().unwrap();
        assert_eq!(table_ptr(&committed), table);
        assert_eq!(committed.snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_within_txn() {
        let committed = Committed::default();
        let mut txn = committed.begin().await.unwrap();
        txn.insert(request("a", 10)).unwrap();

        let err = txn.insert(request("a", 11)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_replace_keeps_created_index_consistent() {
        let committed = Committed::default();
        let mut txn = committed.begin().await.unwrap();
        txn.insert(request("a", 10)).unwrap();
        txn.insert(request("b", 30)).unwrap();
        txn.commit().unwrap();

        let mut txn = committed.begin().await.unwrap();
        let sent = request("a", 10).dispatched(TxId::new("tx-a").unwrap());
        txn.replace(sent).unwrap();
        txn.commit().unwrap();

        let mut txn = committed.begin().await.unwrap();
        let old: Vec<RequestId> = txn.base().created_before(20).cloned().collect();
        assert_eq!(old, vec![RequestId::new("a").unwrap()]);
        assert!(txn.get(&old[0]).unwrap().is_in_flight());
        assert!(txn.delete(&old[0]));
        assert!(!txn.delete(&old[0]));
    }

    #[tokio::test]
    async fn test_replace_missing_is_internal_error() {
        let committed = Committed::default();
        let mut txn = committed.begin().await.unwrap();
        let err = txn.replace(request("ghost", 1)).unwrap_err();
        assert!(matches!(err, StoreError::Internal(_)));
    }
}
