use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use super::storage_traits::{LedgerStore, UnitOfWork};
use crate::errors::{Error, Result};
use crate::holdings::{Holding, HoldingError, HoldingStore};
use crate::transactions::{
    PageRequest, TransactionError, TransactionPage, TransactionRecord, TransactionStore,
};
use crate::users::{User, UserStore};

type HoldingKey = (String, String);

#[derive(Debug, Default, Clone)]
struct MemoryState {
    users: HashMap<String, User>,
    holdings: HashMap<HoldingKey, Holding>,
    transactions: Vec<TransactionRecord>,
}

/// Reference in-memory backend implementing all three store contracts plus
/// the unit-of-work seam. Used by the test suite and by embedders that do not
/// need durable storage; version checks and idempotency-key uniqueness behave
/// exactly as a relational store with the equivalent constraints would.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user; user management itself is outside the core.
    pub fn put_user(&self, user: User) -> Result<()> {
        let mut state = write_lock(&self.state)?;
        state.users.insert(user.id.clone(), user);
        Ok(())
    }
}

fn read_lock(state: &Arc<RwLock<MemoryState>>) -> Result<std::sync::RwLockReadGuard<'_, MemoryState>> {
    state
        .read()
        .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
}

fn write_lock(
    state: &Arc<RwLock<MemoryState>>,
) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>> {
    state
        .write()
        .map_err(|_| Error::Storage("memory store lock poisoned".to_string()))
}

fn holding_key(holding: &Holding) -> HoldingKey {
    (holding.user_id.clone(), holding.asset_id.clone())
}

/// Version-checked upsert against a state map. The caller's `version` must
/// match the stored row (0 asserts no row); the stored copy gets version + 1.
fn apply_save_holding(state: &mut MemoryState, holding: &Holding) -> Result<Holding> {
    let key = holding_key(holding);
    let stored_version = state.holdings.get(&key).map(|h| h.version);
    match stored_version {
        None if holding.version == 0 => {
            let mut stored = holding.clone();
            stored.version = 1;
            state.holdings.insert(key, stored.clone());
            Ok(stored)
        }
        None => Err(HoldingError::VersionConflict(format!(
            "holding {}/{} no longer exists (caller at version {})",
            holding.user_id, holding.asset_id, holding.version
        ))
        .into()),
        Some(current) if current == holding.version => {
            let mut stored = holding.clone();
            stored.version += 1;
            state.holdings.insert(key, stored.clone());
            Ok(stored)
        }
        Some(current) => Err(HoldingError::VersionConflict(format!(
            "holding {}/{} is at version {}, caller read version {}",
            holding.user_id, holding.asset_id, current, holding.version
        ))
        .into()),
    }
}

fn apply_delete_holding(state: &mut MemoryState, holding: &Holding) -> Result<()> {
    let key = holding_key(holding);
    match state.holdings.get(&key) {
        None => Err(HoldingError::NotFound(format!(
            "holding {}/{} not found",
            holding.user_id, holding.asset_id
        ))
        .into()),
        Some(current) if current.version == holding.version => {
            state.holdings.remove(&key);
            Ok(())
        }
        Some(current) => Err(HoldingError::VersionConflict(format!(
            "holding {}/{} is at version {}, caller read version {}",
            holding.user_id, holding.asset_id, current.version, holding.version
        ))
        .into()),
    }
}

/// Uniqueness-checked append; (user_id, idempotency_key) may appear once.
fn apply_save_transaction(
    state: &mut MemoryState,
    record: &TransactionRecord,
) -> Result<TransactionRecord> {
    let duplicate = state.transactions.iter().any(|t| {
        t.user_id == record.user_id && t.idempotency_key == record.idempotency_key
    });
    if duplicate {
        return Err(TransactionError::AlreadyRecorded(record.idempotency_key.clone()).into());
    }
    state.transactions.push(record.clone());
    Ok(record.clone())
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(read_lock(&self.state)?.users.get(user_id).cloned())
    }
}

#[async_trait]
impl HoldingStore for MemoryStore {
    async fn find_holding(&self, user_id: &str, asset_id: &str) -> Result<Option<Holding>> {
        let key = (user_id.to_string(), asset_id.to_string());
        Ok(read_lock(&self.state)?.holdings.get(&key).cloned())
    }

    async fn find_holdings_for_user(&self, user_id: &str) -> Result<Vec<Holding>> {
        let state = read_lock(&self.state)?;
        let mut holdings: Vec<Holding> = state
            .holdings
            .values()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect();
        holdings.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        Ok(holdings)
    }

    async fn save_holding(&self, holding: &Holding) -> Result<Holding> {
        let mut state = write_lock(&self.state)?;
        apply_save_holding(&mut state, holding)
    }

    async fn delete_holding(&self, holding: &Holding) -> Result<()> {
        let mut state = write_lock(&self.state)?;
        apply_delete_holding(&mut state, holding)
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_transaction(
        &self,
        user_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<TransactionRecord>> {
        let state = read_lock(&self.state)?;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.user_id == user_id && t.idempotency_key == idempotency_key)
            .cloned())
    }

    async fn save_transaction(&self, record: &TransactionRecord) -> Result<TransactionRecord> {
        let mut state = write_lock(&self.state)?;
        apply_save_transaction(&mut state, record)
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        page: &PageRequest,
    ) -> Result<TransactionPage> {
        let state = read_lock(&self.state)?;
        let records: Vec<TransactionRecord> = state
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        Ok(TransactionPage::paginate(records, page))
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    fn holdings(&self) -> &dyn HoldingStore {
        self
    }

    fn transactions(&self) -> &dyn TransactionStore {
        self
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(MemoryUnitOfWork {
            state: Arc::clone(&self.state),
            staged: Mutex::new(Vec::new()),
        }))
    }
}

#[derive(Debug, Clone)]
enum StagedOp {
    /// `holding` already carries its post-save version; `expected_version` is
    /// what the live row must still be at when the unit commits.
    SaveHolding {
        expected_version: i64,
        holding: Holding,
    },
    DeleteHolding {
        expected_version: i64,
        user_id: String,
        asset_id: String,
    },
    SaveTransaction(TransactionRecord),
}

/// Staged writes against the shared state. Reads see the unit's own staged
/// writes layered over the live store; commit revalidates every version and
/// uniqueness precondition under the write lock and applies all-or-nothing.
pub struct MemoryUnitOfWork {
    state: Arc<RwLock<MemoryState>>,
    staged: Mutex<Vec<StagedOp>>,
}

impl MemoryUnitOfWork {
    fn staged_ops(&self) -> Result<Vec<StagedOp>> {
        Ok(self
            .staged
            .lock()
            .map_err(|_| Error::Storage("unit of work lock poisoned".to_string()))?
            .clone())
    }

    fn stage(&self, op: StagedOp) -> Result<()> {
        self.staged
            .lock()
            .map_err(|_| Error::Storage("unit of work lock poisoned".to_string()))?
            .push(op);
        Ok(())
    }

    /// Live row overlaid with this unit's staged writes.
    fn overlay_find_holding(&self, user_id: &str, asset_id: &str) -> Result<Option<Holding>> {
        for op in self.staged_ops()?.iter().rev() {
            match op {
                StagedOp::SaveHolding { holding, .. }
                    if holding.user_id == user_id && holding.asset_id == asset_id =>
                {
                    return Ok(Some(holding.clone()));
                }
                StagedOp::DeleteHolding {
                    user_id: staged_user,
                    asset_id: staged_asset,
                    ..
                } if staged_user == user_id && staged_asset == asset_id => {
                    return Ok(None);
                }
                _ => {}
            }
        }
        let key = (user_id.to_string(), asset_id.to_string());
        Ok(read_lock(&self.state)?.holdings.get(&key).cloned())
    }
}

#[async_trait]
impl HoldingStore for MemoryUnitOfWork {
    async fn find_holding(&self, user_id: &str, asset_id: &str) -> Result<Option<Holding>> {
        self.overlay_find_holding(user_id, asset_id)
    }

    async fn find_holdings_for_user(&self, user_id: &str) -> Result<Vec<Holding>> {
        let mut by_key: HashMap<HoldingKey, Holding> = read_lock(&self.state)?
            .holdings
            .iter()
            .filter(|(_, h)| h.user_id == user_id)
            .map(|(k, h)| (k.clone(), h.clone()))
            .collect();
        for op in self.staged_ops()? {
            match op {
                StagedOp::SaveHolding { holding, .. } if holding.user_id == user_id => {
                    by_key.insert(holding_key(&holding), holding);
                }
                StagedOp::DeleteHolding {
                    user_id: staged_user,
                    asset_id,
                    ..
                } if staged_user == user_id => {
                    by_key.remove(&(staged_user, asset_id));
                }
                _ => {}
            }
        }
        let mut holdings: Vec<Holding> = by_key.into_values().collect();
        holdings.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        Ok(holdings)
    }

    async fn save_holding(&self, holding: &Holding) -> Result<Holding> {
        let current = self.overlay_find_holding(&holding.user_id, &holding.asset_id)?;
        let stored = match current {
            None if holding.version == 0 => {
                let mut stored = holding.clone();
                stored.version = 1;
                stored
            }
            None => {
                return Err(HoldingError::VersionConflict(format!(
                    "holding {}/{} no longer exists (caller at version {})",
                    holding.user_id, holding.asset_id, holding.version
                ))
                .into())
            }
            Some(existing) if existing.version == holding.version => {
                let mut stored = holding.clone();
                stored.version += 1;
                stored
            }
            Some(existing) => {
                return Err(HoldingError::VersionConflict(format!(
                    "holding {}/{} is at version {}, caller read version {}",
                    holding.user_id, holding.asset_id, existing.version, holding.version
                ))
                .into())
            }
        };
        self.stage(StagedOp::SaveHolding {
            expected_version: holding.version,
            holding: stored.clone(),
        })?;
        Ok(stored)
    }

    async fn delete_holding(&self, holding: &Holding) -> Result<()> {
        match self.overlay_find_holding(&holding.user_id, &holding.asset_id)? {
            None => Err(HoldingError::NotFound(format!(
                "holding {}/{} not found",
                holding.user_id, holding.asset_id
            ))
            .into()),
            Some(existing) if existing.version == holding.version => {
                self.stage(StagedOp::DeleteHolding {
                    expected_version: holding.version,
                    user_id: holding.user_id.clone(),
                    asset_id: holding.asset_id.clone(),
                })
            }
            Some(existing) => Err(HoldingError::VersionConflict(format!(
                "holding {}/{} is at version {}, caller read version {}",
                holding.user_id, holding.asset_id, existing.version, holding.version
            ))
            .into()),
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryUnitOfWork {
    async fn find_transaction(
        &self,
        user_id: &str,
        idempotency_key: &str,
    ) -> Result<Option<TransactionRecord>> {
        for op in self.staged_ops()?.iter().rev() {
            if let StagedOp::SaveTransaction(record) = op {
                if record.user_id == user_id && record.idempotency_key == idempotency_key {
                    return Ok(Some(record.clone()));
                }
            }
        }
        let state = read_lock(&self.state)?;
        Ok(state
            .transactions
            .iter()
            .find(|t| t.user_id == user_id && t.idempotency_key == idempotency_key)
            .cloned())
    }

    async fn save_transaction(&self, record: &TransactionRecord) -> Result<TransactionRecord> {
        if self
            .find_transaction(&record.user_id, &record.idempotency_key)
            .await?
            .is_some()
        {
            return Err(TransactionError::AlreadyRecorded(record.idempotency_key.clone()).into());
        }
        self.stage(StagedOp::SaveTransaction(record.clone()))?;
        Ok(record.clone())
    }

    async fn list_transactions(
        &self,
        user_id: &str,
        page: &PageRequest,
    ) -> Result<TransactionPage> {
        let mut records: Vec<TransactionRecord> = read_lock(&self.state)?
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        for op in self.staged_ops()? {
            if let StagedOp::SaveTransaction(record) = op {
                if record.user_id == user_id {
                    records.push(record);
                }
            }
        }
        Ok(TransactionPage::paginate(records, page))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn holdings(&self) -> &dyn HoldingStore {
        self
    }

    fn transactions(&self) -> &dyn TransactionStore {
        self
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let ops = self.staged_ops()?;
        let mut guard = write_lock(&self.state)?;
        // Apply to a copy so a late precondition failure publishes nothing.
        let mut next = guard.clone();
        for op in ops {
            match op {
                StagedOp::SaveHolding {
                    expected_version,
                    mut holding,
                } => {
                    holding.version = expected_version;
                    apply_save_holding(&mut next, &holding)?;
                }
                StagedOp::DeleteHolding {
                    expected_version,
                    user_id,
                    asset_id,
                } => {
                    let key = (user_id.clone(), asset_id.clone());
                    let mut probe = match next.holdings.get(&key) {
                        Some(current) => current.clone(),
                        None => {
                            return Err(HoldingError::VersionConflict(format!(
                                "holding {}/{} vanished before commit",
                                user_id, asset_id
                            ))
                            .into())
                        }
                    };
                    probe.version = expected_version;
                    apply_delete_holding(&mut next, &probe)?;
                }
                StagedOp::SaveTransaction(record) => {
                    apply_save_transaction(&mut next, &record)?;
                }
            }
        }
        *guard = next;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.staged
            .lock()
            .map_err(|_| Error::Storage("unit of work lock poisoned".to_string()))?
            .clear();
        Ok(())
    }
}
