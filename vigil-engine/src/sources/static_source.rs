use std::sync::RwLock;

use vigil_core::errors::VigilResult;
use vigil_core::models::MonitoredObligation;
use vigil_core::traits::ObligationSource;

/// In-memory obligation list. Edits are visible from the next cycle.
#[derive(Debug, Default)]
pub struct StaticObligationSource {
    obligations: RwLock<Vec<MonitoredObligation>>,
}

impl StaticObligationSource {
    pub fn new(obligations: impl IntoIterator<Item = MonitoredObligation>) -> Self {
        Self {
            obligations: RwLock::new(obligations.into_iter().collect()),
        }
    }

    /// Replace the whole list.
    pub fn set(&self, obligations: impl IntoIterator<Item = MonitoredObligation>) {
        *self.write() = obligations.into_iter().collect();
    }

    /// Insert, or replace the entry with the same id and type.
    pub fn upsert(&self, obligation: MonitoredObligation) {
        let mut list = self.write();
        match list
            .iter_mut()
            .find(|o| o.id == obligation.id && o.obligation_type == obligation.obligation_type)
        {
            Some(existing) => *existing = obligation,
            None => list.push(obligation),
        }
    }

    /// Returns true if an obligation with this id was present.
    pub fn remove(&self, obligation_id: &str) -> bool {
        let mut list = self.write();
        let before = list.len();
        list.retain(|o| o.id != obligation_id);
        list.len() != before
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<MonitoredObligation>> {
        self.obligations.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl ObligationSource for StaticObligationSource {
    fn list_obligations(&self) -> VigilResult<Vec<MonitoredObligation>> {
        let list = self.obligations.read().unwrap_or_else(|p| p.into_inner());
        Ok(list.clone())
    }
}
