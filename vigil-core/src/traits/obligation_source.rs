use crate::errors::VigilResult;
use crate::models::MonitoredObligation;

/// Read-only provider of monitored obligations, queried once per cycle.
pub trait ObligationSource: Send + Sync {
    fn list_obligations(&self) -> VigilResult<Vec<MonitoredObligation>>;
}
