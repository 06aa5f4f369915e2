//! Simulated DNS failover -- the "Hammer" role.
//!
//! The actuator is the only component allowed to move traffic off the
//! primary path. It mutates route health and journals the simulated record
//! change; it never decides anything itself.

use crate::journal::{Journal, LogSeverity, LogSource};

/// Applies the simulated route switch.
#[derive(Debug, Clone)]
pub struct RouteActuator {
    primary_addr: String,
    backup_addr: String,
}

impl RouteActuator {
    pub fn new(primary_addr: impl Into<String>, backup_addr: impl Into<String>) -> Self {
        Self {
            primary_addr: primary_addr.into(),
            backup_addr: backup_addr.into(),
        }
    }

    /// Point traffic at the backup provider. State-idempotent: a second
    /// call leaves route health unchanged but still journals two fresh
    /// audit entries describing the (repeated) record change.
    pub fn execute(&self, route_healthy: &mut bool, journal: &mut Journal) {
        *route_healthy = false;
        journal.append(
            LogSource::Hammer,
            format!(
                "Cloud DNS Record Updated: @ {} -> {} (Backup Provider)",
                self.primary_addr, self.backup_addr
            ),
            LogSeverity::Success,
        );
        journal.append(
            LogSource::Hammer,
            "TTL Flushed. Propagation started.",
            LogSeverity::Info,
        );
    }
}
