//! Application Configuration

use std::time::Duration;

/// Lifecycle engine configuration
#[derive(Debug, Clone)]
pub struct BiddingConfig {
    /// How far ahead of closingDate participants are reminded
    pub closing_reminder_lead: Duration,
    /// Read notifications older than this are purged
    pub notification_retention: Duration,
    /// Scheduler tick
    pub sweep_interval: Duration,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            closing_reminder_lead: Duration::from_secs(24 * 3600),
            notification_retention: Duration::from_secs(30 * 24 * 3600),
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl BiddingConfig {
    /// Development defaults: fast sweeps, short reminder lead
    pub fn development() -> Self {
        Self {
            closing_reminder_lead: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(30),
            ..Default::default()
        }
    }

    pub fn reminder_lead(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.closing_reminder_lead).unwrap_or(chrono::Duration::hours(24))
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.notification_retention).unwrap_or(chrono::Duration::days(30))
    }
}
