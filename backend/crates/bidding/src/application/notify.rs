//! Fire-and-forget notification dispatch

use crate::domain::entity::Notification;
use crate::domain::repository::Notifier;

/// Delivery failures are logged, never returned
pub(crate) async fn dispatch<N: Notifier>(notifier: &N, notification: Notification) {
    let kind = notification.kind.code();
    if let Err(e) = notifier.notify(notification).await {
        tracing::warn!(error = %e, kind, "Notification dropped");
    }
}
