use crate::db::models::{Alert, AlertStatus, Device, DeviceStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Per-incident reconciliation record for an in-flight status change.
///
/// While a record exists the locally displayed status stays pinned to
/// `status`, whatever stale broadcasts or fetch responses arrive in the
/// meantime. The record clears only when a server-confirmed status equals
/// the pinned one, or when the originating request fails and rolls back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingStatus {
    pub status: AlertStatus,
    pub issued_at: DateTime<Utc>,
}

/// User issuing local status changes, recorded on escalations.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub display_name: String,
}

/// Client-side alert list: a disposable, eventually-consistent projection
/// of the store, seeded by a fetch and kept current by broadcast events and
/// local optimistic edits.
#[derive(Debug, Default)]
pub struct AlertCache {
    alerts: Vec<Alert>,
    pending: HashMap<String, PendingStatus>,
}

impl AlertCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    /// Status currently pinned for an incident, if a local change is still
    /// awaiting confirmation.
    pub fn pending_status(&self, id: &str) -> Option<AlertStatus> {
        self.pending.get(id).map(|p| p.status)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Merge a full snapshot fetch. Known records merge under the lock
    /// rules; unknown records are appended in snapshot order.
    pub fn merge_snapshot(&mut self, snapshot: Vec<Alert>) {
        for alert in snapshot {
            self.merge_incoming(alert);
        }
    }

    /// Merge one authoritative record, from a fetch response or broadcast.
    ///
    /// A payload whose status confirms the pin clears it and merges in
    /// full. A payload that disagrees merges every other field but keeps
    /// the displayed status pinned.
    pub fn merge_incoming(&mut self, incoming: Alert) {
        let id = incoming.id.clone();

        let resolved = match self.pending.get(&id) {
            Some(lock) if incoming.status == lock.status => {
                self.pending.remove(&id);
                incoming
            }
            Some(lock) => {
                let mut pinned = incoming;
                pinned.status = lock.status;
                pinned
            }
            None => incoming,
        };

        match self.alerts.iter_mut().find(|a| a.id == id) {
            Some(slot) => *slot = resolved,
            None => self.alerts.push(resolved),
        }
    }

    /// Record a local optimistic status change before the request is sent.
    ///
    /// The cache reflects the new status immediately; on escalation the
    /// acting officer is attached as well. Returns the status displayed
    /// before the change, which the caller passes back to
    /// [`fail_status_change`](Self::fail_status_change) when the request
    /// fails. Re-issuing while pending re-points the lock to the newest
    /// locally issued value.
    pub fn begin_status_change(
        &mut self,
        id: &str,
        status: AlertStatus,
        actor: Option<&Actor>,
    ) -> Option<AlertStatus> {
        let alert = self.alerts.iter_mut().find(|a| a.id == id)?;
        let prior = alert.status;

        alert.status = status;
        if status == AlertStatus::Escalated {
            if let Some(actor) = actor {
                alert.officer = Some(actor.display_name.clone());
                alert.escalated_by = Some(actor.id.clone());
            }
        }

        self.pending.insert(
            id.to_string(),
            PendingStatus {
                status,
                issued_at: Utc::now(),
            },
        );

        Some(prior)
    }

    /// Merge the mutation response for a locally issued change. Identical
    /// to any other authoritative merge: the lock clears only if the
    /// response confirms it.
    pub fn complete_status_change(&mut self, response: Alert) {
        self.merge_incoming(response);
    }

    /// Roll back a failed local change and release its lock.
    ///
    /// Only the change that still owns the lock may roll back; if a newer
    /// local change re-pointed the lock since, the failure of the older
    /// request changes nothing.
    pub fn fail_status_change(&mut self, id: &str, attempted: AlertStatus, prior: AlertStatus) {
        match self.pending.get(id) {
            Some(lock) if lock.status == attempted => {
                self.pending.remove(id);
                if let Some(alert) = self.alerts.iter_mut().find(|a| a.id == id) {
                    alert.status = prior;
                }
            }
            _ => {}
        }
    }

    /// Apply a `new-alert` broadcast: fresh alerts go to the front.
    pub fn apply_new_alert(&mut self, alert: Alert) {
        if self.alerts.iter().any(|a| a.id == alert.id) {
            self.merge_incoming(alert);
        } else {
            self.alerts.insert(0, alert);
        }
    }

    /// Apply an `update-alert` broadcast.
    pub fn apply_update(&mut self, alert: Alert) {
        self.merge_incoming(alert);
    }
}

/// Reconciliation record for an in-flight device toggle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingToggle {
    pub target: DeviceStatus,
    pub prior: DeviceStatus,
    pub issued_at: DateTime<Utc>,
}

/// Client-side device list, following the same reconciliation policy as
/// [`AlertCache`] for the single toggled field: pin while an update is in
/// flight, roll back when it fails.
#[derive(Debug, Default)]
pub struct DeviceCache {
    devices: Vec<Device>,
    pending: HashMap<String, PendingToggle>,
}

impl DeviceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn get(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Merge a full snapshot fetch.
    pub fn merge_snapshot(&mut self, snapshot: Vec<Device>) {
        for device in snapshot {
            self.merge_incoming(device);
        }
    }

    /// Flip a device's status optimistically and return the target value to
    /// submit. Returns `None` for an unknown device.
    pub fn begin_toggle(&mut self, id: &str) -> Option<DeviceStatus> {
        let device = self.devices.iter_mut().find(|d| d.id == id)?;
        let prior = device.status;
        let target = prior.toggled();
        device.status = target;

        self.pending.insert(
            id.to_string(),
            PendingToggle {
                target,
                prior,
                issued_at: Utc::now(),
            },
        );

        Some(target)
    }

    /// Merge the update response for a locally issued toggle.
    pub fn complete_toggle(&mut self, response: Device) {
        self.merge_incoming(response);
    }

    /// Roll the device back to its pre-toggle status after a failed update
    /// request.
    pub fn fail_toggle(&mut self, id: &str) {
        if let Some(lock) = self.pending.remove(id) {
            if let Some(device) = self.devices.iter_mut().find(|d| d.id == id) {
                device.status = lock.prior;
            }
        }
    }

    /// Apply a `device-update` broadcast. Unknown devices are inserted at
    /// the front.
    pub fn apply_update(&mut self, device: Device) {
        self.merge_incoming(device);
    }

    fn merge_incoming(&mut self, incoming: Device) {
        let id = incoming.id.clone();

        let resolved = match self.pending.get(&id) {
            Some(lock) if incoming.status == lock.target => {
                self.pending.remove(&id);
                incoming
            }
            Some(lock) => {
                let mut pinned = incoming;
                pinned.status = lock.target;
                pinned
            }
            None => incoming,
        };

        match self.devices.iter_mut().find(|d| d.id == id) {
            Some(slot) => *slot = resolved,
            None => self.devices.insert(0, resolved),
        }
    }
}
