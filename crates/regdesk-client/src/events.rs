//! # Change Notifications
//!
//! Every successful mutation made through an
//! [`ObservedStore`](crate::observed::ObservedStore) is published on a
//! [`ChangeBus`] as a [`ChangeEvent`]. Views subscribe with an [`Interest`]
//! (which tables, optionally which company) and reload their data when a
//! matching event arrives.
//!
//! Delivery is best effort. A subscriber that falls behind receives
//! [`Notification::Lagged`] instead of the events it missed and must reload
//! everything it shows.

use std::collections::BTreeSet;
use std::future::Future;

use regdesk_core::{CompanyId, Table};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CAPACITY: usize = 256;

/// Kind of row mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    /// Rows were inserted.
    Insert,
    /// Rows were updated.
    Update,
    /// Rows were deleted.
    Delete,
}

/// A committed change to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    /// Table that changed.
    pub table: Table,
    /// Company the rows belong to, when known. `None` means "any company"
    /// and reaches every subscriber of the table.
    pub company: Option<CompanyId>,
    /// What happened.
    pub op: ChangeOp,
    /// Number of rows affected.
    pub count: usize,
}

/// What a subscriber wants to hear about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interest {
    /// Tables of interest. Empty means every table.
    pub tables: BTreeSet<Table>,
    /// Restrict to one company's rows.
    pub company: Option<CompanyId>,
}

impl Interest {
    /// Every change to every table.
    pub fn all() -> Self {
        Self::default()
    }

    /// Changes to the given tables.
    pub fn tables(tables: impl IntoIterator<Item = Table>) -> Self {
        Self {
            tables: tables.into_iter().collect(),
            company: None,
        }
    }

    /// Narrow to one company.
    pub fn for_company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    /// Whether `event` is relevant to this interest.
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        let table_ok = self.tables.is_empty() || self.tables.contains(&event.table);
        let company_ok = match (self.company, event.company) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        };
        table_ok && company_ok
    }
}

/// What a subscription yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A matching change.
    Change(ChangeEvent),
    /// This many events were dropped; reload everything.
    Lagged(u64),
}

/// Fan-out channel for change events.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChangeBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event. Returns how many subscribers were listening.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        tracing::debug!(
            table = %event.table,
            op = ?event.op,
            count = event.count,
            "change published"
        );
        self.tx.send(event).unwrap_or(0)
    }

    /// Start listening. Events published before this call are not seen.
    pub fn subscribe(&self, interest: Interest) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            interest,
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Run `on_change` for every matching notification until `cancel`
    /// fires or the bus is dropped.
    pub fn watch<F, Fut>(
        &self,
        interest: Interest,
        cancel: CancellationToken,
        mut on_change: F,
    ) -> JoinHandle<()>
    where
        F: FnMut(Notification) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut sub = self.subscribe(interest);
        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    _ = cancel.cancelled() => break,
                    next = sub.recv() => next,
                };
                match next {
                    Some(notification) => on_change(notification).await,
                    None => break,
                }
            }
        })
    }
}

/// A live subscription.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    interest: Interest,
}

impl Subscription {
    /// Next matching notification, or `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Notification> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.interest.matches(&event) => {
                    return Some(Notification::Change(event))
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(missed = n, "change subscriber lagged");
                    return Some(Notification::Lagged(n));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// The interest this subscription filters on.
    pub fn interest(&self) -> &Interest {
        &self.interest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn event(table: Table, company: Option<CompanyId>) -> ChangeEvent {
        ChangeEvent {
            table,
            company,
            op: ChangeOp::Insert,
            count: 1,
        }
    }

    #[test]
    fn interest_filters_by_table_and_company() {
        let acme = CompanyId::new();
        let other = CompanyId::new();
        let interest = Interest::tables([Table::Laws]).for_company(acme);

        assert!(interest.matches(&event(Table::Laws, Some(acme))));
        assert!(interest.matches(&event(Table::Laws, None)));
        assert!(!interest.matches(&event(Table::Laws, Some(other))));
        assert!(!interest.matches(&event(Table::Domains, Some(acme))));
        assert!(Interest::all().matches(&event(Table::Markets, Some(other))));
    }

    #[tokio::test]
    async fn subscription_skips_unrelated_events() {
        let bus = ChangeBus::default();
        let mut sub = bus.subscribe(Interest::tables([Table::ControlFrameworks]));
        bus.publish(event(Table::Laws, None));
        bus.publish(event(Table::ControlFrameworks, None));
        assert_eq!(
            sub.recv().await,
            Some(Notification::Change(event(Table::ControlFrameworks, None)))
        );
    }

    #[tokio::test]
    async fn slow_subscriber_is_told_it_lagged() {
        let bus = ChangeBus::new(2);
        let mut sub = bus.subscribe(Interest::all());
        for _ in 0..5 {
            bus.publish(event(Table::Companies, None));
        }
        assert_eq!(sub.recv().await, Some(Notification::Lagged(3)));
    }

    #[tokio::test]
    async fn recv_ends_when_bus_dropped() {
        let bus = ChangeBus::default();
        let mut sub = bus.subscribe(Interest::all());
        drop(bus);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn watch_stops_on_cancel() {
        let bus = ChangeBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();
        let sink = seen.clone();
        let handle = bus.watch(Interest::all(), cancel.clone(), move |n| {
            let sink = sink.clone();
            async move { sink.lock().await.push(n) }
        });

        bus.publish(event(Table::Laws, None));
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(seen.lock().await.len(), 1);
        assert_eq!(bus.publish(event(Table::Laws, None)), 0);
    }
}
