//! Change notification for observable reads.
//!
//! Every successful write bumps a per-table version on a `watch` channel.
//! [`observe`] turns a fetch function into a stream that yields the current
//! value immediately and again after every bump.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;

use crate::error::ServiceResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Patients,
    Items,
    Orders,
}

#[derive(Clone)]
pub struct ChangeNotifier {
    channels: Arc<[watch::Sender<u64>; 4]>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(std::array::from_fn(|_| watch::channel(0).0)),
        }
    }

    fn channel(&self, table: Table) -> &watch::Sender<u64> {
        let index = match table {
            Table::Users => 0,
            Table::Patients => 1,
            Table::Items => 2,
            Table::Orders => 3,
        };
        &self.channels[index]
    }

    pub fn notify(&self, table: Table) {
        self.channel(table).send_modify(|version| *version += 1);
    }

    pub fn version(&self, table: Table) -> u64 {
        *self.channel(table).borrow()
    }

    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.channel(table).subscribe()
    }
}

/// Stream `fetch()` now and after every change to `table`.
///
/// Bursts of writes between two polls collapse into a single emission.
pub fn observe<T, F, Fut>(
    notifier: &ChangeNotifier,
    table: Table,
    fetch: F,
) -> BoxStream<'static, ServiceResult<T>>
where
    T: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ServiceResult<T>> + Send + 'static,
{
    let mut receiver = notifier.subscribe(table);
    receiver.mark_changed();

    stream::unfold((receiver, fetch), |(mut receiver, fetch)| async move {
        receiver.changed().await.ok()?;
        let value = fetch().await;
        Some((value, (receiver, fetch)))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_notify_bumps_only_that_table() {
        let notifier = ChangeNotifier::new();
        notifier.notify(Table::Patients);
        notifier.notify(Table::Patients);

        assert_eq!(notifier.version(Table::Patients), 2);
        assert_eq!(notifier.version(Table::Items), 0);
    }

    #[tokio::test]
    async fn test_observe_emits_initial_and_after_change() {
        let notifier = ChangeNotifier::new();
        let counter = Arc::new(AtomicU64::new(0));

        let source = Arc::clone(&counter);
        let mut stream = observe(&notifier, Table::Items, move || {
            let value = source.load(Ordering::SeqCst);
            async move { Ok(value) }
        });

        assert_eq!(stream.next().await.unwrap().unwrap(), 0);

        counter.store(5, Ordering::SeqCst);
        notifier.notify(Table::Items);
        assert_eq!(stream.next().await.unwrap().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_stream_ends_when_notifier_dropped() {
        let notifier = ChangeNotifier::new();
        let mut stream = observe(&notifier, Table::Orders, || async { Ok(()) });

        assert!(stream.next().await.is_some());
        drop(notifier);
        assert!(stream.next().await.is_none());
    }
}
