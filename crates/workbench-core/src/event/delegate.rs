use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::event::Topic;
use crate::event::error::EventSystemError;
use crate::utils::lock;

type SubscriberId = u64;
type Callback = Arc<dyn Fn() + Send + Sync>;
type SubscriberTable<T> = HashMap<T, HashMap<SubscriberId, Callback>>;

/// Handle returned by every subscription.
///
/// Calling [`Unsubscribe::unsubscribe`] more than once is a no-op. Dropping
/// the handle does *not* unsubscribe.
pub struct Unsubscribe {
    release: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Unsubscribe {
    pub(crate) fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Mutex::new(Some(Box::new(release))),
        }
    }

    /// A handle with nothing to release.
    pub fn noop() -> Self {
        Self {
            release: Mutex::new(None),
        }
    }

    /// Fold several handles into one.
    pub fn all(handles: Vec<Unsubscribe>) -> Self {
        Self::new(move || handles.iter().for_each(Unsubscribe::unsubscribe))
    }

    pub fn unsubscribe(&self) {
        let release = lock(&self.release).take();
        if let Some(release) = release {
            release();
        }
    }

    /// Whether `unsubscribe` has not been called yet.
    pub fn is_active(&self) -> bool {
        lock(&self.release).is_some()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Topic-keyed listener table with payload-free notifications.
///
/// Listeners are invoked synchronously and outside of any internal lock, so
/// a listener may subscribe, unsubscribe or trigger further notifications.
/// No ordering between listeners of the same topic is promised.
pub struct PublishSubscribeDelegate<T: Topic> {
    subscribers: Arc<Mutex<SubscriberTable<T>>>,
    next_subscriber_id: AtomicU64,
}

impl<T: Topic> PublishSubscribeDelegate<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    pub fn subscribe<F>(&self, topic: T, callback: F) -> Unsubscribe
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.subscribers)
            .entry(topic)
            .or_default()
            .insert(id, Arc::new(callback));

        let table = Arc::downgrade(&self.subscribers);
        Unsubscribe::new(move || {
            let Some(table) = table.upgrade() else {
                return;
            };
            let mut table = lock(&table);
            if let Some(listeners) = table.get_mut(&topic) {
                listeners.remove(&id);
                if listeners.is_empty() {
                    table.remove(&topic);
                }
            }
        })
    }

    pub fn notify_subscribers(&self, topic: T) {
        let callbacks: Vec<Callback> = lock(&self.subscribers)
            .get(&topic)
            .map(|listeners| listeners.values().cloned().collect())
            .unwrap_or_default();
        for callback in callbacks {
            callback();
        }
    }

    pub fn subscriber_count(&self, topic: T) -> usize {
        lock(&self.subscribers).get(&topic).map_or(0, HashMap::len)
    }
}

impl<T: Topic> Default for PublishSubscribeDelegate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Topic> fmt::Debug for PublishSubscribeDelegate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count: usize = lock(&self.subscribers).values().map(HashMap::len).sum();
        f.debug_struct("PublishSubscribeDelegate")
            .field("subscribers", &count)
            .finish()
    }
}

/// Implemented by every object that publishes a closed set of topics.
pub trait PublishSubscribe<T: Topic>: Send + Sync + 'static {
    fn publish_subscribe_delegate(&self) -> &PublishSubscribeDelegate<T>;

    /// Current value for `topic`.
    fn snapshot(&self, topic: T) -> T::Snapshot;

    fn subscribe<F>(&self, topic: T, callback: F) -> Unsubscribe
    where
        F: Fn() + Send + Sync + 'static,
        Self: Sized,
    {
        self.publish_subscribe_delegate().subscribe(topic, callback)
    }
}

/// Reads the current snapshot of one topic of one publisher.
///
/// Two getters for the same publisher and topic compare equal, which is the
/// stability guarantee reactive adapters rely on.
pub struct SnapshotGetter<O, T> {
    owner: Weak<O>,
    topic: T,
}

impl<O, T> SnapshotGetter<O, T>
where
    O: PublishSubscribe<T>,
    T: Topic,
{
    pub fn get(&self) -> Result<T::Snapshot, EventSystemError> {
        self.owner
            .upgrade()
            .map(|owner| owner.snapshot(self.topic))
            .ok_or_else(|| EventSystemError::PublisherDropped {
                topic: format!("{:?}", self.topic),
            })
    }

    pub fn topic(&self) -> T {
        self.topic
    }
}

impl<O, T: Copy> Clone for SnapshotGetter<O, T> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner.clone(),
            topic: self.topic,
        }
    }
}

impl<O, T: PartialEq> PartialEq for SnapshotGetter<O, T> {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.owner, &other.owner) && self.topic == other.topic
    }
}

impl<O, T: fmt::Debug> fmt::Debug for SnapshotGetter<O, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotGetter")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

/// Build the snapshot getter for `topic` on `owner`.
pub fn make_snapshot_getter<O, T>(owner: &Arc<O>, topic: T) -> SnapshotGetter<O, T>
where
    O: PublishSubscribe<T>,
    T: Topic,
{
    SnapshotGetter {
        owner: Arc::downgrade(owner),
        topic,
    }
}
