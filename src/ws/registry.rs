//! Listener bookkeeping for one stream client.
//!
//! Maps each [`SubscriptionKey`] to its listeners and tracks whether the
//! server-side subscription for that key is live on the current socket. Pure
//! bookkeeping; the client decides which control frames to send from the
//! values returned here.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ws::protocol::SubscriptionKey;

/// Handle to a registered listener. Identity (for removal) is the `Arc`
/// pointer, so keep the handle returned by `subscribe`.
pub type Listener<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener<P, F>(f: F) -> Listener<P>
where
    F: Fn(&P) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// How many listeners a key may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Every registered listener receives every frame for its key.
    FanOut,
    /// One slot per key; a new subscriber replaces the previous one.
    LastSubscriberWins,
}

/// Server-side state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyState {
    /// Never sent.
    Pending,
    /// Subscribe frame sent on the current socket.
    Live,
    /// Sent on a socket that has since closed.
    Stale,
}

struct Entry<P> {
    listeners: Vec<Listener<P>>,
    state: KeyState,
}

pub(crate) struct Registry<P> {
    policy: DispatchPolicy,
    entries: HashMap<SubscriptionKey, Entry<P>>,
}

impl<P> Registry<P> {
    pub(crate) fn new(policy: DispatchPolicy) -> Self {
        Self {
            policy,
            entries: HashMap::new(),
        }
    }

    /// Register `listener` under `key`. Returns `true` when the key is new.
    /// Registering the same handle twice is a no-op.
    pub(crate) fn insert(&mut self, key: SubscriptionKey, listener: Listener<P>) -> bool {
        let mut is_new = false;
        let entry = self.entries.entry(key).or_insert_with(|| {
            is_new = true;
            Entry {
                listeners: Vec::new(),
                state: KeyState::Pending,
            }
        });

        match self.policy {
            DispatchPolicy::FanOut => {
                if !entry.listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
                    entry.listeners.push(listener);
                }
            }
            DispatchPolicy::LastSubscriberWins => {
                entry.listeners.clear();
                entry.listeners.push(listener);
            }
        }
        is_new
    }

    /// Remove one listener (`Some`) or every listener (`None`) for `key`.
    ///
    /// Returns `Some(was_live)` when the key lost its last listener and was
    /// dropped, `None` when the key is unknown or still has listeners.
    pub(crate) fn remove(
        &mut self,
        key: &SubscriptionKey,
        listener: Option<&Listener<P>>,
    ) -> Option<bool> {
        let entry = self.entries.get_mut(key)?;
        if let Some(target) = listener {
            entry.listeners.retain(|l| !Arc::ptr_eq(l, target));
        } else {
            entry.listeners.clear();
        }

        if entry.listeners.is_empty() {
            self.entries.remove(key).map(|e| e.state == KeyState::Live)
        } else {
            None
        }
    }

    /// Listeners for every key matching a key rebuilt from an inbound frame.
    pub(crate) fn listeners_for(&self, routed: &SubscriptionKey) -> Vec<Listener<P>> {
        if let Some(entry) = self.entries.get(routed) {
            return entry.listeners.clone();
        }
        self.entries
            .iter()
            .filter(|(key, _)| key.matches(routed))
            .flat_map(|(_, entry)| entry.listeners.iter().cloned())
            .collect()
    }

    pub(crate) fn is_live(&self, key: &SubscriptionKey) -> bool {
        self.entries.get(key).is_some_and(|e| e.state == KeyState::Live)
    }

    pub(crate) fn mark_live(&mut self, key: &SubscriptionKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.state = KeyState::Live;
        }
    }

    /// A consumer subscribed to a key whose subscription died with the last
    /// socket; send it again on the next open.
    pub(crate) fn mark_pending(&mut self, key: &SubscriptionKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            if entry.state == KeyState::Stale {
                entry.state = KeyState::Pending;
            }
        }
    }

    /// Keys to subscribe on a freshly opened socket: keys never sent, plus
    /// keys from a previous socket when `replay` is set.
    pub(crate) fn keys_to_send(&self, replay: bool) -> Vec<SubscriptionKey> {
        self.entries
            .iter()
            .filter(|(_, e)| match e.state {
                KeyState::Pending => true,
                KeyState::Stale => replay,
                KeyState::Live => false,
            })
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// The socket closed; live keys become stale.
    pub(crate) fn mark_all_stale(&mut self) {
        for entry in self.entries.values_mut() {
            if entry.state == KeyState::Live {
                entry.state = KeyState::Stale;
            }
        }
    }

    pub(crate) fn drain(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ForeignDataType;

    fn noop() -> Listener<u32> {
        listener(|_: &u32| {})
    }

    #[test]
    fn fan_out_keeps_key_until_last_listener_leaves() {
        let mut reg = Registry::new(DispatchPolicy::FanOut);
        let key = SubscriptionKey::stock("005930");
        let (a, b) = (noop(), noop());

        assert!(reg.insert(key.clone(), a.clone()));
        assert!(!reg.insert(key.clone(), b.clone()));
        reg.mark_live(&key);

        assert_eq!(reg.remove(&key, Some(&a)), None);
        assert_eq!(reg.listeners_for(&key).len(), 1);
        assert_eq!(reg.remove(&key, Some(&b)), Some(true));
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn same_handle_twice_is_one_registration() {
        let mut reg = Registry::new(DispatchPolicy::FanOut);
        let key = SubscriptionKey::stock("000660");
        let a = noop();
        reg.insert(key.clone(), a.clone());
        reg.insert(key.clone(), a.clone());
        assert_eq!(reg.listeners_for(&key).len(), 1);
        assert_eq!(reg.remove(&key, Some(&a)), Some(false));
    }

    #[test]
    fn single_slot_replaces_previous_listener() {
        let mut reg = Registry::new(DispatchPolicy::LastSubscriberWins);
        let (a, b) = (noop(), noop());
        reg.insert(SubscriptionKey::Gold, a.clone());
        reg.insert(SubscriptionKey::Gold, b.clone());

        let current = reg.listeners_for(&SubscriptionKey::Gold);
        assert_eq!(current.len(), 1);
        assert!(Arc::ptr_eq(&current[0], &b));

        // removing the displaced listener leaves the slot alone
        assert_eq!(reg.remove(&SubscriptionKey::Gold, Some(&a)), None);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.remove(&SubscriptionKey::Gold, None), Some(false));
    }

    #[test]
    fn unknown_key_removal_is_a_no_op() {
        let mut reg: Registry<u32> = Registry::new(DispatchPolicy::FanOut);
        assert_eq!(reg.remove(&SubscriptionKey::stock("999999"), None), None);
    }

    #[test]
    fn stale_keys_are_replayed_only_on_request() {
        let mut reg = Registry::new(DispatchPolicy::FanOut);
        let key = SubscriptionKey::stock("005930");
        reg.insert(key.clone(), noop());
        assert_eq!(reg.keys_to_send(false), vec![key.clone()]);

        reg.mark_live(&key);
        assert!(reg.keys_to_send(true).is_empty());
        assert!(reg.is_live(&key));

        reg.mark_all_stale();
        assert!(!reg.is_live(&key));
        assert!(reg.keys_to_send(false).is_empty());
        assert_eq!(reg.keys_to_send(true), vec![key]);
    }

    #[test]
    fn resubscribing_a_stale_key_queues_it_again() {
        let mut reg = Registry::new(DispatchPolicy::FanOut);
        let key = SubscriptionKey::stock("005930");
        reg.insert(key.clone(), noop());
        reg.mark_live(&key);

        // live keys are left alone
        reg.mark_pending(&key);
        assert!(reg.is_live(&key));

        reg.mark_all_stale();
        reg.insert(key.clone(), noop());
        reg.mark_pending(&key);
        assert_eq!(reg.keys_to_send(false), vec![key]);
    }

    #[test]
    fn foreign_frames_without_exchange_reach_matching_keys() {
        let mut reg = Registry::new(DispatchPolicy::FanOut);
        reg.insert(
            SubscriptionKey::foreign("NAS", "AAPL", ForeignDataType::Trade),
            noop(),
        );
        reg.insert(
            SubscriptionKey::foreign("NAS", "AAPL", ForeignDataType::Quote),
            noop(),
        );

        let routed = SubscriptionKey::foreign("", "AAPL", ForeignDataType::Trade);
        assert_eq!(reg.listeners_for(&routed).len(), 1);
    }
}
