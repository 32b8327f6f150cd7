//! Subscription Registry (§4.4): tracks confirmed channel subscriptions and
//! builds the restore payload sent immediately after a successful reconnect.

use parking_lot::RwLock;
use std::collections::HashSet;

use crate::message::RESTORE_METHOD;

struct Inner {
    order: Vec<String>,
    set: HashSet<String>,
}

pub struct SubscriptionRegistry {
    inner: RwLock<Inner>,
    restore_enabled: bool,
}

impl SubscriptionRegistry {
    pub fn new(restore_enabled: bool) -> Self {
        Self {
            inner: RwLock::new(Inner {
                order: Vec::new(),
                set: HashSet::new(),
            }),
            restore_enabled,
        }
    }

    /// Called on receipt of a subscription confirmation. A channel already
    /// present is left at its original position.
    pub fn add(&self, channel: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.set.insert(channel.to_string()) {
            inner.order.push(channel.to_string());
            true
        } else {
            false
        }
    }

    /// Removal is explicit user action only; the core never clears this set
    /// on disconnect.
    pub fn remove(&self, channel: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.set.remove(channel) {
            inner.order.retain(|c| c != channel);
            true
        } else {
            false
        }
    }

    pub fn list(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().order.is_empty()
    }

    /// `None` if the set is empty or restore is disabled; otherwise the
    /// bit-exact JSON text fixed by §6.
    pub fn build_restore_message(&self) -> Option<String> {
        if !self.restore_enabled {
            return None;
        }
        let channels = self.list();
        if channels.is_empty() {
            return None;
        }
        let payload = serde_json::json!({
            "method": RESTORE_METHOD,
            "params": { "channels": channels },
        });
        Some(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_matches_insertion_order_minus_removals() {
        let reg = SubscriptionRegistry::new(true);
        reg.add("a");
        reg.add("b");
        reg.add("c");
        reg.remove("b");
        reg.add("d");
        assert_eq!(reg.list(), vec!["a", "c", "d"]);
    }

    #[test]
    fn duplicate_add_is_noop() {
        let reg = SubscriptionRegistry::new(true);
        assert!(reg.add("a"));
        assert!(!reg.add("a"));
        assert_eq!(reg.list(), vec!["a"]);
    }

    #[test]
    fn restore_message_empty_when_no_subscriptions() {
        let reg = SubscriptionRegistry::new(true);
        assert!(reg.build_restore_message().is_none());
    }

    #[test]
    fn restore_message_none_when_disabled() {
        let reg = SubscriptionRegistry::new(false);
        reg.add("trades.BTC");
        assert!(reg.build_restore_message().is_none());
    }

    #[test]
    fn restore_message_contains_exact_channels() {
        let reg = SubscriptionRegistry::new(true);
        reg.add("trades.BTC");
        reg.add("book.ETH");
        let msg = reg.build_restore_message().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(parsed["method"], "public/subscribe");
        let channels: Vec<String> = parsed["params"]["channels"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect();
        let mut sorted = channels.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["book.ETH", "trades.BTC"]);
    }
}
