use std::time::{Duration, Instant};

/// One-shot timers keyed by `K`. Scheduling a key that is already pending
/// replaces it. Nothing fires on its own: the owner asks for the next deadline
/// and collects due keys from its event loop.
#[derive(Debug)]
pub struct Scheduler<K> {
    pending: Vec<(Instant, K)>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self { pending: Vec::new() }
    }
}

impl<K: PartialEq> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K, at: Instant) {
        self.remove(&key);
        self.pending.push((at, key));
    }

    pub fn add_after(&mut self, key: K, delay: Duration, now: Instant) {
        self.add(key, now + delay);
    }

    pub fn remove(&mut self, key: &K) -> bool {
        let before = self.pending.len();
        self.pending.retain(|(_, k)| k != key);
        self.pending.len() != before
    }

    pub fn contains(&self, key: &K) -> bool {
        self.pending.iter().any(|(_, k)| k == key)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|(at, _)| *at).min()
    }

    /// Removes and returns every key due at `now`, earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].0 <= now {
                due.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|(at, _)| *at);
        due.into_iter().map(|(_, k)| k).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescheduling_replaces_pending_entry() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.add_after(7u8, Duration::from_millis(100), t0);
        s.add_after(7u8, Duration::from_millis(500), t0);
        assert!(s.take_due(t0 + Duration::from_millis(200)).is_empty());
        assert_eq!(s.take_due(t0 + Duration::from_millis(500)), vec![7]);
        assert!(s.is_empty());
    }

    #[test]
    fn due_keys_come_out_in_deadline_order() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.add_after("b", Duration::from_millis(20), t0);
        s.add_after("a", Duration::from_millis(10), t0);
        s.add_after("c", Duration::from_secs(5), t0);
        assert_eq!(s.next_deadline(), Some(t0 + Duration::from_millis(10)));
        assert_eq!(s.take_due(t0 + Duration::from_secs(1)), vec!["a", "b"]);
        assert!(s.remove(&"c"));
        assert_eq!(s.next_deadline(), None);
    }
}
