use std::time::{Duration, Instant};

/// Last-write-wins debouncer driven by the event loop clock.
///
/// `push` replaces any pending value and restarts the delay; `poll` hands the
/// value out once the delay has elapsed. Stale values are never queued.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Take the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if *deadline <= now => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    /// Drop the pending value without firing it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(250);

    #[test]
    fn fires_after_delay() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.push("a", t0);
        assert_eq!(d.poll(t0 + Duration::from_millis(100)), None);
        assert_eq!(d.poll(t0 + DELAY), Some("a"));
        assert_eq!(d.poll(t0 + DELAY * 2), None);
    }

    #[test]
    fn newer_push_replaces_and_restarts() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.push("x", t0);
        d.push("xy", t0 + Duration::from_millis(200));
        assert_eq!(d.poll(t0 + DELAY), None);
        assert_eq!(d.deadline(), Some(t0 + Duration::from_millis(450)));
        assert_eq!(d.poll(t0 + Duration::from_millis(450)), Some("xy"));
    }

    #[test]
    fn cancel_drops_pending() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(DELAY);
        d.push(1, t0);
        d.cancel();
        assert!(!d.is_pending());
        assert_eq!(d.poll(t0 + DELAY), None);
    }
}
