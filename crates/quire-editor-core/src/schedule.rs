//! Single-slot debounce scheduler.
//!
//! One document has at most one pending span evaluation. Scheduling always
//! replaces the pending task ("latest wins"); if the replaced task was for a
//! different span it is handed back so the caller can flush it.
//!
//! Time is supplied by the caller, so the scheduler never reads a clock.

use std::time::Duration;

use web_time::Instant;

use crate::span::SpanId;

/// Identifies one scheduled task. Stale handles are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// A span evaluation waiting for its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTask {
    pub handle: TaskHandle,
    pub span: SpanId,
    pub deadline: Instant,
}

#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<PendingTask>,
    next_handle: u64,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an evaluation of `span` at `now + delay`, cancelling whatever
    /// was pending. Returns the cancelled task if it targeted another span.
    pub fn schedule(
        &mut self,
        span: SpanId,
        now: Instant,
        delay: Duration,
    ) -> (TaskHandle, Option<PendingTask>) {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;

        let displaced = self
            .pending
            .replace(PendingTask {
                handle,
                span,
                deadline: now + delay,
            })
            .filter(|prev| prev.span != span);

        tracing::trace!(
            target: "quire::schedule",
            %span,
            delay_ms = delay.as_millis() as u64,
            displaced = ?displaced.map(|t| t.span),
            "scheduled span evaluation"
        );
        (handle, displaced)
    }

    /// Take the pending task if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<PendingTask> {
        match self.pending {
            Some(task) if task.deadline <= now => self.pending.take(),
            _ => None,
        }
    }

    /// Cancel the task with `handle`. No-op if it already fired or was
    /// replaced.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        if self.pending.is_some_and(|task| task.handle == handle) {
            self.pending = None;
            return true;
        }
        false
    }

    /// Drop the pending task if it targets `span`.
    pub fn cancel_span(&mut self, span: SpanId) -> Option<PendingTask> {
        if self.pending.is_some_and(|task| task.span == span) {
            return self.pending.take();
        }
        None
    }

    /// Take the pending task regardless of its deadline.
    pub fn flush(&mut self) -> Option<PendingTask> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<&PendingTask> {
        self.pending.as_ref()
    }

    /// Time left until the pending task is due, if any.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .map(|task| task.deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(100);
    const LONG: Duration = Duration::from_millis(300);

    #[test]
    fn test_poll_waits_for_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new();
        debouncer.schedule(SpanId(1), start, LONG);

        assert!(debouncer.poll(start + SHORT).is_none());
        let task = debouncer.poll(start + LONG).expect("due");
        assert_eq!(task.span, SpanId(1));
        assert!(debouncer.poll(start + LONG).is_none());
    }

    #[test]
    fn test_reschedule_same_span_cancels_previous() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new();
        let (first, _) = debouncer.schedule(SpanId(1), start, LONG);
        let (second, displaced) = debouncer.schedule(SpanId(1), start + SHORT, LONG);

        assert!(displaced.is_none());
        assert_ne!(first, second);
        // Old deadline passes without firing.
        assert!(debouncer.poll(start + LONG).is_none());
        assert!(debouncer.poll(start + SHORT + LONG).is_some());
    }

    #[test]
    fn test_schedule_other_span_returns_displaced() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new();
        debouncer.schedule(SpanId(1), start, LONG);
        let (_, displaced) = debouncer.schedule(SpanId(2), start, SHORT);
        assert_eq!(displaced.map(|t| t.span), Some(SpanId(1)));
        assert_eq!(debouncer.pending().map(|t| t.span), Some(SpanId(2)));
    }

    #[test]
    fn test_cancel_stale_handle_is_noop() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new();
        let (first, _) = debouncer.schedule(SpanId(1), start, LONG);
        let (second, _) = debouncer.schedule(SpanId(1), start, LONG);

        assert!(!debouncer.cancel(first));
        assert!(debouncer.pending().is_some());
        assert!(debouncer.cancel(second));
        assert!(debouncer.pending().is_none());
    }

    #[test]
    fn test_time_until_due() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new();
        assert!(debouncer.time_until_due(start).is_none());
        debouncer.schedule(SpanId(3), start, SHORT);
        assert_eq!(debouncer.time_until_due(start), Some(SHORT));
        assert_eq!(debouncer.time_until_due(start + LONG), Some(Duration::ZERO));
        assert_eq!(debouncer.cancel_span(SpanId(3)).map(|t| t.span), Some(SpanId(3)));
    }
}
