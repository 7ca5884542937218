// Path: crates/telemetry/src/time.rs
use crate::sinks::BlockMetricsSink;
use std::time::Instant;

/// Observes the lifetime of a scope as the duration of a block hook.
pub struct HookTimer<'a> {
    sink: &'a dyn BlockMetricsSink,
    hook: &'static str,
    start: Instant,
}

impl<'a> HookTimer<'a> {
    /// Starts timing `hook`.
    pub fn new(sink: &'a dyn BlockMetricsSink, hook: &'static str) -> Self {
        Self {
            sink,
            hook,
            start: Instant::now(),
        }
    }
}

impl Drop for HookTimer<'_> {
    fn drop(&mut self) {
        self.sink
            .observe_hook_duration(self.hook, self.start.elapsed().as_secs_f64());
    }
}
