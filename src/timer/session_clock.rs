use std::time::SystemTime;

/// Counts whole seconds since a session started.
///
/// Advances only when [`SessionClock::tick`] is called. Ticks are never
/// coalesced: a late tick still adds exactly one second, so the count can
/// drift behind wall time under load.
#[derive(Debug, Clone)]
pub struct SessionClock {
    elapsed_seconds: u64,
    running: bool,
    started_at: Option<SystemTime>,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            elapsed_seconds: 0,
            running: false,
            started_at: None,
        }
    }

    /// Reset to zero and start counting. Callers guard against double starts.
    pub fn start(&mut self) {
        self.elapsed_seconds = 0;
        self.running = true;
        self.started_at = Some(SystemTime::now());
    }

    pub fn tick(&mut self) {
        if self.running {
            self.elapsed_seconds += 1;
        }
    }

    /// Halt; the last count stays readable.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_exactly_one_second_per_tick() {
        for n in [0u64, 1, 59, 60, 3601] {
            let mut clock = SessionClock::new();
            clock.start();
            for _ in 0..n {
                clock.tick();
            }
            assert_eq!(clock.elapsed_seconds(), n);
        }
    }

    #[test]
    fn stop_keeps_last_value_and_ignores_further_ticks() {
        let mut clock = SessionClock::new();
        clock.start();
        clock.tick();
        clock.tick();
        clock.stop();
        clock.tick();
        assert!(!clock.is_running());
        assert_eq!(clock.elapsed_seconds(), 2);
    }

    #[test]
    fn restart_resets_count() {
        let mut clock = SessionClock::new();
        clock.start();
        clock.tick();
        clock.stop();
        clock.start();
        assert_eq!(clock.elapsed_seconds(), 0);
        assert!(clock.started_at().is_some());
    }
}
