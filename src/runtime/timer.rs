//! Wall-clock timer for block and run durations

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn now() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_monotonic() {
        let timer = Timer::now();
        let first = timer.elapsed_ms();
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed_ms() >= first);
        assert!(timer.elapsed() >= Duration::from_millis(2));
    }
}
