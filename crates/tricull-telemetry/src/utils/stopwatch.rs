// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::{Duration, Instant};

/// A monotonic timer started on creation.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start_time: Instant,
}

impl Stopwatch {
    /// Creates a stopwatch and starts it.
    #[inline]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Time elapsed since the stopwatch was started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Elapsed time in milliseconds, with sub-millisecond precision.
    #[inline]
    pub fn elapsed_ms_f64(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    /// Elapsed time in microseconds.
    #[inline]
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed().as_micros() as u64
    }

    /// Restarts the stopwatch and returns the time elapsed until now.
    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now - self.start_time;
        self.start_time = now;
        elapsed
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    const SLEEP_DURATION_MS: u64 = 20;
    const SLEEP_MARGIN_MS: u64 = 200;

    #[test]
    fn stopwatch_elapsed_time_after_delay() {
        let watch = Stopwatch::new();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));

        let elapsed = watch.elapsed();
        assert!(
            elapsed >= Duration::from_millis(SLEEP_DURATION_MS),
            "Elapsed duration ({elapsed:?}) should be >= the sleep duration"
        );
        assert!(
            elapsed < Duration::from_millis(SLEEP_DURATION_MS + SLEEP_MARGIN_MS),
            "Elapsed duration ({elapsed:?}) should be < sleep duration + margin"
        );
        assert!(watch.elapsed_ms_f64() >= SLEEP_DURATION_MS as f64);
        assert!(watch.elapsed_us() >= SLEEP_DURATION_MS * 1000);
    }

    #[test]
    fn lap_restarts_the_measurement() {
        let mut watch = Stopwatch::new();
        thread::sleep(Duration::from_millis(SLEEP_DURATION_MS));
        let first = watch.lap();
        assert!(first >= Duration::from_millis(SLEEP_DURATION_MS));
        assert!(watch.elapsed() < first);
    }
}
