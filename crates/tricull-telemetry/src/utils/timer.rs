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

//! RAII frame timer.

use super::Stopwatch;
use crate::metrics::FrameSeries;

/// Times a scope and records the result in a [`FrameSeries`] when dropped.
///
/// The sample is recorded on every exit path, early returns included.
/// Call [`discard`](Self::discard) to drop the measurement instead, e.g. when
/// the frame it was timing failed.
pub struct ScopedFrameTimer<'a> {
    stopwatch: Stopwatch,
    series: Option<&'a mut FrameSeries>,
}

impl<'a> ScopedFrameTimer<'a> {
    /// Starts timing into `series`.
    pub fn new(series: &'a mut FrameSeries) -> Self {
        Self {
            stopwatch: Stopwatch::new(),
            series: Some(series),
        }
    }

    /// Stops the timer without recording anything.
    pub fn discard(mut self) {
        self.series = None;
    }
}

impl Drop for ScopedFrameTimer<'_> {
    fn drop(&mut self) {
        if let Some(series) = self.series.take() {
            series.record(self.stopwatch.elapsed_ms_f64());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_on_drop() {
        let mut series = FrameSeries::new("test");
        {
            let _timer = ScopedFrameTimer::new(&mut series);
        }
        assert_eq!(series.len(), 1);
        assert!(series.samples()[0] >= 0.0);
    }

    #[test]
    fn discarded_timer_records_nothing() {
        let mut series = FrameSeries::new("test");
        ScopedFrameTimer::new(&mut series).discard();
        assert!(series.is_empty());
    }
}
