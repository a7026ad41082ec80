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

//! Collects frame timings for every strategy of a run.

use crate::metrics::FrameSeries;
use crate::report::StrategyReport;
use crate::utils::ScopedFrameTimer;

/// Owns one [`FrameSeries`] per strategy, in registration order.
#[derive(Debug, Default)]
pub struct TelemetryService {
    series: Vec<FrameSeries>,
}

impl TelemetryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the series for `strategy`, creating it on first use.
    pub fn series_mut(&mut self, strategy: &str) -> &mut FrameSeries {
        let index = match self.series.iter().position(|s| s.name() == strategy) {
            Some(index) => index,
            None => {
                log::trace!("New frame series for {strategy}");
                self.series.push(FrameSeries::new(strategy));
                self.series.len() - 1
            }
        };
        &mut self.series[index]
    }

    pub fn series(&self, strategy: &str) -> Option<&FrameSeries> {
        self.series.iter().find(|s| s.name() == strategy)
    }

    /// Starts a timer recording into `strategy`'s series.
    pub fn frame_timer(&mut self, strategy: &str) -> ScopedFrameTimer<'_> {
        ScopedFrameTimer::new(self.series_mut(strategy))
    }

    /// Builds one report per series, in registration order.
    pub fn strategy_reports(&self, warmup_frames: u32) -> Vec<StrategyReport> {
        self.series
            .iter()
            .map(|s| StrategyReport::from_series(s, warmup_frames))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_are_kept_per_strategy_in_order() {
        let mut service = TelemetryService::new();
        service.series_mut("b").record(1.0);
        service.series_mut("a").record(2.0);
        service.series_mut("b").record(3.0);
        drop(service.frame_timer("a"));

        assert_eq!(service.series("b").unwrap().samples(), &[1.0, 3.0]);
        assert_eq!(service.series("a").unwrap().len(), 2);
        let names: Vec<_> = service
            .strategy_reports(0)
            .into_iter()
            .map(|r| r.strategy)
            .collect();
        assert_eq!(names, ["b", "a"]);
    }
}
