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

//! The multi-frame visibility sweep as an explicit state machine.
//!
//! A sweep renders the triangle IDs of the whole model in chunks, one chunk
//! per frame, then compacts the result on the GPU:
//!
//! ```text
//!  WaitingForTransform ──▶ RenderingChunk(0) ─▶ … ─▶ RenderingChunk(n-1)
//!          ▲                                               │
//!          │                                               ▼
//!       Cooldown ◀──────── Dispatching ◀──────── AwaitingGpuDrain
//! ```
//!
//! [`SweepTask::advance`] runs one frame's worth of work and stops at the
//! next yield point. Yield points fall after every chunk, after the dispatch,
//! and while no world transform is known. Dropping the task between two
//! calls is how a sweep is cancelled.

use std::ops::Range;
use tricull_core::math::Mat4;
use tricull_core::StrategyError;

/// Where a sweep currently is. Phases name the work the next `advance` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPhase {
    /// No world transform has been recorded yet.
    WaitingForTransform,
    /// The chunk with this index renders next.
    RenderingChunk(usize),
    /// Every chunk was submitted; the GPU gets one frame to finish them.
    AwaitingGpuDrain,
    /// The dispatch step runs next.
    Dispatching,
    /// The dispatch was submitted; the next sweep starts on the next frame.
    Cooldown,
}

/// The outcome of one [`SweepTask::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepStep {
    /// Nothing could be done this frame.
    Stalled,
    /// The chunk with this index was rendered.
    RenderedChunk(usize),
    /// The dispatch step was submitted, completing the task's `sweep`-th sweep.
    Dispatched {
        /// 1-based sweep number within this task.
        sweep: u64,
    },
}

/// The side effects a sweep needs, implemented by the lane.
pub trait SweepDriver {
    /// The last world transform recorded by the render hook.
    fn world_transform(&self) -> Option<Mat4>;

    /// Snapshots the culling camera and `root` for the sweep about to start.
    fn begin_sweep(&mut self, root: Mat4) -> Result<(), StrategyError>;

    /// Renders the IDs of `triangles`. Chunk 0 clears the ID targets first.
    fn render_chunk(&mut self, index: usize, triangles: Range<u32>) -> Result<(), StrategyError>;

    /// Accumulates, compacts and writes the indirect arguments, in one submission.
    fn dispatch(&mut self) -> Result<(), StrategyError>;
}

/// How the model's triangles are split over the frames of a sweep.
///
/// Chunks are `[i * chunk, min((i + 1) * chunk, total))`: they do not overlap,
/// cover every triangle and never number more than the requested frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    total: u32,
    chunk: u32,
}

impl ChunkPlan {
    /// Splits `total` triangles over at most `frames` chunks.
    pub fn new(total: u32, frames: u32) -> Self {
        Self {
            total,
            chunk: total.div_ceil(frames.max(1)).max(1),
        }
    }

    /// Total number of triangles.
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Triangles per chunk; the last chunk may be shorter.
    pub fn chunk_size(&self) -> u32 {
        self.chunk
    }

    /// Number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.total.div_ceil(self.chunk) as usize
    }

    /// The triangle range of chunk `index`.
    pub fn chunk(&self, index: usize) -> Option<Range<u32>> {
        let start = u32::try_from(index).ok()?.checked_mul(self.chunk)?;
        (start < self.total).then(|| start..self.total.min(start.saturating_add(self.chunk)))
    }

    /// Every chunk, in order.
    pub fn chunks(&self) -> impl Iterator<Item = Range<u32>> + '_ {
        (0..self.chunk_count()).filter_map(|i| self.chunk(i))
    }
}

/// One running sequence of sweeps. Owned by the lane while it is enabled.
#[derive(Debug, Clone)]
pub struct SweepTask {
    plan: ChunkPlan,
    phase: SweepPhase,
    sweeps: u64,
}

impl SweepTask {
    /// A task that starts by waiting for a world transform.
    pub fn new(plan: ChunkPlan) -> Self {
        Self {
            plan,
            phase: SweepPhase::WaitingForTransform,
            sweeps: 0,
        }
    }

    /// The current phase.
    pub fn phase(&self) -> SweepPhase {
        self.phase
    }

    /// The chunk plan.
    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    /// Sweeps completed by this task.
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    /// Runs until the next yield point.
    ///
    /// A driver error is returned as is and leaves the phase unchanged, so
    /// the failed step is attempted again on the next call.
    pub fn advance(&mut self, io: &mut dyn SweepDriver) -> Result<SweepStep, StrategyError> {
        loop {
            match self.phase {
                SweepPhase::WaitingForTransform | SweepPhase::Cooldown => {
                    let Some(root) = io.world_transform() else {
                        self.phase = SweepPhase::WaitingForTransform;
                        return Ok(SweepStep::Stalled);
                    };
                    io.begin_sweep(root)?;
                    self.phase = SweepPhase::RenderingChunk(0);
                }
                SweepPhase::RenderingChunk(index) => {
                    let Some(triangles) = self.plan.chunk(index) else {
                        self.phase = SweepPhase::AwaitingGpuDrain;
                        continue;
                    };
                    io.render_chunk(index, triangles)?;
                    self.phase = if index + 1 < self.plan.chunk_count() {
                        SweepPhase::RenderingChunk(index + 1)
                    } else {
                        SweepPhase::AwaitingGpuDrain
                    };
                    return Ok(SweepStep::RenderedChunk(index));
                }
                SweepPhase::AwaitingGpuDrain => self.phase = SweepPhase::Dispatching,
                SweepPhase::Dispatching => {
                    io.dispatch()?;
                    self.sweeps += 1;
                    self.phase = SweepPhase::Cooldown;
                    return Ok(SweepStep::Dispatched { sweep: self.sweeps });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Begin,
        Chunk(usize, Range<u32>),
        Dispatch,
    }

    #[derive(Default)]
    struct FakeDriver {
        root: Option<Mat4>,
        calls: Vec<Call>,
        fail_dispatch: bool,
    }

    impl SweepDriver for FakeDriver {
        fn world_transform(&self) -> Option<Mat4> {
            self.root
        }

        fn begin_sweep(&mut self, _root: Mat4) -> Result<(), StrategyError> {
            self.calls.push(Call::Begin);
            Ok(())
        }

        fn render_chunk(&mut self, index: usize, triangles: Range<u32>) -> Result<(), StrategyError> {
            self.calls.push(Call::Chunk(index, triangles));
            Ok(())
        }

        fn dispatch(&mut self) -> Result<(), StrategyError> {
            if self.fail_dispatch {
                return Err(StrategyError::NotPrepared);
            }
            self.calls.push(Call::Dispatch);
            Ok(())
        }
    }

    fn ready() -> FakeDriver {
        FakeDriver {
            root: Some(Mat4::IDENTITY),
            ..Default::default()
        }
    }

    #[test]
    fn chunks_cover_every_triangle_once() {
        for (total, frames) in [(30, 5), (31, 5), (4, 5), (1, 1), (350_001, 7)] {
            let plan = ChunkPlan::new(total, frames);
            let chunks: Vec<_> = plan.chunks().collect();
            assert!(chunks.len() <= frames as usize);
            assert_eq!(chunks.len(), plan.chunk_count());
            assert_eq!(chunks.first().map(|c| c.start), Some(0));
            assert_eq!(chunks.last().map(|c| c.end), Some(total));
            assert!(chunks.windows(2).all(|w| w[0].end == w[1].start));
        }
    }

    #[test]
    fn fewer_triangles_than_frames_gives_single_triangle_chunks() {
        let plan = ChunkPlan::new(3, 5);
        assert_eq!(plan.chunks().collect::<Vec<_>>(), vec![0..1, 1..2, 2..3]);
        assert_eq!(plan.chunk(3), None);
    }

    #[test]
    fn waits_until_a_transform_is_recorded() {
        let mut task = SweepTask::new(ChunkPlan::new(10, 2));
        let mut io = FakeDriver::default();
        assert_eq!(task.advance(&mut io).unwrap(), SweepStep::Stalled);
        assert_eq!(task.advance(&mut io).unwrap(), SweepStep::Stalled);
        assert!(io.calls.is_empty());
        assert_eq!(task.phase(), SweepPhase::WaitingForTransform);

        io.root = Some(Mat4::IDENTITY);
        assert_eq!(task.advance(&mut io).unwrap(), SweepStep::RenderedChunk(0));
        assert_eq!(io.calls, vec![Call::Begin, Call::Chunk(0, 0..5)]);
    }

    #[test]
    fn one_chunk_per_frame_then_drain_then_dispatch() {
        let mut task = SweepTask::new(ChunkPlan::new(30, 3));
        let mut io = ready();

        let steps: Vec<_> = (0..5).map(|_| task.advance(&mut io).unwrap()).collect();
        assert_eq!(
            steps,
            vec![
                SweepStep::RenderedChunk(0),
                SweepStep::RenderedChunk(1),
                SweepStep::RenderedChunk(2),
                SweepStep::Dispatched { sweep: 1 },
                SweepStep::RenderedChunk(0),
            ]
        );
        assert_eq!(
            io.calls,
            vec![
                Call::Begin,
                Call::Chunk(0, 0..10),
                Call::Chunk(1, 10..20),
                Call::Chunk(2, 20..30),
                Call::Dispatch,
                Call::Begin,
                Call::Chunk(0, 0..10),
            ]
        );
    }

    #[test]
    fn every_dispatch_follows_all_chunks_of_its_sweep() {
        let plan = ChunkPlan::new(50, 4);
        let mut task = SweepTask::new(plan);
        let mut io = ready();
        for _ in 0..40 {
            task.advance(&mut io).unwrap();
        }

        let mut pending = Vec::new();
        for call in &io.calls {
            match call {
                Call::Begin => pending.clear(),
                Call::Chunk(_, range) => pending.push(range.clone()),
                Call::Dispatch => assert_eq!(pending, plan.chunks().collect::<Vec<_>>()),
            }
        }
        assert_eq!(task.sweeps(), io.calls.iter().filter(|c| **c == Call::Dispatch).count() as u64);
    }

    #[test]
    fn failed_dispatch_is_retried() {
        let mut task = SweepTask::new(ChunkPlan::new(2, 1));
        let mut io = ready();
        task.advance(&mut io).unwrap();
        io.fail_dispatch = true;
        assert!(task.advance(&mut io).is_err());
        assert_eq!(task.phase(), SweepPhase::Dispatching);

        io.fail_dispatch = false;
        assert_eq!(task.advance(&mut io).unwrap(), SweepStep::Dispatched { sweep: 1 });
        assert_eq!(task.phase(), SweepPhase::Cooldown);
    }

    #[test]
    fn a_lost_transform_stalls_the_next_sweep() {
        let mut task = SweepTask::new(ChunkPlan::new(1, 1));
        let mut io = ready();
        task.advance(&mut io).unwrap();
        task.advance(&mut io).unwrap();
        io.root = None;
        assert_eq!(task.advance(&mut io).unwrap(), SweepStep::Stalled);
        assert_eq!(task.phase(), SweepPhase::WaitingForTransform);
    }
}
