#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleAction {
    Process { frame_id: u64 },
    Skip { frame_id: u64 },
}

/// Fixed-stride sampler: frame `f` is processed when `f % step == 0`.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    step: u64,
    frame_counter: u64,
}

impl FrameSampler {
    /// `step` of 0 is treated as 1; configs are validated before reaching here.
    pub fn new(step: u32) -> Self {
        Self {
            step: step.max(1) as u64,
            frame_counter: 0,
        }
    }

    /// Decides for the next frame and advances the counter.
    pub fn next_frame(&mut self) -> SampleAction {
        let frame_id = self.frame_counter;
        self.frame_counter += 1;

        if frame_id % self.step == 0 {
            SampleAction::Process { frame_id }
        } else {
            SampleAction::Skip { frame_id }
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn reset(&mut self) {
        self.frame_counter = 0;
    }
}
