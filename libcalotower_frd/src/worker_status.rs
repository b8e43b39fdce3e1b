#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Loading,
    Writing,
    Finalized,
}

/// Progress message sent from the processing thread to whoever is watching
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub run_number: u32,
    pub orbit_number: u32,
    pub stage: Stage,
}

impl WorkerStatus {
    pub fn new(progress: f32, run_number: u32, orbit_number: u32, stage: Stage) -> Self {
        Self {
            progress,
            run_number,
            orbit_number,
            stage,
        }
    }
}
