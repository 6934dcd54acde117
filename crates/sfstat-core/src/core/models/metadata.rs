use serde::Serialize;

/// Simulation conditions read from the xtck log header, plus the retained
/// frame count. Populated once at parse time; immutable afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationMetadata {
    /// Number of water molecules in the simulated system.
    pub wat_number: usize,
    /// Number of K+ ions in the simulated system.
    pub k_number: usize,
    /// Number of frames retained after time filtering (not the total in the file).
    pub frame_number: usize,
}
