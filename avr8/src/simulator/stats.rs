/// Running totals over every synchronization step
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub ticks: u64,
    pub executed_cycles: u64,
    pub instructions: u64,
    /// Cycles executed past the budget because an instruction straddled it
    pub overshoot_cycles: u64,
    pub clock_anomalies: u64,
    pub stalled_ticks: u64,
    pub conversions: u64,
}
