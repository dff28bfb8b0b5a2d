use core::time::Duration;

pub const USER_HEAP_SIZE: usize = 32768;

/// Rounds printed by each process of a bounded variant.
pub const REPORT_ROUNDS: usize = 5;

pub const SPIN_CYCLES: usize = 1_000_000_000;

pub const SLEEP_INTERVAL: Duration = Duration::from_millis(500);
