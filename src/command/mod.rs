mod check;

pub use check::{run_check, CheckOptions, CheckOutcome};
