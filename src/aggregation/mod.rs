// src/aggregation/mod.rs
pub mod vitals;
pub mod weekly;

pub use vitals::{read_daily_vitals, simulate_week, write_daily_vitals, DailyVitals};
pub use weekly::{aggregate_weekly, write_final_dataset, Demographics, WeeklyVitals};
