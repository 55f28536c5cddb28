//! Delivery pacing and the daily control loop.
//!
//! [`DeliveryScheduler`] recomputes the upload timetable for every retained
//! pack each cycle and dispatches the slots that have come due.
//! [`DailyLoop`] ties everything together: it tops up today's pack through
//! the pipeline, dispatches due uploads, enforces retention, and sleeps
//! until the next cycle, surviving every per-unit failure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod daily;
mod delivery;

pub use daily::DailyLoop;
pub use delivery::{DeliveryScheduler, DispatchReport};
