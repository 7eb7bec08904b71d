//! Default pulse-Doppler processing unit.
//!
//! Per pulse period the capture stream is mixed to baseband, box-car
//! decimated into fast-time bins and matched-filtered against the transmit
//! pulse. Every `slow_pulse_count` pulses the frame is clutter-filtered,
//! windowed and transformed across slow time into a range-Doppler map.

mod baseband;
pub use baseband::PulseBaseband;

mod matched;
pub use matched::MatchedFilter;

mod clutter;
pub use clutter::ClutterFilter;

mod doppler;
pub use doppler::DopplerProcessor;

mod kernel;
pub use kernel::{direct_path_bin, DopplerKernel};

mod unit;
pub use unit::PulseDopplerUnit;
