//! Ready-made samplers.
//!
//! [`distributions`] holds samplers that draw directly from a textbook
//! distribution and do not depend on other samplers. [`pulse`] holds the
//! samplers of the pulse population: durations, decay times and the
//! correlated luminosity and peak energy.

pub mod distributions;
pub mod pulse;

pub use distributions::{FixedAuxSampler, LogNormalAuxSampler, NormalAuxSampler, UniformAuxSampler};
pub use pulse::{DerivedEpeakSampler, DurationSampler, EpeakLuminositySampler, TDecaySampler};
