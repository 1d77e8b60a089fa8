//! magnetar-sampler — random variates for Thompson sampling.
//!
//! [`RandomSource`] serializes access to one seeded generator so every
//! caller draws from a single stream. [`sample_gamma`] and [`sample_beta`]
//! turn uniform and standard-normal variates into Gamma and Beta draws
//! with the Marsaglia–Tsang method.

pub mod gamma;
pub mod random;

pub use gamma::{MAX_REJECTIONS, sample_beta, sample_gamma};
pub use random::{RandomSource, Variates};
