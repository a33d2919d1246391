//! Point density estimation
//!
//! - **bandwidth**: kernel bandwidth selection (Scott rule or fixed)
//! - **kde**: kernel density at hexagonal cell centers

mod bandwidth;
mod kde;

pub use bandwidth::{select_bandwidth, BandwidthRule, MIN_POINTS};
pub use kde::{kernel_density, DensityParams, DensitySurface, Kernel, KernelDensity};
