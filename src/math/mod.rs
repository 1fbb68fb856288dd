//! Numeric kernels executed locally on each core.

pub mod dot_product;
