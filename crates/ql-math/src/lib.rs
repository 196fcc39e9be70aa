//! # ql-math
//!
//! Matrix/array newtypes over `nalgebra`, SVD-based general linear
//! least-squares regression, and epsilon-tolerant float comparison.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// `Array` newtype over `nalgebra::DVector`.
pub mod array;

/// Epsilon-tolerant float comparison (`close`, `close_enough`).
pub mod comparison;

/// General linear least-squares regression via SVD.
pub mod linear_least_squares;

/// `Matrix` newtype over `nalgebra::DMatrix`.
pub mod matrix;

/// `SVD` and other matrix decomposition helpers.
pub mod matrix_utilities;
