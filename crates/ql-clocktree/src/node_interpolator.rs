//! `NodeInterpolator` (spec §4/C3) — the same representation as
//! [`Distribution`](crate::distribution::Distribution), exposed as a
//! namespace of specialized constructors used by the message-passing
//! engine. The original models this as a subclass that only adds two
//! static methods; this translates to a zero-sized type whose associated
//! functions simply forward to the shared distribution algebra, the way
//! the teacher's `LinearLeastSquaresRegression::from_design_matrix` and
//! `::new` share one implementation.

use crate::config::EngineConfig;
use crate::distribution::{self, Distribution};
use crate::errors::Result;

/// Namespace for the two node-message constructors the engine needs:
/// combining sibling messages ([`NodeInterpolator::multiply`]) and
/// propagating a message across a branch ([`NodeInterpolator::convolve`]).
pub struct NodeInterpolator;

impl NodeInterpolator {
    /// Combine independent messages about the same node's time into one
    /// posterior contribution (spec §4.4.2/§4.4.3: product of sibling
    /// messages, or of complementary messages and the parent's own
    /// incoming message).
    pub fn multiply(items: &[&Distribution], cfg: &EngineConfig) -> Result<Distribution> {
        distribution::multiply(items, cfg)
    }

    /// Propagate a message across one edge's branch-length density (spec
    /// §4.4.2/§4.4.3: `send_message` and the downward-pass convolution).
    pub fn convolve(
        a: &Distribution,
        b: &Distribution,
        inverse_time: bool,
        cfg: &EngineConfig,
    ) -> Result<Distribution> {
        distribution::convolve(a, b, inverse_time, cfg)
    }
}
