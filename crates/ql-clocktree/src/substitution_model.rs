//! Substitution models (supplement, see `SPEC_FULL.md` §3).
//!
//! Spec §4.2/§4.5 treats the substitution model `Γ` as an external
//! collaborator reachable only through `Γ.prob_t(child_seq, parent_seq, b)`.
//! This module provides the trait seam plus the one concrete model named
//! as an example identifier in spec §6: Jukes-Cantor (1969).

use ql_core::Real;

/// A nucleotide substitution model: scores the log-likelihood of observing
/// a child sequence given its parent and a branch length `b` (expected
/// substitutions per site).
///
/// Corresponds to `GTR.prob_t` in the original, specialized to the trait
/// seam the teacher uses for pluggable model families (e.g.
/// `Interpolation1D`, `RateHelper`).
pub trait SubstitutionModel: std::fmt::Debug + Send + Sync {
    /// `log P(child_seq | parent_seq, b)`, summed over informative sites.
    fn log_prob_t(&self, child_seq: &[u8], parent_seq: &[u8], b: Real) -> Real;

    /// Short identifier, e.g. `"Jukes-Cantor"` (spec §6).
    fn name(&self) -> &'static str;
}

/// `true` for an unambiguous nucleotide call (`A`/`C`/`G`/`T`, either
/// case); anything else (`N`, `-`, IUPAC ambiguity codes) is treated as
/// uninformative and excluded from the site sum.
fn is_informative(base: u8) -> bool {
    matches!(base.to_ascii_uppercase(), b'A' | b'C' | b'G' | b'T')
}

/// The Jukes-Cantor (1969) model: all substitutions equally likely, a
/// single rate parameter folded into the branch-length scale so that `b`
/// is already "expected substitutions per site".
#[derive(Debug, Clone, Copy, Default)]
pub struct JukesCantor;

impl JukesCantor {
    /// Probability that a site is unchanged after branch length `b`.
    fn p_same(b: Real) -> Real {
        0.25 + 0.75 * (-4.0 * b / 3.0).exp()
    }
}

impl SubstitutionModel for JukesCantor {
    fn log_prob_t(&self, child_seq: &[u8], parent_seq: &[u8], b: Real) -> Real {
        let b = b.max(0.0);
        let p_same = Self::p_same(b).clamp(1e-300, 1.0);
        let p_diff = ((1.0 - p_same) / 3.0).clamp(1e-300, 1.0);
        let (mut same, mut diff) = (0u64, 0u64);
        for (&c, &p) in child_seq.iter().zip(parent_seq.iter()) {
            if !is_informative(c) || !is_informative(p) {
                continue;
            }
            if c.to_ascii_uppercase() == p.to_ascii_uppercase() {
                same += 1;
            } else {
                diff += 1;
            }
        }
        same as Real * p_same.ln() + diff as Real * p_diff.ln()
    }

    fn name(&self) -> &'static str {
        "Jukes-Cantor"
    }
}

/// Resolve a substitution model by the identifier named in spec §6.
///
/// # Errors
/// Returns [`crate::errors::ClockTreeError::Configuration`] for any
/// identifier other than `"Jukes-Cantor"` (the only model in scope, per
/// `SPEC_FULL.md` §3).
pub fn resolve_model(identifier: &str) -> crate::errors::Result<Box<dyn SubstitutionModel>> {
    match identifier {
        "Jukes-Cantor" | "JC69" | "jukes-cantor" => Ok(Box::new(JukesCantor)),
        other => Err(crate::errors::ClockTreeError::Configuration(format!(
            "unknown substitution model identifier: {other}"
        ))),
    }
}
