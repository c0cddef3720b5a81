//! Prediction modes and conflict analysis.
//!
//! These helpers decide when lookahead can stop. They only look at the
//! shape of a [`ConfigSet`]: which alternatives share a configuration state.
//!
//! ```text
//! subsets by state:   {1} {2}     -> keep going, states still differ
//!                     {1,2}       -> conflict: more input cannot separate 1 and 2
//!                     {1,2} {2}   -> keep going, state with a lone alt may still win
//! ```

use crate::{Alt, AltSet, ConfigSet};
use std::fmt;
use std::str::FromStr;

/// How hard prediction tries before settling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PredictionMode {
    /// Context-insensitive only. Conflicts resolve to the lowest alternative.
    Sll,
    /// SLL first, full-context LL on conflict. Stops at the first conflict
    /// that resolves to a single minimum alternative.
    #[default]
    Ll,
    /// Like [`PredictionMode::Ll`] but keeps consuming until an ambiguity is
    /// exact (every subset conflicts with the same alternatives).
    LlExactAmbigDetection,
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PredictionMode::Sll => "sll",
            PredictionMode::Ll => "ll",
            PredictionMode::LlExactAmbigDetection => "ll-exact",
        })
    }
}

impl FromStr for PredictionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sll" => Ok(PredictionMode::Sll),
            "ll" => Ok(PredictionMode::Ll),
            "ll-exact" | "exact" => Ok(PredictionMode::LlExactAmbigDetection),
            other => Err(format!("unknown prediction mode '{other}' (expected sll, ll or ll-exact)")),
        }
    }
}

/// Whether SLL prediction should stop on `configs` because of a conflict.
///
/// True when every configuration has reached rule stop, or when some state
/// is shared by several alternatives and no state is owned by exactly one.
pub fn has_sll_conflict_terminating_prediction(configs: &ConfigSet) -> bool {
    if configs.all_in_stop_state() {
        return true;
    }
    let subsets = configs.conflicting_alt_subsets();
    has_conflicting_alt_set(&subsets) && !has_state_associated_with_one_alt(&subsets)
}

pub fn has_conflicting_alt_set(subsets: &[AltSet]) -> bool {
    subsets.iter().any(|s| s.len() > 1)
}

pub fn has_state_associated_with_one_alt(subsets: &[AltSet]) -> bool {
    subsets.iter().any(|s| s.len() == 1)
}

pub fn all_subsets_conflict(subsets: &[AltSet]) -> bool {
    !has_state_associated_with_one_alt(subsets)
}

pub fn all_subsets_equal(subsets: &[AltSet]) -> bool {
    match subsets.split_first() {
        Some((first, rest)) => rest.iter().all(|s| s == first),
        None => true,
    }
}

/// The alternative every subset would resolve to, if they agree.
///
/// Each subset resolves to its lowest alternative; when all of them pick the
/// same one, more lookahead cannot change the answer.
pub fn single_viable_alt(subsets: &[AltSet]) -> Option<Alt> {
    let mut mins = subsets.iter().map(AltSet::lowest);
    let first = mins.next()??;
    mins.all(|m| m == Some(first)).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AtnConfig, ConfigState, Follow, SemanticContext};

    fn at(alt: Alt, state: ConfigState) -> AtnConfig {
        AtnConfig::new(alt, state, SemanticContext::None)
    }

    const SHARED: ConfigState = ConfigState::Follow { follow: Follow::Eof, offset: 0 };
    const OWN: ConfigState = ConfigState::Body { production: 0, offset: 1 };

    #[test]
    fn all_stop_terminates() {
        let set: ConfigSet = [at(1, ConfigState::Stop), at(2, ConfigState::Stop)].into_iter().collect();
        assert!(has_sll_conflict_terminating_prediction(&set));
    }

    #[test]
    fn lone_alt_state_keeps_going() {
        let set: ConfigSet = [at(1, SHARED), at(2, SHARED), at(2, OWN)].into_iter().collect();
        assert!(!has_sll_conflict_terminating_prediction(&set));

        let set: ConfigSet = [at(1, SHARED), at(2, SHARED)].into_iter().collect();
        assert!(has_sll_conflict_terminating_prediction(&set));
    }

    #[test]
    fn single_viable_alt_needs_matching_minimums() {
        assert_eq!(single_viable_alt(&[alts![1, 2], alts![1, 3]]), Some(1));
        assert_eq!(single_viable_alt(&[alts![1, 2], alts![2, 3]]), None);
        assert_eq!(single_viable_alt(&[]), None);
    }

    #[test]
    fn subset_predicates() {
        let subsets = [alts![1, 2], alts![1, 2]];
        assert!(all_subsets_conflict(&subsets));
        assert!(all_subsets_equal(&subsets));
        assert!(!all_subsets_equal(&[alts![1, 2], alts![2, 3]]));
        assert!(!all_subsets_conflict(&[alts![1, 2], alts![4]]));
    }

    #[test]
    fn mode_round_trips_through_strings() {
        for mode in [PredictionMode::Sll, PredictionMode::Ll, PredictionMode::LlExactAmbigDetection] {
            assert_eq!(mode.to_string().parse::<PredictionMode>(), Ok(mode));
        }
        assert!("fast".parse::<PredictionMode>().is_err());
    }
}
