//! ATN configurations and configuration sets.
//!
//! A configuration is one live hypothesis during prediction: "alternative
//! `alt` could still match, and it is currently at `state`". A set of them is
//! the frontier after consuming some lookahead.
//!
//! `ConfigSet` is canonical (ordered and deduplicated), so two walks that
//! reach the same frontier produce equal sets. DFA state interning relies on
//! this.

use crate::{Alt, AltSet, SemanticContext};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::Follow;

/// Position of a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConfigState {
    /// Inside production `production`, before symbol `offset`.
    Body { production: usize, offset: usize },
    /// Past the decision's rule, before symbol `offset` of a follow sequence.
    Follow { follow: Follow, offset: usize },
    /// Everything this configuration needed has been matched.
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtnConfig {
    // Field order matters: sets iterate grouped by state.
    pub state: ConfigState,
    pub alt: Alt,
    pub semantic: SemanticContext,
}

impl AtnConfig {
    pub fn new(alt: Alt, state: ConfigState, semantic: SemanticContext) -> Self {
        AtnConfig { state, alt, semantic }
    }

    /// The same configuration one symbol further along.
    pub fn advanced(&self) -> Self {
        let state = match self.state {
            ConfigState::Body { production, offset } => ConfigState::Body { production, offset: offset + 1 },
            ConfigState::Follow { follow, offset } => ConfigState::Follow { follow, offset: offset + 1 },
            ConfigState::Stop => ConfigState::Stop,
        };
        AtnConfig { state, ..self.clone() }
    }

    pub fn with_state(&self, state: ConfigState) -> Self {
        AtnConfig { state, ..self.clone() }
    }

    pub fn is_stop(&self) -> bool {
        self.state == ConfigState::Stop
    }
}

impl fmt::Display for AtnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            ConfigState::Body { production, offset } => write!(f, "({}, p{production}:{offset}", self.alt)?,
            ConfigState::Follow { follow: Follow::Caller(rs), offset } => write!(f, "({}, r{rs}:{offset}", self.alt)?,
            ConfigState::Follow { follow: Follow::Eof, offset } => write!(f, "({}, eof:{offset}", self.alt)?,
            ConfigState::Stop => write!(f, "({}, stop", self.alt)?,
        }
        if !self.semantic.is_none() {
            write!(f, ", {}", self.semantic)?;
        }
        f.write_str(")")
    }
}

/// Canonical set of configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ConfigSet {
    configs: BTreeSet<AtnConfig>,
    full_ctx: bool,
}

impl ConfigSet {
    pub fn new(full_ctx: bool) -> Self {
        ConfigSet { configs: BTreeSet::new(), full_ctx }
    }

    pub fn add(&mut self, config: AtnConfig) -> bool {
        self.configs.insert(config)
    }

    /// `true` when the set was computed during full-context prediction.
    pub fn full_ctx(&self) -> bool {
        self.full_ctx
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtnConfig> {
        self.configs.iter()
    }

    pub fn alts(&self) -> AltSet {
        self.configs.iter().map(|c| c.alt).collect()
    }

    /// The single alternative predicted by every configuration, if any.
    pub fn unique_alt(&self) -> Option<Alt> {
        let mut alts = self.configs.iter().map(|c| c.alt);
        let first = alts.next()?;
        alts.all(|a| a == first).then_some(first)
    }

    pub fn has_semantic_context(&self) -> bool {
        self.configs.iter().any(|c| !c.semantic.is_none())
    }

    pub fn all_in_stop_state(&self) -> bool {
        self.configs.iter().all(AtnConfig::is_stop)
    }

    /// Alternatives grouped by configuration state, in state order.
    ///
    /// Two alternatives in the same group reached the same position on the
    /// same input, so no further lookahead can tell them apart.
    pub fn conflicting_alt_subsets(&self) -> Vec<AltSet> {
        let mut by_state: BTreeMap<ConfigState, AltSet> = BTreeMap::new();
        for c in &self.configs {
            by_state.entry(c.state).or_default().insert(c.alt);
        }
        by_state.into_values().collect()
    }
}

impl FromIterator<AtnConfig> for ConfigSet {
    fn from_iter<I: IntoIterator<Item = AtnConfig>>(iter: I) -> Self {
        ConfigSet { configs: iter.into_iter().collect(), full_ctx: false }
    }
}

impl fmt::Display for ConfigSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, c) in self.configs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("]")?;
        if self.full_ctx {
            f.write_str(" full-ctx")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(alt: Alt, production: usize, offset: usize) -> AtnConfig {
        AtnConfig::new(alt, ConfigState::Body { production, offset }, SemanticContext::None)
    }

    #[test]
    fn sets_are_canonical() {
        let a: ConfigSet = [body(2, 1, 0), body(1, 0, 0)].into_iter().collect();
        let b: ConfigSet = [body(1, 0, 0), body(2, 1, 0), body(1, 0, 0)].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn unique_alt_requires_agreement() {
        let mut set = ConfigSet::new(false);
        assert_eq!(set.unique_alt(), None);
        set.add(body(2, 0, 1));
        set.add(body(2, 1, 1));
        assert_eq!(set.unique_alt(), Some(2));
        set.add(body(3, 2, 1));
        assert_eq!(set.unique_alt(), None);
        assert_eq!(set.alts(), alts![2, 3]);
    }

    #[test]
    fn conflicting_subsets_group_by_state() {
        let follow = ConfigState::Follow { follow: Follow::Caller(0), offset: 0 };
        let set: ConfigSet = [
            AtnConfig::new(1, follow, SemanticContext::None),
            AtnConfig::new(3, follow, SemanticContext::None),
            body(2, 1, 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.conflicting_alt_subsets(), vec![alts![2], alts![1, 3]]);
    }

    #[test]
    fn advanced_moves_one_symbol() {
        let c = body(1, 0, 0).advanced();
        assert_eq!(c.state, ConfigState::Body { production: 0, offset: 1 });
        let stop = c.with_state(ConfigState::Stop);
        assert!(stop.advanced().is_stop());
        assert_eq!(stop.to_string(), "(1, stop)");
    }
}
