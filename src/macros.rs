#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build an [`AltSet`](crate::AltSet) from alternative numbers.
#[macro_export]
macro_rules! alts {
    ($($alt:expr),* $(,)?) => {{
        let mut set = $crate::AltSet::new();
        $( set.insert($alt); )*
        set
    }};
}

/// Implement [`DecisionEvent`](crate::DecisionEvent) for a record that embeds
/// a `base: DecisionEventInfo` field.
macro_rules! decision_event {
    ($($ty:ident),* $(,)?) => {
        $(
            impl $crate::DecisionEvent for $ty {
                fn base(&self) -> &$crate::DecisionEventInfo {
                    &self.base
                }
            }
        )*
    };
}
