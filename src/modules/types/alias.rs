//! Alias tables: every accepted spelling of a construct mapped to one identity

use std::fmt;

/// Accepted spellings for one construct class.
///
/// The first spelling listed for an identity is its canonical name.
/// Lookup is an exact, case-sensitive match.
#[derive(Debug)]
pub struct AliasTable<T: 'static> {
    class: &'static str,
    entries: &'static [(&'static str, T)],
}

impl<T: Copy + PartialEq + 'static> AliasTable<T> {
    pub const fn new(class: &'static str, entries: &'static [(&'static str, T)]) -> Self {
        Self { class, entries }
    }

    /// Human readable name of the construct class (e.g. "middleware")
    pub fn class(&self) -> &'static str {
        self.class
    }

    /// Resolve a raw spelling to its canonical identity
    pub fn resolve(&self, raw: &str) -> Result<T, UnknownAlias> {
        self.entries
            .iter()
            .find(|(spelling, _)| *spelling == raw)
            .map(|(_, identity)| *identity)
            .ok_or_else(|| UnknownAlias {
                class: self.class,
                value: raw.to_string(),
                accepted: self.spellings().collect(),
                suggestion: did_you_mean(raw, self.spellings()),
            })
    }

    /// Every accepted spelling, in declaration order
    pub fn spellings(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(spelling, _)| *spelling)
    }

    /// Reverse lookup: all spellings accepted for `identity`
    pub fn spellings_of(&self, identity: T) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(_, id)| *id == identity)
            .map(|(spelling, _)| *spelling)
            .collect()
    }
}

/// A spelling that matched nothing in its construct class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAlias {
    pub class: &'static str,
    pub value: String,
    pub accepted: Vec<&'static str>,
    pub suggestion: Option<&'static str>,
}

impl fmt::Display for UnknownAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown {} '{}', expected one of: {}",
            self.class,
            self.value,
            self.accepted.join(", ")
        )?;
        if let Some(suggestion) = self.suggestion {
            write!(f, " (did you mean '{}'?)", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for UnknownAlias {}

/// Closest candidate to `input` by edit distance, if it is close enough to be useful
pub fn did_you_mean<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let threshold = (input.chars().count() / 2).max(2);
    candidates
        .into_iter()
        .map(|candidate| (levenshtein(input, candidate), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Declare a closed construct class together with its alias table.
///
/// ```ignore
/// construct! {
///     pub enum StopMethod in "stop method" {
///         Pause => "pause",
///         Stop => "stop",
///     }
/// }
/// ```
macro_rules! construct {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident in $class:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $canonical:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Accepted spellings, canonical spelling first
            pub const ALIASES: $crate::alias::AliasTable<$name> = $crate::alias::AliasTable::new(
                $class,
                &[ $( ($canonical, $name::$variant), $( ($alias, $name::$variant), )* )+ ],
            );

            /// Every identity in this class
            pub fn all() -> &'static [$name] {
                &[ $( $name::$variant ),+ ]
            }

            /// Canonical spelling
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $canonical ),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::alias::UnknownAlias;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALIASES.resolve(s)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

pub(crate) use construct;
