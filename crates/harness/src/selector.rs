//! Union selectors
//!
//! Diagram markup differs slightly between renderer versions, so one logical
//! element is usually described by several CSS alternatives. A [`Selector`]
//! holds those alternatives as a non-empty set and matches an element if any
//! alternative does.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{HarnessError, HarnessResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<String>,
}

impl Selector {
    /// Build a selector from a set of alternatives.
    ///
    /// Alternatives are trimmed and deduplicated in first-seen order. Fails if
    /// no alternatives are given or any of them is blank.
    pub fn any_of<I, S>(alternatives: I) -> HarnessResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for alt in alternatives {
            let alt = alt.into();
            let alt = alt.trim();
            if alt.is_empty() {
                return Err(HarnessError::InvalidSelector(
                    "blank selector alternative".to_string(),
                ));
            }
            if !out.iter().any(|a| a == alt) {
                out.push(alt.to_string());
            }
        }

        if out.is_empty() {
            return Err(HarnessError::InvalidSelector(
                "selector needs at least one alternative".to_string(),
            ));
        }

        Ok(Self { alternatives: out })
    }

    /// Single-alternative selector
    pub fn one(selector: impl Into<String>) -> HarnessResult<Self> {
        Self::any_of([selector.into()])
    }

    /// Selector from a known-good literal
    pub(crate) fn literal(selector: &'static str) -> Self {
        Self {
            alternatives: vec![selector.to_string()],
        }
    }

    /// Union of known-good, distinct literals
    pub(crate) fn literals(alternatives: &[&'static str]) -> Self {
        debug_assert!(!alternatives.is_empty());
        Self {
            alternatives: alternatives.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// Every alternative of `self` combined with every alternative of
    /// `children` as a descendant selector.
    pub fn descendants(&self, children: &Selector) -> Selector {
        let mut alternatives = Vec::with_capacity(self.alternatives.len() * children.alternatives.len());
        for parent in &self.alternatives {
            for child in &children.alternatives {
                let combined = format!("{} {}", parent, child);
                if !alternatives.contains(&combined) {
                    alternatives.push(combined);
                }
            }
        }
        Selector { alternatives }
    }

    /// CSS selector list understood by the browser engine
    pub fn to_css(&self) -> String {
        self.alternatives.join(", ")
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

impl std::str::FromStr for Selector {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::one(s)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SelectorRepr {
    One(String),
    Many(Vec<String>),
}

impl Serialize for Selector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.alternatives.as_slice() {
            [single] => SelectorRepr::One(single.clone()).serialize(serializer),
            many => SelectorRepr::Many(many.to_vec()).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Selector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match SelectorRepr::deserialize(deserializer)? {
            SelectorRepr::One(s) => Selector::one(s),
            SelectorRepr::Many(v) => Selector::any_of(v),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}
