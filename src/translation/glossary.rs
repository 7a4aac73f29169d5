/*!
 * User-supplied glossary and literal pre-substitution.
 *
 * Two strategies exist, chosen by the backend: backends that cannot accept
 * structured glossary hints get the terms substituted into the source text
 * before the call (longest source term first, so overlapping terms resolve
 * to the most specific match); backends whose prompt format understands
 * glossaries receive the mapping as `source->target` hint lines instead.
 */

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;

use crate::errors::TranslationError;

/// Mapping from source term to target term
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Glossary(BTreeMap<String, String>);

impl Glossary {
    /// Create an empty glossary
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a term
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        self.0.insert(source.into(), target.into());
    }

    /// Whether the glossary has no terms
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of terms
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the terms
    pub fn entries(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    /// Replace every literal occurrence of each source term with its
    /// target term, longest source term first.
    pub fn apply(&self, text: &str) -> String {
        let mut terms: Vec<(&String, &String)> = self.0.iter().collect();
        terms.sort_by_key(|(source, _)| std::cmp::Reverse(source.chars().count()));

        let mut result = text.to_string();
        for (source, target) in terms {
            result = result.replace(source.as_str(), target);
        }
        result
    }

    /// Glossary as `source->target` hint lines for prompt embedding
    pub fn hint_lines(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|(source, target)| format!("{}->{}", source, target))
            .collect()
    }
}

impl FromIterator<(String, String)> for Glossary {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Wrap a translation call with glossary pre-substitution.
///
/// Applies the glossary to each line of the segment and invokes `translate`
/// exactly once with the substituted lines. Retrying is backend policy, not
/// the wrapper's; the inner result is returned unmodified. Substitution is
/// per line, so the output line count only depends on the inner call.
pub async fn translate_with_glossary<F, Fut>(
    seg: &[String],
    glossary: &Glossary,
    translate: F,
) -> Result<Vec<String>, TranslationError>
where
    F: FnOnce(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<String>, TranslationError>>,
{
    let substituted: Vec<String> = seg.iter().map(|line| glossary.apply(line)).collect();
    translate(substituted).await
}
