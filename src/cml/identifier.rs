use super::error::{CmlError, CmlResult, XPath};
use nom::{
    bytes::complete::take_while,
    character::complete::satisfy,
    combinator::{all_consuming, recognize},
    sequence::pair,
    IResult,
};
use std::collections::HashMap;

/// A letter followed by any run of letters, digits, `.`, `-` or `_`.
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')),
    ))(input)
}

pub fn is_valid_id(id: &str) -> bool {
    all_consuming(identifier)(id).is_ok()
}

/// Fail with `InvalidIdentifier` unless `id` is lexically valid. `path` locates the `@id`.
pub fn validate_id(path: &XPath, id: &str) -> CmlResult<()> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(CmlError::invalid_identifier(path, id))
    }
}

/// Identifiers seen so far within one molecule, mapped to the index of the
/// atom or bond that declared them. Lookups are case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct IdScope {
    ids: HashMap<String, usize>,
}

impl IdScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id` for `index`, failing if another element already holds it.
    pub fn register(&mut self, path: &XPath, id: &str, index: usize) -> CmlResult<()> {
        if self.ids.contains_key(id) {
            return Err(CmlError::duplicate_identifier(path, id));
        }
        self.ids.insert(id.to_string(), index);
        Ok(())
    }

    pub fn resolve(&self, id: &str) -> Option<usize> {
        self.ids.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
