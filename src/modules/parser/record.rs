//! Closed-record field reader used by every decoder
//!
//! A [`Record`] wraps one mapping node. Fields are read by name; each read
//! declares the field. When the record is finished every key that was never
//! read is reported as an unexpected field, and all errors collected along the
//! way are returned together.

use portico_core::{ConfigError, ConfigErrors, ErrorKind, FieldPath, RawNode};
use portico_types::did_you_mean;

pub(crate) struct Record<'a> {
    path: FieldPath,
    what: String,
    entries: &'a [(String, RawNode)],
    consumed: Vec<bool>,
    declared: Vec<&'static str>,
    errors: ConfigErrors,
}

impl<'a> Record<'a> {
    /// Open a record over a mapping node
    pub fn new(node: &'a RawNode, path: &FieldPath, what: impl Into<String>) -> Result<Self, ConfigErrors> {
        match node {
            RawNode::Map(entries) => Ok(Self::over(entries, path, what.into())),
            other => Err(ConfigError::wrong_type(path.clone(), "a mapping", other.type_name()).into()),
        }
    }

    /// Like [`Record::new`], but `null` reads as an empty mapping
    pub fn new_or_empty(
        node: &'a RawNode,
        path: &FieldPath,
        what: impl Into<String>,
    ) -> Result<Self, ConfigErrors> {
        match node {
            RawNode::Null => Ok(Self::over(&[], path, what.into())),
            _ => Self::new(node, path, what),
        }
    }

    fn over(entries: &'a [(String, RawNode)], path: &FieldPath, what: String) -> Self {
        Self {
            path: path.clone(),
            what,
            entries,
            consumed: vec![false; entries.len()],
            declared: Vec::new(),
            errors: ConfigErrors::new(),
        }
    }

    /// Same record, described by a more specific variant name in messages
    pub fn renamed(mut self, what: impl Into<String>) -> Self {
        self.what = what.into();
        self
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn what(&self) -> &str {
        &self.what
    }

    pub fn field(&self, key: &str) -> FieldPath {
        self.path.key(key)
    }

    /// Look at a field without consuming it
    pub fn peek(&self, key: &str) -> Option<&'a RawNode> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn take(&mut self, key: &'static str) -> Option<(FieldPath, &'a RawNode)> {
        self.take_any(&[key])
    }

    /// Consume a field that has alternative spellings.
    ///
    /// The first spelling found wins; any further spelling present is an
    /// unexpected field.
    pub fn take_any(&mut self, keys: &[&'static str]) -> Option<(FieldPath, &'a RawNode)> {
        let mut found: Option<(&'static str, FieldPath, &'a RawNode)> = None;
        for &key in keys {
            self.declared.push(key);
            let Some(index) = self.entries.iter().position(|(k, _)| k == key) else {
                continue;
            };
            self.consumed[index] = true;
            match &found {
                Some((first, _, _)) => {
                    let message =
                        format!("'{}' is another spelling of '{}'; supply only one", key, first);
                    let error = ConfigError::new(self.field(key), ErrorKind::UnexpectedField, message);
                    self.errors.push(error);
                }
                None => found = Some((key, self.field(key), &self.entries[index].1)),
            }
        }
        found.map(|(_, path, node)| (path, node))
    }

    pub fn required<T>(
        &mut self,
        key: &'static str,
        decode: impl FnOnce(&FieldPath, &'a RawNode) -> Result<T, ConfigErrors>,
    ) -> Option<T> {
        self.required_any(&[key], decode)
    }

    pub fn required_any<T>(
        &mut self,
        keys: &[&'static str],
        decode: impl FnOnce(&FieldPath, &'a RawNode) -> Result<T, ConfigErrors>,
    ) -> Option<T> {
        match self.take_any(keys) {
            Some((path, node)) => self.errors.absorb(decode(&path, node)),
            None => {
                let error = ConfigError::missing_field(self.field(keys[0]), &self.what);
                self.errors.push(error);
                None
            }
        }
    }

    pub fn optional<T>(
        &mut self,
        key: &'static str,
        decode: impl FnOnce(&FieldPath, &'a RawNode) -> Result<T, ConfigErrors>,
    ) -> Option<T> {
        self.optional_any(&[key], decode)
    }

    pub fn optional_any<T>(
        &mut self,
        keys: &[&'static str],
        decode: impl FnOnce(&FieldPath, &'a RawNode) -> Result<T, ConfigErrors>,
    ) -> Option<T> {
        let (path, node) = self.take_any(keys)?;
        self.errors.absorb(decode(&path, node))
    }

    pub fn push(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    /// Stop decoding this record: remaining fields are not reported
    pub fn abort(mut self, errors: ConfigErrors) -> ConfigErrors {
        self.errors.extend(errors);
        self.errors
    }

    /// Report unread fields and hand back every collected error
    pub fn finish(mut self) -> ConfigErrors {
        for (index, (key, _)) in self.entries.iter().enumerate() {
            if self.consumed[index] {
                continue;
            }
            let suggestion = did_you_mean(key, self.declared.iter().copied());
            self.errors.push(ConfigError::unexpected_field(
                self.path.key(key.as_str()),
                &self.what,
                suggestion,
            ));
        }
        self.errors
    }

    /// Finish the record and assemble its value if nothing went wrong
    pub fn build<T>(self, assemble: impl FnOnce() -> Option<T>) -> Result<T, ConfigErrors> {
        let path = self.path.clone();
        let what = self.what.clone();
        let errors = self.finish();
        if !errors.is_empty() {
            return Err(errors);
        }
        assemble().ok_or_else(|| {
            ConfigError::invariant(path, format!("incomplete {}", what)).into()
        })
    }
}
