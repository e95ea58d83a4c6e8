//! Composite resource identifier codec.
//!
//! Several control-plane resources are addressed through a single opaque id
//! field that actually packs multiple independent components (for example a
//! load-balancer endpoint rule is `server_protocol_port`). [`IdShape`]
//! describes one id kind as plain data: the delimiter, the accepted field
//! count, and which positions are case-folded so that equality is
//! case-insensitive on the wire. Encode and decode are pure functions with
//! no failure modes beyond validation.

use crate::error::EngineError;

/// Shape of one composite identifier kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IdShape {
    delimiter: char,
    min_fields: usize,
    max_fields: usize,
    folded: Vec<usize>,
}

impl IdShape {
    /// Creates a shape that accepts exactly `count` fields.
    #[must_use]
    pub const fn exact(delimiter: char, count: usize) -> Self {
        Self {
            delimiter,
            min_fields: count,
            max_fields: count,
            folded: Vec::new(),
        }
    }

    /// Creates a shape that accepts between `min` and `max` fields.
    #[must_use]
    pub const fn ranged(delimiter: char, min: usize, max: usize) -> Self {
        Self {
            delimiter,
            min_fields: min,
            max_fields: max,
            folded: Vec::new(),
        }
    }

    /// Marks the field at `position` as case-folded to lowercase.
    ///
    /// Folding applies on both encode and decode, so two differently-cased
    /// renderings of the same logical id produce equal structured values.
    #[must_use]
    pub fn fold_field(mut self, position: usize) -> Self {
        if !self.folded.contains(&position) {
            self.folded.push(position);
        }
        self
    }

    /// Delimiter used between fields.
    #[must_use]
    pub const fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Joins `fields` into one opaque identifier string.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when the field count falls outside
    /// the shape's bounds, a field is empty, or a field contains the
    /// delimiter.
    pub fn encode(&self, fields: &[&str]) -> Result<String, EngineError> {
        self.check_count(fields.len())?;
        let mut normalized = Vec::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            if field.is_empty() {
                return Err(EngineError::Validation(format!(
                    "composite id field {position} is empty"
                )));
            }
            if field.contains(self.delimiter) {
                return Err(EngineError::Validation(format!(
                    "composite id field {position} contains delimiter '{}'",
                    self.delimiter
                )));
            }
            normalized.push(self.normalize(position, field));
        }
        Ok(normalized.join(&self.delimiter.to_string()))
    }

    /// Splits an opaque identifier back into its normalized fields.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when the field count falls outside
    /// the shape's bounds or any field is empty.
    pub fn decode(&self, id: &str) -> Result<Vec<String>, EngineError> {
        let parts: Vec<&str> = id.split(self.delimiter).collect();
        self.check_count(parts.len())?;
        let mut fields = Vec::with_capacity(parts.len());
        for (position, part) in parts.iter().enumerate() {
            if part.is_empty() {
                return Err(EngineError::Validation(format!(
                    "composite id '{id}' has an empty field at position {position}"
                )));
            }
            fields.push(self.normalize(position, part));
        }
        Ok(fields)
    }

    /// Applies the shape's normalization to a field tuple without encoding.
    #[must_use]
    pub fn normalize_fields(&self, fields: &[&str]) -> Vec<String> {
        fields
            .iter()
            .enumerate()
            .map(|(position, field)| self.normalize(position, field))
            .collect()
    }

    fn normalize(&self, position: usize, field: &str) -> String {
        if self.folded.contains(&position) {
            field.to_lowercase()
        } else {
            field.to_owned()
        }
    }

    fn check_count(&self, count: usize) -> Result<(), EngineError> {
        if count < self.min_fields || count > self.max_fields {
            let expected = if self.min_fields == self.max_fields {
                format!("exactly {}", self.min_fields)
            } else {
                format!("between {} and {}", self.min_fields, self.max_fields)
            };
            return Err(EngineError::Validation(format!(
                "composite id has {count} field(s), expected {expected}"
            )));
        }
        Ok(())
    }
}
