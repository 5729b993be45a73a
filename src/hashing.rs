//! One-way password hashing (bcrypt).

use std::collections::HashSet;

use crate::error::GatewayError;

pub const DEFAULT_COST: u32 = 12;
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

pub fn hash(plaintext: &str, cost: u32) -> Result<String, GatewayError> {
    if plaintext.trim().is_empty() {
        return Err(GatewayError::invalid("value to hash must not be empty"));
    }
    if !(MIN_COST..=MAX_COST).contains(&cost) {
        return Err(GatewayError::invalid(format!(
            "hash cost must be between {MIN_COST} and {MAX_COST}, got {cost}"
        )));
    }
    bcrypt::hash(plaintext, cost).map_err(|e| GatewayError::Hash(e.to_string()))
}

/// Constant-time comparison of `plaintext` against a stored hash.
///
/// Malformed or empty hashes verify as `false`.
pub fn verify(plaintext: &str, stored: &str) -> bool {
    if plaintext.is_empty() || stored.trim().is_empty() {
        return false;
    }
    bcrypt::verify(plaintext, stored).unwrap_or(false)
}

/// Field names whose values are hashed before a write, matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptionDirective {
    fields: HashSet<String>,
}

impl EncryptionDirective {
    /// Parse a comma-separated directive such as `"contrasena, pin"`.
    ///
    /// `None` or a blank string yields an empty directive. A directive
    /// that has content but no usable field names, or a name with inner
    /// whitespace, is rejected.
    pub fn parse(directive: Option<&str>) -> Result<Self, GatewayError> {
        let Some(raw) = directive.filter(|d| !d.trim().is_empty()) else {
            return Ok(Self::default());
        };

        let mut fields = HashSet::new();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token.chars().any(char::is_whitespace) {
                return Err(GatewayError::invalid(format!(
                    "malformed encrypt directive: field '{token}' contains whitespace"
                )));
            }
            fields.insert(token.to_lowercase());
        }

        if fields.is_empty() {
            return Err(GatewayError::invalid(format!(
                "malformed encrypt directive: '{raw}' names no fields"
            )));
        }
        Ok(EncryptionDirective { fields })
    }

    pub fn covers(&self, field: &str) -> bool {
        self.fields.contains(&field.to_lowercase())
    }

    /// Lower-cased field names, in no particular order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}
