//! SQL identifiers that are safe to splice into DDL.
//!
//! Names read back from the system catalogs (constraint names, index names)
//! cannot be bound as parameters in `ALTER TABLE`/`DROP INDEX`, so they go
//! through [`Identifier::parse`] and are always rendered double-quoted.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::OpsError;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 63 bytes is the PostgreSQL NAMEDATALEN limit.
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    pub fn parse(name: &str) -> Result<Self, OpsError> {
        if identifier_pattern().is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(OpsError::UnsafeIdentifier(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for use in SQL text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_catalog_style_names() {
        for name in [
            "branches_pkey",
            "reviews_branch_id_fkey",
            "idx_branches_city",
            "_tmp1",
        ] {
            let ident = Identifier::parse(name).unwrap();
            assert_eq!(ident.quoted(), format!("\"{}\"", name));
        }
    }

    #[test]
    fn rejects_injection_attempts() {
        for name in [
            "",
            "1abc",
            "x; DROP TABLE users",
            "name\"quote",
            "with space",
            "semi;",
            "dash-name",
        ] {
            assert!(
                matches!(Identifier::parse(name), Err(OpsError::UnsafeIdentifier(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn enforces_length_limit() {
        assert!(Identifier::parse(&"a".repeat(63)).is_ok());
        assert!(Identifier::parse(&"a".repeat(64)).is_err());
    }
}
