//! Protein search terms with optional organism prefix

use super::types::QueryError;

/// Organism codes recognised without a colon separator (e.g. "HsBBS7")
pub const KNOWN_ORGANISM_CODES: [&str; 9] = ["Hs", "Cr", "Mm", "Dm", "Ce", "Sc", "Dr", "Xl", "Rn"];

/// A parsed protein identifier
///
/// Matches UniProt IDs, gene names, common names, aliases and source paths
/// by case-insensitive substring. An organism code restricts matches to
/// interactions where bait or prey belongs to that organism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    /// The identifier as given
    pub raw: String,
    /// The identifier with any organism prefix removed
    pub term: String,
    pub organism_code: Option<String>,
}

impl SearchTerm {
    /// Parse `Hs:BBS7`, `HsBBS7` or a bare identifier
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(QueryError::EmptySearchTerm);
        }

        let (organism_code, term) = match split_colon_prefix(raw).or_else(|| split_known_prefix(raw)) {
            Some((code, rest)) => (Some(code.to_string()), rest.to_string()),
            None => (None, raw.to_string()),
        };

        Ok(Self {
            raw: raw.to_string(),
            term,
            organism_code,
        })
    }

    /// A bare identifier without organism restriction
    pub fn exact(term: impl Into<String>) -> Self {
        let term = term.into();
        Self {
            raw: term.clone(),
            term,
            organism_code: None,
        }
    }

    /// SQL LIKE pattern for substring matching, escaped with `\`
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.term.len() + 2);
        pattern.push('%');
        for c in self.term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

/// `Xx:rest` where `Xx` is an uppercase letter followed by a lowercase one
fn split_colon_prefix(raw: &str) -> Option<(&str, &str)> {
    let (code, rest) = raw.split_once(':')?;
    let mut chars = code.chars();
    let valid = matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(a), Some(b), None) if a.is_ascii_uppercase() && b.is_ascii_lowercase()
    );
    (valid && !rest.is_empty()).then_some((code, rest))
}

/// Known code in canonical casing, followed by an uppercase letter or digit.
/// "HsBBS7" splits; "Cep290" and "CEP290" do not.
fn split_known_prefix(raw: &str) -> Option<(&str, &str)> {
    KNOWN_ORGANISM_CODES.iter().find_map(|code| {
        let rest = raw.strip_prefix(code)?;
        let next = rest.chars().next()?;
        (next.is_ascii_uppercase() || next.is_ascii_digit()).then_some((*code, rest))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_identifier() {
        let term = SearchTerm::parse("BBS7").unwrap();
        assert_eq!(term.term, "BBS7");
        assert_eq!(term.organism_code, None);
    }

    #[test]
    fn test_colon_prefix() {
        let term = SearchTerm::parse("Cr:IFT144").unwrap();
        assert_eq!(term.term, "IFT144");
        assert_eq!(term.organism_code.as_deref(), Some("Cr"));
        assert_eq!(term.raw, "Cr:IFT144");
    }

    #[test]
    fn test_known_prefix_without_colon() {
        let term = SearchTerm::parse("HsBBS7").unwrap();
        assert_eq!(term.term, "BBS7");
        assert_eq!(term.organism_code.as_deref(), Some("Hs"));
    }

    #[test]
    fn test_gene_names_that_look_like_prefixes_are_kept() {
        for name in ["Cep290", "CEP290", "Hs", "Scaffold"] {
            let term = SearchTerm::parse(name).unwrap();
            assert_eq!(term.term, name, "{name} should not be split");
            assert_eq!(term.organism_code, None);
        }
    }

    #[test]
    fn test_invalid_colon_prefix_is_literal() {
        let term = SearchTerm::parse("HS:BBS7").unwrap();
        assert_eq!(term.term, "HS:BBS7");
        assert_eq!(term.organism_code, None);
    }

    #[test]
    fn test_empty_term_rejected() {
        assert!(matches!(SearchTerm::parse("  "), Err(QueryError::EmptySearchTerm)));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(SearchTerm::exact("IFT_70%").like_pattern(), "%IFT\\_70\\%%");
    }
}
