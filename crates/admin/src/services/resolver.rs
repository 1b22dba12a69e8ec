//! Product resolution seam: free-text order description to canonical
//! product lines.
//!
//! The allocator consumes resolver output as-is; it never retries or
//! second-guesses a match. The shipped [`CatalogResolver`] only does
//! canonical (case-insensitive exact) name lookup with an optional leading
//! quantity, e.g. `"3x Mailer Box"`.

use async_trait::async_trait;
use sqlx::PgPool;

use parceldesk_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};

/// One resolved order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLine {
    /// Canonical product.
    pub product_id: ProductId,
    /// Units ordered.
    pub quantity: i32,
}

/// Maps a free-text order description to zero or more canonical product
/// lines.
#[async_trait]
pub trait ProductResolver: Send + Sync {
    /// Resolve a description. An empty vec means "no match" and is an
    /// expected outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog lookup fails.
    async fn resolve(&self, description: &str) -> Result<Vec<ResolvedLine>, RepositoryError>;
}

/// Resolver backed by the product catalog: exact case-insensitive name
/// match, with an optional `"<n>x "` / `"<n> x "` quantity prefix.
pub struct CatalogResolver<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogResolver<'a> {
    /// Create a new catalog resolver.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductResolver for CatalogResolver<'_> {
    async fn resolve(&self, description: &str) -> Result<Vec<ResolvedLine>, RepositoryError> {
        let (quantity, name) = split_quantity_prefix(description.trim());
        if name.is_empty() {
            return Ok(vec![]);
        }

        let product = ProductRepository::new(self.pool).get_by_name(name).await?;
        Ok(product
            .map(|p| ResolvedLine {
                product_id: p.id,
                quantity,
            })
            .into_iter()
            .collect())
    }
}

/// Split an optional leading quantity off a description: `"3x Widget"` and
/// `"3 x Widget"` both yield `(3, "Widget")`; anything else yields
/// `(1, text)`.
fn split_quantity_prefix(text: &str) -> (i32, &str) {
    let digits_end = text.find(|c: char| !c.is_ascii_digit()).unwrap_or(0);
    if digits_end == 0 {
        return (1, text);
    }

    let Some((digits, rest)) = text.split_at_checked(digits_end) else {
        return (1, text);
    };
    let name = rest
        .strip_prefix("x ")
        .or_else(|| rest.strip_prefix(" x "))
        .map(str::trim_start);

    match (digits.parse::<i32>(), name) {
        (Ok(qty), Some(name)) if qty > 0 && !name.is_empty() => (qty, name),
        _ => (1, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_prefix_with_x() {
        assert_eq!(split_quantity_prefix("3x Mailer Box"), (3, "Mailer Box"));
    }

    #[test]
    fn test_quantity_prefix_with_spaced_x() {
        assert_eq!(split_quantity_prefix("2 x Tape Roll"), (2, "Tape Roll"));
    }

    #[test]
    fn test_no_prefix_defaults_to_one() {
        assert_eq!(split_quantity_prefix("Mailer Box"), (1, "Mailer Box"));
    }

    #[test]
    fn test_bare_number_is_not_a_prefix() {
        assert_eq!(split_quantity_prefix("90210"), (1, "90210"));
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        assert_eq!(split_quantity_prefix("0x Widget"), (1, "0x Widget"));
    }

    #[test]
    fn test_number_inside_name_is_untouched() {
        assert_eq!(split_quantity_prefix("Box 40cm"), (1, "Box 40cm"));
    }
}
