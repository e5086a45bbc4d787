//! The filter key identifying a transaction feed.

use crate::Error;

/// The filters defining one transaction feed: a month and year plus an
/// optional free-text search.
///
/// Equality over the whole struct is what identifies a feed. A page fetched
/// under one set of filters must never be applied to a feed showing a
/// different set, which is why the coordinator compares filters by
/// generation when a fetch completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFilters {
    /// The month to show transactions for (1-12).
    pub month: u8,
    /// The year to show transactions for.
    pub year: i32,
    /// Free-text search over transaction categories.
    ///
    /// An empty string means no text filter.
    pub search: String,
}

impl FeedFilters {
    /// Create the filters for one month's feed of transactions.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `month` is outside the range 1-12.
    pub fn new(month: u8, year: i32, search: &str) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth(month));
        }

        Ok(Self {
            month,
            year,
            search: search.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::FeedFilters;

    #[test]
    fn new_rejects_invalid_months() {
        assert_eq!(FeedFilters::new(0, 2026, ""), Err(Error::InvalidMonth(0)));
        assert_eq!(FeedFilters::new(13, 2026, ""), Err(Error::InvalidMonth(13)));
    }

    #[test]
    fn new_trims_the_search_text() {
        let got = FeedFilters::new(3, 2026, "  coffee ").unwrap();

        assert_eq!(got.search, "coffee");
    }
}
