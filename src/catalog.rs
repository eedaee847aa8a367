//! Fixed, ordered list of companies the user can pick from.
//!
//! Selection is positional, so the order of [`DEFAULT_COMPANIES`] is part of the
//! contract: index 0 is always Apple.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Company {
    pub display_name: &'static str,
    pub ticker: &'static str,
}

impl Company {
    pub const fn new(display_name: &'static str, ticker: &'static str) -> Self {
        Self {
            display_name,
            ticker,
        }
    }
}

pub const DEFAULT_COMPANIES: &[Company] = &[
    Company::new("Apple", "AAPL"),
    Company::new("Microsoft", "MSFT"),
    Company::new("Google", "GOOG"),
    Company::new("Amazon", "AMZN"),
    Company::new("Facebook", "FB"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    companies: &'static [Company],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(DEFAULT_COMPANIES)
    }
}

impl Catalog {
    pub const fn new(companies: &'static [Company]) -> Self {
        Self { companies }
    }

    pub fn count(&self) -> usize {
        self.companies.len()
    }

    pub fn get(&self, index: usize) -> Option<&Company> {
        self.companies.get(index)
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.get(index).map(|c| c.display_name)
    }

    pub fn ticker_at(&self, index: usize) -> Option<&str> {
        self.get(index).map(|c| c.ticker)
    }

    /// Index of the company with this ticker, ignoring ASCII case.
    pub fn position(&self, ticker: &str) -> Option<usize> {
        self.companies
            .iter()
            .position(|c| c.ticker.eq_ignore_ascii_case(ticker.trim()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Company> {
        self.companies.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_has_a_stable_non_empty_ticker() {
        let catalog = Catalog::default();
        assert_eq!(catalog.count(), 5);

        for i in 0..catalog.count() {
            let first = catalog.ticker_at(i).unwrap();
            assert!(!first.is_empty());
            assert_eq!(catalog.ticker_at(i), Some(first));
            assert!(!catalog.name_at(i).unwrap().is_empty());
        }
    }

    #[test]
    fn order_is_positional() {
        let catalog = Catalog::default();
        assert_eq!(catalog.name_at(0), Some("Apple"));
        assert_eq!(catalog.ticker_at(0), Some("AAPL"));
        assert_eq!(catalog.ticker_at(4), Some("FB"));
    }

    #[test]
    fn out_of_range_is_none() {
        let catalog = Catalog::default();
        assert_eq!(catalog.name_at(5), None);
        assert_eq!(catalog.ticker_at(usize::MAX), None);
    }

    #[test]
    fn position_ignores_case() {
        let catalog = Catalog::default();
        assert_eq!(catalog.position("msft"), Some(1));
        assert_eq!(catalog.position(" AMZN "), Some(3));
        assert_eq!(catalog.position("TSLA"), None);
    }
}
