//! # Memory Cost Model
//!
//! Pure pricing for linear-memory growth. A transaction gets a small free
//! tier; beyond it, each page opened pays a linear rent and each page
//! allocated for the first time in the transaction's lifetime additionally
//! pays a ramp that grows with the high-water mark. Re-expanding into
//! pages the program has touched before pays only the linear term, so
//! first-time allocation is always priced at least as high.
//!
//! The same model prices the `MemGrow` host call and the one-time
//! footprint charge when a call enters a program whose memory already grew
//! earlier in the transaction.

/// Bytes per linear-memory page.
pub const PAGE_SIZE: usize = 64 * 1024;

/// Hard cap on pages a module may ever hold open.
pub const PAGE_LIMIT: u16 = 128;

/// Default pages in the free tier.
pub const INITIAL_FREE_PAGES: u16 = 2;

/// Default base gas per billable page.
pub const INITIAL_PAGE_GAS: u16 = 1000;

/// Linear-memory growth pricing.
#[derive(Clone, Copy, Debug)]
pub struct MemoryModel {
    free_pages: u16,
    page_gas: u16,
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self {
            free_pages: INITIAL_FREE_PAGES,
            page_gas: INITIAL_PAGE_GAS,
        }
    }
}

impl MemoryModel {
    /// Creates a model with explicit parameters.
    #[must_use]
    pub fn new(free_pages: u16, page_gas: u16) -> Self {
        Self {
            free_pages,
            page_gas,
        }
    }

    /// Gas to open `pages` more pages, given the pages currently open and
    /// the pages ever allocated in this transaction.
    #[must_use]
    pub fn gas_cost(&self, pages: u16, open: u16, ever: u16) -> u64 {
        let new_open = open.saturating_add(pages);
        let new_ever = ever.max(new_open);

        // free tier
        if new_ever <= self.free_pages {
            return 0;
        }

        let billable = |p: u16| u64::from(p.saturating_sub(self.free_pages));
        let linear = billable(new_open)
            .saturating_sub(billable(open))
            .saturating_mul(u64::from(self.page_gas));
        let expand = self.ramp(new_ever) - self.ramp(ever.min(new_ever));
        linear.saturating_add(expand)
    }

    /// Cumulative first-allocation charge for a lifetime high-water mark
    /// of `pages`. Monotone non-decreasing in `pages`.
    fn ramp(&self, pages: u16) -> u64 {
        let billable = u64::from(pages.saturating_sub(self.free_pages));
        // triangular growth keeps late pages strictly pricier than early ones
        billable * (billable + 1) / 2 * u64::from(self.page_gas)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_point() {
        let model = MemoryModel::default();
        assert_eq!(model.gas_cost(0, 0, 0), 0);
    }

    #[test]
    fn test_free_tier_is_free() {
        let model = MemoryModel::new(4, 1000);
        assert_eq!(model.gas_cost(4, 0, 0), 0);
        assert_eq!(model.gas_cost(1, 3, 3), 0);
        assert_ne!(model.gas_cost(5, 0, 0), 0);
    }

    #[test]
    fn test_ramp_monotone_in_ever() {
        let model = MemoryModel::default();
        let mut last = 0;
        for ever in 0..PAGE_LIMIT {
            let cumulative = model.ramp(ever);
            assert!(cumulative >= last, "ramp regressed at {ever}");
            last = cumulative;
        }
    }

    #[test]
    fn test_first_allocation_pricier_than_reexpansion() {
        let model = MemoryModel::default();
        for open in 0..32u16 {
            // first time: the new page raises the high-water mark
            let fresh = model.gas_cost(1, open, open);
            // re-expansion: the page was touched earlier in this tx
            let retouch = model.gas_cost(1, open, open + 1);
            assert!(fresh >= retouch, "fresh {fresh} < retouch {retouch} at {open}");
        }
        assert!(model.gas_cost(1, 16, 16) > model.gas_cost(1, 16, 32));
    }

    #[test]
    fn test_cost_never_negative_and_saturates() {
        let model = MemoryModel::new(0, u16::MAX);
        // large requests saturate instead of wrapping
        let huge = model.gas_cost(u16::MAX, u16::MAX, 0);
        assert!(huge > 0);
    }

    #[test]
    fn test_split_growth_costs_no_less_than_bulk() {
        let model = MemoryModel::default();
        let bulk = model.gas_cost(10, 0, 0);
        let first = model.gas_cost(5, 0, 0);
        let second = model.gas_cost(5, 5, 5);
        assert_eq!(first + second, bulk);
    }
}
