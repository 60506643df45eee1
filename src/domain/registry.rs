//! Index registry: the fixed catalog of market indices and ETF proxies.
//!
//! Maps provider symbols to human-readable display names and back. The catalog
//! is compiled in; display names are unique.

use crate::domain::error::IndexboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    pub symbol: &'static str,
    pub display_name: &'static str,
}

const fn entry(symbol: &'static str, display_name: &'static str) -> IndexEntry {
    IndexEntry {
        symbol,
        display_name,
    }
}

pub const CATALOG: &[IndexEntry] = &[
    entry("^GSPC", "S&P 500 (US)"),
    entry("^IXIC", "NASDAQ Composite (US)"),
    entry("^DJI", "Dow Jones (US)"),
    entry("^RUT", "Russell 2000 (US)"),
    entry("VTI", "Wilshire 5000 ETF (US)"),
    entry("^GSPTSE", "S&P/TSX Composite (Canada)"),
    entry("^FTSE", "FTSE 100 (UK)"),
    entry("^GDAXI", "DAX (Germany)"),
    entry("^FCHI", "CAC 40 (France)"),
    entry("^STOXX50E", "Euro Stoxx 50 (Eurozone)"),
    entry("^IBEX", "IBEX 35 (Spain)"),
    entry("^N225", "Nikkei 225 (Japan)"),
    entry("^HSI", "Hang Seng (Hong Kong)"),
    entry("GXC", "SPDR S&P China ETF (proxy for Shanghai Composite)"),
    entry("ASHR", "CSI 300 ETF (China)"),
    entry("^KS11", "KOSPI (South Korea)"),
    entry("^BSESN", "SENSEX (India)"),
    entry("^NSEI", "NIFTY 50 (India)"),
    entry("^AXJO", "ASX 200 (Australia)"),
    entry("^BVSP", "Bovespa (Brazil)"),
    entry("^MXX", "IPC (Mexico)"),
    entry("^NYA", "NYSE Composite (US)"),
    entry("^SP500-45", "S&P 500 Energy (proxy)"),
    entry("ESGU", "S&P 500 ESG ETF"),
    entry("EEM", "MSCI Emerging Markets ETF"),
    entry("^VIX", "CBOE VOLATILITY (FEAR)"),
];

/// Selection shown when the user has not picked anything yet.
pub const DEFAULT_SELECTION: &[&str] = &["S&P 500 (US)", "NASDAQ Composite (US)"];

#[derive(Debug, Clone, Copy)]
pub struct IndexRegistry {
    entries: &'static [IndexEntry],
}

impl Default for IndexRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self { entries: CATALOG }
    }

    pub fn entries(&self) -> &'static [IndexEntry] {
        self.entries
    }

    /// Reverse lookup: display name to provider symbol.
    pub fn lookup_symbol(&self, display_name: &str) -> Result<&'static str, IndexboardError> {
        self.entries
            .iter()
            .find(|e| e.display_name == display_name)
            .map(|e| e.symbol)
            .ok_or_else(|| IndexboardError::UnknownIndex {
                name: display_name.to_string(),
            })
    }

    pub fn display_name(&self, symbol: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.symbol == symbol)
            .map(|e| e.display_name)
    }

    /// Display names in catalog order.
    pub fn all_display_names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.display_name).collect()
    }

    pub fn contains(&self, display_name: &str) -> bool {
        self.entries.iter().any(|e| e.display_name == display_name)
    }
}
