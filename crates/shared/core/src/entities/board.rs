use serde::{Deserialize, Serialize};

/// Listing board of a symbol; decides its daily price-limit rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Board {
    /// Shanghai/Shenzhen main board
    Main,
    /// Special-treatment (ST / *ST / delisting) stocks
    SpecialTreatment,
    /// ChiNext (300/301) and STAR market (688/689)
    Growth,
}

const SPECIAL_TREATMENT_MARKERS: [&str; 2] = ["ST", "退市"];
const GROWTH_PREFIXES: [&str; 4] = ["300", "301", "688", "689"];

impl Board {
    /// Classify a symbol such as `SH600000`, `SZ300750`, `*ST康美` or `688981.SH`
    pub fn classify(symbol: &str) -> Self {
        let upper = symbol.to_uppercase();
        if SPECIAL_TREATMENT_MARKERS.iter().any(|m| upper.contains(m)) {
            return Board::SpecialTreatment;
        }

        let code: String = symbol.chars().filter(|c| c.is_ascii_digit()).collect();
        if GROWTH_PREFIXES.iter().any(|p| code.starts_with(p)) {
            Board::Growth
        } else {
            Board::Main
        }
    }
}
