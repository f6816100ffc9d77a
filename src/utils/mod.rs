/// Convert decimal odds to implied probability
pub fn implied_probability(price: f64) -> f64 {
    1.0 / price
}

/// `1 - Σ 1/price`. Higher means a less lopsided, lower-margin market.
pub fn margin_deficit(prices: &[f64]) -> f64 {
    1.0 - prices.iter().map(|p| implied_probability(*p)).sum::<f64>()
}

/// Normalise a team name for comparison: lowercase, common club suffixes
/// and punctuation stripped, whitespace collapsed.
pub fn normalize_team_name(name: &str) -> String {
    let padded = format!(" {} ", name.to_lowercase().replace(['.', '-'], " "));
    let stripped = [" fc ", " afc ", " sc ", " cf "]
        .iter()
        .fold(padded, |acc, suffix| acc.replace(suffix, " "));
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Jaro–Winkler similarity of two team names after normalisation.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    strsim::jaro_winkler(&normalize_team_name(a), &normalize_team_name(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implied_probability() {
        assert_eq!(implied_probability(2.0), 0.5);
        assert_eq!(implied_probability(4.0), 0.25);
    }

    #[test]
    fn test_margin_deficit() {
        // 1/2 + 1/4 + 1/4 = 1 -> fair market
        assert!(margin_deficit(&[2.0, 4.0, 4.0]).abs() < 1e-12);
        // 1/1.9 + 1/3.4 + 1/4.2 ≈ 1.0585
        assert!((margin_deficit(&[1.9, 3.4, 4.2]) + 0.0585).abs() < 0.001);
    }

    #[test]
    fn test_margin_deficit_order_invariant() {
        let a = margin_deficit(&[2.1, 3.3, 3.6]);
        let b = margin_deficit(&[3.6, 2.1, 3.3]);
        let c = margin_deficit(&[3.3, 3.6, 2.1]);
        assert!((a - b).abs() < 1e-12);
        assert!((a - c).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_team_name() {
        assert_eq!(normalize_team_name("Brighton & Hove Albion FC"), "brighton & hove albion");
        assert_eq!(normalize_team_name("AFC Bournemouth"), "bournemouth");
        assert_eq!(normalize_team_name("Wolverhampton-Wanderers"), "wolverhampton wanderers");
    }

    #[test]
    fn test_name_similarity() {
        assert_eq!(name_similarity("Arsenal FC", "arsenal"), 1.0);
        assert!(name_similarity("Manchester City", "Manchester United") < 1.0);
        assert!(
            name_similarity("Manchester City", "Manchester City") >
                name_similarity("Manchester City", "Manchester United")
        );
    }
}
