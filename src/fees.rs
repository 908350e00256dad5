/// Compute-unit price selection
///
/// Maps a user's priority tier to a CU price in micro-lamports using the
/// `[fees]` config section (overridable through `DEX_CU_PRICE_MICRO*`).
use crate::config::FeesConfig;
use crate::logger::{self, LogTag};
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use std::str::FromStr;

const MICRO_LAMPORTS_PER_LAMPORT: u128 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityTier {
    Fast,
    Turbo,
    Ultra,
}

impl PriorityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityTier::Fast => "fast",
            PriorityTier::Turbo => "turbo",
            PriorityTier::Ultra => "ultra",
        }
    }

    /// Configured CU price for this tier
    pub fn cu_price(&self, fees: &FeesConfig) -> u64 {
        match self {
            PriorityTier::Fast => fees.cu_price_micro_fast,
            PriorityTier::Turbo => fees.cu_price_micro_turbo,
            PriorityTier::Ultra => fees.cu_price_micro_ultra,
        }
    }
}

impl FromStr for PriorityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(PriorityTier::Fast),
            "turbo" => Ok(PriorityTier::Turbo),
            "ultra" => Ok(PriorityTier::Ultra),
            other => Err(format!("Unknown priority tier '{}'", other)),
        }
    }
}

/// CU price for an optional tier name
///
/// Missing, empty or unknown tiers use the default price; a default of 0
/// means no explicit price (`None`).
pub fn choose_cu_price(tier: Option<&str>, fees: &FeesConfig) -> Option<u64> {
    let default = || (fees.cu_price_micro_default > 0).then_some(fees.cu_price_micro_default);

    match tier.map(str::trim).filter(|t| !t.is_empty()) {
        None => default(),
        Some(name) => match name.parse::<PriorityTier>() {
            Ok(tier) => Some(tier.cu_price(fees)),
            Err(e) => {
                logger::debug(LogTag::Fees, &format!("{}, using default CU price", e));
                default()
            }
        },
    }
}

/// Priority fee in lamports for `compute_units` at `cu_price_micro`, rounded up
pub fn priority_fee_lamports(cu_price_micro: u64, compute_units: u32) -> u64 {
    let micro = cu_price_micro as u128 * compute_units as u128;
    micro.div_ceil(MICRO_LAMPORTS_PER_LAMPORT) as u64
}

/// Same fee expressed in SOL, for display
pub fn priority_fee_sol(cu_price_micro: u64, compute_units: u32) -> f64 {
    priority_fee_lamports(cu_price_micro, compute_units) as f64 / LAMPORTS_PER_SOL as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_use_configured_prices() {
        let fees = FeesConfig::default();
        assert_eq!(choose_cu_price(Some("fast"), &fees), Some(500));
        assert_eq!(choose_cu_price(Some("TURBO"), &fees), Some(2_000));
        assert_eq!(choose_cu_price(Some(" ultra "), &fees), Some(10_000));
    }

    #[test]
    fn test_default_price_zero_means_none() {
        let fees = FeesConfig::default();
        assert_eq!(choose_cu_price(None, &fees), None);
        assert_eq!(choose_cu_price(Some(""), &fees), None);
        assert_eq!(choose_cu_price(Some("ludicrous"), &fees), None);

        let fees = FeesConfig {
            cu_price_micro_default: 150,
            ..FeesConfig::default()
        };
        assert_eq!(choose_cu_price(None, &fees), Some(150));
        assert_eq!(choose_cu_price(Some("ludicrous"), &fees), Some(150));
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("Fast".parse::<PriorityTier>(), Ok(PriorityTier::Fast));
        assert!("slow".parse::<PriorityTier>().is_err());
        assert_eq!(PriorityTier::Ultra.as_str(), "ultra");
    }

    #[test]
    fn test_priority_fee_conversion() {
        assert_eq!(priority_fee_lamports(500, 200_000), 100);
        assert_eq!(priority_fee_lamports(1, 1), 1);
        assert_eq!(priority_fee_lamports(0, 200_000), 0);
        assert!((priority_fee_sol(10_000, 200_000) - 0.000002).abs() < 1e-12);
    }
}
