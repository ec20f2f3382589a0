//! Exact decimal ETH amounts.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Decimals of one ether.
pub const ETH_DECIMALS: usize = 18;

const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is required")]
    Empty,
    #[error("Invalid amount format")]
    Format,
    #[error("Too many decimal places")]
    TooManyDecimals,
    #[error("Amount is too large")]
    Overflow,
}

/// An amount of ether held as an integer number of wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Wei(pub u128);

impl Wei {
    pub const ZERO: Wei = Wei(0);

    /// Parse a decimal ETH string such as `"1"`, `"0.25"` or `".5"`.
    pub fn parse_eth(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let mut parts = s.split('.');
        let int = parts.next().unwrap_or("");
        let frac = parts.next().unwrap_or("");
        if parts.next().is_some() || (int.is_empty() && frac.is_empty()) {
            return Err(AmountError::Format);
        }
        if !int.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(AmountError::Format);
        }
        if frac.len() > ETH_DECIMALS {
            return Err(AmountError::TooManyDecimals);
        }

        let int_wei = if int.is_empty() {
            0
        } else {
            int.parse::<u128>()
                .map_err(|_| AmountError::Overflow)?
                .checked_mul(WEI_PER_ETH)
                .ok_or(AmountError::Overflow)?
        };
        let frac_wei = if frac.is_empty() {
            0
        } else {
            format!("{:0<width$}", frac, width = ETH_DECIMALS)
                .parse::<u128>()
                .map_err(|_| AmountError::Format)?
        };

        int_wei
            .checked_add(frac_wei)
            .map(Wei)
            .ok_or(AmountError::Overflow)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn saturating_sub(self, other: Wei) -> Wei {
        Wei(self.0.saturating_sub(other.0))
    }

    /// Format with exactly `decimals` fractional digits, rounding half up.
    pub fn to_fixed(&self, decimals: usize) -> String {
        let decimals = decimals.min(ETH_DECIMALS);
        let scale = 10u128.pow((ETH_DECIMALS - decimals) as u32);
        let rounded = if scale > 1 {
            (self.0 + scale / 2) / scale
        } else {
            self.0
        };
        let unit = 10u128.pow(decimals as u32);
        let int = rounded / unit;
        if decimals == 0 {
            return int.to_string();
        }
        let frac = rounded % unit;
        format!("{}.{:0width$}", int, frac, width = decimals)
    }
}

impl fmt::Display for Wei {
    /// Shortest exact representation, e.g. `1.5` or `0.000001`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / WEI_PER_ETH;
        let frac = self.0 % WEI_PER_ETH;
        if frac == 0 {
            return write!(f, "{}", int);
        }
        let frac = format!("{:018}", frac);
        write!(f, "{}.{}", int, frac.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_eth() {
        assert_eq!(Wei::parse_eth("1").unwrap(), Wei(WEI_PER_ETH));
        assert_eq!(Wei::parse_eth("0.5").unwrap(), Wei(WEI_PER_ETH / 2));
        assert_eq!(Wei::parse_eth(".5").unwrap(), Wei(WEI_PER_ETH / 2));
        assert_eq!(Wei::parse_eth(" 2. ").unwrap(), Wei(2 * WEI_PER_ETH));
        assert_eq!(Wei::parse_eth("0.000000000000000001").unwrap(), Wei(1));
    }

    #[test]
    fn test_parse_eth_rejects() {
        assert_eq!(Wei::parse_eth(""), Err(AmountError::Empty));
        assert_eq!(Wei::parse_eth("."), Err(AmountError::Format));
        assert_eq!(Wei::parse_eth("1.2.3"), Err(AmountError::Format));
        assert_eq!(Wei::parse_eth("-1"), Err(AmountError::Format));
        assert_eq!(Wei::parse_eth("1e5"), Err(AmountError::Format));
        assert_eq!(
            Wei::parse_eth("0.0000000000000000001"),
            Err(AmountError::TooManyDecimals)
        );
    }

    #[test]
    fn test_to_fixed_rounds_half_up() {
        let w = Wei::parse_eth("1.23456").unwrap();
        assert_eq!(w.to_fixed(4), "1.2346");
        assert_eq!(w.to_fixed(2), "1.23");
        assert_eq!(w.to_fixed(0), "1");
        assert_eq!(Wei::parse_eth("0.99999").unwrap().to_fixed(4), "1.0000");
    }

    #[test]
    fn test_display_trims_zeros() {
        assert_eq!(Wei::parse_eth("1.500").unwrap().to_string(), "1.5");
        assert_eq!(Wei::parse_eth("3").unwrap().to_string(), "3");
        assert_eq!(Wei::parse_eth("0.000001").unwrap().to_string(), "0.000001");
    }

    #[test]
    fn test_subtraction() {
        let a = Wei::parse_eth("5").unwrap();
        let b = Wei::parse_eth("1.25").unwrap();
        assert_eq!(a.saturating_sub(b).to_fixed(4), "3.7500");
        assert_eq!(b.saturating_sub(a), Wei::ZERO);
    }
}
