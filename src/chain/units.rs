use alloy_primitives::U256;
use serde::Serialize;

/// Raw on-chain amount with the decimals needed to read it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenAmount {
    pub raw: U256,
    pub decimals: u8,
}

impl TokenAmount {
    pub fn new(raw: U256, decimals: u8) -> Self {
        Self { raw, decimals }
    }

    /// The "no account" default
    pub fn zero(decimals: u8) -> Self {
        Self::new(U256::ZERO, decimals)
    }

    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    pub fn to_f64(&self) -> f64 {
        to_f64(self.raw, self.decimals)
    }

    /// Exact decimal form with at least two fractional digits ("0.00", "12.5" -> "12.50")
    pub fn to_decimal_string(&self) -> String {
        let digits = self.raw.to_string();
        let decimals = self.decimals as usize;

        let (int_part, frac_part) = if decimals == 0 {
            (digits, String::new())
        } else if digits.len() > decimals {
            let split = digits.len() - decimals;
            (digits[..split].to_string(), digits[split..].to_string())
        } else {
            ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
        };

        let mut frac = frac_part.trim_end_matches('0').to_string();
        while frac.len() < 2 {
            frac.push('0');
        }
        format!("{}.{}", int_part, frac)
    }

    pub fn saturating_add(self, other: TokenAmount) -> TokenAmount {
        TokenAmount::new(self.raw.saturating_add(other.raw), self.decimals)
    }
}

/// Lossy conversion of a raw amount into whole units
pub fn to_f64(raw: U256, decimals: u8) -> f64 {
    if raw.is_zero() {
        return 0.0;
    }
    let whole: f64 = raw.to_string().parse().unwrap_or(0.0);
    whole / 10_f64.powi(decimals as i32)
}
