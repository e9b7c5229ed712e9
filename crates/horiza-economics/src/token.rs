// crates/horiza-economics/src/token.rs
//
// HZ (Horiza) token units.
//
// The smallest unit of HZ is the wei. 1 HZ = 10^18 wei. All internal
// accounting uses integer wei; `Hz` only exists for display and for
// building amounts in configuration and tests.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use horiza_core::{Amount, HorizaError, Result};

/// Number of wei in one HZ.
pub const WEI_PER_HZ: Amount = 1_000_000_000_000_000_000;

/// An HZ amount, wrapping its value in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Hz {
    /// Amount in wei (1 HZ = 10^18 wei).
    pub wei: Amount,
}

impl Hz {
    /// Create an amount from whole HZ.
    ///
    /// # Example
    /// ```
    /// use horiza_economics::token::Hz;
    /// assert_eq!(Hz::from_hz(3).wei, 3_000_000_000_000_000_000);
    /// ```
    pub fn from_hz(whole: u64) -> Self {
        Self {
            wei: whole as Amount * WEI_PER_HZ,
        }
    }

    pub fn from_wei(wei: Amount) -> Self {
        Self { wei }
    }

    pub fn zero() -> Self {
        Self { wei: 0 }
    }
}

impl fmt::Display for Hz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.wei / WEI_PER_HZ;
        let frac = self.wei % WEI_PER_HZ;
        if frac == 0 {
            write!(f, "{} HZ", whole)
        } else {
            // Up to 18 decimal places, trailing zeros trimmed
            let frac_str = format!("{:018}", frac);
            write!(f, "{}.{} HZ", whole, frac_str.trim_end_matches('0'))
        }
    }
}

/// Parses decimal HZ ("250", "0.5", "1.000000000000000001") or a raw wei
/// amount with a `wei` suffix ("42wei").
impl FromStr for Hz {
    type Err = HorizaError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || HorizaError::InvalidInput(format!("invalid HZ amount: {:?}", s));

        if let Some(wei) = s.strip_suffix("wei") {
            return wei.trim().parse().map(Hz::from_wei).map_err(|_| invalid());
        }

        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if frac.len() > 18 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: Amount = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let frac: Amount = if frac.is_empty() {
            0
        } else {
            format!("{:0<18}", frac).parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(WEI_PER_HZ)
            .and_then(|w| w.checked_add(frac))
            .map(Hz::from_wei)
            .ok_or_else(|| HorizaError::ArithmeticOverflow(format!("HZ amount {}", s)))
    }
}

/// `a * b / c`, truncating, with a 256-bit intermediate product.
///
/// Pool sizes times vote tallies routinely exceed 128 bits, so the product
/// is formed in `U256` and divided back down.
///
/// # Errors
/// `ArithmeticOverflow` if `c` is zero or the quotient does not fit.
pub fn mul_div(a: Amount, b: Amount, c: Amount, context: &str) -> Result<Amount> {
    if c == 0 {
        return Err(HorizaError::ArithmeticOverflow(format!("{}: division by zero", context)));
    }
    // Two 128-bit factors never overflow 256 bits.
    let quotient = U256::from(a) * U256::from(b) / U256::from(c);
    if quotient > U256::from(Amount::MAX) {
        return Err(HorizaError::ArithmeticOverflow(context.to_string()));
    }
    Ok(quotient.low_u128())
}
