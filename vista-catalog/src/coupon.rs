use serde::Serialize;

use crate::pricing::DiscountKind;

/// Static coupon descriptor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Coupon {
    pub code: &'static str,
    pub kind: DiscountKind,
    pub value: i64,
    pub description: &'static str,
}

impl Coupon {
    /// Amount off a subtotal, capped at the subtotal. `None` on overflow.
    pub fn amount_off(&self, subtotal: i64) -> Option<i64> {
        if subtotal <= 0 {
            return Some(0);
        }
        let off = match self.kind {
            DiscountKind::Percentage => subtotal.checked_mul(self.value)? / 100,
            DiscountKind::Fixed => self.value,
        };
        Some(off.min(subtotal))
    }
}

const WELCOME10: Coupon = Coupon {
    code: "WELCOME10",
    kind: DiscountKind::Percentage,
    value: 10,
    description: "10% off your booking",
};

const VISTA500: Coupon = Coupon {
    code: "VISTA500",
    kind: DiscountKind::Fixed,
    value: 500,
    description: "500 off your booking",
};

/// Case-insensitive lookup of one of the two promotional codes.
pub fn lookup(code: &str) -> Option<Coupon> {
    let code = code.trim();
    if code.eq_ignore_ascii_case(WELCOME10.code) {
        Some(WELCOME10)
    } else if code.eq_ignore_ascii_case(VISTA500.code) {
        Some(VISTA500)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup(" welcome10 ").unwrap().code, "WELCOME10");
        assert_eq!(lookup("Vista500").unwrap().value, 500);
        assert!(lookup("FREESTUFF").is_none());
        assert!(lookup("").is_none());
    }

    #[test]
    fn test_fixed_coupon_capped_at_subtotal() {
        let flat = lookup("VISTA500").unwrap();
        assert_eq!(flat.amount_off(10_000), Some(500));
        assert_eq!(flat.amount_off(200), Some(200));
        assert_eq!(flat.amount_off(0), Some(0));
    }

    #[test]
    fn test_percentage_coupon_reports_overflow() {
        let welcome = lookup("WELCOME10").unwrap();
        assert_eq!(welcome.amount_off(1_000), Some(100));
        assert_eq!(welcome.amount_off(i64::MAX / 2), None);
    }
}
