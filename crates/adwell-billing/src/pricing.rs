use adwell_db::Database;
use adwell_types::models::{Coupon, Plan};
use anyhow::Result;

/// Monthly plan prices in integer cents. All money in this crate is cents;
/// dollars exist only at the display edge, and the cent value itself is the
/// provider's minor-unit amount at the charge boundary.
pub const VIP_MONTHLY_CENTS: i64 = 2999;
pub const STANDARD_MONTHLY_CENTS: i64 = 999;

pub fn base_price_cents(plan: Plan) -> i64 {
    match plan {
        Plan::Vip => VIP_MONTHLY_CENTS,
        Plan::Standard => STANDARD_MONTHLY_CENTS,
    }
}

/// A resolved charge. Computed on demand, never persisted.
#[derive(Debug, Clone)]
pub struct Quote {
    pub plan: Plan,
    pub base_cents: i64,
    pub coupon: Option<Coupon>,
    pub amount_cents: i64,
}

/// Resolve the charge for a plan. A coupon applies only when a non-empty
/// code matches an active registry entry; unknown or inactive codes mean
/// "no discount", never an error.
pub fn quote(db: &Database, plan: Plan, coupon_code: Option<&str>) -> Result<Quote> {
    let base_cents = base_price_cents(plan);

    let coupon = match coupon_code {
        Some(code) if !code.is_empty() => db.find_active_coupon(code)?.map(|row| Coupon {
            code: row.code,
            percent: row.percent.clamp(0, 100) as u8,
            active: row.active,
        }),
        _ => None,
    };

    let amount_cents = match &coupon {
        Some(coupon) => discounted_cents(base_cents, coupon.percent),
        None => base_cents,
    };

    Ok(Quote {
        plan,
        base_cents,
        coupon,
        amount_cents,
    })
}

/// Integer division floors, i.e. the discount rounds in the customer's
/// favor: $29.99 at 50% is $14.99.
fn discounted_cents(base_cents: i64, percent: u8) -> i64 {
    (base_cents * (100 - i64::from(percent)) / 100).max(0)
}

pub fn dollars(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_code_quotes_base_price() {
        let db = Database::open_in_memory().unwrap();
        let q = quote(&db, Plan::Vip, None).unwrap();
        assert_eq!(q.amount_cents, VIP_MONTHLY_CENTS);
        assert!(q.coupon.is_none());

        let q = quote(&db, Plan::Standard, None).unwrap();
        assert_eq!(q.amount_cents, STANDARD_MONTHLY_CENTS);
    }

    #[test]
    fn empty_and_unknown_codes_quote_base_price() {
        let db = Database::open_in_memory().unwrap();
        let q = quote(&db, Plan::Vip, Some("")).unwrap();
        assert_eq!(q.amount_cents, VIP_MONTHLY_CENTS);

        let q = quote(&db, Plan::Vip, Some("NOSUCH")).unwrap();
        assert_eq!(q.amount_cents, VIP_MONTHLY_CENTS);
        assert!(q.coupon.is_none());
    }

    #[test]
    fn inactive_coupons_never_discount() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_coupon("SAVE50", 50).unwrap();
        db.set_coupon_active("SAVE50", false).unwrap();

        let q = quote(&db, Plan::Vip, Some("SAVE50")).unwrap();
        assert_eq!(q.amount_cents, VIP_MONTHLY_CENTS);
        assert!(q.coupon.is_none());
    }

    #[test]
    fn half_off_vip_floors_to_1499() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_coupon("SAVE50", 50).unwrap();

        let q = quote(&db, Plan::Vip, Some("SAVE50")).unwrap();
        assert_eq!(q.amount_cents, 1499);
        assert_eq!(dollars(q.amount_cents), 14.99);
        assert_eq!(q.coupon.as_ref().unwrap().percent, 50);
    }

    #[test]
    fn full_discount_is_free_not_negative() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_coupon("FREE", 100).unwrap();

        let q = quote(&db, Plan::Vip, Some("FREE")).unwrap();
        assert_eq!(q.amount_cents, 0);
    }

    #[test]
    fn clamped_overlarge_percent_behaves_as_full_discount() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_coupon("HUGE", 150).unwrap();

        let q = quote(&db, Plan::Standard, Some("HUGE")).unwrap();
        assert_eq!(q.amount_cents, 0);
    }
}
