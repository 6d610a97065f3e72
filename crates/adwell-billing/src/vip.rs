use adwell_db::Database;
use adwell_db::models::AdRow;
use chrono::{DateTime, Duration, Utc};

use crate::BillingError;

/// One paid placement period.
pub const VIP_PERIOD_DAYS: i64 = 30;

/// Flip a listing's VIP state. Activation extends the paid period from
/// max(now, current expiry), so renewing before lapse stacks rather than
/// restarting the clock; deactivation clears the expiry. Repeated
/// activation leaves the flag true with no error.
pub fn set_vip(db: &Database, ad_id: &str, is_vip: bool) -> Result<AdRow, BillingError> {
    if !is_vip {
        return db
            .set_ad_vip(ad_id, false, None)?
            .ok_or_else(|| BillingError::AdNotFound(ad_id.to_string()));
    }

    let current = db
        .get_ad(ad_id)?
        .ok_or_else(|| BillingError::AdNotFound(ad_id.to_string()))?;

    let now = Utc::now();
    let from = current
        .vip_expires_at
        .as_deref()
        .and_then(parse_expiry)
        .filter(|t| *t > now)
        .unwrap_or(now);
    let expires = (from + Duration::days(VIP_PERIOD_DAYS)).to_rfc3339();

    db.set_ad_vip(ad_id, true, Some(&expires))?
        .ok_or_else(|| BillingError::AdNotFound(ad_id.to_string()))
}

fn parse_expiry(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Clear the VIP flag on listings whose paid period has lapsed.
pub fn expire_lapsed(db: &Database) -> anyhow::Result<usize> {
    db.expire_lapsed_vips(&Utc::now().to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_ad(db: &Database, id: &str) {
        db.insert_ad(&AdRow {
            id: id.to_string(),
            company_name: "Acme".to_string(),
            description: "A test listing".to_string(),
            category: "commerce".to_string(),
            country: "SA".to_string(),
            city: "Riyadh".to_string(),
            image: "/placeholder.svg?height=400&width=600".to_string(),
            logo: None,
            phone: "+966500000000".to_string(),
            whatsapp: None,
            website: None,
            email: None,
            owner_email: Some("owner@example.com".to_string()),
            is_vip: false,
            vip_expires_at: None,
            created_at: Utc::now().to_rfc3339(),
        })
        .unwrap();
    }

    #[test]
    fn activation_sets_flag_and_full_period() {
        let db = Database::open_in_memory().unwrap();
        seed_ad(&db, "A1");

        let before = Utc::now();
        let ad = set_vip(&db, "A1", true).unwrap();
        assert!(ad.is_vip);

        let expires = parse_expiry(ad.vip_expires_at.as_deref().unwrap()).unwrap();
        assert!(expires > before + Duration::days(VIP_PERIOD_DAYS - 1));
    }

    #[test]
    fn renewal_extends_from_current_expiry() {
        let db = Database::open_in_memory().unwrap();
        seed_ad(&db, "A1");

        let first = set_vip(&db, "A1", true).unwrap();
        let second = set_vip(&db, "A1", true).unwrap();

        // Still active either way (flag idempotence), but the paid period stacked.
        assert!(first.is_vip);
        assert!(second.is_vip);

        let first_expiry = parse_expiry(first.vip_expires_at.as_deref().unwrap()).unwrap();
        let second_expiry = parse_expiry(second.vip_expires_at.as_deref().unwrap()).unwrap();
        assert!(second_expiry > first_expiry + Duration::days(VIP_PERIOD_DAYS - 1));
    }

    #[test]
    fn deactivation_clears_expiry() {
        let db = Database::open_in_memory().unwrap();
        seed_ad(&db, "A1");

        set_vip(&db, "A1", true).unwrap();
        let ad = set_vip(&db, "A1", false).unwrap();
        assert!(!ad.is_vip);
        assert!(ad.vip_expires_at.is_none());
    }

    #[test]
    fn unknown_listing_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        match set_vip(&db, "missing", true) {
            Err(BillingError::AdNotFound(id)) => assert_eq!(id, "missing"),
            other => panic!("expected AdNotFound, got {:?}", other.map(|a| a.id)),
        }
    }

    #[test]
    fn corrupt_expiry_falls_back_to_a_fresh_period() {
        let db = Database::open_in_memory().unwrap();
        seed_ad(&db, "A1");
        db.set_ad_vip("A1", true, Some("not-a-timestamp")).unwrap();

        let before = Utc::now();
        let ad = set_vip(&db, "A1", true).unwrap();
        let expires = parse_expiry(ad.vip_expires_at.as_deref().unwrap()).unwrap();
        assert!(expires > before + Duration::days(VIP_PERIOD_DAYS - 1));
        assert!(expires < before + Duration::days(VIP_PERIOD_DAYS + 1));
    }
}
