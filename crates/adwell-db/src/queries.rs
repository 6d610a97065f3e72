use crate::Database;
use crate::models::{AdRow, AdUpdate, CategoryRow, CouponRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;

const AD_COLS: &str = "id, company_name, description, category, country, city, image, logo, \
     phone, whatsapp, website, email, owner_email, is_vip, vip_expires_at, created_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
        phone: Option<&str>,
        role: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, name, phone, role) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, email, password_hash, name, phone, role],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, email, password, name, phone, role, created_at
                 FROM users ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([], user_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_user(
        &self,
        id: &str,
        name: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<UserRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE users SET name = COALESCE(?2, name), phone = COALESCE(?3, phone) WHERE id = ?1",
                rusqlite::params![id, name, phone],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user_by_id(conn, id)
        })
    }

    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Categories --

    pub fn upsert_category(
        &self,
        slug: &str,
        name_ar: &str,
        name_en: &str,
        image: &str,
        color: &str,
    ) -> Result<CategoryRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO categories (slug, name_ar, name_en, image, color) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(slug) DO UPDATE SET
                     name_ar = excluded.name_ar,
                     name_en = excluded.name_en,
                     image = excluded.image,
                     color = excluded.color",
                rusqlite::params![slug, name_ar, name_en, image, color],
            )?;
            Ok(CategoryRow {
                slug: slug.to_string(),
                name_ar: name_ar.to_string(),
                name_en: name_en.to_string(),
                image: image.to_string(),
                color: color.to_string(),
            })
        })
    }

    pub fn update_category_color(&self, slug: &str, color: &str) -> Result<Option<CategoryRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE categories SET color = ?2 WHERE slug = ?1",
                rusqlite::params![slug, color],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_category(conn, slug)
        })
    }

    pub fn get_category(&self, slug: &str) -> Result<Option<CategoryRow>> {
        self.with_conn(|conn| query_category(conn, slug))
    }

    pub fn list_categories(&self) -> Result<Vec<CategoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT slug, name_ar, name_en, image, color FROM categories ORDER BY slug",
            )?;
            let rows = stmt
                .query_map([], category_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Ads --

    pub fn insert_ad(&self, ad: &AdRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO ads ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                    AD_COLS
                ),
                rusqlite::params![
                    ad.id,
                    ad.company_name,
                    ad.description,
                    ad.category,
                    ad.country,
                    ad.city,
                    ad.image,
                    ad.logo,
                    ad.phone,
                    ad.whatsapp,
                    ad.website,
                    ad.email,
                    ad.owner_email,
                    ad.is_vip,
                    ad.vip_expires_at,
                    ad.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_ad(&self, id: &str) -> Result<Option<AdRow>> {
        self.with_conn(|conn| query_ad_by_id(conn, id))
    }

    /// Browse listings with optional filters. VIP placements come first,
    /// newest first within each tier.
    pub fn list_ads(
        &self,
        category: Option<&str>,
        country: Option<&str>,
        city: Option<&str>,
        q: Option<&str>,
    ) -> Result<Vec<AdRow>> {
        self.with_conn(|conn| {
            let mut sql = format!("SELECT {} FROM ads", AD_COLS);
            let mut clauses: Vec<String> = Vec::new();
            let mut values: Vec<String> = Vec::new();

            if let Some(category) = category {
                values.push(category.to_string());
                clauses.push(format!("category = ?{}", values.len()));
            }
            if let Some(country) = country {
                values.push(country.to_string());
                clauses.push(format!("country = ?{}", values.len()));
            }
            if let Some(city) = city {
                values.push(city.to_string());
                clauses.push(format!("city = ?{}", values.len()));
            }
            if let Some(q) = q {
                values.push(format!("%{}%", q));
                let n = values.len();
                clauses.push(format!(
                    "(company_name LIKE ?{n} OR description LIKE ?{n})"
                ));
            }

            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY is_vip DESC, created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = values
                .iter()
                .map(|v| v as &dyn rusqlite::types::ToSql)
                .collect();
            let rows = stmt
                .query_map(params.as_slice(), ad_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_ad(&self, id: &str, update: &AdUpdate) -> Result<Option<AdRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE ads SET
                    company_name = COALESCE(?2, company_name),
                    description  = COALESCE(?3, description),
                    category     = COALESCE(?4, category),
                    country      = COALESCE(?5, country),
                    city         = COALESCE(?6, city),
                    image        = COALESCE(?7, image),
                    logo         = COALESCE(?8, logo),
                    phone        = COALESCE(?9, phone),
                    whatsapp     = COALESCE(?10, whatsapp),
                    website      = COALESCE(?11, website),
                    email        = COALESCE(?12, email)
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    update.company_name,
                    update.description,
                    update.category,
                    update.country,
                    update.city,
                    update.image,
                    update.logo,
                    update.phone,
                    update.whatsapp,
                    update.website,
                    update.email,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_ad_by_id(conn, id)
        })
    }

    pub fn delete_ad(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM ads WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Set the VIP flag and expiry on a listing. Returns the updated row,
    /// or `None` when the id references nothing.
    pub fn set_ad_vip(
        &self,
        id: &str,
        is_vip: bool,
        vip_expires_at: Option<&str>,
    ) -> Result<Option<AdRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE ads SET is_vip = ?2, vip_expires_at = ?3 WHERE id = ?1",
                rusqlite::params![id, is_vip, vip_expires_at],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_ad_by_id(conn, id)
        })
    }

    /// Clear the VIP flag on listings whose paid period has lapsed.
    /// The expiry timestamp is kept so the lapse time stays visible.
    pub fn expire_lapsed_vips(&self, now: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE ads SET is_vip = 0
                 WHERE is_vip = 1 AND vip_expires_at IS NOT NULL AND vip_expires_at < ?1",
                [now],
            )?;
            Ok(changed)
        })
    }

    // -- Coupons --

    /// Create a coupon, active by default. Percent is clamped to [0, 100];
    /// re-creating an existing code overwrites it (last write wins) and
    /// re-activates it.
    pub fn upsert_coupon(&self, code: &str, percent: i64) -> Result<CouponRow> {
        let percent = percent.clamp(0, 100);
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO coupons (code, percent, active) VALUES (?1, ?2, 1)
                 ON CONFLICT(code) DO UPDATE SET percent = excluded.percent, active = 1",
                rusqlite::params![code, percent],
            )?;
            Ok(CouponRow {
                code: code.to_string(),
                percent,
                active: true,
            })
        })
    }

    pub fn set_coupon_active(&self, code: &str, active: bool) -> Result<Option<CouponRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE coupons SET active = ?2 WHERE code = ?1",
                rusqlite::params![code, active],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_coupon(conn, code)
        })
    }

    /// Lookup-if-active: `Some` only when the code matches a row whose
    /// active flag is set. Codes are case-sensitive. Absence of a valid
    /// coupon is not an error.
    pub fn find_active_coupon(&self, code: &str) -> Result<Option<CouponRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT code, percent, active FROM coupons WHERE code = ?1 AND active = 1")?;
            let row = stmt.query_row([code], coupon_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn list_coupons(&self) -> Result<Vec<CouponRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT code, percent, active FROM coupons ORDER BY created_at DESC")?;
            let rows = stmt
                .query_map([], coupon_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        name: row.get(3)?,
        phone: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        slug: row.get(0)?,
        name_ar: row.get(1)?,
        name_en: row.get(2)?,
        image: row.get(3)?,
        color: row.get(4)?,
    })
}

fn ad_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AdRow> {
    Ok(AdRow {
        id: row.get(0)?,
        company_name: row.get(1)?,
        description: row.get(2)?,
        category: row.get(3)?,
        country: row.get(4)?,
        city: row.get(5)?,
        image: row.get(6)?,
        logo: row.get(7)?,
        phone: row.get(8)?,
        whatsapp: row.get(9)?,
        website: row.get(10)?,
        email: row.get(11)?,
        owner_email: row.get(12)?,
        is_vip: row.get(13)?,
        vip_expires_at: row.get(14)?,
        created_at: row.get(15)?,
    })
}

fn coupon_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CouponRow> {
    Ok(CouponRow {
        code: row.get(0)?,
        percent: row.get(1)?,
        active: row.get(2)?,
    })
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password, name, phone, role, created_at FROM users WHERE email = ?1",
    )?;
    let row = stmt.query_row([email], user_from_row).optional()?;
    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, email, password, name, phone, role, created_at FROM users WHERE id = ?1",
    )?;
    let row = stmt.query_row([id], user_from_row).optional()?;
    Ok(row)
}

fn query_category(conn: &Connection, slug: &str) -> Result<Option<CategoryRow>> {
    let mut stmt = conn
        .prepare("SELECT slug, name_ar, name_en, image, color FROM categories WHERE slug = ?1")?;
    let row = stmt.query_row([slug], category_from_row).optional()?;
    Ok(row)
}

fn query_ad_by_id(conn: &Connection, id: &str) -> Result<Option<AdRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM ads WHERE id = ?1", AD_COLS))?;
    let row = stmt.query_row([id], ad_from_row).optional()?;
    Ok(row)
}

fn query_coupon(conn: &Connection, code: &str) -> Result<Option<CouponRow>> {
    let mut stmt = conn.prepare("SELECT code, percent, active FROM coupons WHERE code = ?1")?;
    let row = stmt.query_row([code], coupon_from_row).optional()?;
    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
