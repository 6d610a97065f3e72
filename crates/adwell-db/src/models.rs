/// Database row types — these map directly to SQLite rows.
/// Distinct from the adwell-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: String,
}

pub struct CategoryRow {
    pub slug: String,
    pub name_ar: String,
    pub name_en: String,
    pub image: String,
    pub color: String,
}

#[derive(Clone)]
pub struct AdRow {
    pub id: String,
    pub company_name: String,
    pub description: String,
    pub category: String,
    pub country: String,
    pub city: String,
    pub image: String,
    pub logo: Option<String>,
    pub phone: String,
    pub whatsapp: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub owner_email: Option<String>,
    pub is_vip: bool,
    pub vip_expires_at: Option<String>,
    pub created_at: String,
}

/// Partial listing update; `None` keeps the stored value.
#[derive(Default)]
pub struct AdUpdate {
    pub company_name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub image: Option<String>,
    pub logo: Option<String>,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
}

pub struct CouponRow {
    pub code: String,
    pub percent: i64,
    pub active: bool,
}
