use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            name        TEXT,
            phone       TEXT,
            role        TEXT NOT NULL DEFAULT 'advertiser',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS categories (
            slug        TEXT PRIMARY KEY,
            name_ar     TEXT NOT NULL,
            name_en     TEXT NOT NULL,
            image       TEXT NOT NULL,
            color       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ads (
            id              TEXT PRIMARY KEY,
            company_name    TEXT NOT NULL,
            description     TEXT NOT NULL,
            category        TEXT NOT NULL REFERENCES categories(slug),
            country         TEXT NOT NULL,
            city            TEXT NOT NULL,
            image           TEXT NOT NULL,
            logo            TEXT,
            phone           TEXT NOT NULL,
            whatsapp        TEXT,
            website         TEXT,
            email           TEXT,
            owner_email     TEXT,
            is_vip          INTEGER NOT NULL DEFAULT 0,
            vip_expires_at  TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_ads_category
            ON ads(category, is_vip);

        CREATE INDEX IF NOT EXISTS idx_ads_vip_expiry
            ON ads(vip_expires_at) WHERE is_vip = 1;

        CREATE TABLE IF NOT EXISTS coupons (
            code        TEXT PRIMARY KEY,
            percent     INTEGER NOT NULL,
            active      INTEGER NOT NULL DEFAULT 1,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Seed the default category set
        INSERT OR IGNORE INTO categories (slug, name_ar, name_en, image, color) VALUES
            ('commerce',    'تجارة',        'Commerce',    '/placeholder.svg?height=400&width=600', '#1e88e5'),
            ('restaurants', 'مطاعم',        'Restaurants', '/placeholder.svg?height=400&width=600', '#e53935'),
            ('real-estate', 'عقارات',       'Real Estate', '/placeholder.svg?height=400&width=600', '#43a047'),
            ('services',    'خدمات',        'Services',    '/placeholder.svg?height=400&width=600', '#fb8c00'),
            ('medical',     'طبي',          'Medical',     '/placeholder.svg?height=400&width=600', '#8e24aa'),
            ('travel',      'سفر وسياحة',   'Travel',      '/placeholder.svg?height=400&width=600', '#00acc1');
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
