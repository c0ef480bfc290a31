use chrono::NaiveTime;
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_generate_per_min: u32,

    pub api_prefix: String,

    /// Check-ins after this local time flip the day's status to `late`.
    /// Default is 09:15, i.e. 15 minutes after the 09:00 nominal start.
    pub late_cutoff: NaiveTime,

    // Geofence for check-in. Disabled by default.
    pub geofence_enabled: bool,
    pub office_latitude: f64,
    pub office_longitude: f64,
    pub geofence_radius_m: f64,

    /// Fixed presence-sheet template workbook.
    pub template_path: String,
    /// Root directory for generated sheets (`<root>/presence/<year>-<MM>/`).
    pub storage_root: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),

            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),
            rate_generate_per_min: env::var("RATE_GENERATE_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            late_cutoff: NaiveTime::parse_from_str(
                &env::var("LATE_CUTOFF").unwrap_or_else(|_| "09:15".to_string()),
                "%H:%M",
            )
            .expect("LATE_CUTOFF must be HH:MM"),

            geofence_enabled: env::var("GEOFENCE_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap(),
            office_latitude: env::var("OFFICE_LATITUDE")
                .unwrap_or_else(|_| "0.0".to_string())
                .parse()
                .unwrap(),
            office_longitude: env::var("OFFICE_LONGITUDE")
                .unwrap_or_else(|_| "0.0".to_string())
                .parse()
                .unwrap(),
            geofence_radius_m: env::var("GEOFENCE_RADIUS_M")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap(),

            template_path: env::var("PRESENCE_TEMPLATE_PATH")
                .unwrap_or_else(|_| "assets/presence_template.xlsx".to_string()),
            storage_root: env::var("STORAGE_ROOT").unwrap_or_else(|_| "storage".to_string()),
        }
    }
}
