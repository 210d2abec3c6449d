//! Timezone resolution with UTC fallback.

use chrono_tz::Tz;

/// Resolve a requested zone id. Blank or absent means UTC; an unknown id is logged and replaced with UTC, never rejected.
pub fn resolve_timezone(requested: Option<&str>) -> Tz {
    let Some(name) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Tz::UTC;
    };
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(e) => {
            log::warn!("invalid timezone {:?}, falling back to UTC: {}", name, e);
            Tz::UTC
        }
    }
}
