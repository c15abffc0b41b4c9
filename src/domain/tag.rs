use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{TagId, TagName, TenantId};

pub const DEFAULT_TAG_COLOR: &str = "#6b7280";

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Tag {
    pub id: TagId,
    pub tenant_id: TenantId,
    pub name: TagName,
    pub color: String,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug)]
pub struct NewTag {
    pub tenant_id: TenantId,
    pub name: TagName,
    pub color: String,
}

#[derive(Clone, Debug)]
pub struct UpdateTag {
    pub name: TagName,
    pub color: String,
}

/// Accepts `#rgb` or `#rrggbb` colours, falling back to the default grey.
pub fn normalize_color(color: Option<&str>) -> String {
    match color.map(str::trim) {
        Some(c)
            if (c.len() == 4 || c.len() == 7)
                && c.starts_with('#')
                && c[1..].chars().all(|ch| ch.is_ascii_hexdigit()) =>
        {
            c.to_lowercase()
        }
        _ => DEFAULT_TAG_COLOR.to_string(),
    }
}
