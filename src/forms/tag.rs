use serde::Deserialize;
use validator::Validate;

use crate::domain::tag::{NewTag, UpdateTag, normalize_color};
use crate::domain::types::{TagName, TenantId};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
pub struct TagPayload {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub color: Option<String>,
}

impl TagPayload {
    pub fn into_new(self, tenant_id: TenantId) -> Result<NewTag, FormError> {
        self.validate()?;
        Ok(NewTag {
            tenant_id,
            name: TagName::new(ammonia::clean(&self.name))?,
            color: normalize_color(self.color.as_deref()),
        })
    }

    pub fn into_update(self) -> Result<UpdateTag, FormError> {
        self.validate()?;
        Ok(UpdateTag {
            name: TagName::new(ammonia::clean(&self.name))?,
            color: normalize_color(self.color.as_deref()),
        })
    }
}
