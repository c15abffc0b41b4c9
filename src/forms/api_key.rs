use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ApiKeyPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

impl ApiKeyPayload {
    pub fn name(self) -> Result<String, validator::ValidationErrors> {
        self.validate()?;
        Ok(ammonia::clean(self.name.trim()))
    }
}
