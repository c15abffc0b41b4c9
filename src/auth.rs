//! Request authentication.
//!
//! Dashboard users arrive with an identity cookie whose id is a JWT issued by
//! the auth service. Integrations send an `X-API-Key` header instead. Both
//! resolve to a [`TenantContext`] that scopes every query.

use std::future::{Ready, ready};

use actix_identity::IdentityExt;
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::domain::api_key::ApiKey;
use crate::domain::tenant::Tenant;
use crate::models::config::ServerConfig;
use crate::repository::{ApiKeyReader, ApiKeyWriter, DieselRepository, TenantReader};
use crate::services::{ServiceError, ServiceResult};

pub const API_KEY_HEADER: &str = "X-API-Key";
pub const TENANT_SLUG_HEADER: &str = "X-Tenant-Slug";
pub const API_KEY_PREFIX: &str = "bf_";

/// Claims of the session JWT.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    pub sub: String,
    pub email: String,
    pub name: String,
    /// Organization the user acts for; maps onto a tenant.
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: usize,
}

impl AuthenticatedUser {
    pub fn from_jwt(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        let data = decode::<AuthenticatedUser>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }

    pub fn to_jwt(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::new(Algorithm::HS256),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }
}

fn server_config(req: &HttpRequest) -> ServiceResult<&web::Data<ServerConfig>> {
    req.app_data::<web::Data<ServerConfig>>().ok_or_else(|| {
        log::error!("ServerConfig is not registered as app data");
        ServiceError::Internal("Internal server error".to_string())
    })
}

fn session_user(req: &HttpRequest, secret: &str) -> Option<AuthenticatedUser> {
    let identity = req.get_identity().ok()?;
    let token = identity.id().ok()?;
    match AuthenticatedUser::from_jwt(&token, secret) {
        Ok(user) => Some(user),
        Err(e) => {
            log::info!("Rejected session token: {e}");
            None
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = server_config(req).and_then(|config| {
            session_user(req, &config.secret).ok_or_else(ServiceError::unauthorized)
        });
        ready(result)
    }
}

/// Credentials presented by a request, in order of precedence.
#[derive(Clone, Debug, PartialEq)]
pub enum Credentials {
    ApiKey {
        key: String,
        tenant_slug: Option<String>,
    },
    Session(AuthenticatedUser),
    Anonymous,
}

/// How the caller proved access to the tenant.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthMethod {
    Session(AuthenticatedUser),
    ApiKey(ApiKey),
    InternalKey,
}

/// The tenant every operation of the request is scoped to.
#[derive(Clone, Debug)]
pub struct TenantContext {
    pub tenant: Tenant,
    pub method: AuthMethod,
}

fn constant_time_eq(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Resolves the tenant for a set of credentials.
///
/// * the internal key acts for the tenant named by `X-Tenant-Slug`;
/// * any other key must match a stored key hash, whose `last_used_at` is
///   refreshed;
/// * a session resolves through the user's organization.
pub fn resolve_tenant<R>(
    repo: &R,
    credentials: Credentials,
    internal_api_key: Option<&str>,
) -> ServiceResult<TenantContext>
where
    R: TenantReader + ApiKeyReader + ApiKeyWriter + ?Sized,
{
    match credentials {
        Credentials::ApiKey { key, tenant_slug } => {
            if internal_api_key.is_some_and(|internal| constant_time_eq(&key, internal)) {
                let slug = tenant_slug.filter(|s| !s.trim().is_empty()).ok_or_else(|| {
                    ServiceError::Validation(format!(
                        "{TENANT_SLUG_HEADER} header is required with the internal API key"
                    ))
                })?;
                let tenant = repo
                    .get_tenant_by_slug(slug.trim())?
                    .ok_or_else(|| ServiceError::not_found("Tenant"))?;
                return Ok(TenantContext {
                    tenant,
                    method: AuthMethod::InternalKey,
                });
            }

            let api_key = repo
                .get_api_key_by_hash(&hash_api_key(&key))?
                .ok_or_else(|| ServiceError::Unauthorized("Invalid API key".to_string()))?;
            if let Err(e) = repo.touch_api_key(api_key.id, Utc::now().naive_utc()) {
                log::error!("Failed to record API key usage: {e}");
            }
            let tenant = repo
                .get_tenant_by_id(api_key.tenant_id)?
                .ok_or_else(|| ServiceError::not_found("Tenant"))?;
            Ok(TenantContext {
                tenant,
                method: AuthMethod::ApiKey(api_key),
            })
        }
        Credentials::Session(user) => {
            let org_id = user
                .org_id
                .as_deref()
                .ok_or_else(|| ServiceError::not_found("Tenant"))?;
            let tenant = repo
                .get_tenant_by_org_id(org_id)?
                .ok_or_else(|| ServiceError::not_found("Tenant"))?;
            Ok(TenantContext {
                tenant,
                method: AuthMethod::Session(user),
            })
        }
        Credentials::Anonymous => Err(ServiceError::unauthorized()),
    }
}

fn header_value(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Reads the credentials of a request without touching storage.
pub fn credentials_from_request(req: &HttpRequest, secret: &str) -> Credentials {
    if let Some(key) = header_value(req, API_KEY_HEADER) {
        return Credentials::ApiKey {
            key,
            tenant_slug: header_value(req, TENANT_SLUG_HEADER),
        };
    }
    session_user(req, secret)
        .map(Credentials::Session)
        .unwrap_or(Credentials::Anonymous)
}

impl FromRequest for TenantContext {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = (|| {
            let config = server_config(req)?;
            let repo = req
                .app_data::<web::Data<DieselRepository>>()
                .ok_or_else(|| ServiceError::Internal("Internal server error".to_string()))?;
            let credentials = credentials_from_request(req, &config.secret);
            resolve_tenant(
                repo.get_ref(),
                credentials,
                config.internal_api_key.as_deref(),
            )
        })();
        ready(result)
    }
}

/// Whether an `Authorization` header carries the cron secret. Always false
/// when no secret is configured.
pub fn check_cron_secret(authorization: Option<&str>, cron_secret: Option<&str>) -> bool {
    let Some(secret) = cron_secret.filter(|s| !s.is_empty()) else {
        return false;
    };
    authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| constant_time_eq(token.trim(), secret))
}

/// Proof that the request came from the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct CronAuth;

impl FromRequest for CronAuth {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = server_config(req).and_then(|config| {
            let authorization = req
                .headers()
                .get(actix_web::http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            if check_cron_secret(authorization, config.cron_secret.as_deref()) {
                Ok(CronAuth)
            } else {
                log::info!("Rejected cron request without a valid secret");
                Err(ServiceError::unauthorized())
            }
        });
        ready(result)
    }
}

/// New API key: `bf_` followed by 40 random hex characters.
pub fn generate_api_key() -> String {
    let random = format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );
    format!("{API_KEY_PREFIX}{}", &random[..40])
}

/// Hex SHA-256 digest under which a key is stored.
pub fn hash_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Shortened form shown in key listings, e.g. `bf_1a2b3c4d...`.
pub fn display_prefix(key: &str) -> String {
    let visible: String = key.chars().take(API_KEY_PREFIX.len() + 8).collect();
    format!("{visible}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(org_id: Option<&str>) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "user_1".to_string(),
            email: "owner@example.com".to_string(),
            name: "Owner".to_string(),
            org_id: org_id.map(str::to_string),
            roles: vec![],
            exp: (Utc::now().timestamp() + 3600) as usize,
        }
    }

    #[test]
    fn jwt_round_trips_with_the_same_secret() {
        let claims = user(Some("org_1"));
        let token = claims.to_jwt("secret").unwrap();
        assert_eq!(AuthenticatedUser::from_jwt(&token, "secret").unwrap(), claims);
        assert!(AuthenticatedUser::from_jwt(&token, "other").is_err());
    }

    #[test]
    fn api_keys_have_prefix_and_fixed_length() {
        let key = generate_api_key();
        assert!(key.starts_with("bf_"));
        assert_eq!(key.len(), 43);
        assert!(key[3..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
        assert_eq!(display_prefix(&key).len(), 14);
    }

    #[test]
    fn hash_is_stable_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn cron_secret_must_be_configured_and_match() {
        assert!(check_cron_secret(Some("Bearer s3cret"), Some("s3cret")));
        assert!(!check_cron_secret(Some("Bearer wrong"), Some("s3cret")));
        assert!(!check_cron_secret(Some("s3cret"), Some("s3cret")));
        assert!(!check_cron_secret(None, Some("s3cret")));
        assert!(!check_cron_secret(Some("Bearer "), None));
        assert!(!check_cron_secret(Some("Bearer "), Some("")));
    }

    #[cfg(feature = "test-mocks")]
    mod resolve {
        use super::*;
        use crate::domain::api_key::ApiKey;
        use crate::domain::types::{ApiKeyId, TenantId, TenantName, TenantSlug};
        use crate::repository::mock::MockRepository;

        fn tenant() -> Tenant {
            let now = Utc::now().naive_utc();
            Tenant {
                id: TenantId::new(1).unwrap(),
                org_id: Some("org_1".to_string()),
                slug: TenantSlug::new("bright-smile").unwrap(),
                name: TenantName::new("Bright Smile").unwrap(),
                email: "hello@example.com".to_string(),
                business_phone: None,
                business_address: None,
                business_website: None,
                timezone: "America/New_York".to_string(),
                slot_interval: 30,
                break_start: None,
                break_end: None,
                created_at: now,
                updated_at: now,
            }
        }

        #[test]
        fn internal_key_requires_tenant_slug() {
            let repo = MockRepository::new();
            let result = resolve_tenant(
                &repo,
                Credentials::ApiKey {
                    key: "internal".to_string(),
                    tenant_slug: None,
                },
                Some("internal"),
            );
            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }

        #[test]
        fn internal_key_resolves_slug() {
            let mut repo = MockRepository::new();
            repo.expect_get_tenant_by_slug()
                .withf(|slug| slug.to_string() == "bright-smile")
                .returning(|_| Ok(Some(tenant())));
            let ctx = resolve_tenant(
                &repo,
                Credentials::ApiKey {
                    key: "internal".to_string(),
                    tenant_slug: Some("bright-smile".to_string()),
                },
                Some("internal"),
            )
            .unwrap();
            assert_eq!(ctx.method, AuthMethod::InternalKey);
        }

        #[test]
        fn unknown_api_key_is_unauthorized() {
            let mut repo = MockRepository::new();
            repo.expect_get_api_key_by_hash().returning(|_| Ok(None));
            let result = resolve_tenant(
                &repo,
                Credentials::ApiKey {
                    key: "bf_nope".to_string(),
                    tenant_slug: None,
                },
                None,
            );
            assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
        }

        #[test]
        fn stored_api_key_is_touched_and_resolved() {
            let mut repo = MockRepository::new();
            let key = "bf_0123456789abcdef0123456789abcdef01234567";
            let expected_hash = hash_api_key(key);
            repo.expect_get_api_key_by_hash()
                .withf(move |hash| hash.to_string() == expected_hash)
                .returning(|hash| {
                    Ok(Some(ApiKey {
                        id: ApiKeyId::new(9).unwrap(),
                        tenant_id: TenantId::new(1).unwrap(),
                        name: "Zapier".to_string(),
                        key_hash: hash.to_string(),
                        key_prefix: "bf_01234567...".to_string(),
                        last_used_at: None,
                        created_at: Utc::now().naive_utc(),
                    }))
                });
            repo.expect_touch_api_key().times(1).returning(|_, _| Ok(()));
            repo.expect_get_tenant_by_id()
                .returning(|_| Ok(Some(tenant())));

            let ctx = resolve_tenant(
                &repo,
                Credentials::ApiKey {
                    key: key.to_string(),
                    tenant_slug: None,
                },
                Some("internal"),
            )
            .unwrap();
            assert!(matches!(ctx.method, AuthMethod::ApiKey(_)));
        }

        #[test]
        fn session_without_tenant_is_not_found() {
            let mut repo = MockRepository::new();
            repo.expect_get_tenant_by_org_id().returning(|_| Ok(None));
            let result = resolve_tenant(&repo, Credentials::Session(user(Some("org_2"))), None);
            assert!(matches!(result, Err(ServiceError::NotFound(_))));

            let anonymous = resolve_tenant(&repo, Credentials::Anonymous, None);
            assert!(matches!(anonymous, Err(ServiceError::Unauthorized(_))));
        }
    }
}
