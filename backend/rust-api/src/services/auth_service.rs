use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::refresh_token::RefreshToken;
use crate::models::user::{
    AuthProvider, AuthResponse, LoginRequest, RegisterRequest, SocialLoginRequest, User,
    UserProfile, UserRole,
};
use anyhow::{anyhow, Context, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::Database;
use redis::aio::ConnectionManager;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const MAX_FAILED_ATTEMPTS: u32 = 5;
const FAILED_ATTEMPTS_WINDOW_SECONDS: i64 = 900; // 15 minutes

pub struct AuthService {
    mongo: Database,
    redis: ConnectionManager,
    jwt_service: JwtService,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
}

impl AuthService {
    pub fn new(mongo: Database, redis: ConnectionManager, jwt_service: JwtService) -> Self {
        // Read TTL from env or use defaults
        let access_token_ttl_seconds = std::env::var("JWT_ACCESS_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(3600); // Default: 1 hour

        let refresh_token_ttl_seconds = std::env::var("JWT_REFRESH_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(2592000); // Default: 30 days

        Self {
            mongo,
            redis,
            jwt_service,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
        }
    }

    /// Hash a password using bcrypt with cost 12
    pub fn hash_password(&self, password: &str) -> Result<String> {
        hash(password, DEFAULT_COST).context("Failed to hash password")
    }

    /// Verify a password against a hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        verify(password, hash).context("Failed to verify password")
    }

    /// Register a new user
    pub async fn register(&self, req: RegisterRequest) -> Result<AuthResponse> {
        let users_collection = self.mongo.collection::<User>("users");

        let existing_user = users_collection
            .find_one(doc! { "email": &req.email })
            .await
            .context("Failed to check existing user")?;

        if existing_user.is_some() {
            return Err(anyhow!("User with this email already exists"));
        }

        let password_hash = self.hash_password(&req.password)?;

        let now = Utc::now();
        let user = User {
            id: None, // MongoDB will generate
            email: req.email.clone(),
            password_hash,
            name: req.name,
            role: UserRole::Child,
            auth_provider: AuthProvider::Password,
            is_blocked: false,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        let insert_result = users_collection
            .insert_one(&user)
            .await
            .context("Failed to insert user")?;

        let user_id = insert_result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Failed to get inserted user ID"))?;

        let access_token = self.generate_access_token(&user_id, &user.role)?;
        let refresh_token = self.create_refresh_token(&user_id, true).await?;

        let mut user_with_id = user;
        user_with_id.id = Some(user_id);
        let user_profile = UserProfile::from(user_with_id);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user: user_profile,
        })
    }

    /// Login user with email and password
    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
        let users_collection = self.mongo.collection::<User>("users");

        let user = users_collection
            .find_one(doc! { "email": &req.email })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow!("Invalid email or password"))?;

        if user.password_hash.is_empty() {
            // Social-only account; no password to check
            return Err(anyhow!("This account uses social login"));
        }

        if !self.verify_password(&req.password, &user.password_hash)? {
            return Err(anyhow!("Invalid email or password"));
        }

        if user.is_blocked {
            return Err(anyhow!("Account is blocked"));
        }

        let user_id = user
            .id
            .ok_or_else(|| anyhow!("User document missing _id"))?;

        let now = Utc::now();
        users_collection
            .update_one(
                doc! { "_id": user_id },
                doc! { "$set": {
                    "lastLoginAt": mongodb::bson::DateTime::from_millis(now.timestamp_millis())
                } },
            )
            .await
            .context("Failed to update last login")?;

        let access_token = self.generate_access_token(&user_id, &user.role)?;
        let refresh_token = self
            .create_refresh_token(&user_id, req.remember_me)
            .await?;

        let mut user_with_login = user;
        user_with_login.last_login_at = Some(now);
        let user_profile = UserProfile::from(user_with_login);

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user: user_profile,
        })
    }

    /// Sign in with an external identity provider. The ID token is
    /// verified against the provider's userinfo endpoint; the account is
    /// created on first sign-in.
    pub async fn social_login(
        &self,
        req: SocialLoginRequest,
        userinfo_url: &str,
    ) -> Result<AuthResponse> {
        if req.provider.to_lowercase() != "google" {
            return Err(anyhow!("Unsupported provider: {}", req.provider));
        }

        let identity = self.verify_google_token(&req.id_token, userinfo_url).await?;

        let users_collection = self.mongo.collection::<User>("users");
        let existing = users_collection
            .find_one(doc! { "email": &identity.email })
            .await
            .context("Failed to query user")?;

        let now = Utc::now();
        let user = match existing {
            Some(user) => {
                if user.is_blocked {
                    return Err(anyhow!("Account is blocked"));
                }
                let user_id = user
                    .id
                    .ok_or_else(|| anyhow!("User document missing _id"))?;
                users_collection
                    .update_one(
                        doc! { "_id": user_id },
                        doc! { "$set": {
                            "lastLoginAt": mongodb::bson::DateTime::from_millis(now.timestamp_millis())
                        } },
                    )
                    .await
                    .context("Failed to update last login")?;
                user
            }
            None => {
                let user = User {
                    id: None,
                    email: identity.email.clone(),
                    password_hash: String::new(),
                    name: identity.name.unwrap_or_else(|| identity.email.clone()),
                    role: UserRole::Child,
                    auth_provider: AuthProvider::Google,
                    is_blocked: false,
                    created_at: now,
                    updated_at: now,
                    last_login_at: Some(now),
                };
                let insert_result = users_collection
                    .insert_one(&user)
                    .await
                    .context("Failed to insert social user")?;
                let user_id = insert_result
                    .inserted_id
                    .as_object_id()
                    .ok_or_else(|| anyhow!("Failed to get inserted user ID"))?;
                tracing::info!("Created account via social login: {}", identity.email);
                let mut user_with_id = user;
                user_with_id.id = Some(user_id);
                user_with_id
            }
        };

        let user_id = user
            .id
            .ok_or_else(|| anyhow!("User document missing _id"))?;
        let access_token = self.generate_access_token(&user_id, &user.role)?;
        let refresh_token = self.create_refresh_token(&user_id, true).await?;

        Ok(AuthResponse {
            access_token,
            refresh_token,
            user: UserProfile::from(user),
        })
    }

    async fn verify_google_token(
        &self,
        id_token: &str,
        userinfo_url: &str,
    ) -> Result<GoogleIdentity> {
        let client = reqwest::Client::new();
        let response = client
            .get(userinfo_url)
            .bearer_auth(id_token)
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .context("Failed to reach identity provider")?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Identity provider rejected token: {}",
                response.status()
            ));
        }

        let identity: GoogleIdentity = response
            .json()
            .await
            .context("Failed to parse identity provider response")?;

        if identity.email.is_empty() {
            return Err(anyhow!("Identity provider returned no email"));
        }

        Ok(identity)
    }

    fn generate_access_token(&self, user_id: &ObjectId, role: &UserRole) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = JwtClaims {
            sub: user_id.to_hex(),
            role: role.as_str().to_string(),
            exp: (now + self.access_token_ttl_seconds) as usize,
            iat: now as usize,
        };

        self.jwt_service
            .generate_token(claims)
            .map_err(|e| anyhow!("Failed to generate access token: {}", e))
    }

    async fn create_refresh_token(&self, user_id: &ObjectId, remember_me: bool) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let token_hash = self.hash_token(&token);

        let ttl_seconds = if remember_me {
            self.refresh_token_ttl_seconds
        } else {
            86400 // 1 day without remember_me
        };

        let now = Utc::now();
        let refresh_token = RefreshToken {
            id: None,
            user_id: *user_id,
            token_hash,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds),
            revoked: false,
        };

        self.mongo
            .collection::<RefreshToken>("refresh_tokens")
            .insert_one(&refresh_token)
            .await
            .context("Failed to store refresh token")?;

        Ok(token)
    }

    fn hash_token(&self, token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Exchange a refresh token for a new access token
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<String> {
        let token_hash = self.hash_token(refresh_token);
        let tokens_collection = self.mongo.collection::<RefreshToken>("refresh_tokens");

        let stored = tokens_collection
            .find_one(doc! { "token_hash": &token_hash, "revoked": false })
            .await
            .context("Failed to query refresh token")?
            .ok_or_else(|| anyhow!("Invalid refresh token"))?;

        if stored.expires_at < Utc::now() {
            return Err(anyhow!("Refresh token expired"));
        }

        let user = self.get_user_by_id(&stored.user_id.to_hex()).await?;
        if user.is_blocked {
            return Err(anyhow!("Account is blocked"));
        }

        self.generate_access_token(&stored.user_id, &user.role)
    }

    /// Revoke a refresh token
    pub async fn logout(&self, refresh_token: &str) -> Result<()> {
        let token_hash = self.hash_token(refresh_token);

        self.mongo
            .collection::<RefreshToken>("refresh_tokens")
            .update_one(
                doc! { "token_hash": &token_hash },
                doc! { "$set": { "revoked": true } },
            )
            .await
            .context("Failed to revoke refresh token")?;

        Ok(())
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User> {
        let object_id = ObjectId::parse_str(user_id).context("Invalid user id")?;

        self.mongo
            .collection::<User>("users")
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to query user")?
            .ok_or_else(|| anyhow!("User not found"))
    }

    /// Returns true when the account is temporarily locked out
    pub async fn check_failed_attempts(&self, email: &str) -> Result<bool> {
        let mut conn = self.redis.clone();
        let key = format!("login_failures:{}", email);

        let count: Option<u32> = redis::cmd("GET")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .context("Failed to read login failure counter")?;

        Ok(count.unwrap_or(0) >= MAX_FAILED_ATTEMPTS)
    }

    pub async fn increment_failed_attempts(&self, email: &str) -> Result<u32> {
        let mut conn = self.redis.clone();
        let key = format!("login_failures:{}", email);

        let count: u32 = redis::cmd("INCR")
            .arg(&key)
            .query_async(&mut conn)
            .await
            .context("Failed to increment login failure counter")?;

        redis::cmd("EXPIRE")
            .arg(&key)
            .arg(FAILED_ATTEMPTS_WINDOW_SECONDS)
            .query_async::<()>(&mut conn)
            .await
            .context("Failed to set login failure counter TTL")?;

        Ok(count)
    }

    pub async fn clear_failed_attempts(&self, email: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        let key = format!("login_failures:{}", email);

        redis::cmd("DEL")
            .arg(&key)
            .query_async::<()>(&mut conn)
            .await
            .context("Failed to clear login failure counter")?;

        Ok(())
    }
}

#[derive(Debug, serde::Deserialize)]
struct GoogleIdentity {
    #[serde(default)]
    email: String,
    name: Option<String>,
}
