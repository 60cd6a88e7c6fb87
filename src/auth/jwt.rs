use anyhow::{bail, Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::api::user::TokenResponse;
use crate::auth::Identity;
use crate::roles::Role;

/// JWT issuer identifier
const ISSUER: &str = "newshub/jwt-tokenizer";

/// Claims represents public claim values (as specified in RFC 7519), plus the
/// identity snapshot carried by the token: subject is the user id, `name` and
/// `roles` are private claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    pub exp: usize,   // Required. Token expiration time (timestamp)
    pub iat: usize,   // Optional. Time at which token was issued (timestamp)
    pub iss: String,  // Optional. Token issuer
    pub nbf: usize,   // Optional. Time before which token must not be accepted (timestamp)
    pub sub: String,  // Optional. Subject of the token (user id)
    pub name: String, // Private. Display name
    pub roles: Vec<String>, // Private. Role names
}

/// JSON Web Token generator for creating signed tokens.
/// For more details, see: https://en.wikipedia.org/wiki/JSON_Web_Token
pub struct JwtTokenGenerator {
    key: EncodingKey, // Secret key for signing
    expiry: usize,    // Token expiration time in seconds
}

impl JwtTokenGenerator {
    /// Creates a new HS256 token generator.
    ///
    /// # Arguments
    /// * `secret` - Shared secret, configured out of band
    /// * `expiry` - Token expiration time in seconds
    pub fn new(secret: &[u8], expiry: u64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            expiry: expiry as usize,
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        Self::new(b"test_secret_key", 60)
    }

    pub fn generate_token(&self, identity: &Identity, now: u64) -> Result<TokenResponse> {
        let now = now as usize;

        let claims = Claims {
            exp: now + self.expiry,
            iat: now,
            iss: String::from(ISSUER),
            nbf: now,
            sub: identity.id.to_string(),
            name: identity.name.clone(),
            roles: identity.roles.iter().map(|r| r.to_string()).collect(),
        };

        match encode(&Header::new(Algorithm::HS256), &claims, &self.key) {
            Ok(token) => Ok(TokenResponse {
                token,
                expire_after: claims.exp as u64,
            }),
            Err(e) => bail!("generate jwt token failed: {e}"),
        }
    }
}

/// JSON Web Token validator for verifying and decoding tokens.
/// Validates token signature, expiration time, and other claims. Any failure
/// to evaluate a claim is treated as an invalid token (fail closed).
pub struct JwtTokenValidator {
    key: DecodingKey, // Secret key for verification
}

impl JwtTokenValidator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }

    #[cfg(test)]
    pub fn new_test() -> Self {
        Self::new(b"test_secret_key")
    }

    pub fn validate_token(&self, token: &str, now: u64) -> Result<Identity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]); // Validate issuer
        validation.set_required_spec_claims(&["exp", "iat", "iss", "nbf", "sub"]);

        // Verify token signature and decode
        let claims = match decode::<Claims>(token, &self.key, &validation) {
            Ok(data) => data.claims,
            Err(e) => bail!("validate jwt token failed: {e}"),
        };

        if claims.sub.is_empty() {
            bail!("validate jwt token failed: empty subject");
        }

        let now = now as usize;
        if now >= claims.exp {
            bail!("validate jwt token failed: token expired");
        }

        if now < claims.nbf {
            bail!("validate jwt token failed: token not yet valid");
        }

        let id: u64 = claims
            .sub
            .parse()
            .context("validate jwt token failed: invalid subject")?;
        let roles = claims
            .roles
            .iter()
            .map(|r| r.parse::<Role>())
            .collect::<Result<Vec<_>>>()
            .context("validate jwt token failed: invalid roles")?;
        if roles.is_empty() {
            bail!("validate jwt token failed: empty roles");
        }

        Ok(Identity {
            id,
            name: claims.name,
            roles,
        })
    }
}
