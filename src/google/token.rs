use crate::config::GOOGLE_TOKEN_URL;
use crate::error::RelayError;
use crate::google::credentials::ServiceAccountCredential;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Short-lived OAuth2 access token. Held in memory for one pipeline run;
/// never persisted, never shared across invocations.
#[derive(Debug, Clone)]
pub struct BearerToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Serialize)]
struct JwtHeader {
    alg: &'static str,
    typ: &'static str,
}

#[derive(Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Assemble and sign the RS256 JWT-bearer assertion by hand:
/// `base64url(header).base64url(claims)` signed with RSASSA-PKCS1-v1_5 /
/// SHA-256. No padding characters appear in any segment.
pub fn sign_assertion(
    cred: &ServiceAccountCredential,
    scope: &str,
    issued_at: DateTime<Utc>,
) -> Result<String, RelayError> {
    let header = JwtHeader {
        alg: "RS256",
        typ: "JWT",
    };
    let claims = JwtClaims {
        iss: cred.client_email.clone(),
        scope: scope.to_string(),
        aud: GOOGLE_TOKEN_URL.as_str().to_string(),
        iat: issued_at.timestamp(),
        exp: issued_at.timestamp() + ASSERTION_LIFETIME_SECS,
    };

    let signing_input = format!(
        "{}.{}",
        b64url(&serde_json::to_vec(&header)?),
        b64url(&serde_json::to_vec(&claims)?)
    );

    let key = RsaPrivateKey::from_pkcs8_pem(&cred.private_key)
        .map_err(|e| RelayError::InvalidKey(e.to_string()))?;
    let signer = SigningKey::<Sha256>::new(key);
    let signature = signer
        .try_sign(signing_input.as_bytes())
        .map_err(|e| RelayError::InvalidKey(e.to_string()))?;

    Ok(format!("{signing_input}.{}", b64url(&signature.to_bytes())))
}

/// Exchange a freshly signed assertion for a bearer token scoped to `scope`.
/// No retries here; callers decide. A non-2xx response surfaces as
/// `RelayError::Auth` with the provider body intact.
pub async fn mint(
    client: &reqwest::Client,
    cred: &ServiceAccountCredential,
    scope: &str,
) -> Result<BearerToken, RelayError> {
    let now = Utc::now();
    let assertion = sign_assertion(cred, scope, now)?;

    let resp = client
        .post(GOOGLE_TOKEN_URL.clone())
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RelayError::Auth {
            status: status.as_u16(),
            body,
        });
    }

    let payload: TokenResponse = resp.json().await?;
    let expires_in = payload.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
    debug!(client_email = %cred.client_email, scope, expires_in, "bearer token minted");
    Ok(BearerToken {
        value: payload.access_token,
        expires_at: now + Duration::seconds(expires_in),
    })
}
