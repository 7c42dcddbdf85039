//! Bootstrap token generation for sub-cluster registration.
//!
//! Tokens are drawn from a restricted lowercase-alphanumeric alphabet via
//! a cryptographically secure source and stored as a bootstrap-token
//! Secret in `kube-system` on the host cluster.

use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use k8s_openapi::api::core::v1::Secret;
use rand::rngs::OsRng;
use rand::Rng;

use fedlink_common::{
    BOOTSTRAP_TOKEN_NAMESPACE, BOOTSTRAP_TOKEN_SECRET_PREFIX, BOOTSTRAP_TOKEN_SECRET_TYPE,
};

/// Length of the token ID part
pub const TOKEN_ID_LENGTH: usize = 6;
/// Length of the token secret part
pub const TOKEN_SECRET_LENGTH: usize = 16;

/// Bootstrap tokens expire 20 years out; registration is long-lived.
const EXPIRATION_YEARS: i64 = 20;

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a random string of length `n` over `[a-z0-9]`.
pub fn generate_random_str(n: usize) -> String {
    let mut rng = OsRng;
    (0..n)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// Build the bootstrap-token Secret for a token ID/secret pair.
pub fn bootstrap_secret(token_id: &str, token_secret: &str) -> Secret {
    let mut string_data = BTreeMap::new();
    string_data.insert("token-id".to_string(), token_id.to_string());
    string_data.insert("token-secret".to_string(), token_secret.to_string());
    string_data.insert(
        "expiration".to_string(),
        (Utc::now() + Duration::days(365 * EXPIRATION_YEARS)).to_rfc3339(),
    );
    string_data.insert(
        "description".to_string(),
        "bootstrap token for registering sub-clusters with the federation hub".to_string(),
    );
    string_data.insert("usage-bootstrap-authentication".to_string(), "true".to_string());
    string_data.insert("usage-bootstrap-signing".to_string(), "true".to_string());
    string_data.insert(
        "auth-extra-groups".to_string(),
        "system:bootstrappers:clusternet:register-cluster-token".to_string(),
    );

    Secret {
        metadata: kube::api::ObjectMeta {
            name: Some(format!("{}{}", BOOTSTRAP_TOKEN_SECRET_PREFIX, token_id)),
            namespace: Some(BOOTSTRAP_TOKEN_NAMESPACE.to_string()),
            ..Default::default()
        },
        type_: Some(BOOTSTRAP_TOKEN_SECRET_TYPE.to_string()),
        string_data: Some(string_data),
        ..Default::default()
    }
}

/// Recover the `<id>.<secret>` token from a bootstrap secret.
///
/// Freshly built secrets carry `string_data`; secrets read back from a
/// cluster carry base64-decoded `data`.
pub fn token_from_secret(secret: &Secret) -> Option<String> {
    let field = |key: &str| -> Option<String> {
        if let Some(v) = secret.string_data.as_ref().and_then(|sd| sd.get(key)) {
            return Some(v.clone());
        }
        secret
            .data
            .as_ref()
            .and_then(|d| d.get(key))
            .and_then(|v| String::from_utf8(v.0.clone()).ok())
    };
    Some(format!("{}.{}", field("token-id")?, field("token-secret")?))
}

/// Whether a secret matches the bootstrap-token naming/content pattern.
pub fn is_bootstrap_secret(secret: &Secret) -> bool {
    let named_like_token = secret
        .metadata
        .name
        .as_deref()
        .map(|n| n.starts_with(BOOTSTRAP_TOKEN_SECRET_PREFIX))
        .unwrap_or(false);
    let typed_like_token =
        secret.type_.as_deref() == Some(BOOTSTRAP_TOKEN_SECRET_TYPE);
    named_like_token && typed_like_token
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_str_has_exact_length_and_alphabet() {
        for n in [0, 1, TOKEN_ID_LENGTH, TOKEN_SECRET_LENGTH, 64] {
            let s = generate_random_str(n);
            assert_eq!(s.len(), n);
            assert!(s
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_independent_tokens_are_distinct() {
        let tokens: HashSet<String> = (0..100)
            .map(|_| generate_random_str(TOKEN_SECRET_LENGTH))
            .collect();
        assert_eq!(tokens.len(), 100);
    }

    #[test]
    fn test_bootstrap_secret_shape() {
        let secret = bootstrap_secret("abc123", "0123456789abcdef");
        assert_eq!(
            secret.metadata.name.as_deref(),
            Some("bootstrap-token-abc123")
        );
        assert_eq!(secret.metadata.namespace.as_deref(), Some("kube-system"));
        assert_eq!(
            secret.type_.as_deref(),
            Some("bootstrap.kubernetes.io/token")
        );

        let data = secret.string_data.as_ref().unwrap();
        assert_eq!(data.get("token-id").map(String::as_str), Some("abc123"));
        assert_eq!(
            data.get("token-secret").map(String::as_str),
            Some("0123456789abcdef")
        );
        // Expiration is roughly 20 years out
        let expiration = chrono::DateTime::parse_from_rfc3339(data.get("expiration").unwrap())
            .unwrap()
            .with_timezone(&Utc);
        let years = (expiration - Utc::now()).num_days() / 365;
        assert!((19..=20).contains(&years));
    }

    #[test]
    fn test_bootstrap_secret_recognition() {
        let secret = bootstrap_secret("abc123", "0123456789abcdef");
        assert!(is_bootstrap_secret(&secret));

        let mut wrong_type = secret.clone();
        wrong_type.type_ = Some("Opaque".to_string());
        assert!(!is_bootstrap_secret(&wrong_type));

        let mut wrong_name = secret;
        wrong_name.metadata.name = Some("my-secret".to_string());
        assert!(!is_bootstrap_secret(&wrong_name));
    }
}
