use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::TaskError;

use super::auth::UserSummary;
use super::session::{Session, SessionToken};

pub(crate) const SERVICE_NAME: &str = "tick-session";

fn attributes(server: &str) -> HashMap<&str, &str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", server);
    attrs
}

/// What a successful login leaves behind for the next start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    pub session: Session,
    pub user: Option<UserSummary>,
}

#[derive(Serialize, Deserialize)]
struct Secret {
    token: String,
    #[serde(default)]
    user: Option<UserSummary>,
}

fn encode_secret(token: &SessionToken, user: Option<&UserSummary>) -> Result<String, TaskError> {
    let secret = Secret {
        token: token.expose().to_string(),
        user: user.cloned(),
    };
    serde_json::to_string(&secret)
        .map_err(|e| TaskError::Keyring(format!("Failed to encode session: {}", e)))
}

/// A secret that isn't our JSON is taken as a bare token.
fn decode_secret(secret: &str) -> StoredSession {
    match serde_json::from_str::<Secret>(secret) {
        Ok(parsed) => StoredSession {
            session: Session::from_optional(Some(parsed.token)),
            user: parsed.user,
        },
        Err(_) => StoredSession {
            session: Session::from_optional(Some(secret.to_string())),
            user: None,
        },
    }
}

/// Store the session token and user for `server` in the system keyring via Secret Service.
pub async fn store_session(
    server: &str,
    token: &SessionToken,
    user: Option<&UserSummary>,
) -> Result<(), TaskError> {
    let secret = encode_secret(token, user)?;

    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| TaskError::Keyring(format!("Failed to connect to keyring: {}", e)))?;

    keyring
        .create_item(
            &format!("Tick session ({})", server),
            &attributes(server),
            secret.as_bytes(),
            true, // replace existing
        )
        .await
        .map_err(|e| TaskError::Keyring(format!("Failed to store token: {}", e)))?;

    Ok(())
}

/// Load the session for `server`. A missing item yields an anonymous session.
pub async fn load_session(server: &str) -> Result<StoredSession, TaskError> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| TaskError::Keyring(format!("Failed to connect to keyring: {}", e)))?;

    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| TaskError::Keyring(format!("Failed to search keyring: {}", e)))?;

    let Some(item) = items.first() else {
        return Ok(StoredSession::default());
    };

    let secret_bytes = item
        .secret()
        .await
        .map_err(|e| TaskError::Keyring(format!("Failed to read secret: {}", e)))?;
    let secret = String::from_utf8(secret_bytes.to_vec())
        .map_err(|e| TaskError::Keyring(format!("Invalid UTF-8 in secret: {}", e)))?;

    Ok(decode_secret(&secret))
}

/// Forget the session for `server` (logout).
pub async fn delete_token(server: &str) -> Result<(), TaskError> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| TaskError::Keyring(format!("Failed to connect to keyring: {}", e)))?;

    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| TaskError::Keyring(format!("Failed to search keyring: {}", e)))?;

    for item in items {
        item.delete()
            .await
            .map_err(|e| TaskError::Keyring(format!("Failed to delete token: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> UserSummary {
        UserSummary {
            id: Some("u1".into()),
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
        }
    }

    #[test]
    fn user_is_kept_next_to_token() {
        let token = SessionToken::new("t0k");
        let secret = encode_secret(&token, Some(&ada())).unwrap();
        let stored = decode_secret(&secret);
        assert_eq!(stored.session.bearer().unwrap().expose(), "t0k");
        assert_eq!(stored.user, Some(ada()));
    }

    #[test]
    fn session_without_user() {
        let secret = encode_secret(&SessionToken::new("t0k"), None).unwrap();
        let stored = decode_secret(&secret);
        assert!(stored.session.is_authenticated());
        assert_eq!(stored.user, None);
    }

    #[test]
    fn bare_token_secret_still_loads() {
        let stored = decode_secret("eyJhbGciOiJIUzI1NiJ9.abc.def");
        assert_eq!(
            stored.session.bearer().unwrap().expose(),
            "eyJhbGciOiJIUzI1NiJ9.abc.def"
        );
        assert_eq!(stored.user, None);
    }

    #[test]
    fn blank_secret_is_anonymous() {
        assert!(!decode_secret("").session.is_authenticated());
        assert!(!decode_secret(r#"{"token":"  "}"#).session.is_authenticated());
    }
}
