//! Login: pick a display name and role, get a temporary account.

use chrono::Utc;
use tracing::info;

use crate::api::{ApiClient, Identity, Role};
use crate::error::{Result, SstError};
use crate::router::Route;
use crate::storage::LocalStore;

pub const MIN_DISPLAY_NAME_CHARS: usize = 2;

/// Trim and check a display name. Returns the trimmed name.
pub fn validate_display_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.chars().count() < MIN_DISPLAY_NAME_CHARS {
        return Err(SstError::Validation(format!(
            "Display name must be at least {MIN_DISPLAY_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

/// Create the account, persist it under `sst:user`, and return the identity
/// together with the view to continue to.
pub async fn login(
    api: &ApiClient,
    store: &mut LocalStore,
    display_name: &str,
    role: Role,
) -> Result<(Identity, Route)> {
    let name = validate_display_name(display_name)?;
    let mut identity = api.temp_login(&name, role).await?;
    identity.created_at = Some(Utc::now());
    store.save_identity(&identity)?;
    info!(user = %identity.username, role = %identity.role, "logged in");
    Ok((identity, Route::RoomsHub))
}

/// Forget the stored identity. Returns whether one was stored.
pub fn logout(store: &mut LocalStore) -> Result<bool> {
    store.clear_identity()
}

pub fn current_identity(store: &LocalStore) -> Option<Identity> {
    store.identity()
}

/// First view to show: the rooms hub if someone is logged in, else login.
pub fn landing_route(store: &LocalStore) -> Route {
    if store.identity().is_some() {
        Route::RoomsHub
    } else {
        Route::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_is_trimmed() {
        assert_eq!(validate_display_name("  student A ").unwrap(), "student A");
    }

    #[test]
    fn display_name_too_short() {
        assert!(matches!(validate_display_name(" a "), Err(SstError::Validation(_))));
        assert!(validate_display_name("").is_err());
    }

    #[test]
    fn display_name_counts_chars_not_bytes() {
        assert!(validate_display_name("é").is_err());
        assert!(validate_display_name("éa").is_ok());
    }

    #[test]
    fn landing_route_depends_on_identity() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("s.json")).unwrap();
        assert_eq!(landing_route(&store), Route::Login);
        store
            .save_identity(&Identity {
                id: 1,
                username: "u".into(),
                display_name: "Una".into(),
                role: Role::Facilitator,
                created_at: None,
            })
            .unwrap();
        assert_eq!(landing_route(&store), Route::RoomsHub);
        assert_eq!(current_identity(&store).map(|i| i.display_name), Some("Una".to_string()));
        assert!(logout(&mut store).unwrap());
        assert_eq!(landing_route(&store), Route::Login);
    }
}
