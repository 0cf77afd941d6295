//! Admin authentication: password hashing, login and sessions

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{AdminRole, AdminUser, Session};
use crate::storage::AccountRepository;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password into an argon2 PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Authentication(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => {
            warn!("Stored password hash is not a valid PHC string");
            false
        }
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<()> {
    if username.trim().chars().count() < MIN_USERNAME_LEN {
        return Err(Error::Validation(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Validate credentials and hash the password for a new account.
///
/// Hashing is slow; callers serving requests run this off the async
/// workers and outside the database lock.
pub fn new_account(username: &str, password: &str, role: AdminRole) -> Result<AdminUser> {
    validate_credentials(username, password)?;
    Ok(AdminUser::new(
        username.trim().to_string(),
        hash_password(password)?,
        role,
    ))
}

/// Persist an account built by [`new_account`]; a taken username surfaces
/// as a constraint violation
pub fn store_account<S: AccountRepository>(store: &S, user: &AdminUser) -> Result<()> {
    store.create_user(user)?;
    info!(user_id = %user.id, role = ?user.role, "Created admin account");
    Ok(())
}

#[instrument(skip(store, password))]
pub fn create_account<S: AccountRepository>(
    store: &S,
    username: &str,
    password: &str,
    role: AdminRole,
) -> Result<AdminUser> {
    let user = new_account(username, password, role)?;
    store_account(store, &user)?;
    Ok(user)
}

fn rejected() -> Error {
    Error::Authentication("Invalid username or password".into())
}

/// Check `password` against a looked-up account. Unknown accounts and
/// wrong passwords get the same error.
pub fn check_credentials(user: Option<AdminUser>, password: &str) -> Result<AdminUser> {
    let user = user.ok_or_else(rejected)?;
    if !verify_password(password, &user.password_hash) {
        return Err(rejected());
    }
    Ok(user)
}

/// Open a session lasting `session_hours` for a verified account
pub fn open_session<S: AccountRepository>(
    store: &S,
    user: &AdminUser,
    session_hours: i64,
) -> Result<Session> {
    let session = Session::new(user.id, session_hours)?;
    store.update_last_login(user.id)?;
    store.create_session(&session)?;
    info!(user_id = %user.id, "Admin logged in");
    Ok(session)
}

/// Verify credentials and open a session lasting `session_hours`
#[instrument(skip(store, password))]
pub fn login<S: AccountRepository>(
    store: &S,
    username: &str,
    password: &str,
    session_hours: i64,
) -> Result<(AdminUser, Session)> {
    let user = check_credentials(store.find_user_by_username(username.trim())?, password)?;
    let session = open_session(store, &user, session_hours)?;
    Ok((user, session))
}

/// Verify the current password and hash its replacement
pub fn rehash_password(user: &AdminUser, current: &str, new: &str) -> Result<String> {
    if !verify_password(current, &user.password_hash) {
        return Err(Error::Authentication("Current password is incorrect".into()));
    }
    validate_credentials(&user.username, new)?;
    hash_password(new)
}

/// Store a new password hash and end every session of the account
pub fn replace_password<S: AccountRepository>(
    store: &S,
    user_id: Uuid,
    password_hash: &str,
) -> Result<()> {
    store.update_password(user_id, password_hash)?;
    store.delete_user_sessions(user_id)?;
    info!(%user_id, "Admin password changed, sessions revoked");
    Ok(())
}

/// Resolve a session ID to its account
pub fn authenticate<S: AccountRepository>(store: &S, session_id: Uuid) -> Result<AdminUser> {
    let session = store
        .find_valid_session(session_id)?
        .ok_or_else(|| Error::Authentication("Session expired or unknown".into()))?;
    store
        .find_user_by_id(session.user_id)?
        .ok_or_else(|| Error::Authentication("Session account no longer exists".into()))
}

pub fn logout<S: AccountRepository>(store: &S, session_id: Uuid) -> Result<()> {
    store.delete_session(session_id)
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// Create the first admin account when none exists.
///
/// Returns the password when one had to be generated so the caller can
/// show it once.
#[instrument(skip(store, password))]
pub fn bootstrap_admin<S: AccountRepository>(
    store: &S,
    username: &str,
    password: Option<&str>,
) -> Result<Option<String>> {
    if store.count_users()? > 0 {
        return Ok(None);
    }
    let (password, generated) = match password {
        Some(p) => (p.to_string(), false),
        None => (generate_password(), true),
    };
    create_account(store, username, &password, AdminRole::Admin)?;
    Ok(generated.then_some(password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn test_login_and_authenticate() {
        let db = Database::open_in_memory().unwrap();
        create_account(&db, "editor", "secret1", AdminRole::Editor).unwrap();

        let (user, session) = login(&db, "editor", "secret1", 8).unwrap();
        assert_eq!(user.role, AdminRole::Editor);
        assert_eq!(authenticate(&db, session.id).unwrap().id, user.id);

        logout(&db, session.id).unwrap();
        assert!(matches!(
            authenticate(&db, session.id),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn test_login_rejects_bad_password_and_unknown_user() {
        let db = Database::open_in_memory().unwrap();
        create_account(&db, "editor", "secret1", AdminRole::Editor).unwrap();
        assert!(matches!(
            login(&db, "editor", "secret2", 8),
            Err(Error::Authentication(_))
        ));
        assert!(matches!(
            login(&db, "nobody", "secret1", 8),
            Err(Error::Authentication(_))
        ));
    }

    #[test]
    fn test_create_account_rules() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            create_account(&db, "ab", "secret1", AdminRole::Editor),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            create_account(&db, "abc", "short", AdminRole::Editor),
            Err(Error::Validation(_))
        ));
        create_account(&db, "abc", "secret1", AdminRole::Editor).unwrap();
        assert!(create_account(&db, "abc", "secret1", AdminRole::Admin)
            .unwrap_err()
            .is_constraint_violation());
    }

    #[test]
    fn test_password_change_revokes_sessions() {
        let db = Database::open_in_memory().unwrap();
        let user = create_account(&db, "editor", "secret1", AdminRole::Editor).unwrap();
        let (_, session) = login(&db, "editor", "secret1", 8).unwrap();

        assert!(matches!(
            rehash_password(&user, "wrong-1", "secret2"),
            Err(Error::Authentication(_))
        ));
        assert!(matches!(
            rehash_password(&user, "secret1", "short"),
            Err(Error::Validation(_))
        ));

        let hash = rehash_password(&user, "secret1", "secret2").unwrap();
        replace_password(&db, user.id, &hash).unwrap();

        assert!(authenticate(&db, session.id).is_err());
        assert!(login(&db, "editor", "secret1", 8).is_err());
        assert!(login(&db, "editor", "secret2", 8).is_ok());
        assert!(replace_password(&db, Uuid::new_v4(), &hash).is_err());
    }

    #[test]
    fn test_login_rejects_out_of_range_session_length() {
        let db = Database::open_in_memory().unwrap();
        create_account(&db, "editor", "secret1", AdminRole::Editor).unwrap();
        assert!(matches!(
            login(&db, "editor", "secret1", 9_000_000_000_000_000),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_bootstrap_runs_once() {
        let db = Database::open_in_memory().unwrap();
        let generated = bootstrap_admin(&db, "admin", None).unwrap().unwrap();
        assert_eq!(generated.len(), 16);
        assert!(login(&db, "admin", &generated, 1).is_ok());
        assert_eq!(bootstrap_admin(&db, "admin", Some("other-pass")).unwrap(), None);
        assert_eq!(db.users().count().unwrap(), 1);
    }
}
