use anyhow::{Context, Result, bail};
use chrono::Utc;
use teamacy_db::{Database, is_unique_violation, models::UserRow};
use teamacy_types::models::{Role, User};
use tracing::{info, warn};
use uuid::Uuid;

use crate::password;
use crate::validate;

/// Credentials for the single admin account.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Delete every admin account and create a fresh one from `seed`.
///
/// Runs on every start. The new admin gets a new id, so admin tokens issued
/// before the restart stop working. If a regular user already owns the admin
/// email nothing is changed and an error is returned.
pub fn ensure_admin(db: &Database, seed: &AdminSeed) -> Result<User> {
    let email = validate::account_email(&seed.email)
        .map_err(|e| anyhow::anyhow!("admin email '{}': {}", seed.email, e))?;
    if seed.password.is_empty() {
        bail!("admin password must not be empty");
    }

    let admin = User {
        id: Uuid::new_v4(),
        name: seed.name.trim().to_string(),
        email,
        role: Role::Admin,
        created_at: Utc::now(),
    };
    let row = UserRow::from_user(&admin, password::hash_password(&seed.password)?);

    let removed = match db.replace_admins(&row) {
        Ok(n) => n,
        Err(e) if is_unique_violation(&e) => {
            return Err(e).with_context(|| {
                format!("admin email {} already belongs to a non-admin account", admin.email)
            });
        }
        Err(e) => return Err(e),
    };

    if removed > 1 {
        warn!("Removed {} admin accounts, expected at most one", removed);
    }
    info!("Admin created: {} ({})", admin.email, admin.id);

    Ok(admin)
}
