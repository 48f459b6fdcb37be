use sea_orm::DbErr;
use tracing::info;

use crate::config::AuthConfig;
use crate::models::user::{NewUser, Role};
use crate::repository::UserRepository;
use crate::utils::hash;

/// Create the configured admin account if it does not exist yet.
///
/// Does nothing unless both `auth.admin_email` and `auth.admin_password` are set.
pub async fn seed_admin(users: &dyn UserRepository, auth: &AuthConfig) -> Result<(), DbErr> {
    let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) else {
        return Ok(());
    };

    if users.find_by_email(email).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;
    let admin = users
        .insert(NewUser {
            email: email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await?;
    info!(user_id = admin.id, email = %admin.email, "Seeded admin user");

    Ok(())
}
