//! Fake teachers and students.

use std::time::Instant;

use chrono::{DateTime, Utc};
use fake::Fake;
use fake::faker::company::en::Industry;
use fake::faker::name::en::{FirstName, LastName};
use rayon::prelude::*;

use classconnect_db::Store;
use classconnect_models::UserRole;
use classconnect_models::users::{NewUser, User};

use super::{SEED_EMAIL_DOMAIN, SeedError};

const GRADE_LEVELS: &[&str] = &["9", "10", "11", "12"];

/// Builds `count` accounts of one role in parallel. Emails are unique
/// within the batch and live under the seed domain.
pub fn generate_users(
    role: UserRole,
    count: usize,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Vec<NewUser> {
    (0..count)
        .into_par_iter()
        .map(|idx| {
            let first_name: String = FirstName().fake();
            let last_name: String = LastName().fake();
            let email = format!(
                "{}.{}+{}{}@{}",
                slug(&first_name),
                slug(&last_name),
                role.as_str(),
                idx,
                SEED_EMAIL_DOMAIN
            );

            let (department, grade_level) = match role {
                UserRole::Teacher => (Some(Industry().fake::<String>()), None),
                UserRole::Student => (None, Some(GRADE_LEVELS[idx % GRADE_LEVELS.len()].into())),
            };

            NewUser {
                email,
                password_hash: password_hash.to_string(),
                first_name,
                last_name,
                role,
                department,
                grade_level,
                registered_at: now,
            }
        })
        .collect()
}

fn slug(name: &str) -> String {
    name.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Inserts the accounts one by one. Accounts whose email is already taken
/// (a previous seed run) are skipped.
pub async fn insert_users(db: &dyn Store, users: Vec<NewUser>) -> Result<Vec<User>, SeedError> {
    let start_time = Instant::now();
    let total = users.len();
    let mut created = Vec::with_capacity(total);

    for user in users {
        match db.create_user(user).await {
            Ok(user) => created.push(user),
            Err(e) if e.is_conflict() => continue,
            Err(e) => return Err(e.into()),
        }
    }

    println!(
        "   ✓ Inserted {} of {} users in {:?}",
        created.len(),
        total,
        start_time.elapsed()
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_emails_are_unique_and_under_seed_domain() {
        let users = generate_users(UserRole::Student, 200, "hash", Utc::now());
        assert_eq!(users.len(), 200);

        let emails: HashSet<&str> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails.len(), 200);
        assert!(
            users
                .iter()
                .all(|u| u.email.ends_with(&format!("@{SEED_EMAIL_DOMAIN}")))
        );
        assert!(users.iter().all(|u| u.grade_level.is_some()));
    }

    #[test]
    fn test_teachers_get_a_department() {
        let users = generate_users(UserRole::Teacher, 5, "hash", Utc::now());
        assert!(
            users
                .iter()
                .all(|u| u.role == UserRole::Teacher && u.department.is_some())
        );
    }
}
