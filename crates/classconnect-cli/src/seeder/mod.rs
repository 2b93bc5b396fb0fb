//! Fake data for local development.
//!
//! Every seeded account lives under [`SEED_EMAIL_DOMAIN`], which is how
//! [`clear_seed`] finds them again. Deleting the accounts cascades to the
//! classes they created and everything under them.

mod classes;
mod models;
mod users;

use std::time::Instant;

use chrono::{DateTime, Utc};

use classconnect_core::{HashError, PasswordHasher};
use classconnect_db::{Store, StoreError};
use classconnect_models::UserRole;

pub use classes::{generate_assignments, generate_classes, random_class_code};
pub use models::{SeedConfig, SeedSummary};
pub use users::generate_users;

pub const SEED_EMAIL_DOMAIN: &str = "seed.classconnect.test";

/// Password shared by every seeded account.
pub const SEED_PASSWORD: &str = "password123";

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to hash the seed password: {0}")]
    Hash(#[from] HashError),

    #[error("could not find a free class code")]
    CodeSpaceExhausted,
}

pub async fn seed_all(
    db: &dyn Store,
    hasher: &PasswordHasher,
    config: SeedConfig,
    now: DateTime<Utc>,
) -> Result<SeedSummary, SeedError> {
    let start_time = Instant::now();
    println!("🌱 Seeding database...");

    let password_hash = hasher.hash(SEED_PASSWORD)?;

    println!("👩‍🏫 Seeding {} teachers...", config.teachers);
    let teachers = users::insert_users(
        db,
        generate_users(UserRole::Teacher, config.teachers, &password_hash, now),
    )
    .await?;

    println!("🎓 Seeding {} students...", config.students);
    let students = users::insert_users(
        db,
        generate_users(UserRole::Student, config.students, &password_hash, now),
    )
    .await?;

    let teacher_ids: Vec<i64> = teachers.iter().map(|u| u.id).collect();
    let student_ids: Vec<i64> = students.iter().map(|u| u.id).collect();

    println!(
        "🏫 Seeding {} classes ({} per teacher)...",
        teacher_ids.len() * config.classes_per_teacher,
        config.classes_per_teacher
    );
    let mut created_classes = Vec::new();
    for class in generate_classes(&teacher_ids, config.classes_per_teacher, now) {
        created_classes.push(classes::insert_class(db, class).await?);
    }

    let enrollments = classes::enroll_all(db, &created_classes, &student_ids, now).await?;

    println!(
        "📝 Seeding {} assignments per class...",
        config.assignments_per_class
    );
    let mut assignments = 0;
    for assignment in generate_assignments(&created_classes, config.assignments_per_class, now) {
        db.create_assignment(assignment).await?;
        assignments += 1;
    }

    let summary = SeedSummary {
        teachers: teachers.len(),
        students: students.len(),
        classes: created_classes.len(),
        enrollments,
        assignments,
    };

    println!("✅ Seeding finished in {:?}", start_time.elapsed());
    println!("   Seeded accounts use the password \"{SEED_PASSWORD}\"");
    Ok(summary)
}

/// Removes every account under the seed domain. Returns how many.
pub async fn clear_seed(db: &dyn Store) -> Result<u64, SeedError> {
    let removed = db
        .delete_users_by_email_suffix(&format!("@{SEED_EMAIL_DOMAIN}"))
        .await?;
    println!("🧹 Removed {removed} seeded accounts");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use classconnect_core::MIN_COST;
    use classconnect_db::{ClassStore, MemoryStore, UserStore};

    #[tokio::test]
    async fn test_seed_then_clear() {
        let db = MemoryStore::default();
        let hasher = PasswordHasher::new(MIN_COST);
        let config = SeedConfig {
            teachers: 2,
            classes_per_teacher: 2,
            students: 5,
            assignments_per_class: 3,
        };

        let summary = seed_all(&db, &hasher, config, Utc::now()).await.unwrap();
        assert_eq!(summary.teachers, 2);
        assert_eq!(summary.students, 5);
        assert_eq!(summary.classes, 4);
        assert_eq!(summary.enrollments, 20);
        assert_eq!(summary.assignments, 12);

        let student = first_student(&db).await;
        assert!(hasher.verify(SEED_PASSWORD, &student.password_hash));
        assert_eq!(db.classes_for_student(student.id).await.unwrap().len(), 4);

        let removed = clear_seed(&db).await.unwrap();
        assert_eq!(removed, 7);
        assert!(
            db.find_user_by_email(&student.email)
                .await
                .unwrap()
                .is_none()
        );
    }

    async fn first_student(db: &MemoryStore) -> classconnect_models::users::User {
        for id in 1..100 {
            if let Some(user) = db.find_user_by_id(id).await.unwrap() {
                if user.role == UserRole::Student {
                    return user;
                }
            }
        }
        panic!("no seeded student found");
    }
}
