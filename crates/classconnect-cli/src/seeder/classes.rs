//! Fake classes, enrollments and assignments.

use std::collections::HashSet;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use fake::Fake;
use fake::faker::lorem::en::{Sentence, Words};
use rand::Rng;
use rayon::prelude::*;

use classconnect_db::{Store, StoreError};
use classconnect_models::assignments::{DEFAULT_POINTS_POSSIBLE, NewAssignment};
use classconnect_models::classes::{CLASS_CODE_ALPHABET, CLASS_CODE_LENGTH, Class, NewClass};

use super::SeedError;

const SUBJECTS: &[&str] = &[
    "Algebra",
    "Biology",
    "Chemistry",
    "History",
    "Literature",
    "Physics",
    "Geography",
    "Art",
];
const THEME_COLORS: &[&str] = &["#1E88E5", "#43A047", "#FB8C00", "#8E24AA", "#E53935"];
const MAX_CODE_ATTEMPTS: usize = 10;

pub fn random_class_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CLASS_CODE_LENGTH)
        .map(|_| CLASS_CODE_ALPHABET[rng.gen_range(0..CLASS_CODE_ALPHABET.len())] as char)
        .collect()
}

/// `per_teacher` classes for each teacher, with codes unique within the batch.
pub fn generate_classes(teacher_ids: &[i64], per_teacher: usize, now: DateTime<Utc>) -> Vec<NewClass> {
    let mut classes: Vec<NewClass> = teacher_ids
        .par_iter()
        .enumerate()
        .flat_map_iter(|(teacher_idx, &teacher_id)| {
            (0..per_teacher).map(move |class_idx| {
                let subject = SUBJECTS[(teacher_idx + class_idx) % SUBJECTS.len()];
                NewClass {
                    class_name: format!("{subject} {}", 100 + teacher_idx * 10 + class_idx),
                    class_code: random_class_code(),
                    description: Some(Sentence(4..10).fake()),
                    subject: Some(subject.to_string()),
                    theme_color: Some(THEME_COLORS[class_idx % THEME_COLORS.len()].to_string()),
                    creator_id: teacher_id,
                    created_date: now,
                }
            })
        })
        .collect();

    let mut seen = HashSet::with_capacity(classes.len());
    for class in &mut classes {
        while !seen.insert(class.class_code.clone()) {
            class.class_code = random_class_code();
        }
    }
    classes
}

/// Inserts a class, drawing a new code when the generated one is already
/// taken in the store.
pub async fn insert_class(db: &dyn Store, mut class: NewClass) -> Result<Class, SeedError> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        match db.create_class(class.clone()).await {
            Ok(created) => return Ok(created),
            Err(StoreError::Conflict(_)) => class.class_code = random_class_code(),
            Err(e) => return Err(e.into()),
        }
    }
    Err(SeedError::CodeSpaceExhausted)
}

/// Assignments spread over the coming weeks, a few already past due.
pub fn generate_assignments(classes: &[Class], per_class: usize, now: DateTime<Utc>) -> Vec<NewAssignment> {
    classes
        .par_iter()
        .flat_map_iter(|class| {
            (0..per_class).map(move |idx| {
                let words: Vec<String> = Words(2..4).fake();
                let week_offset = idx as i64 - 1;
                NewAssignment {
                    class_id: class.id,
                    title: format!("{} {}", capitalize(&words.join(" ")), idx + 1),
                    description: Some(Sentence(6..14).fake()),
                    due_date: Some(now + Duration::weeks(week_offset)),
                    points_possible: DEFAULT_POINTS_POSSIBLE,
                    is_published: true,
                    allow_late_submissions: idx % 2 == 0,
                    created_by: class.creator_id,
                    created_at: now,
                }
            })
        })
        .collect()
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn enroll_all(
    db: &dyn Store,
    classes: &[Class],
    student_ids: &[i64],
    now: DateTime<Utc>,
) -> Result<usize, SeedError> {
    let start_time = Instant::now();
    let mut enrolled = 0;

    for class in classes {
        for &student_id in student_ids {
            match db.enroll_student(class.id, student_id, now).await {
                Ok(()) => enrolled += 1,
                Err(e) if e.is_conflict() => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    println!("   ✓ Created {enrolled} enrollments in {:?}", start_time.elapsed());
    Ok(enrolled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_unique_and_well_formed() {
        let teachers: Vec<i64> = (1..=20).collect();
        let classes = generate_classes(&teachers, 5, Utc::now());
        assert_eq!(classes.len(), 100);

        let codes: HashSet<&str> = classes.iter().map(|c| c.class_code.as_str()).collect();
        assert_eq!(codes.len(), 100);
        assert!(codes.iter().all(|code| {
            code.len() == CLASS_CODE_LENGTH && code.bytes().all(|b| CLASS_CODE_ALPHABET.contains(&b))
        }));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("quiz one"), "Quiz one");
        assert_eq!(capitalize(""), "");
    }
}
