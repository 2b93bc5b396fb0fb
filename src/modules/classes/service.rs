use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use classconnect_auth::AuthContext;
use classconnect_db::{Store, StoreError};
use classconnect_models::UserRole;
use classconnect_models::classes::{
    Class, ClassChanges, ClassStudent, CreateClassRequest, NewClass, normalize_class_code,
};

use super::access::{class_membership, require_class_teacher};
use super::error::ClassError;
use crate::utils::tokens::generate_class_code;

pub const MAX_CODE_ATTEMPTS: usize = 10;

pub struct ClassService;

impl ClassService {
    #[instrument(skip(db, dto), fields(class_name = %dto.class_name))]
    pub async fn create_class(
        db: &dyn Store,
        teacher_id: i64,
        dto: CreateClassRequest,
        now: DateTime<Utc>,
    ) -> Result<Class, ClassError> {
        Self::create_class_with(db, teacher_id, dto, now, &mut generate_class_code).await
    }

    /// Draws codes from `next_code` until one is free, at most
    /// [`MAX_CODE_ATTEMPTS`] times. The class and its teacher link are
    /// written together.
    pub async fn create_class_with<F>(
        db: &dyn Store,
        teacher_id: i64,
        dto: CreateClassRequest,
        now: DateTime<Utc>,
        next_code: &mut F,
    ) -> Result<Class, ClassError>
    where
        F: FnMut() -> String + Send,
    {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let class_code = next_code();
            if db.class_code_exists(&class_code).await? {
                debug!(attempt, "Class code collision");
                continue;
            }

            let new_class = NewClass {
                class_name: dto.class_name.trim().to_string(),
                class_code,
                description: dto.description.clone(),
                subject: dto.subject.clone(),
                theme_color: dto.theme_color.clone(),
                creator_id: teacher_id,
                created_date: now,
            };

            match db.create_class(new_class).await {
                Ok(class) => {
                    info!(class_id = class.id, "Class created");
                    return Ok(class);
                }
                // Lost a race for the code between the check and the insert.
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Err(ClassError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Taught classes for teachers, enrolled classes for students.
    #[instrument(skip(db))]
    pub async fn list_classes(db: &dyn Store, ctx: &AuthContext) -> Result<Vec<Class>, ClassError> {
        let classes = match ctx.role {
            UserRole::Teacher => db.classes_for_teacher(ctx.user_id).await?,
            UserRole::Student => db.classes_for_student(ctx.user_id).await?,
        };
        Ok(classes)
    }

    #[instrument(skip(db))]
    pub async fn get_class(
        db: &dyn Store,
        class_id: i64,
        ctx: &AuthContext,
    ) -> Result<Class, ClassError> {
        let (class, _) = class_membership(db, class_id, ctx).await?;
        Ok(class)
    }

    #[instrument(skip(db, changes))]
    pub async fn update_class(
        db: &dyn Store,
        class_id: i64,
        teacher_id: i64,
        changes: ClassChanges,
    ) -> Result<Class, ClassError> {
        require_class_teacher(db, class_id, teacher_id).await?;

        db.update_class(class_id, changes)
            .await?
            .ok_or(ClassError::ClassNotFound)
    }

    #[instrument(skip(db))]
    pub async fn archive_class(
        db: &dyn Store,
        class_id: i64,
        teacher_id: i64,
    ) -> Result<Class, ClassError> {
        let changes = ClassChanges {
            is_archived: Some(true),
            ..Default::default()
        };
        Self::update_class(db, class_id, teacher_id, changes).await
    }

    /// Only the teacher who created the class may delete it.
    #[instrument(skip(db))]
    pub async fn delete_class(
        db: &dyn Store,
        class_id: i64,
        teacher_id: i64,
    ) -> Result<(), ClassError> {
        let class = require_class_teacher(db, class_id, teacher_id).await?;
        if class.creator_id != teacher_id {
            return Err(ClassError::NotClassTeacher);
        }

        if !db.delete_class(class_id).await? {
            return Err(ClassError::ClassNotFound);
        }
        info!(class_id, "Class deleted");
        Ok(())
    }

    /// Enrolls the student in the class behind `raw_code`. Archived classes
    /// do not accept new students.
    #[instrument(skip(db))]
    pub async fn join_class(
        db: &dyn Store,
        student_id: i64,
        raw_code: &str,
        now: DateTime<Utc>,
    ) -> Result<Class, ClassError> {
        let code = normalize_class_code(raw_code);
        let class = db
            .find_class_by_code(&code)
            .await?
            .filter(|class| !class.is_archived)
            .ok_or(ClassError::InvalidClassCode)?;

        db.enroll_student(class.id, student_id, now)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => ClassError::AlreadyEnrolled,
                other => ClassError::Store(other),
            })?;

        info!(class_id = class.id, student_id, "Student joined class");
        Ok(class)
    }

    #[instrument(skip(db))]
    pub async fn list_students(
        db: &dyn Store,
        class_id: i64,
        teacher_id: i64,
    ) -> Result<Vec<ClassStudent>, ClassError> {
        require_class_teacher(db, class_id, teacher_id).await?;
        Ok(db.list_class_students(class_id).await?)
    }

    /// Deactivates the enrollment. The student's submissions are kept.
    #[instrument(skip(db))]
    pub async fn remove_student(
        db: &dyn Store,
        class_id: i64,
        teacher_id: i64,
        student_id: i64,
    ) -> Result<(), ClassError> {
        require_class_teacher(db, class_id, teacher_id).await?;

        if !db.deactivate_enrollment(class_id, student_id).await? {
            return Err(ClassError::StudentNotEnrolled);
        }
        info!(class_id, student_id, "Student removed from class");
        Ok(())
    }
}
