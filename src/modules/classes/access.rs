//! Class membership checks shared by every class-scoped module.

use classconnect_auth::AuthContext;
use classconnect_db::Store;
use classconnect_models::UserRole;
use classconnect_models::classes::Class;

use super::error::ClassError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Teacher,
    Student,
}

/// The class, and how the caller belongs to it: teaching it or actively
/// enrolled. Anyone else gets `NotAMember`.
pub async fn class_membership(
    db: &dyn Store,
    class_id: i64,
    ctx: &AuthContext,
) -> Result<(Class, Membership), ClassError> {
    let class = db
        .find_class(class_id)
        .await?
        .ok_or(ClassError::ClassNotFound)?;

    let membership = match ctx.role {
        UserRole::Teacher => db
            .is_class_teacher(class_id, ctx.user_id)
            .await?
            .then_some(Membership::Teacher),
        UserRole::Student => db
            .is_enrolled(class_id, ctx.user_id)
            .await?
            .then_some(Membership::Student),
    };

    membership
        .map(|membership| (class, membership))
        .ok_or(ClassError::NotAMember)
}

pub async fn require_class_teacher(
    db: &dyn Store,
    class_id: i64,
    teacher_id: i64,
) -> Result<Class, ClassError> {
    let class = db
        .find_class(class_id)
        .await?
        .ok_or(ClassError::ClassNotFound)?;

    if !db.is_class_teacher(class_id, teacher_id).await? {
        return Err(ClassError::NotClassTeacher);
    }

    Ok(class)
}
