use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use classconnect_auth::AuthContext;
use classconnect_db::Store;
use classconnect_models::announcements::{
    Announcement, AnnouncementChanges, CreateAnnouncementRequest, NewAnnouncement,
};

use super::error::AnnouncementError;
use crate::modules::classes::access::{Membership, class_membership, require_class_teacher};

pub struct AnnouncementService;

impl AnnouncementService {
    #[instrument(skip(db, dto), fields(title = %dto.title))]
    pub async fn create_announcement(
        db: &dyn Store,
        class_id: i64,
        teacher_id: i64,
        dto: CreateAnnouncementRequest,
        now: DateTime<Utc>,
    ) -> Result<Announcement, AnnouncementError> {
        require_class_teacher(db, class_id, teacher_id).await?;

        let announcement = db
            .create_announcement(NewAnnouncement {
                class_id,
                title: dto.title.trim().to_string(),
                content: dto.content,
                created_by: teacher_id,
                created_date: now,
                scheduled_date: dto.scheduled_date,
                is_published: dto.is_published.unwrap_or(true),
            })
            .await?;

        info!(announcement_id = announcement.id, "Announcement created");
        Ok(announcement)
    }

    /// Newest first. Students only see published announcements whose
    /// scheduled date has arrived.
    #[instrument(skip(db))]
    pub async fn list_announcements(
        db: &dyn Store,
        class_id: i64,
        ctx: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<Vec<Announcement>, AnnouncementError> {
        let (_, membership) = class_membership(db, class_id, ctx).await?;

        let mut announcements = db.list_announcements(class_id).await?;
        if membership == Membership::Student {
            announcements.retain(|a| is_visible(a, now));
        }
        Ok(announcements)
    }

    #[instrument(skip(db))]
    pub async fn get_announcement(
        db: &dyn Store,
        class_id: i64,
        announcement_id: i64,
        ctx: &AuthContext,
        now: DateTime<Utc>,
    ) -> Result<Announcement, AnnouncementError> {
        let (_, membership) = class_membership(db, class_id, ctx).await?;

        db.find_announcement(class_id, announcement_id)
            .await?
            .filter(|a| membership == Membership::Teacher || is_visible(a, now))
            .ok_or(AnnouncementError::AnnouncementNotFound)
    }

    #[instrument(skip(db, changes))]
    pub async fn update_announcement(
        db: &dyn Store,
        class_id: i64,
        announcement_id: i64,
        user_id: i64,
        changes: AnnouncementChanges,
    ) -> Result<Announcement, AnnouncementError> {
        Self::authored(db, class_id, announcement_id, user_id).await?;

        db.update_announcement(class_id, announcement_id, changes)
            .await?
            .ok_or(AnnouncementError::AnnouncementNotFound)
    }

    #[instrument(skip(db))]
    pub async fn delete_announcement(
        db: &dyn Store,
        class_id: i64,
        announcement_id: i64,
        user_id: i64,
    ) -> Result<(), AnnouncementError> {
        Self::authored(db, class_id, announcement_id, user_id).await?;

        if !db.delete_announcement(class_id, announcement_id).await? {
            return Err(AnnouncementError::AnnouncementNotFound);
        }
        info!(announcement_id, "Announcement deleted");
        Ok(())
    }

    async fn authored(
        db: &dyn Store,
        class_id: i64,
        announcement_id: i64,
        user_id: i64,
    ) -> Result<Announcement, AnnouncementError> {
        let announcement = db
            .find_announcement(class_id, announcement_id)
            .await?
            .ok_or(AnnouncementError::AnnouncementNotFound)?;

        if announcement.created_by != user_id {
            return Err(AnnouncementError::NotAuthor);
        }
        Ok(announcement)
    }
}

fn is_visible(announcement: &Announcement, now: DateTime<Utc>) -> bool {
    announcement.is_published && announcement.scheduled_date.is_none_or(|at| at <= now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use classconnect_db::{ClassStore, MemoryStore, UserStore};
    use classconnect_models::UserRole;
    use classconnect_models::classes::NewClass;
    use classconnect_models::users::NewUser;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn ctx(user_id: i64, role: UserRole) -> AuthContext {
        AuthContext {
            user_id,
            email: format!("u{user_id}@example.com"),
            role,
        }
    }

    async fn setup(db: &MemoryStore) -> (i64, i64, i64, i64) {
        let mut ids = Vec::new();
        for (email, role) in [
            ("lead@example.com", UserRole::Teacher),
            ("co@example.com", UserRole::Teacher),
            ("kid@example.com", UserRole::Student),
        ] {
            let user = db
                .create_user(NewUser {
                    email: email.to_string(),
                    password_hash: "x".to_string(),
                    first_name: "Pat".to_string(),
                    last_name: "Lee".to_string(),
                    role,
                    department: None,
                    grade_level: None,
                    registered_at: now(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }

        let class = db
            .create_class(NewClass {
                class_name: "Chemistry".to_string(),
                class_code: "CHEM01".to_string(),
                description: None,
                subject: None,
                theme_color: None,
                creator_id: ids[0],
                created_date: now(),
            })
            .await
            .unwrap();
        db.enroll_student(class.id, ids[2], now()).await.unwrap();
        (class.id, ids[0], ids[1], ids[2])
    }

    fn post(title: &str, scheduled: Option<DateTime<Utc>>) -> CreateAnnouncementRequest {
        CreateAnnouncementRequest {
            title: title.to_string(),
            content: "Bring goggles".to_string(),
            scheduled_date: scheduled,
            is_published: None,
        }
    }

    #[tokio::test]
    async fn test_scheduled_announcements_hidden_from_students_until_due() {
        let db = MemoryStore::default();
        let (class_id, lead, _, kid) = setup(&db).await;

        AnnouncementService::create_announcement(&db, class_id, lead, post("Now", None), now())
            .await
            .unwrap();
        AnnouncementService::create_announcement(
            &db,
            class_id,
            lead,
            post("Later", Some(now() + Duration::days(2))),
            now(),
        )
        .await
        .unwrap();

        let teacher_sees = AnnouncementService::list_announcements(
            &db,
            class_id,
            &ctx(lead, UserRole::Teacher),
            now(),
        )
        .await
        .unwrap();
        assert_eq!(teacher_sees.len(), 2);

        let student_sees = AnnouncementService::list_announcements(
            &db,
            class_id,
            &ctx(kid, UserRole::Student),
            now(),
        )
        .await
        .unwrap();
        assert_eq!(student_sees.len(), 1);
        assert_eq!(student_sees[0].title, "Now");
    }

    #[tokio::test]
    async fn test_only_author_may_edit_or_delete() {
        let db = MemoryStore::default();
        let (class_id, lead, co, _) = setup(&db).await;

        let announcement =
            AnnouncementService::create_announcement(&db, class_id, lead, post("Quiz", None), now())
                .await
                .unwrap();

        let err = AnnouncementService::delete_announcement(&db, class_id, announcement.id, co)
            .await
            .unwrap_err();
        assert!(matches!(err, AnnouncementError::NotAuthor));

        let changes = AnnouncementChanges {
            title: Some("Quiz moved".to_string()),
            ..Default::default()
        };
        let updated =
            AnnouncementService::update_announcement(&db, class_id, announcement.id, lead, changes)
                .await
                .unwrap();
        assert_eq!(updated.title, "Quiz moved");

        AnnouncementService::delete_announcement(&db, class_id, announcement.id, lead)
            .await
            .unwrap();
    }
}
