use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use classconnect_auth::AuthContext;
use classconnect_db::Store;
use classconnect_models::chat::{ChatMessage, NewChatMessage};

use super::error::ChatError;
use crate::modules::classes::access::{Membership, class_membership};

pub struct ChatService;

impl ChatService {
    /// Non-deleted messages, oldest first.
    #[instrument(skip(db))]
    pub async fn list_messages(
        db: &dyn Store,
        class_id: i64,
        ctx: &AuthContext,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        class_membership(db, class_id, ctx).await?;
        Ok(db.list_messages(class_id).await?)
    }

    #[instrument(skip(db, content))]
    pub async fn send_message(
        db: &dyn Store,
        class_id: i64,
        ctx: &AuthContext,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<ChatMessage, ChatError> {
        class_membership(db, class_id, ctx).await?;

        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message = db
            .create_message(NewChatMessage {
                class_id,
                user_id: ctx.user_id,
                content: content.to_string(),
                timestamp: now,
            })
            .await?;

        debug!(message_id = message.id, "Chat message posted");
        Ok(message)
    }

    /// Soft delete. Allowed for the author or any teacher of the class.
    #[instrument(skip(db))]
    pub async fn delete_message(
        db: &dyn Store,
        class_id: i64,
        message_id: i64,
        ctx: &AuthContext,
    ) -> Result<(), ChatError> {
        let (_, membership) = class_membership(db, class_id, ctx).await?;

        let message = db
            .find_message(class_id, message_id)
            .await?
            .ok_or(ChatError::MessageNotFound)?;

        if message.user_id != ctx.user_id && membership != Membership::Teacher {
            return Err(ChatError::CannotDelete);
        }

        if !db.soft_delete_message(class_id, message_id).await? {
            return Err(ChatError::MessageNotFound);
        }
        Ok(())
    }
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
        Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
    }

    async fn member(db: &MemoryStore, email: &str, role: UserRole) -> AuthContext {
        let user = db
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "x".to_string(),
                first_name: "Kim".to_string(),
                last_name: "Park".to_string(),
                role,
                department: None,
                grade_level: None,
                registered_at: now(),
            })
            .await
            .unwrap();
        AuthContext {
            user_id: user.id,
            email: user.email,
            role,
        }
    }

    async fn class(db: &MemoryStore, teacher: &AuthContext, students: &[&AuthContext]) -> i64 {
        let class = db
            .create_class(NewClass {
                class_name: "Art".to_string(),
                class_code: "ART123".to_string(),
                description: None,
                subject: None,
                theme_color: None,
                creator_id: teacher.user_id,
                created_date: now(),
            })
            .await
            .unwrap();
        for student in students {
            db.enroll_student(class.id, student.user_id, now())
                .await
                .unwrap();
        }
        class.id
    }

    #[tokio::test]
    async fn test_messages_are_listed_oldest_first_without_deleted() {
        let db = MemoryStore::default();
        let teacher = member(&db, "t@example.com", UserRole::Teacher).await;
        let alice = member(&db, "a@example.com", UserRole::Student).await;
        let class_id = class(&db, &teacher, &[&alice]).await;

        let first = ChatService::send_message(&db, class_id, &alice, "hello", now())
            .await
            .unwrap();
        ChatService::send_message(&db, class_id, &teacher, "welcome", now() + Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(first.user_role, UserRole::Student);

        ChatService::delete_message(&db, class_id, first.id, &alice)
            .await
            .unwrap();

        let messages = ChatService::list_messages(&db, class_id, &teacher)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "welcome");
    }

    #[tokio::test]
    async fn test_delete_permissions() {
        let db = MemoryStore::default();
        let teacher = member(&db, "t@example.com", UserRole::Teacher).await;
        let alice = member(&db, "a@example.com", UserRole::Student).await;
        let bob = member(&db, "b@example.com", UserRole::Student).await;
        let class_id = class(&db, &teacher, &[&alice, &bob]).await;

        let message = ChatService::send_message(&db, class_id, &alice, "my answer", now())
            .await
            .unwrap();

        let err = ChatService::delete_message(&db, class_id, message.id, &bob)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::CannotDelete));

        ChatService::delete_message(&db, class_id, message.id, &teacher)
            .await
            .unwrap();

        let err = ChatService::delete_message(&db, class_id, message.id, &teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::MessageNotFound));
    }

    #[tokio::test]
    async fn test_outsiders_cannot_post() {
        let db = MemoryStore::default();
        let teacher = member(&db, "t@example.com", UserRole::Teacher).await;
        let stranger = member(&db, "s@example.com", UserRole::Student).await;
        let class_id = class(&db, &teacher, &[]).await;

        let err = ChatService::send_message(&db, class_id, &stranger, "hi", now())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Class(_)));

        let err = ChatService::send_message(&db, class_id, &teacher, "   ", now())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
    }
}
