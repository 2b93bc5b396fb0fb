use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use classconnect_core::ErrorResponse;
use classconnect_models::UserRole;
use classconnect_models::announcements::{
    Announcement, CreateAnnouncementRequest, UpdateAnnouncementRequest,
};
use classconnect_models::assignments::{
    Assignment, AssignmentResponse, CreateAssignmentRequest, UpdateAssignmentRequest,
};
use classconnect_models::auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest, VerifyEmailRequest,
};
use classconnect_models::chat::{ChatMessage, SendMessageRequest};
use classconnect_models::classes::{
    Class, ClassStudent, CreateClassRequest, JoinClassRequest, UpdateClassRequest,
};
use classconnect_models::submissions::{
    GradeRequest, SubmissionRecord, SubmissionStatus, SubmissionView, SubmitRequest,
};
use classconnect_models::users::{
    CurrentUserResponse, RoleProfile, StudentProfile, TeacherProfile, UserSummary,
};

use crate::modules::health::controller::{DatabaseHealth, HealthResponse, PingResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::health::controller::ping,
        crate::modules::health::controller::health,
        crate::modules::auth::controller::register,
        crate::modules::auth::controller::login,
        crate::modules::auth::controller::refresh_token,
        crate::modules::auth::controller::forgot_password,
        crate::modules::auth::controller::reset_password,
        crate::modules::auth::controller::verify_email,
        crate::modules::users::controller::get_me,
        crate::modules::classes::controller::create_class,
        crate::modules::classes::controller::list_classes,
        crate::modules::classes::controller::get_class,
        crate::modules::classes::controller::update_class,
        crate::modules::classes::controller::archive_class,
        crate::modules::classes::controller::delete_class,
        crate::modules::classes::controller::join_class,
        crate::modules::classes::controller::list_students,
        crate::modules::classes::controller::remove_student,
        crate::modules::assignments::controller::create_assignment,
        crate::modules::assignments::controller::list_assignments,
        crate::modules::assignments::controller::get_assignment,
        crate::modules::assignments::controller::update_assignment,
        crate::modules::assignments::controller::delete_assignment,
        crate::modules::submissions::controller::submit,
        crate::modules::submissions::controller::my_submission,
        crate::modules::submissions::controller::list_submissions,
        crate::modules::submissions::controller::student_submission,
        crate::modules::submissions::controller::grade_submission,
        crate::modules::announcements::controller::create_announcement,
        crate::modules::announcements::controller::list_announcements,
        crate::modules::announcements::controller::get_announcement,
        crate::modules::announcements::controller::update_announcement,
        crate::modules::announcements::controller::delete_announcement,
        crate::modules::chat::controller::list_messages,
        crate::modules::chat::controller::send_message,
        crate::modules::chat::controller::delete_message,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            UserRole,
            UserSummary,
            CurrentUserResponse,
            RoleProfile,
            TeacherProfile,
            StudentProfile,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            RefreshTokenRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            VerifyEmailRequest,
            Class,
            ClassStudent,
            CreateClassRequest,
            UpdateClassRequest,
            JoinClassRequest,
            Assignment,
            AssignmentResponse,
            CreateAssignmentRequest,
            UpdateAssignmentRequest,
            SubmissionStatus,
            SubmissionRecord,
            SubmissionView,
            SubmitRequest,
            GradeRequest,
            Announcement,
            CreateAnnouncementRequest,
            UpdateAnnouncementRequest,
            ChatMessage,
            SendMessageRequest,
            PingResponse,
            HealthResponse,
            DatabaseHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Authentication", description = "Registration, login and password recovery"),
        (name = "Users", description = "The signed-in user"),
        (name = "Classes", description = "Classes, codes and rosters"),
        (name = "Assignments", description = "Assignments within a class"),
        (name = "Submissions", description = "Submitting and grading work"),
        (name = "Announcements", description = "Class announcements"),
        (name = "Chat", description = "Class chat")
    ),
    info(
        title = "ClassConnect API",
        version = "0.1.0",
        description = "Classroom REST API: classes, assignments, submissions, announcements and chat for teachers and students.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
