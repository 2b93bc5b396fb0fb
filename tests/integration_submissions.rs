mod common;

use axum::Router;
use axum::http::StatusCode;
use common::{
    TestUser, create_class, join_class, register_student, register_teacher, send, setup_test_app,
};
use serde_json::{Value, json};

struct Classroom {
    app: Router,
    teacher: TestUser,
    student: TestUser,
    class_id: i64,
    code: String,
}

async fn classroom() -> Classroom {
    let app = setup_test_app();
    let teacher = register_teacher(&app, "Ada").await;
    let student = register_student(&app, "Sam").await;
    let (class_id, code) = create_class(&app, &teacher, "Algebra").await;
    join_class(&app, &student, &code).await;
    Classroom {
        app,
        teacher,
        student,
        class_id,
        code,
    }
}

async fn create_assignment(room: &Classroom, payload: Value) -> i64 {
    let (status, body) = send(
        &room.app,
        "POST",
        &format!("/api/classes/{}/assignments", room.class_id),
        Some(&room.teacher.token),
        Some(payload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create assignment failed: {body}");
    body["id"].as_i64().unwrap()
}

fn assignment_uri(room: &Classroom, assignment_id: i64, rest: &str) -> String {
    format!(
        "/api/classes/{}/assignments/{assignment_id}{rest}",
        room.class_id
    )
}

#[tokio::test]
async fn test_late_flag_follows_due_date_after_grading() {
    let room = classroom().await;
    let assignment_id = create_assignment(
        &room,
        json!({ "title": "Quadratics", "dueDate": "2020-01-10T23:59:00Z" }),
    )
    .await;

    let (status, body) = send(
        &room.app,
        "POST",
        &assignment_uri(&room, assignment_id, "/submit"),
        Some(&room.student.token),
        Some(json!({ "content": "x = 2 or x = 3" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "submitted");
    assert_eq!(body["isLate"], true);

    let (status, body) = send(
        &room.app,
        "PUT",
        &assignment_uri(
            &room,
            assignment_id,
            &format!("/submissions/{}/grade", room.student.id),
        ),
        Some(&room.teacher.token),
        Some(json!({ "grade": 95, "feedback": "Nice work" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "graded");
    assert_eq!(body["grade"], 95);
    assert_eq!(body["gradedBy"], room.teacher.id);

    let (status, _) = send(
        &room.app,
        "PUT",
        &assignment_uri(&room, assignment_id, ""),
        Some(&room.teacher.token),
        Some(json!({ "dueDate": "2099-01-20T23:59:00Z" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &room.app,
        "GET",
        &assignment_uri(&room, assignment_id, "/submission"),
        Some(&room.student.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isLate"], false);
    assert_eq!(body["status"], "graded");
    assert_eq!(body["grade"], 95);
    assert_eq!(body["feedback"], "Nice work");
}

#[tokio::test]
async fn test_resubmission_overwrites_until_graded() {
    let room = classroom().await;
    let assignment_id = create_assignment(&room, json!({ "title": "Proofs" })).await;
    let submit_uri = assignment_uri(&room, assignment_id, "/submit");

    let (_, first) = send(
        &room.app,
        "POST",
        &submit_uri,
        Some(&room.student.token),
        Some(json!({ "content": "draft" })),
    )
    .await;
    let (status, second) = send(
        &room.app,
        "POST",
        &submit_uri,
        Some(&room.student.token),
        Some(json!({ "fileUrl": "https://files.test/proof.pdf" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["fileUrl"], "https://files.test/proof.pdf");

    let (status, _) = send(
        &room.app,
        "POST",
        &assignment_uri(
            &room,
            assignment_id,
            &format!("/submissions/{}/grade", room.student.id),
        ),
        Some(&room.teacher.token),
        Some(json!({ "grade": 80 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &room.app,
        "POST",
        &submit_uri,
        Some(&room.student.token),
        Some(json!({ "content": "too late to change" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_submission_rules() {
    let room = classroom().await;
    let strict_id = create_assignment(
        &room,
        json!({
            "title": "Closed",
            "dueDate": "2020-01-01T00:00:00Z",
            "allowLateSubmissions": false
        }),
    )
    .await;
    let open_id = create_assignment(&room, json!({ "title": "Open" })).await;

    let (status, _) = send(
        &room.app,
        "POST",
        &assignment_uri(&room, strict_id, "/submit"),
        Some(&room.student.token),
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &room.app,
        "POST",
        &assignment_uri(&room, open_id, "/submit"),
        Some(&room.student.token),
        Some(json!({ "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &room.app,
        "POST",
        &assignment_uri(&room, open_id, "/submit"),
        Some(&room.teacher.token),
        Some(json!({ "content": "teachers do not submit" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let outsider = register_student(&room.app, "Eve").await;
    let (status, _) = send(
        &room.app,
        "POST",
        &assignment_uri(&room, open_id, "/submit"),
        Some(&outsider.token),
        Some(json!({ "content": "let me in" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_grade_validation_and_roster() {
    let room = classroom().await;
    let late_comer = register_student(&room.app, "Lee").await;
    join_class(&room.app, &late_comer, &room.code).await;

    let assignment_id =
        create_assignment(&room, json!({ "title": "Worksheet", "pointsPossible": 50 })).await;
    send(
        &room.app,
        "POST",
        &assignment_uri(&room, assignment_id, "/submit"),
        Some(&room.student.token),
        Some(json!({ "content": "answers" })),
    )
    .await;

    let grade_uri = assignment_uri(
        &room,
        assignment_id,
        &format!("/submissions/{}/grade", room.student.id),
    );
    let (status, _) = send(
        &room.app,
        "PUT",
        &grade_uri,
        Some(&room.teacher.token),
        Some(json!({ "grade": 51 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &room.app,
        "PUT",
        &grade_uri,
        Some(&room.student.token),
        Some(json!({ "grade": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &room.app,
        "PUT",
        &assignment_uri(
            &room,
            assignment_id,
            &format!("/submissions/{}/grade", late_comer.id),
        ),
        Some(&room.teacher.token),
        Some(json!({ "grade": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &room.app,
        "GET",
        &assignment_uri(&room, assignment_id, "/submissions"),
        Some(&room.teacher.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let roster = body.as_array().unwrap();
    assert_eq!(roster.len(), 2);
    let status_of = |id: i64| {
        roster
            .iter()
            .find(|entry| entry["studentId"] == id)
            .map(|entry| entry["status"].clone())
    };
    assert_eq!(status_of(room.student.id), Some(json!("submitted")));
    assert_eq!(status_of(late_comer.id), Some(json!("not_submitted")));

    let (status, body) = send(
        &room.app,
        "GET",
        &assignment_uri(
            &room,
            assignment_id,
            &format!("/submissions/{}", room.student.id),
        ),
        Some(&late_comer.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

#[tokio::test]
async fn test_student_views_hide_drafts() {
    let room = classroom().await;
    create_assignment(&room, json!({ "title": "Published" })).await;
    let draft_id =
        create_assignment(&room, json!({ "title": "Draft", "isPublished": false })).await;

    let list_uri = format!("/api/classes/{}/assignments", room.class_id);
    let (_, teacher_view) = send(&room.app, "GET", &list_uri, Some(&room.teacher.token), None).await;
    let (_, student_view) = send(&room.app, "GET", &list_uri, Some(&room.student.token), None).await;

    assert_eq!(teacher_view.as_array().unwrap().len(), 2);
    let student_view = student_view.as_array().unwrap();
    assert_eq!(student_view.len(), 1);
    assert_eq!(student_view[0]["status"], "not_submitted");

    let (status, _) = send(
        &room.app,
        "GET",
        &assignment_uri(&room, draft_id, ""),
        Some(&room.student.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_announcements_and_chat() {
    let room = classroom().await;
    let announcements_uri = format!("/api/classes/{}/announcements", room.class_id);

    let (status, body) = send(
        &room.app,
        "POST",
        &announcements_uri,
        Some(&room.teacher.token),
        Some(json!({ "title": "Quiz Friday", "content": "Chapters 1 to 3" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["authorName"], "Ada Tester");

    send(
        &room.app,
        "POST",
        &announcements_uri,
        Some(&room.teacher.token),
        Some(json!({
            "title": "Next term",
            "content": "Coming soon",
            "scheduledDate": "2099-09-01T08:00:00Z"
        })),
    )
    .await;

    let (status, _) = send(
        &room.app,
        "POST",
        &announcements_uri,
        Some(&room.student.token),
        Some(json!({ "title": "Hi", "content": "Students cannot post" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, teacher_view) = send(
        &room.app,
        "GET",
        &announcements_uri,
        Some(&room.teacher.token),
        None,
    )
    .await;
    let (_, student_view) = send(
        &room.app,
        "GET",
        &announcements_uri,
        Some(&room.student.token),
        None,
    )
    .await;
    assert_eq!(teacher_view.as_array().unwrap().len(), 2);
    assert_eq!(student_view.as_array().unwrap().len(), 1);

    let chat_uri = format!("/api/classes/{}/chat", room.class_id);
    let (status, message) = send(
        &room.app,
        "POST",
        &chat_uri,
        Some(&room.student.token),
        Some(json!({ "content": "  Is the quiz open book?  " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["content"], "Is the quiz open book?");
    assert_eq!(message["userRole"], "student");

    let (status, _) = send(
        &room.app,
        "DELETE",
        &format!("{chat_uri}/{}", message["id"]),
        Some(&room.teacher.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&room.app, "GET", &chat_uri, Some(&room.student.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}
