// tests/quiz_flow_tests.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use practicum::config::Config;
use practicum::engine::presentation;
use practicum::external::{NoopAssistant, TokioScheduler};
use practicum::models::quiz::{Answer, Batch, Question, Quiz};
use practicum::models::user::User;
use practicum::routes;
use practicum::state::AppState;
use practicum::store::{MemStore, Store, new_id};
use practicum::utils::hash::hash_password;

struct TestApp {
    address: String,
    store: Arc<MemStore>,
}

/// Helper function to spawn the app on a random port for testing.
/// Runs against the in-memory store, so no database is required.
async fn spawn_app() -> TestApp {
    let store = Arc::new(MemStore::new());
    let store_dyn: Arc<dyn Store> = store.clone();

    let config = Config {
        database_url: "unused-in-tests".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let assistant = Arc::new(NoopAssistant);
    let scheduler = Arc::new(TokioScheduler::new(assistant.clone()));
    let state = AppState {
        store: store_dyn,
        assistant,
        scheduler,
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
    }
}

/// The quiz used throughout: one batch, two multiple-choice questions,
/// correct answer at source index 0 in both.
fn scenario_quiz() -> Quiz {
    let question = |prompt: &str, right: &str, wrong: [&str; 2]| Question::MultipleChoice {
        prompt: prompt.to_string(),
        answers: vec![
            Answer {
                text: right.to_string(),
                correct: true,
            },
            Answer {
                text: wrong[0].to_string(),
                correct: false,
            },
            Answer {
                text: wrong[1].to_string(),
                correct: false,
            },
        ],
        keep_answer_order: false,
    };
    Quiz {
        batches: vec![Batch {
            randomize: true,
            questions: vec![
                question("q1", "right1", ["wrong1a", "wrong1b"]),
                question("q2", "right2", ["wrong2a", "wrong2b"]),
            ],
        }],
    }
}

async fn admin_token(app: &TestApp, client: &reqwest::Client) -> String {
    let mut tx = app.store.begin().await.unwrap();
    tx.insert_user(&User {
        id: new_id(),
        username: "admin".to_string(),
        password: hash_password("admin_password").unwrap(),
        role: "admin".to_string(),
        has_accommodation: false,
        created_at: Utc::now(),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    login(app, client, "admin", "admin_password").await.0
}

async fn login(
    app: &TestApp,
    client: &reqwest::Client,
    username: &str,
    password: &str,
) -> (String, String) {
    let body: serde_json::Value = client
        .post(format!("{}/api/auth/login", app.address))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    (
        body["token"].as_str().unwrap().to_string(),
        body["user_id"].as_str().unwrap().to_string(),
    )
}

async fn student(
    app: &TestApp,
    client: &reqwest::Client,
    admin: &str,
    username: &str,
    course_id: &str,
) -> (String, String) {
    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({ "username": username, "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let (token, user_id) = login(app, client, username, "password123").await;

    let response = client
        .put(format!("{}/api/admin/registrations", app.address))
        .bearer_auth(admin)
        .json(&serde_json::json!({
            "student_id": user_id,
            "course_id": course_id,
            "role": "student",
            "group": null,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    (token, user_id)
}

/// Creates an open week plus one exercise carrying `scenario_quiz`.
/// Returns (week_id, exercise_id).
async fn seed_exercise(
    app: &TestApp,
    client: &reqwest::Client,
    admin: &str,
    course_id: &str,
    control_group: &str,
) -> (String, String) {
    let now = Utc::now();
    let response = client
        .post(format!("{}/api/admin/weeks", app.address))
        .bearer_auth(admin)
        .json(&serde_json::json!({
            "course_id": course_id,
            "title": "Week 1",
            "start_date": now - Duration::days(1),
            "end_date": now + Duration::days(7),
            "end_date_extra_time": now + Duration::days(9),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let week: serde_json::Value = response.json().await.unwrap();
    let week_id = week["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/api/admin/exercises", app.address))
        .bearer_auth(admin)
        .json(&serde_json::json!({
            "week_id": week_id,
            "title": "Sorting networks",
            "content": "Read about sorting networks.",
            "control_group": control_group,
            "quiz": scenario_quiz(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let exercise: serde_json::Value = response.json().await.unwrap();
    (week_id, exercise["id"].as_str().unwrap().to_string())
}

/// The answer vector that matches the recomputed presentation for one
/// student, as indices into the presented answer order.
fn correct_answer_vector(student_id: &str, exercise_id: &str) -> Vec<usize> {
    let presented =
        presentation::presented_questions(&scenario_quiz(), student_id, exercise_id, None)
            .expect("presentation failed");
    presented
        .iter()
        .map(|q| q.correct_indices()[0])
        .collect()
}

#[tokio::test]
async fn full_quiz_flow_wrong_then_right() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&app, &client).await;
    let (week_id, exercise_id) = seed_exercise(&app, &client, &admin, "course-a", "all").await;
    let (token, student_id) = student(&app, &client, &admin, "alice", "course-a").await;

    // Start the attempt: reading variant, no thread.
    let response = client
        .post(format!("{}/api/exercises/{}/attempts", app.address, exercise_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let attempt: serde_json::Value = response.json().await.unwrap();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();
    assert_eq!(attempt["status"], "exercise");
    assert_eq!(attempt["variant"], "reading");
    assert!(attempt["thread_id"].is_null());

    // Rendering the quiz before goToQuiz is an invalid state.
    let response = client
        .get(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // goToQuiz.
    let response = client
        .post(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "quiz");

    // The rendered quiz hides correctness and matches the engine's order.
    let response = client
        .get(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let view: serde_json::Value = response.json().await.unwrap();
    assert_eq!(view["solution_shown"], false);
    assert!(view["can_retry_at"].is_null());
    let questions = view["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    for q in questions {
        assert!(q["correct_indices"].is_null());
        assert_eq!(q["answers"].as_array().unwrap().len(), 3);
    }

    let correct = correct_answer_vector(&student_id, &exercise_id);
    let presented = presentation::presented_questions(
        &scenario_quiz(),
        &student_id,
        &exercise_id,
        None,
    )
    .unwrap();
    for (i, q) in questions.iter().enumerate() {
        let api_answers: Vec<&str> = q["answers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a.as_str().unwrap())
            .collect();
        let engine_answers: Vec<&str> = match &presented[i] {
            practicum::models::quiz::PresentedQuestion::MultipleChoice { answers, .. } => {
                answers.iter().map(|a| a.text.as_str()).collect()
            }
            practicum::models::quiz::PresentedQuestion::FreeText { .. } => vec![],
        };
        assert_eq!(api_answers, engine_answers);
    }

    // A wrong vector: shift every correct index by one.
    let wrong: Vec<usize> = correct.iter().map(|i| (i + 1) % 3).collect();
    let response = client
        .post(format!(
            "{}/api/attempts/{}/quiz/submissions",
            app.address, attempt_id
        ))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": wrong }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["correctness"], 0.0);
    assert_eq!(outcome["status"], "quiz");

    // The cooldown and pre-fill now surface in the view.
    let view: serde_json::Value = client
        .get(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(view["can_retry_at"].is_string());
    assert_eq!(
        view["latest_answers"],
        serde_json::json!(wrong)
    );

    // The literal recomputed correct indices score 1.0.
    let response = client
        .post(format!(
            "{}/api/attempts/{}/quiz/submissions",
            app.address, attempt_id
        ))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": correct }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["correctness"], 1.0);
    assert_eq!(outcome["correct_count"], 2);
    assert_eq!(outcome["status"], "quizCompleted");

    // Completion marker shows up in the week listing.
    let body: serde_json::Value = client
        .get(format!("{}/api/weeks/{}/exercises", app.address, week_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["exercises"][0]["completed"], true);

    // Resubmitting against a completed attempt is an invalid state, and
    // goToQuiz is too.
    let response = client
        .post(format!(
            "{}/api/attempts/{}/quiz/submissions",
            app.address, attempt_id
        ))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": correct }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = client
        .post(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "invalidState");

    // The audit log reconstructs the whole lifecycle, snapshots included.
    let logs: serde_json::Value = client
        .get(format!("{}/api/admin/attempts/{}/logs", app.address, attempt_id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let logs = logs.as_array().unwrap();
    let events: Vec<&str> = logs.iter().map(|l| l["event"].as_str().unwrap()).collect();
    assert_eq!(
        events,
        vec!["attemptStarted", "quizStarted", "quizSubmission", "quizSubmission"]
    );
    let final_submission = &logs[3];
    assert_eq!(final_submission["correctness"], 1.0);
    assert_eq!(final_submission["questions"].as_array().unwrap().len(), 2);
    assert_eq!(final_submission["answers"], serde_json::json!(correct));
}

#[tokio::test]
async fn completion_is_idempotent_across_resubmission() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&app, &client).await;
    let (_week_id, exercise_id) = seed_exercise(&app, &client, &admin, "course-a", "all").await;
    let (token, student_id) = student(&app, &client, &admin, "bob", "course-a").await;

    let attempt: serde_json::Value = client
        .post(format!("{}/api/exercises/{}/attempts", app.address, exercise_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let correct = correct_answer_vector(&student_id, &exercise_id);
    let submit = |answers: Vec<usize>| {
        let client = client.clone();
        let url = format!("{}/api/attempts/{}/quiz/submissions", app.address, attempt_id);
        let token = token.clone();
        async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&serde_json::json!({ "answers": answers }))
                .send()
                .await
                .unwrap()
        }
    };

    let response = submit(correct.clone()).await;
    assert_eq!(response.status().as_u16(), 200);

    // Administrative correction re-opens the quiz; a second fully correct
    // submission must not duplicate the completion entry.
    let response = client
        .put(format!("{}/api/admin/attempts/{}/status", app.address, attempt_id))
        .bearer_auth(&admin)
        .json(&serde_json::json!({ "status": "quiz" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = submit(correct).await;
    assert_eq!(response.status().as_u16(), 200);
    let outcome: serde_json::Value = response.json().await.unwrap();
    assert_eq!(outcome["status"], "quizCompleted");

    let mut tx = app.store.begin().await.unwrap();
    let completions = tx.completed_exercises(&student_id).await.unwrap();
    assert_eq!(completions, vec![exercise_id]);
}

#[tokio::test]
async fn presentation_is_deterministic_over_http() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&app, &client).await;
    let (_week_id, exercise_id) = seed_exercise(&app, &client, &admin, "course-a", "all").await;
    let (token, _) = student(&app, &client, &admin, "carol", "course-a").await;

    let attempt: serde_json::Value = client
        .post(format!("{}/api/exercises/{}/attempts", app.address, exercise_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let mut renderings = Vec::new();
    for _ in 0..3 {
        let view: serde_json::Value = client
            .get(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        renderings.push(view["questions"].clone());
    }
    assert_eq!(renderings[0], renderings[1]);
    assert_eq!(renderings[1], renderings[2]);
}

#[tokio::test]
async fn explain_variant_creates_assistant_thread() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&app, &client).await;
    let (_week_id, exercise_id) = seed_exercise(&app, &client, &admin, "course-a", "none").await;
    let (token, _) = student(&app, &client, &admin, "dave", "course-a").await;

    let response = client
        .post(format!("{}/api/exercises/{}/attempts", app.address, exercise_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let attempt: serde_json::Value = response.json().await.unwrap();
    assert_eq!(attempt["variant"], "explain");
    assert!(attempt["thread_id"].as_str().unwrap().starts_with("thread-"));

    // Starting again returns the same attempt, not a duplicate.
    let again: serde_json::Value = client
        .post(format!("{}/api/exercises/{}/attempts", app.address, exercise_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(again["id"], attempt["id"]);
    assert_eq!(again["thread_id"], attempt["thread_id"]);
}

#[tokio::test]
async fn submissions_on_foreign_attempts_are_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&app, &client).await;
    let (_week_id, exercise_id) = seed_exercise(&app, &client, &admin, "course-a", "all").await;
    let (owner, owner_id) = student(&app, &client, &admin, "erin", "course-a").await;
    let (intruder, _) = student(&app, &client, &admin, "frank", "course-a").await;

    let attempt: serde_json::Value = client
        .post(format!("{}/api/exercises/{}/attempts", app.address, exercise_id))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&owner)
        .send()
        .await
        .unwrap();

    let correct = correct_answer_vector(&owner_id, &exercise_id);
    let response = client
        .post(format!(
            "{}/api/attempts/{}/quiz/submissions",
            app.address, attempt_id
        ))
        .bearer_auth(&intruder)
        .json(&serde_json::json!({ "answers": correct }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ownership");
}

#[tokio::test]
async fn answer_count_mismatch_is_rejected() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&app, &client).await;
    let (_week_id, exercise_id) = seed_exercise(&app, &client, &admin, "course-a", "all").await;
    let (token, _) = student(&app, &client, &admin, "grace", "course-a").await;

    let attempt: serde_json::Value = client
        .post(format!("{}/api/exercises/{}/attempts", app.address, exercise_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let attempt_id = attempt["id"].as_str().unwrap().to_string();

    client
        .post(format!("{}/api/attempts/{}/quiz", app.address, attempt_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!(
            "{}/api/attempts/{}/quiz/submissions",
            app.address, attempt_id
        ))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "answers": [0] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], "validation");
}
