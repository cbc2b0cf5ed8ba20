//! End-to-end tests against the real router.
//!
//! Covers:
//! - Registration, login, cookies and bearer tokens
//! - Exercise CRUD with derived counts and ownership
//! - Comments/solutions validation and attachments
//! - The activity feed and its live SSE stream
//! - Cascade delete

mod common;

use std::time::Duration;

use common::{TestResult, TestServer};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};

// ============================================================================
// AUTH
// ============================================================================

#[tokio::test]
async fn test_health() -> TestResult {
    let server = TestServer::spawn().await;
    let (status, body) = server.get_json(None, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["ok"], true);
    Ok(())
}

#[tokio::test]
async fn test_session_cookie_round_trip() -> TestResult {
    let server = TestServer::spawn().await;
    let client = Client::builder().cookie_store(true).build()?;

    let response = client
        .post(server.url("/api/auth/register"))
        .json(&json!({ "name": "Ada", "email": "Ada@Example.com", "password": "pw" }))
        .send()
        .await?;
    assert_eq!(response.status(), 201);
    assert!(response
        .cookies()
        .any(|c| c.name() == "collabex_session"));

    let me: Value = client.get(server.url("/api/users/me")).send().await?.json().await?;
    assert_eq!(me["email"], "ada@example.com");
    assert_eq!(me["name"], "Ada");

    let logout = client.post(server.url("/api/auth/logout")).send().await?;
    assert_eq!(logout.status(), 200);

    let after = client.get(server.url("/api/users/me")).send().await?;
    assert_eq!(after.status(), 401);
    let body: Value = after.json().await?;
    assert_eq!(body["message"], "Unauthorized");

    let login = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "pw" }))
        .send()
        .await?;
    assert_eq!(login.status(), 200);
    let me = client.get(server.url("/api/users/me")).send().await?;
    assert_eq!(me.status(), 200);
    Ok(())
}

#[tokio::test]
async fn test_register_and_login_errors() -> TestResult {
    let server = TestServer::spawn().await;
    server.register("Ada").await;

    let dup = server
        .client
        .post(server.url("/api/auth/register"))
        .json(&json!({ "name": "Other", "email": "ADA@example.com", "password": "x" }))
        .send()
        .await?;
    assert_eq!(dup.status(), 400);
    let body: Value = dup.json().await?;
    assert_eq!(body["message"], "Email already in use");

    let bad = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "ada@example.com", "password": "nope" }))
        .send()
        .await?;
    assert_eq!(bad.status(), 400);
    let body: Value = bad.json().await?;
    assert_eq!(body["message"], "Invalid credentials");
    Ok(())
}

#[tokio::test]
async fn test_profile_update() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    server.register("Bob").await;

    let taken = server
        .client
        .put(server.url("/api/users/me"))
        .bearer_auth(&ada)
        .json(&json!({ "email": "bob@example.com" }))
        .send()
        .await?;
    assert_eq!(taken.status(), 400);

    let renamed: Value = server
        .client
        .put(server.url("/api/users/me"))
        .bearer_auth(&ada)
        .json(&json!({ "name": "Ada L." }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(renamed["name"], "Ada L.");
    assert_eq!(renamed["email"], "ada@example.com");
    Ok(())
}

// ============================================================================
// EXERCISES
// ============================================================================

#[tokio::test]
async fn test_comment_shows_up_in_feed_and_counts() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, ada_id) = server.register("Ada").await;
    let (bob, bob_id) = server.register("Bob").await;

    let exercise = server.create_exercise(&ada, "X").await;

    let comment = server
        .client
        .post(server.url(&format!("/api/exercises/{}/comments", exercise)))
        .bearer_auth(&bob)
        .json(&json!({ "text": "nice" }))
        .send()
        .await?;
    assert_eq!(comment.status(), 201);
    let comment: Value = comment.json().await?;
    assert_eq!(comment["author"]["id"], bob_id.as_str());

    let (status, feed) = server.get_json(Some(&ada), "/api/activity?limit=10").await;
    assert_eq!(status, 200);
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed[0]["type"], "comment_added");
    assert_eq!(feed[0]["actor"]["id"], bob_id.as_str());
    assert_eq!(feed[0]["exerciseId"], exercise.as_str());
    assert_eq!(feed[0]["comment"]["text"], "nice");
    assert_eq!(feed[1]["type"], "exercise_created");
    assert_eq!(feed[1]["actor"]["id"], ada_id.as_str());
    assert_eq!(feed[1]["exercise"]["subject"], "Math");
    assert_eq!(feed[1]["exercise"]["difficulty"], "Beginner");

    let (_, view) = server
        .get_json(None, &format!("/api/exercises/{}", exercise))
        .await;
    assert_eq!(view["commentsCount"], 1);
    assert_eq!(view["solutionsCount"], 0);
    assert_eq!(view["savesCount"], 0);
    assert_eq!(view["createdBy"]["name"], "Ada");
    Ok(())
}

#[tokio::test]
async fn test_status_codes() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    let (bob, _) = server.register("Bob").await;
    let exercise = server.create_exercise(&ada, "Limits").await;

    // No identity
    let anon = server
        .client
        .post(server.url("/api/exercises"))
        .json(&json!({ "title": "t" }))
        .send()
        .await?;
    assert_eq!(anon.status(), 401);
    let (status, _) = server.get_json(None, "/api/activity").await;
    assert_eq!(status, 401);
    let (status, _) = server.get_json(Some("bogus"), "/api/exercises/mine").await;
    assert_eq!(status, 401);

    // Missing fields
    let incomplete = server
        .client
        .post(server.url("/api/exercises"))
        .bearer_auth(&ada)
        .json(&json!({ "title": "t", "subject": "Math" }))
        .send()
        .await?;
    assert_eq!(incomplete.status(), 400);

    // Not the owner
    let hijack = server
        .client
        .put(server.url(&format!("/api/exercises/{}", exercise)))
        .bearer_auth(&bob)
        .json(&json!({ "title": "mine now" }))
        .send()
        .await?;
    assert_eq!(hijack.status(), 403);
    let delete = server
        .client
        .delete(server.url(&format!("/api/exercises/{}", exercise)))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(delete.status(), 403);

    // Missing exercise
    let (status, body) = server.get_json(None, "/api/exercises/does-not-exist").await;
    assert_eq!(status, 404);
    assert_eq!(body["message"], "Exercise not found");
    let toggle = server
        .client
        .post(server.url("/api/exercises/does-not-exist/save-toggle"))
        .bearer_auth(&bob)
        .send()
        .await?;
    assert_eq!(toggle.status(), 404);

    // Empty comment
    let empty = server
        .client
        .post(server.url(&format!("/api/exercises/{}/comments", exercise)))
        .bearer_auth(&bob)
        .json(&json!({ "text": "" }))
        .send()
        .await?;
    assert_eq!(empty.status(), 400);
    let body: Value = empty.json().await?;
    assert_eq!(body["message"], "Comment must have text or files");
    Ok(())
}

#[tokio::test]
async fn test_owner_update_and_listing() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    let (bob, _) = server.register("Bob").await;
    let first = server.create_exercise(&ada, "first").await;
    server.create_exercise(&bob, "second").await;

    let updated: Value = server
        .client
        .put(server.url(&format!("/api/exercises/{}", first)))
        .bearer_auth(&ada)
        .json(&json!({ "title": "First, revised", "tags": "limits, series" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(updated["title"], "First, revised");
    assert_eq!(updated["tags"], json!(["limits", "series"]));
    assert_eq!(updated["description"], "Work it out");

    let (_, all) = server.get_json(None, "/api/exercises").await;
    let titles: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["second", "First, revised"]);

    let (_, mine) = server.get_json(Some(&bob), "/api/exercises/mine").await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["title"], "second");
    Ok(())
}

#[tokio::test]
async fn test_save_toggle_round_trip() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    let (bob, _) = server.register("Bob").await;
    let exercise = server.create_exercise(&ada, "t").await;
    let toggle_url = server.url(&format!("/api/exercises/{}/save-toggle", exercise));
    let is_saved_path = format!("/api/exercises/{}/is-saved", exercise);

    let on: Value = server
        .client
        .post(&toggle_url)
        .bearer_auth(&bob)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(on, json!({ "saved": true, "savesCount": 1 }));
    let (_, state) = server.get_json(Some(&bob), &is_saved_path).await;
    assert_eq!(state["saved"], true);

    let (_, saved) = server.get_json(Some(&bob), "/api/exercises/saved").await;
    assert_eq!(saved.as_array().unwrap().len(), 1);
    assert_eq!(saved[0]["exercise"]["id"], exercise.as_str());
    assert_eq!(saved[0]["exercise"]["savesCount"], 1);

    let off: Value = server
        .client
        .post(&toggle_url)
        .bearer_auth(&bob)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(off, json!({ "saved": false, "savesCount": 0 }));
    let (_, state) = server.get_json(Some(&bob), &is_saved_path).await;
    assert_eq!(state["saved"], false);

    // Saves are not part of the feed unless configured
    let (_, feed) = server.get_json(Some(&ada), "/api/activity").await;
    assert_eq!(feed.as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_saves_in_feed_when_enabled() -> TestResult {
    let server = TestServer::spawn_with(|config| config.activity.record_saves = true).await;
    let (ada, _) = server.register("Ada").await;
    let exercise = server.create_exercise(&ada, "Limits").await;

    server
        .client
        .post(server.url(&format!("/api/exercises/{}/save-toggle", exercise)))
        .bearer_auth(&ada)
        .send()
        .await?;

    let (_, feed) = server.get_json(Some(&ada), "/api/activity").await;
    assert_eq!(feed[0]["type"], "exercise_saved");
    assert_eq!(feed[0]["message"], "Ada saved \"Limits\"");
    Ok(())
}

#[tokio::test]
async fn test_feed_limit_and_cursor() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    for i in 0..5 {
        server.create_exercise(&ada, &format!("e{}", i)).await;
    }

    let (_, clamped) = server.get_json(Some(&ada), "/api/activity?limit=0").await;
    assert_eq!(clamped.as_array().unwrap().len(), 1);

    let (_, page) = server.get_json(Some(&ada), "/api/activity?limit=2").await;
    let page = page.as_array().unwrap();
    assert_eq!(page[0]["exercise"]["title"], "e4");
    assert_eq!(page[1]["exercise"]["title"], "e3");

    let cursor = page[1]["id"].as_str().unwrap();
    let (_, next) = server
        .get_json(Some(&ada), &format!("/api/activity?limit=2&before={}", cursor))
        .await;
    assert_eq!(next[0]["exercise"]["title"], "e2");
    assert_eq!(next[1]["exercise"]["title"], "e1");

    let (status, _) = server
        .get_json(Some(&ada), "/api/activity?before=unknown")
        .await;
    assert_eq!(status, 400);
    Ok(())
}

#[tokio::test]
async fn test_malformed_feed_params_answer_json() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;

    for path in ["/api/activity?limit=abc", "/api/activity?days=-1"] {
        let (status, body) = server.get_json(Some(&ada), path).await;
        assert_eq!(status, 400, "{}", path);
        assert!(body["message"].is_string(), "{}: {}", path, body);
    }
    Ok(())
}

// ============================================================================
// ATTACHMENTS
// ============================================================================

#[tokio::test]
async fn test_multipart_uploads() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;

    let form = Form::new()
        .text("title", "Integrals")
        .text("description", "See sheet")
        .text("subject", "Math")
        .text("difficulty", "Advanced")
        .text("tags", "calculus,integrals")
        .part(
            "files",
            Part::bytes(b"%PDF-1.4 sheet".to_vec())
                .file_name("sheet.pdf")
                .mime_str("application/pdf")?,
        );
    let response = server
        .client
        .post(server.url("/api/exercises"))
        .bearer_auth(&ada)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(response.status(), 201);
    let exercise: Value = response.json().await?;
    assert_eq!(exercise["tags"], json!(["calculus", "integrals"]));
    let attachment = &exercise["attachments"][0];
    assert_eq!(attachment["originalName"], "sheet.pdf");
    assert_eq!(attachment["mimeType"], "application/pdf");
    assert_eq!(attachment["sizeBytes"], 14);

    let blob = server
        .client
        .get(server.url(attachment["url"].as_str().unwrap()))
        .send()
        .await?;
    assert_eq!(blob.status(), 200);
    assert_eq!(blob.bytes().await?.as_ref(), b"%PDF-1.4 sheet");

    // A solution with only a file is accepted
    let id = exercise["id"].as_str().unwrap();
    let form = Form::new().part(
        "files",
        Part::bytes(b"work".to_vec())
            .file_name("work.txt")
            .mime_str("text/plain")?,
    );
    let solution = server
        .client
        .post(server.url(&format!("/api/exercises/{}/solutions", id)))
        .bearer_auth(&ada)
        .multipart(form)
        .send()
        .await?;
    assert_eq!(solution.status(), 201);
    let solution: Value = solution.json().await?;
    assert_eq!(solution["text"], "");
    assert_eq!(solution["attachments"].as_array().unwrap().len(), 1);

    let (_, mine) = server.get_json(Some(&ada), "/api/solutions/mine").await;
    assert_eq!(mine[0]["exercise"]["solutionsCount"], 1);

    let (status, _) = server.get_json(None, "/uploads/missing.pdf").await;
    assert_eq!(status, 404);
    Ok(())
}

// ============================================================================
// LIVE STREAM
// ============================================================================

#[tokio::test]
async fn test_live_stream_receives_new_activity() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    let (bob, _) = server.register("Bob").await;
    let exercise = server.create_exercise(&ada, "Before connect").await;

    let mut stream = server
        .client
        .get(server.url("/api/activity/stream"))
        .send()
        .await?;
    assert_eq!(stream.status(), 200);
    assert!(stream
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()?
        .starts_with("text/event-stream"));

    server
        .client
        .post(server.url(&format!("/api/exercises/{}/comments", exercise)))
        .bearer_auth(&bob)
        .json(&json!({ "text": "live!" }))
        .send()
        .await?;

    let mut received = String::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !received.contains("live!") {
        let chunk = tokio::time::timeout_at(deadline, stream.chunk()).await??;
        match chunk {
            Some(bytes) => received.push_str(&String::from_utf8_lossy(&bytes)),
            None => break,
        }
    }

    assert!(received.contains("event: activity"));
    assert!(received.contains("comment_added"));
    assert!(received.contains("live!"));
    // Published before this observer connected, so never delivered
    assert!(!received.contains("exercise_created"));
    Ok(())
}

// ============================================================================
// CASCADE DELETE
// ============================================================================

#[tokio::test]
async fn test_delete_cascades_and_keeps_history() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    let (bob, _) = server.register("Bob").await;
    let exercise = server.create_exercise(&ada, "Doomed").await;
    let base = format!("/api/exercises/{}", exercise);

    for (kind, text) in [("comments", "c"), ("solutions", "s")] {
        let response = server
            .client
            .post(server.url(&format!("{}/{}", base, kind)))
            .bearer_auth(&bob)
            .json(&json!({ "text": text }))
            .send()
            .await?;
        assert_eq!(response.status(), 201);
    }
    server
        .client
        .post(server.url(&format!("{}/save-toggle", base)))
        .bearer_auth(&bob)
        .send()
        .await?;

    let deleted = server
        .client
        .delete(server.url(&base))
        .bearer_auth(&ada)
        .send()
        .await?;
    assert_eq!(deleted.status(), 200);

    let again = server
        .client
        .delete(server.url(&base))
        .bearer_auth(&ada)
        .send()
        .await?;
    assert_eq!(again.status(), 404);

    let (status, _) = server.get_json(None, &format!("{}/comments", base)).await;
    assert_eq!(status, 404);
    let (_, saved) = server.get_json(Some(&bob), "/api/exercises/saved").await;
    assert!(saved.as_array().unwrap().is_empty());
    let (_, solutions) = server.get_json(Some(&bob), "/api/solutions/mine").await;
    assert!(solutions.as_array().unwrap().is_empty());

    // History stays, with the exercise no longer resolvable
    let (_, feed) = server.get_json(Some(&ada), "/api/activity").await;
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 3);
    assert!(feed.iter().all(|e| e["exercise"].is_null()));
    assert!(feed.iter().all(|e| e["exerciseId"] == exercise.as_str()));
    Ok(())
}
