//! Concurrent writers against a file-backed database.

mod common;

use common::{TestResult, TestServer};
use futures::future::join_all;
use serde_json::{json, Value};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_toggles_never_duplicate_a_save() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    let exercise = server.create_exercise(&ada, "Contended").await;
    let url = server.url(&format!("/api/exercises/{}/save-toggle", exercise));

    let toggles = (0..20).map(|_| {
        server
            .client
            .post(url.clone())
            .bearer_auth(ada.clone())
            .send()
    });
    for response in join_all(toggles).await {
        assert_eq!(response?.status(), 200);
    }

    // Twenty serialized flips end where they started
    let (_, view) = server
        .get_json(None, &format!("/api/exercises/{}", exercise))
        .await;
    assert_eq!(view["savesCount"], 0);
    let (_, state) = server
        .get_json(Some(&ada), &format!("/api/exercises/{}/is-saved", exercise))
        .await;
    assert_eq!(state["saved"], false);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_savers_are_each_counted_once() -> TestResult {
    let server = TestServer::spawn().await;
    let (owner, _) = server.register("Owner").await;
    let exercise = server.create_exercise(&owner, "Popular").await;

    let mut tokens = Vec::new();
    for i in 0..8 {
        tokens.push(server.register(&format!("Fan{}", i)).await.0);
    }

    let url = server.url(&format!("/api/exercises/{}/save-toggle", exercise));
    let saves = tokens
        .iter()
        .map(|token| server.client.post(url.clone()).bearer_auth(token).send());
    for response in join_all(saves).await {
        let body: Value = response?.json().await?;
        assert_eq!(body["saved"], true);
    }

    let (_, view) = server
        .get_json(None, &format!("/api/exercises/{}", exercise))
        .await;
    assert_eq!(view["savesCount"], 8);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_comments_each_log_one_activity() -> TestResult {
    let server = TestServer::spawn().await;
    let (ada, _) = server.register("Ada").await;
    let exercise = server.create_exercise(&ada, "Busy").await;
    let url = server.url(&format!("/api/exercises/{}/comments", exercise));

    let comments = (0..10).map(|i| {
        server
            .client
            .post(url.clone())
            .bearer_auth(ada.clone())
            .json(&json!({ "text": format!("comment {}", i) }))
            .send()
    });
    for response in join_all(comments).await {
        assert_eq!(response?.status(), 201);
    }

    let (_, view) = server
        .get_json(None, &format!("/api/exercises/{}", exercise))
        .await;
    assert_eq!(view["commentsCount"], 10);

    let (_, feed) = server.get_json(Some(&ada), "/api/activity?limit=50").await;
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 11);
    assert_eq!(
        feed.iter()
            .filter(|e| e["type"] == "comment_added")
            .count(),
        10
    );
    assert_eq!(feed[10]["type"], "exercise_created");
    Ok(())
}
