//! End-to-end tests for the notification-board endpoints, run against a
//! real server with the full registration in place.

mod common;

use std::sync::Arc;

use common::{get, post, start_server};
use minibind::api::{register_all, App};
use minibind::store::MemoryStore;
use serde_json::{json, Value};

fn token_of(body: &Value) -> String {
    body["token"].as_str().unwrap().to_string()
}

/// Boot a fully registered app, keeping a store handle for test-side
/// mutations (permission grants have no endpoint, as in the original
/// deployment).
fn boot() -> (common::Server, Arc<MemoryStore>) {
    let mut app = App::new();
    register_all(&mut app).unwrap();
    let store = Arc::clone(&app.store);
    let (handle, addr) = start_server(app);
    (common::Server { handle, addr }, store)
}

#[test]
fn register_validates_username_and_password() {
    let (server, _store) = boot();
    let addr = server.addr;

    let (_, body) = post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "ab", "display_name": "A", "password": "longenough" }),
    );
    assert_eq!(body["error"], json!("Username is invalid."));

    let (_, body) = post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "A", "password": "short" }),
    );
    assert_eq!(body["error"], json!("Password is invalid."));

    let (_, body) = post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "A", "password": "longenough" }),
    );
    assert_eq!(body, json!({ "success": true, "id": 1 }));

    let (_, body) = post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "B", "password": "longenough" }),
    );
    assert_eq!(body["error"], json!("Username already exists."));
}

#[test]
fn login_checks_username_then_password() {
    let (server, _store) = boot();
    let addr = server.addr;
    post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "A", "password": "longenough" }),
    );

    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "nobody", "password": "longenough" }),
    );
    assert_eq!(body["error"], json!("Username not found."));

    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "wrongwrong" }),
    );
    assert_eq!(body["error"], json!("Password is incorrect."));

    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    assert_eq!(body["success"], json!(true));
    let token = token_of(&body);

    let (_, body) = get(&addr, "/api/check_session", Some(&token));
    assert_eq!(body, json!({ "success": true }));
}

#[test]
fn publishing_requires_permission_from_a_fresh_session() {
    let (server, store) = boot();
    let addr = server.addr;
    let (_, body) = post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "A", "password": "longenough" }),
    );
    let alice_id = body["id"].as_i64().unwrap();
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    let token = token_of(&body);

    let (_, body) = post(
        &addr,
        "/api/new_post",
        Some(&token),
        &json!({ "content": "hi", "tags": [], "recipients": ["alice"] }),
    );
    assert_eq!(body["error"], json!("Unauthorized to access this endpoint."));

    // Permission is granted out of band; sessions snapshot it at login,
    // so a new login is needed to pick it up.
    store.set_permission(alice_id, 1);
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    let token = token_of(&body);

    let (_, body) = post(
        &addr,
        "/api/new_post",
        Some(&token),
        &json!({ "content": "hi", "tags": ["news"], "recipients": ["alice"] }),
    );
    assert_eq!(body["success"], json!(true));
    let post_id = body["id"].as_i64().unwrap();

    let (_, body) = get(&addr, &format!("/api/get_post?id={post_id}"), Some(&token));
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["author"]["username"], json!("alice"));
    assert_eq!(body["content"], json!("hi"));
    assert_eq!(body["reactions"], json!({}));
}

#[test]
fn post_visibility_follows_recipients_and_tags() {
    let (server, store) = boot();
    let addr = server.addr;
    for (name, display) in [("alice", "A"), ("bobby", "B")] {
        post(
            &addr,
            "/api/register",
            None,
            &json!({ "username": name, "display_name": display, "password": "longenough" }),
        );
    }
    store.set_permission(1, 1);
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    let alice = token_of(&body);
    let (_, body) = post(
        &addr,
        "/api/new_post",
        Some(&alice),
        &json!({ "content": "hi", "tags": ["news"], "recipients": ["alice"] }),
    );
    let post_id = body["id"].as_i64().unwrap();

    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "bobby", "password": "longenough" }),
    );
    let bobby = token_of(&body);

    // Not a recipient, no shared tag.
    let (_, body) = get(&addr, &format!("/api/get_post?id={post_id}"), Some(&bobby));
    assert_eq!(body["error"], json!("Not subscribed."));
    let (_, body) = get(&addr, "/api/get_posts", Some(&bobby));
    assert_eq!(body["posts"], json!([]));

    // Subscribing to the tag makes the post visible, on the live session.
    let (_, body) = post(
        &addr,
        "/api/edit_profile",
        Some(&bobby),
        &json!({ "tags": ["news"] }),
    );
    assert_eq!(body["success"], json!(true));
    let (_, body) = get(&addr, &format!("/api/get_post?id={post_id}"), Some(&bobby));
    assert_eq!(body["success"], json!(true));
    let (_, body) = get(&addr, "/api/get_posts", Some(&bobby));
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
}

#[test]
fn reactions_count_and_flag_the_caller() {
    let (server, store) = boot();
    let addr = server.addr;
    post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "A", "password": "longenough" }),
    );
    store.set_permission(1, 1);
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    let token = token_of(&body);
    let (_, body) = post(
        &addr,
        "/api/new_post",
        Some(&token),
        &json!({ "content": "hi", "tags": [], "recipients": ["alice"] }),
    );
    let post_id = body["id"].as_i64().unwrap();

    let (_, body) = post(
        &addr,
        "/api/add_reaction",
        Some(&token),
        &json!({ "post_id": post_id, "emoji": 5 }),
    );
    assert_eq!(body, json!({ "success": true }));

    let (_, body) = post(
        &addr,
        "/api/add_reaction",
        Some(&token),
        &json!({ "post_id": post_id, "emoji": 5 }),
    );
    assert_eq!(body["error"], json!("Reaction exists."));

    let (_, body) = get(&addr, &format!("/api/get_post?id={post_id}"), Some(&token));
    assert_eq!(body["reactions"], json!({ "5": [1, true] }));

    let (_, body) = post(
        &addr,
        "/api/remove_reaction",
        Some(&token),
        &json!({ "post_id": post_id, "emoji": 5 }),
    );
    assert_eq!(body["success"], json!(true));
    let (_, body) = get(&addr, &format!("/api/get_post?id={post_id}"), Some(&token));
    assert_eq!(body["reactions"], json!({}));
}

#[test]
fn edit_and_delete_are_author_only() {
    let (server, store) = boot();
    let addr = server.addr;
    for (name, display) in [("alice", "A"), ("bobby", "B")] {
        post(
            &addr,
            "/api/register",
            None,
            &json!({ "username": name, "display_name": display, "password": "longenough" }),
        );
    }
    store.set_permission(1, 1);
    store.set_permission(2, 1);
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    let alice = token_of(&body);
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "bobby", "password": "longenough" }),
    );
    let bobby = token_of(&body);

    let (_, body) = post(
        &addr,
        "/api/new_post",
        Some(&alice),
        &json!({ "content": "hi", "tags": [], "recipients": ["alice"] }),
    );
    let post_id = body["id"].as_i64().unwrap();

    let (_, body) = post(
        &addr,
        "/api/edit_post",
        Some(&bobby),
        &json!({ "id": post_id, "content": "hacked", "tags": null, "recipients": null }),
    );
    assert_eq!(body["error"], json!("Not author."));

    let (_, body) = post(
        &addr,
        "/api/edit_post",
        Some(&alice),
        &json!({ "id": post_id, "content": "edited", "tags": null, "recipients": null }),
    );
    assert_eq!(body["success"], json!(true));
    let (_, body) = get(&addr, &format!("/api/get_post?id={post_id}"), Some(&alice));
    assert_eq!(body["content"], json!("edited"));

    let (_, body) = post(
        &addr,
        "/api/delete_post",
        Some(&bobby),
        &json!({ "id": post_id }),
    );
    assert_eq!(body["error"], json!("Not author."));
    let (_, body) = post(
        &addr,
        "/api/delete_post",
        Some(&alice),
        &json!({ "id": post_id }),
    );
    assert_eq!(body["success"], json!(true));
    let (_, body) = get(&addr, &format!("/api/get_post?id={post_id}"), Some(&alice));
    assert_eq!(body["error"], json!("Post not found."));
}

#[test]
fn change_password_revokes_every_session() {
    let (server, _store) = boot();
    let addr = server.addr;
    post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "A", "password": "longenough" }),
    );
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    let token = token_of(&body);

    let (_, body) = post(
        &addr,
        "/api/change_password",
        None,
        &json!({ "username": "alice", "old_password": "longenough", "new_password": "short" }),
    );
    assert_eq!(body["error"], json!("New password is invalid."));

    let (_, body) = post(
        &addr,
        "/api/change_password",
        None,
        &json!({ "username": "alice", "old_password": "wrongwrong", "new_password": "evenlonger" }),
    );
    assert_eq!(body["error"], json!("Old password is incorrect."));

    let (_, body) = post(
        &addr,
        "/api/change_password",
        None,
        &json!({ "username": "alice", "old_password": "longenough", "new_password": "evenlonger" }),
    );
    assert_eq!(body["success"], json!(true));

    let (_, body) = get(&addr, "/api/check_session", Some(&token));
    assert_eq!(
        body["error"],
        json!("This API endpoint requires you to be logged in.")
    );
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "evenlonger" }),
    );
    assert_eq!(body["success"], json!(true));
}

#[test]
fn logout_and_delete_user_invalidate_access() {
    let (server, _store) = boot();
    let addr = server.addr;
    post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "A", "password": "longenough" }),
    );
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    let token = token_of(&body);

    let (_, body) = post(&addr, "/api/logout", Some(&token), &json!({}));
    assert_eq!(body["success"], json!(true));
    let (_, body) = get(&addr, "/api/check_session", Some(&token));
    assert_eq!(body["success"], json!(false));

    let (_, body) = post(
        &addr,
        "/api/delete_user",
        None,
        &json!({ "username": "alice", "password": "wrongwrong" }),
    );
    assert_eq!(body["error"], json!("Password is incorrect."));
    let (_, body) = post(
        &addr,
        "/api/delete_user",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    assert_eq!(body["success"], json!(true));
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    assert_eq!(body["error"], json!("Username not found."));
}

#[test]
fn get_user_returns_the_profile_shape() {
    let (server, _store) = boot();
    let addr = server.addr;
    post(
        &addr,
        "/api/register",
        None,
        &json!({ "username": "alice", "display_name": "Alice", "password": "longenough" }),
    );
    let (_, body) = post(
        &addr,
        "/api/login",
        None,
        &json!({ "username": "alice", "password": "longenough" }),
    );
    let token = token_of(&body);

    let (_, body) = get(&addr, "/api/get_user?username=alice", Some(&token));
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["id"], json!(1));
    assert_eq!(body["username"], json!("alice"));
    assert_eq!(body["display_name"], json!("Alice"));
    assert_eq!(body["avatar_url"], json!(null));
    assert_eq!(body["tags"], json!([]));
    assert_eq!(body["permission"], json!(0));

    let (_, body) = get(&addr, "/api/get_user?username=nobody", Some(&token));
    assert_eq!(body["error"], json!("Username not found."));
}
