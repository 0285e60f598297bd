//! Account and profile endpoints: login, logout, register, password
//! change, profile edits, user lookup, account deletion.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::{payload, App};
use crate::binder::Gate;
use crate::error::{Error, SchemaError};
use crate::schema::TypeDescriptor;
use crate::session::{hash_password, is_password_valid, is_username_valid};
use crate::store::UserRow;

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterParams {
    username: String,
    display_name: String,
    password: String,
}

#[derive(Deserialize)]
struct ChangePasswordParams {
    username: String,
    old_password: String,
    new_password: String,
}

#[derive(Deserialize)]
struct EditProfileParams {
    display_name: Option<String>,
    avatar_url: Option<String>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct GetUserParams {
    username: String,
}

pub(super) fn profile_json(user: &UserRow) -> serde_json::Value {
    json!({
        "id": user.id,
        "username": user.username,
        "display_name": user.display_name,
        "avatar_url": user.avatar_url,
        "tags": user.tags,
        "permission": user.permission,
        "created_time": user.created_time,
    })
}

pub fn register(app: &mut App) -> Result<(), SchemaError> {
    let store = Arc::clone(&app.store);
    let sessions = Arc::clone(&app.sessions);
    app.post(
        "/api/login",
        Gate::Public,
        vec![
            ("username", TypeDescriptor::Str),
            ("password", TypeDescriptor::Str),
        ],
        move |_ctx, _session, args| {
            let Credentials { username, password } = args.parse()?;
            let user = store
                .user_by_username(&username)
                .ok_or_else(|| Error::new("Username not found."))?;
            if hash_password(&password, &username) != user.password_hash {
                return Err(Error::new("Password is incorrect."));
            }
            let session =
                sessions.create(user.id, &user.username, user.permission, user.tags);
            Ok(payload(json!({ "token": session.token })))
        },
    )?;

    let sessions = Arc::clone(&app.sessions);
    app.post(
        "/api/logout",
        Gate::LoggedIn,
        vec![],
        move |_ctx, session, _args| {
            if let Some(s) = session {
                sessions.remove(&s.token);
            }
            Ok(payload(json!({})))
        },
    )?;

    let store = Arc::clone(&app.store);
    app.post(
        "/api/register",
        Gate::Public,
        vec![
            ("username", TypeDescriptor::Str),
            ("display_name", TypeDescriptor::Str),
            ("password", TypeDescriptor::Str),
        ],
        move |_ctx, _session, args| {
            let RegisterParams {
                username,
                display_name,
                password,
            } = args.parse()?;
            if !is_username_valid(&username) {
                return Err(Error::new("Username is invalid."));
            }
            if !is_password_valid(&password) {
                return Err(Error::new("Password is invalid."));
            }
            if store.user_by_username(&username).is_some() {
                return Err(Error::new("Username already exists."));
            }
            let hash = hash_password(&password, &username);
            let id = store.insert_user(username, display_name, hash);
            Ok(payload(json!({ "id": id })))
        },
    )?;

    let store = Arc::clone(&app.store);
    let sessions = Arc::clone(&app.sessions);
    app.post(
        "/api/change_password",
        Gate::Public,
        vec![
            ("username", TypeDescriptor::Str),
            ("old_password", TypeDescriptor::Str),
            ("new_password", TypeDescriptor::Str),
        ],
        move |_ctx, _session, args| {
            let ChangePasswordParams {
                username,
                old_password,
                new_password,
            } = args.parse()?;
            if !is_password_valid(&new_password) {
                return Err(Error::new("New password is invalid."));
            }
            let user = store
                .user_by_username(&username)
                .ok_or_else(|| Error::new("Username not found."))?;
            if hash_password(&old_password, &username) != user.password_hash {
                return Err(Error::new("Old password is incorrect."));
            }
            store.set_password_hash(&username, hash_password(&new_password, &username));
            sessions.remove_all(&username);
            Ok(payload(json!({})))
        },
    )?;

    let store = Arc::clone(&app.store);
    let sessions = Arc::clone(&app.sessions);
    app.post(
        "/api/edit_profile",
        Gate::LoggedIn,
        vec![
            ("display_name", TypeDescriptor::optional(TypeDescriptor::Str)),
            ("avatar_url", TypeDescriptor::optional(TypeDescriptor::Str)),
            (
                "tags",
                TypeDescriptor::optional(TypeDescriptor::list(TypeDescriptor::Str)),
            ),
        ],
        move |_ctx, session, args| {
            let EditProfileParams {
                display_name,
                avatar_url,
                tags,
            } = args.parse()?;
            let Some(s) = session else {
                return Err(Error::new("This API endpoint requires you to be logged in."));
            };
            if let Some(tags) = &tags {
                sessions.set_tags(&s.token, tags.clone());
            }
            store.update_profile(s.user_id, display_name, avatar_url, tags);
            Ok(payload(json!({})))
        },
    )?;

    app.get(
        "/api/check_session",
        Gate::LoggedIn,
        vec![],
        move |_ctx, _session, _args| Ok(payload(json!({}))),
    )?;

    let store = Arc::clone(&app.store);
    app.get(
        "/api/get_user",
        Gate::LoggedIn,
        vec![("username", TypeDescriptor::Str)],
        move |_ctx, _session, args| {
            let GetUserParams { username } = args.parse()?;
            let user = store
                .user_by_username(&username)
                .ok_or_else(|| Error::new("Username not found."))?;
            Ok(payload(profile_json(&user)))
        },
    )?;

    let store = Arc::clone(&app.store);
    let sessions = Arc::clone(&app.sessions);
    app.post(
        "/api/delete_user",
        Gate::Public,
        vec![
            ("username", TypeDescriptor::Str),
            ("password", TypeDescriptor::Str),
        ],
        move |_ctx, _session, args| {
            let Credentials { username, password } = args.parse()?;
            let user = store
                .user_by_username(&username)
                .ok_or_else(|| Error::new("Username not found."))?;
            if hash_password(&password, &username) != user.password_hash {
                return Err(Error::new("Password is incorrect."));
            }
            store.delete_user(user.id);
            sessions.remove_all(&username);
            Ok(payload(json!({})))
        },
    )
}
