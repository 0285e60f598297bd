//! Post endpoints: feed retrieval with subscription filtering plus the
//! publisher-only create/edit/delete operations.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::user::profile_json;
use super::{payload, App};
use crate::binder::Gate;
use crate::error::{Error, SchemaError};
use crate::schema::TypeDescriptor;
use crate::session::Session;
use crate::store::{MemoryStore, PostRow};

#[derive(Deserialize)]
struct GetPostParams {
    id: i64,
}

#[derive(Deserialize)]
struct NewPostParams {
    content: String,
    tags: Vec<String>,
    recipients: Vec<String>,
}

#[derive(Deserialize)]
struct EditPostParams {
    id: i64,
    content: Option<String>,
    tags: Option<Vec<String>>,
    recipients: Option<Vec<String>>,
}

/// A post is visible when the caller is a named recipient or shares at
/// least one tag with it.
fn is_visible(post: &PostRow, session: &Session) -> bool {
    post.recipients.iter().any(|r| *r == session.username)
        || session.tags.iter().any(|t| post.tags.contains(t))
}

/// Reaction summary keyed by emoji: `[count, is_user_reaction]`.
fn reaction_summary(store: &MemoryStore, post_id: i64, user_id: i64) -> Map<String, Value> {
    let mut summary: Map<String, Value> = Map::new();
    for (emoji, uid) in store.reactions_for_post(post_id) {
        let entry = summary
            .entry(emoji.to_string())
            .or_insert_with(|| json!([0, false]));
        if let Some(pair) = entry.as_array_mut() {
            let count = pair[0].as_i64().unwrap_or(0) + 1;
            pair[0] = json!(count);
            if uid == user_id {
                pair[1] = json!(true);
            }
        }
    }
    summary
}

fn post_json(store: &MemoryStore, post: &PostRow, session: &Session) -> Value {
    let author = store
        .user_by_id(post.author_id)
        .map(|u| profile_json(&u))
        .unwrap_or(Value::Null);
    json!({
        "id": post.id,
        "author": author,
        "content": post.content,
        "tags": post.tags,
        "recipients": post.recipients,
        "created_time": post.created_time,
        "reactions": reaction_summary(store, post.id, session.user_id),
    })
}

pub fn register(app: &mut App) -> Result<(), SchemaError> {
    let store = Arc::clone(&app.store);
    app.get(
        "/api/get_post",
        Gate::LoggedIn,
        vec![("id", TypeDescriptor::Int)],
        move |_ctx, session, args| {
            let GetPostParams { id } = args.parse()?;
            let Some(session) = session else {
                return Err(Error::new("This API endpoint requires you to be logged in."));
            };
            let post = store
                .post_by_id(id)
                .ok_or_else(|| Error::new("Post not found."))?;
            if !is_visible(&post, session) {
                return Err(Error::new("Not subscribed."));
            }
            Ok(payload(post_json(&store, &post, session)))
        },
    )?;

    let store = Arc::clone(&app.store);
    app.get(
        "/api/get_posts",
        Gate::LoggedIn,
        vec![],
        move |_ctx, session, _args| {
            let Some(session) = session else {
                return Err(Error::new("This API endpoint requires you to be logged in."));
            };
            let posts: Vec<Value> = store
                .all_posts()
                .iter()
                .filter(|p| is_visible(p, session))
                .map(|p| post_json(&store, p, session))
                .collect();
            Ok(payload(json!({ "posts": posts })))
        },
    )?;

    let store = Arc::clone(&app.store);
    app.post(
        "/api/new_post",
        Gate::Permitted(vec![1]),
        vec![
            ("content", TypeDescriptor::Str),
            ("tags", TypeDescriptor::list(TypeDescriptor::Str)),
            ("recipients", TypeDescriptor::list(TypeDescriptor::Str)),
        ],
        move |_ctx, session, args| {
            let NewPostParams {
                content,
                tags,
                recipients,
            } = args.parse()?;
            let Some(session) = session else {
                return Err(Error::new("This API endpoint requires you to be logged in."));
            };
            let id = store.insert_post(session.user_id, content, tags, recipients);
            Ok(payload(json!({ "id": id })))
        },
    )?;

    let store = Arc::clone(&app.store);
    app.post(
        "/api/edit_post",
        Gate::Permitted(vec![1]),
        vec![
            ("id", TypeDescriptor::Int),
            ("content", TypeDescriptor::optional(TypeDescriptor::Str)),
            (
                "tags",
                TypeDescriptor::optional(TypeDescriptor::list(TypeDescriptor::Str)),
            ),
            (
                "recipients",
                TypeDescriptor::optional(TypeDescriptor::list(TypeDescriptor::Str)),
            ),
        ],
        move |_ctx, session, args| {
            let EditPostParams {
                id,
                content,
                tags,
                recipients,
            } = args.parse()?;
            let Some(session) = session else {
                return Err(Error::new("This API endpoint requires you to be logged in."));
            };
            let post = store
                .post_by_id(id)
                .ok_or_else(|| Error::new("Post not found."))?;
            if post.author_id != session.user_id {
                return Err(Error::new("Not author."));
            }
            store.update_post(id, content, tags, recipients);
            Ok(payload(json!({})))
        },
    )?;

    let store = Arc::clone(&app.store);
    app.post(
        "/api/delete_post",
        Gate::Permitted(vec![1]),
        vec![("id", TypeDescriptor::Int)],
        move |_ctx, session, args| {
            let GetPostParams { id } = args.parse()?;
            let Some(session) = session else {
                return Err(Error::new("This API endpoint requires you to be logged in."));
            };
            let post = store
                .post_by_id(id)
                .ok_or_else(|| Error::new("Post not found."))?;
            if post.author_id != session.user_id {
                return Err(Error::new("Not author."));
            }
            store.delete_post(id);
            Ok(payload(json!({})))
        },
    )
}
