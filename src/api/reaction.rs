//! Emoji reaction endpoints.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::{payload, App};
use crate::binder::Gate;
use crate::error::{Error, SchemaError};
use crate::schema::TypeDescriptor;

#[derive(Deserialize)]
struct ReactionParams {
    post_id: i64,
    emoji: i64,
}

pub fn register(app: &mut App) -> Result<(), SchemaError> {
    let store = Arc::clone(&app.store);
    app.post(
        "/api/add_reaction",
        Gate::LoggedIn,
        vec![
            ("post_id", TypeDescriptor::Int),
            ("emoji", TypeDescriptor::Int),
        ],
        move |_ctx, session, args| {
            let ReactionParams { post_id, emoji } = args.parse()?;
            let Some(session) = session else {
                return Err(Error::new("This API endpoint requires you to be logged in."));
            };
            store
                .add_reaction(emoji, post_id, session.user_id)
                .map_err(|_| Error::new("Reaction exists."))?;
            Ok(payload(json!({})))
        },
    )?;

    let store = Arc::clone(&app.store);
    app.post(
        "/api/remove_reaction",
        Gate::LoggedIn,
        vec![
            ("post_id", TypeDescriptor::Int),
            ("emoji", TypeDescriptor::Int),
        ],
        move |_ctx, session, args| {
            let ReactionParams { post_id, emoji } = args.parse()?;
            let Some(session) = session else {
                return Err(Error::new("This API endpoint requires you to be logged in."));
            };
            store.remove_reaction(emoji, post_id, session.user_id);
            Ok(payload(json!({})))
        },
    )
}
