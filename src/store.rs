//! Storage collaborator for the bundled API.
//!
//! The binder never touches storage; business handlers issue whatever
//! queries they need against this store. [`MemoryStore`] keeps the three
//! tables of the notification board (users, posts, reactions) behind one
//! lock, safe to call from concurrent in-flight requests.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;

/// Seconds since the Unix epoch; the creation timestamp unit everywhere.
pub fn unix_time() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub tags: Vec<String>,
    pub permission: i64,
    pub created_time: i64,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    pub tags: Vec<String>,
    pub recipients: Vec<String>,
    pub created_time: i64,
}

/// One reaction: `(emoji, post_id, user_id)`, unique as a triple.
pub type ReactionKey = (i64, i64, i64);

/// The reaction already exists for this user and post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateReaction;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, UserRow>,
    posts: BTreeMap<i64, PostRow>,
    reactions: BTreeSet<ReactionKey>,
    next_user_id: i64,
    next_post_id: i64,
}

/// In-memory store with interior mutability.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- users -----

    pub fn user_by_username(&self, username: &str) -> Option<UserRow> {
        let t = self.tables.read();
        t.users.values().find(|u| u.username == username).cloned()
    }

    pub fn user_by_id(&self, id: i64) -> Option<UserRow> {
        self.tables.read().users.get(&id).cloned()
    }

    /// Insert a new user and return its id. Callers check username
    /// uniqueness first, as the original queries did.
    pub fn insert_user(
        &self,
        username: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> i64 {
        let mut t = self.tables.write();
        t.next_user_id += 1;
        let id = t.next_user_id;
        t.users.insert(
            id,
            UserRow {
                id,
                username: username.into(),
                display_name: display_name.into(),
                avatar_url: None,
                tags: Vec::new(),
                permission: 0,
                created_time: unix_time(),
                password_hash: password_hash.into(),
            },
        );
        id
    }

    pub fn set_password_hash(&self, username: &str, password_hash: String) {
        let mut t = self.tables.write();
        if let Some(user) = t.users.values_mut().find(|u| u.username == username) {
            user.password_hash = password_hash;
        }
    }

    /// Mark a user as a publisher or revoke it; used by deployment setup
    /// and tests, never exposed as an endpoint.
    pub fn set_permission(&self, user_id: i64, permission: i64) {
        if let Some(user) = self.tables.write().users.get_mut(&user_id) {
            user.permission = permission;
        }
    }

    /// Partial profile update: only the `Some` fields are applied.
    pub fn update_profile(
        &self,
        user_id: i64,
        display_name: Option<String>,
        avatar_url: Option<String>,
        tags: Option<Vec<String>>,
    ) {
        let mut t = self.tables.write();
        if let Some(user) = t.users.get_mut(&user_id) {
            if let Some(v) = display_name {
                user.display_name = v;
            }
            if let Some(v) = avatar_url {
                user.avatar_url = Some(v);
            }
            if let Some(v) = tags {
                user.tags = v;
            }
        }
    }

    /// Delete a user together with their posts and reactions.
    pub fn delete_user(&self, user_id: i64) {
        let mut t = self.tables.write();
        t.users.remove(&user_id);
        t.posts.retain(|_, p| p.author_id != user_id);
        t.reactions.retain(|&(_, _, uid)| uid != user_id);
    }

    // ----- posts -----

    pub fn insert_post(
        &self,
        author_id: i64,
        content: String,
        tags: Vec<String>,
        recipients: Vec<String>,
    ) -> i64 {
        let mut t = self.tables.write();
        t.next_post_id += 1;
        let id = t.next_post_id;
        t.posts.insert(
            id,
            PostRow {
                id,
                author_id,
                content,
                tags,
                recipients,
                created_time: unix_time(),
            },
        );
        id
    }

    pub fn post_by_id(&self, id: i64) -> Option<PostRow> {
        self.tables.read().posts.get(&id).cloned()
    }

    pub fn all_posts(&self) -> Vec<PostRow> {
        self.tables.read().posts.values().cloned().collect()
    }

    /// Partial post update: only the `Some` fields are applied.
    pub fn update_post(
        &self,
        id: i64,
        content: Option<String>,
        tags: Option<Vec<String>>,
        recipients: Option<Vec<String>>,
    ) {
        let mut t = self.tables.write();
        if let Some(post) = t.posts.get_mut(&id) {
            if let Some(v) = content {
                post.content = v;
            }
            if let Some(v) = tags {
                post.tags = v;
            }
            if let Some(v) = recipients {
                post.recipients = v;
            }
        }
    }

    pub fn delete_post(&self, id: i64) {
        self.tables.write().posts.remove(&id);
    }

    // ----- reactions -----

    pub fn add_reaction(
        &self,
        emoji: i64,
        post_id: i64,
        user_id: i64,
    ) -> Result<(), DuplicateReaction> {
        let mut t = self.tables.write();
        if t.reactions.insert((emoji, post_id, user_id)) {
            Ok(())
        } else {
            Err(DuplicateReaction)
        }
    }

    pub fn remove_reaction(&self, emoji: i64, post_id: i64, user_id: i64) {
        self.tables.write().reactions.remove(&(emoji, post_id, user_id));
    }

    /// All reactions on a post, as `(emoji, user_id)` pairs.
    pub fn reactions_for_post(&self, post_id: i64) -> Vec<(i64, i64)> {
        self.tables
            .read()
            .reactions
            .iter()
            .filter(|&&(_, pid, _)| pid == post_id)
            .map(|&(emoji, _, uid)| (emoji, uid))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_are_sequential_and_lookup_works() {
        let store = MemoryStore::new();
        let a = store.insert_user("ada", "Ada", "h1");
        let b = store.insert_user("bob", "Bob", "h2");
        assert_eq!((a, b), (1, 2));
        assert_eq!(store.user_by_username("bob").map(|u| u.id), Some(2));
        assert_eq!(store.user_by_username("eve"), None);
    }

    #[test]
    fn delete_user_cascades_to_posts_and_reactions() {
        let store = MemoryStore::new();
        let ada = store.insert_user("ada", "Ada", "h");
        let bob = store.insert_user("bob", "Bob", "h");
        let post = store.insert_post(ada, "hi".into(), vec![], vec!["bob".into()]);
        store.add_reaction(1, post, bob).unwrap();
        store.add_reaction(1, post, ada).unwrap();
        store.delete_user(ada);
        assert_eq!(store.post_by_id(post), None);
        assert_eq!(store.reactions_for_post(post), vec![(1, bob)]);
    }

    #[test]
    fn duplicate_reactions_are_rejected() {
        let store = MemoryStore::new();
        assert_eq!(store.add_reaction(7, 1, 1), Ok(()));
        assert_eq!(store.add_reaction(7, 1, 1), Err(DuplicateReaction));
        store.remove_reaction(7, 1, 1);
        assert_eq!(store.add_reaction(7, 1, 1), Ok(()));
    }

    #[test]
    fn partial_updates_apply_only_some_fields() {
        let store = MemoryStore::new();
        let id = store.insert_user("ada", "Ada", "h");
        store.update_profile(id, None, Some("http://a/b.png".into()), None);
        let user = store.user_by_id(id).unwrap();
        assert_eq!(user.display_name, "Ada");
        assert_eq!(user.avatar_url.as_deref(), Some("http://a/b.png"));
    }
}
