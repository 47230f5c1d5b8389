use crate::domain::models::{
    Category, Idea, IdeaPatch, Notification, Profile, ReviewCycle, Vote,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process cache of the signed-in user's view of the world.
///
/// All mutators are synchronous merge operations on the in-memory data;
/// no network calls originate here. The cache has no eviction: it lives
/// for the lifetime of the session and is replaced wholesale on
/// sign-in/out.
#[derive(Debug, Default)]
pub struct SessionStore {
    user: Option<Profile>,
    ideas: Vec<Idea>,
    categories: Vec<Category>,
    notifications: Vec<Notification>,
    unread_count: usize,
    user_votes: HashMap<Uuid, Vote>,
    current_cycle: Option<ReviewCycle>,
}

pub type SharedStore = Arc<RwLock<SessionStore>>;

pub fn shared() -> SharedStore {
    Arc::new(RwLock::new(SessionStore::default()))
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_user(&mut self, user: Option<Profile>) {
        self.user = user;
    }

    pub fn user(&self) -> Option<&Profile> {
        self.user.as_ref()
    }

    pub fn set_ideas(&mut self, ideas: Vec<Idea>) {
        self.ideas = ideas;
    }

    /// Newest first, matching the bootstrap ordering.
    pub fn add_idea(&mut self, idea: Idea) {
        self.ideas.insert(0, idea);
    }

    /// Merge-patches the matching idea; every other idea is untouched.
    /// Unknown ids are ignored (the row may have been evicted by a
    /// full reload racing the caller).
    pub fn update_idea(&mut self, id: Uuid, patch: &IdeaPatch) {
        if let Some(idea) = self.ideas.iter_mut().find(|idea| idea.id == id) {
            patch.apply(idea);
        }
    }

    pub fn ideas(&self) -> &[Idea] {
        &self.ideas
    }

    pub fn idea(&self, id: Uuid) -> Option<&Idea> {
        self.ideas.iter().find(|idea| idea.id == id)
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn set_notifications(&mut self, notifications: Vec<Notification>) {
        self.unread_count = notifications.iter().filter(|n| !n.is_read).count();
        self.notifications = notifications;
    }

    pub fn add_notification(&mut self, notification: Notification) {
        if !notification.is_read {
            self.unread_count += 1;
        }
        self.notifications.insert(0, notification);
    }

    /// Flips one notification to read. Already-read entries are left
    /// alone so the unread counter stays an exact derived count.
    pub fn mark_as_read(&mut self, id: Uuid) {
        if let Some(notification) = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id && !n.is_read)
        {
            notification.is_read = true;
            self.unread_count -= 1;
        }
    }

    pub fn mark_all_as_read(&mut self) {
        for notification in &mut self.notifications {
            notification.is_read = true;
        }
        self.unread_count = 0;
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    /// Rebuilds the idea_id -> vote mapping from a bootstrap read.
    pub fn set_user_votes(&mut self, votes: Vec<Vote>) {
        self.user_votes = votes.into_iter().map(|v| (v.idea_id, v)).collect();
    }

    /// Upserts the single entry for one idea.
    pub fn set_vote(&mut self, idea_id: Uuid, vote: Vote) {
        self.user_votes.insert(idea_id, vote);
    }

    pub fn user_vote(&self, idea_id: Uuid) -> Option<&Vote> {
        self.user_votes.get(&idea_id)
    }

    pub fn user_votes(&self) -> &HashMap<Uuid, Vote> {
        &self.user_votes
    }

    pub fn set_current_cycle(&mut self, cycle: Option<ReviewCycle>) {
        self.current_cycle = cycle;
    }

    pub fn current_cycle(&self) -> Option<&ReviewCycle> {
        self.current_cycle.as_ref()
    }

    /// Sign-out wipe: user, ideas, votes and notifications go away.
    /// Categories and the review cycle are not user-scoped and survive
    /// until the next bootstrap replaces them.
    pub fn clear_session(&mut self) {
        self.user = None;
        self.ideas.clear();
        self.user_votes.clear();
        self.notifications.clear();
        self.unread_count = 0;
    }
}
