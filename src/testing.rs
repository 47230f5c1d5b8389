//! In-memory fake of the data backend plus row fixtures, compiled for
//! tests only. The fake honors the same contracts the wire gateway
//! does: single-row misses surface the backend's not-found code,
//! joined reads resolve the author embed, and scripted failures let
//! tests exercise the log-and-continue paths.

use crate::backend::Backend;
use crate::domain::models::{
    Category, Comment, DecisionUpdate, Idea, IdeaPatch, IdeaScores, IdeaStatus, NewComment,
    NewIdea, NewNotification, NewProfile, NewVote, Notification, Profile, ProfileUpdate,
    ReviewCycle, Vote, VoteKind,
};
use crate::gateway::auth::{AuthEvent, AuthUser, Session, UserMetadata};
use crate::gateway::{GatewayError, NOT_FOUND_CODE};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

pub fn uuid(seed: u128) -> Uuid {
    Uuid::from_u128(seed)
}

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

pub fn profile(seed: u128) -> Profile {
    Profile {
        id: uuid(seed),
        email: format!("user{seed}@example.com"),
        full_name: format!("User {seed}"),
        department: None,
        avatar_url: None,
        is_admin: false,
        is_direction: false,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

pub fn direction_profile(seed: u128) -> Profile {
    Profile {
        is_direction: true,
        ..profile(seed)
    }
}

pub fn category(seed: u128) -> Category {
    Category {
        id: uuid(seed),
        name: format!("Category {seed}"),
        description: None,
        color: "#6366f1".to_string(),
        icon: "lightbulb".to_string(),
        created_at: fixed_time(),
    }
}

pub fn idea(seed: u128) -> Idea {
    Idea {
        id: uuid(seed),
        author_id: Some(uuid(seed + 900)),
        is_anonymous: false,
        title: format!("Idea {seed}"),
        description: format!("Description of idea {seed}"),
        category_id: None,
        ai_summary: None,
        ai_tags: None,
        quality_score: 0.0,
        priority_score: 0.0,
        quality_votes_count: 0,
        priority_votes_count: 0,
        comments_count: 0,
        status: IdeaStatus::Submitted,
        review_cycle: None,
        direction_verdict: None,
        direction_motivation: None,
        direction_reviewed_by: None,
        direction_reviewed_at: None,
        scheduled_quarter: None,
        created_at: fixed_time(),
        updated_at: fixed_time(),
        author: None,
        category: None,
    }
}

pub fn vote(idea_seed: u128, user_seed: u128) -> Vote {
    Vote {
        id: uuid(7000 + idea_seed * 100 + user_seed),
        idea_id: uuid(idea_seed),
        user_id: uuid(user_seed),
        quality_rating: Some(3),
        priority_rating: None,
        created_at: fixed_time(),
        updated_at: fixed_time(),
    }
}

pub fn notification(seed: u128, user_seed: u128) -> Notification {
    Notification {
        id: uuid(seed + 8000),
        user_id: uuid(user_seed),
        kind: "idea_approved".to_string(),
        title: format!("Notification {seed}"),
        message: None,
        idea_id: None,
        is_read: false,
        created_at: fixed_time(),
    }
}

pub fn cycle() -> ReviewCycle {
    ReviewCycle {
        id: 1,
        cycle_number: 4,
        start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        review_date: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
        status: "active".to_string(),
    }
}

pub fn session(user_seed: u128) -> Session {
    Session {
        access_token: "test-access-token".to_string(),
        refresh_token: "test-refresh-token".to_string(),
        expires_in: 3600,
        user: AuthUser {
            id: uuid(user_seed),
            email: Some(format!("user{user_seed}@example.com")),
            user_metadata: UserMetadata {
                full_name: Some(format!("User {user_seed}")),
            },
        },
    }
}

fn scripted_failure() -> GatewayError {
    GatewayError::Api {
        status: 500,
        code: "XX000".to_string(),
        message: "scripted failure".to_string(),
    }
}

fn not_found() -> GatewayError {
    GatewayError::Api {
        status: 406,
        code: NOT_FOUND_CODE.to_string(),
        message: "JSON object requested, multiple (or no) rows returned".to_string(),
    }
}

pub struct FakeBackend {
    restore: RwLock<Option<Session>>,
    session: RwLock<Option<Session>>,
    profiles: RwLock<HashMap<Uuid, Profile>>,
    categories: RwLock<Vec<Category>>,
    ideas: RwLock<Vec<Idea>>,
    votes: RwLock<Vec<Vote>>,
    comments: RwLock<Vec<Comment>>,
    notifications: RwLock<Vec<Notification>>,
    cycle: RwLock<Option<ReviewCycle>>,
    scores: RwLock<HashMap<Uuid, IdeaScores>>,
    failing: RwLock<HashSet<&'static str>>,
    calls: RwLock<Vec<&'static str>>,
    events: broadcast::Sender<AuthEvent>,
}

impl FakeBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            restore: RwLock::new(None),
            session: RwLock::new(None),
            profiles: RwLock::new(HashMap::new()),
            categories: RwLock::new(Vec::new()),
            ideas: RwLock::new(Vec::new()),
            votes: RwLock::new(Vec::new()),
            comments: RwLock::new(Vec::new()),
            notifications: RwLock::new(Vec::new()),
            cycle: RwLock::new(None),
            scores: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            calls: RwLock::new(Vec::new()),
            events,
        }
    }

    pub async fn set_restore(&self, session: Session) {
        *self.restore.write().await = Some(session);
    }

    pub async fn seed_profile(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id, profile);
    }

    pub async fn seed_category(&self, category: Category) {
        self.categories.write().await.push(category);
    }

    pub async fn seed_idea(&self, idea: Idea) {
        self.ideas.write().await.push(idea);
    }

    pub async fn seed_vote(&self, vote: Vote) {
        self.votes.write().await.push(vote);
    }

    pub async fn seed_notification(&self, notification: Notification) {
        self.notifications.write().await.push(notification);
    }

    pub async fn set_cycle(&self, cycle: ReviewCycle) {
        *self.cycle.write().await = Some(cycle);
    }

    /// Scores served by `fetch_idea_scores`, standing in for the
    /// backend-maintained aggregates.
    pub async fn set_scores(&self, idea_id: Uuid, scores: IdeaScores) {
        self.scores.write().await.insert(idea_id, scores);
    }

    /// Makes the named operation fail until cleared.
    pub async fn fail_on(&self, op: &'static str) {
        self.failing.write().await.insert(op);
    }

    pub async fn clear_failures(&self) {
        self.failing.write().await.clear();
    }

    pub async fn call_count(&self, op: &'static str) -> usize {
        self.calls.read().await.iter().filter(|c| **c == op).count()
    }

    pub fn emit(&self, event: AuthEvent) {
        let _ = self.events.send(event);
    }

    pub async fn stored_idea(&self, id: Uuid) -> Option<Idea> {
        self.ideas.read().await.iter().find(|i| i.id == id).cloned()
    }

    pub async fn stored_notifications(&self) -> Vec<Notification> {
        self.notifications.read().await.clone()
    }

    async fn gate(&self, op: &'static str) -> Result<(), GatewayError> {
        self.calls.write().await.push(op);
        if self.failing.read().await.contains(op) {
            return Err(scripted_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn restore_session(&self) -> Option<Session> {
        self.calls.write().await.push("restore_session");
        if let Some(session) = self.session.read().await.clone() {
            return Some(session);
        }
        let restored = self.restore.read().await.clone();
        if let Some(session) = &restored {
            *self.session.write().await = Some(session.clone());
        }
        restored
    }

    async fn sign_out(&self) {
        self.calls.write().await.push("sign_out");
        *self.session.write().await = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    fn subscribe_auth(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn fetch_profile(&self, id: Uuid) -> Result<Profile, GatewayError> {
        self.gate("fetch_profile").await?;
        self.profiles
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, GatewayError> {
        self.gate("create_profile").await?;
        let row = Profile {
            id: profile.id,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            department: None,
            avatar_url: None,
            is_admin: false,
            is_direction: false,
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        self.profiles.write().await.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileUpdate,
    ) -> Result<Profile, GatewayError> {
        self.gate("update_profile").await?;
        let mut profiles = self.profiles.write().await;
        let row = profiles.get_mut(&id).ok_or_else(not_found)?;
        row.full_name = changes.full_name.clone();
        row.department = changes.department.clone();
        Ok(row.clone())
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, GatewayError> {
        self.gate("fetch_categories").await?;
        Ok(self.categories.read().await.clone())
    }

    async fn fetch_ideas(&self) -> Result<Vec<Idea>, GatewayError> {
        self.gate("fetch_ideas").await?;
        Ok(self
            .ideas
            .read()
            .await
            .iter()
            .filter(|idea| idea.status != IdeaStatus::Draft)
            .cloned()
            .collect())
    }

    async fn fetch_idea(&self, id: Uuid) -> Result<Idea, GatewayError> {
        self.gate("fetch_idea").await?;
        self.stored_idea(id).await.ok_or_else(not_found)
    }

    async fn fetch_idea_scores(&self, id: Uuid) -> Result<IdeaScores, GatewayError> {
        self.gate("fetch_idea_scores").await?;
        if let Some(scores) = self.scores.read().await.get(&id) {
            return Ok(*scores);
        }
        let idea = self.stored_idea(id).await.ok_or_else(not_found)?;
        Ok(IdeaScores {
            quality_score: idea.quality_score,
            priority_score: idea.priority_score,
            quality_votes_count: idea.quality_votes_count,
            priority_votes_count: idea.priority_votes_count,
        })
    }

    async fn insert_idea(&self, idea: &NewIdea) -> Result<Idea, GatewayError> {
        self.gate("insert_idea").await?;
        let author = self.profiles.read().await.get(&idea.author_id).cloned();
        let row = Idea {
            id: Uuid::new_v4(),
            author_id: Some(idea.author_id),
            is_anonymous: idea.is_anonymous,
            title: idea.title.clone(),
            description: idea.description.clone(),
            category_id: idea.category_id,
            status: idea.status,
            author,
            ..self::idea(0)
        };
        self.ideas.write().await.push(row.clone());
        Ok(row)
    }

    async fn apply_decision(
        &self,
        idea_id: Uuid,
        update: &DecisionUpdate,
    ) -> Result<(), GatewayError> {
        self.gate("apply_decision").await?;
        let mut ideas = self.ideas.write().await;
        let idea = ideas
            .iter_mut()
            .find(|i| i.id == idea_id)
            .ok_or_else(not_found)?;
        IdeaPatch::from(update).apply(idea);
        Ok(())
    }

    async fn fetch_votes_for_user(&self, user_id: Uuid) -> Result<Vec<Vote>, GatewayError> {
        self.gate("fetch_votes_for_user").await?;
        Ok(self
            .votes
            .read()
            .await
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn fetch_votes_for_idea(&self, idea_id: Uuid) -> Result<Vec<Vote>, GatewayError> {
        self.gate("fetch_votes_for_idea").await?;
        Ok(self
            .votes
            .read()
            .await
            .iter()
            .filter(|v| v.idea_id == idea_id)
            .cloned()
            .collect())
    }

    async fn insert_vote(&self, vote: &NewVote) -> Result<Vote, GatewayError> {
        self.gate("insert_vote").await?;
        let row = Vote {
            id: Uuid::new_v4(),
            idea_id: vote.idea_id,
            user_id: vote.user_id,
            quality_rating: vote.quality_rating,
            priority_rating: vote.priority_rating,
            created_at: fixed_time(),
            updated_at: fixed_time(),
        };
        self.votes.write().await.push(row.clone());
        Ok(row)
    }

    async fn update_vote_rating(
        &self,
        vote_id: Uuid,
        kind: VoteKind,
        rating: i16,
    ) -> Result<(), GatewayError> {
        self.gate("update_vote_rating").await?;
        let mut votes = self.votes.write().await;
        let vote = votes
            .iter_mut()
            .find(|v| v.id == vote_id)
            .ok_or_else(not_found)?;
        vote.set_rating(kind, rating);
        Ok(())
    }

    async fn fetch_comments(&self, idea_id: Uuid) -> Result<Vec<Comment>, GatewayError> {
        self.gate("fetch_comments").await?;
        Ok(self
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.idea_id == idea_id)
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, GatewayError> {
        self.gate("insert_comment").await?;
        let author = self.profiles.read().await.get(&comment.author_id).cloned();
        let row = Comment {
            id: Uuid::new_v4(),
            idea_id: comment.idea_id,
            author_id: Some(comment.author_id),
            is_anonymous: comment.is_anonymous,
            content: comment.content.clone(),
            is_direction_reply: false,
            created_at: fixed_time(),
            author,
        };
        self.comments.write().await.push(row.clone());
        Ok(row)
    }

    async fn fetch_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, GatewayError> {
        self.gate("fetch_notifications").await?;
        Ok(self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<(), GatewayError> {
        self.gate("insert_notification").await?;
        let row = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            kind: notification.kind.clone(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            idea_id: notification.idea_id,
            is_read: false,
            created_at: fixed_time(),
        };
        self.notifications.write().await.push(row);
        Ok(())
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<(), GatewayError> {
        self.gate("mark_notification_read").await?;
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(not_found)?;
        notification.is_read = true;
        Ok(())
    }

    async fn mark_notifications_read(&self, ids: &[Uuid]) -> Result<(), GatewayError> {
        self.gate("mark_notifications_read").await?;
        let mut notifications = self.notifications.write().await;
        for notification in notifications.iter_mut() {
            if ids.contains(&notification.id) {
                notification.is_read = true;
            }
        }
        Ok(())
    }

    async fn fetch_latest_cycle(&self) -> Result<Option<ReviewCycle>, GatewayError> {
        self.gate("fetch_latest_cycle").await?;
        Ok(self.cycle.read().await.clone())
    }
}
