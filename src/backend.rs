use crate::domain::models::{
    Category, Comment, DecisionUpdate, Idea, IdeaScores, NewComment, NewIdea, NewNotification,
    NewProfile, NewVote, Notification, Profile, ProfileUpdate, ReviewCycle, Vote, VoteKind,
};
use crate::gateway::auth::{AuthEvent, Session};
use crate::gateway::GatewayError;
use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Every operation the client issues against the data backend: the
/// table reads/writes plus the session lifecycle. The gateway implements
/// it over HTTP; tests swap in an in-memory fake.
#[async_trait]
pub trait Backend: Send + Sync {
    // Session lifecycle.
    async fn current_session(&self) -> Option<Session>;
    async fn restore_session(&self) -> Option<Session>;
    async fn sign_out(&self);
    fn subscribe_auth(&self) -> broadcast::Receiver<AuthEvent>;

    // Profiles.
    async fn fetch_profile(&self, id: Uuid) -> Result<Profile, GatewayError>;
    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, GatewayError>;
    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileUpdate,
    ) -> Result<Profile, GatewayError>;

    // Categories.
    async fn fetch_categories(&self) -> Result<Vec<Category>, GatewayError>;

    // Ideas.
    async fn fetch_ideas(&self) -> Result<Vec<Idea>, GatewayError>;
    async fn fetch_idea(&self, id: Uuid) -> Result<Idea, GatewayError>;
    async fn fetch_idea_scores(&self, id: Uuid) -> Result<IdeaScores, GatewayError>;
    async fn insert_idea(&self, idea: &NewIdea) -> Result<Idea, GatewayError>;
    async fn apply_decision(
        &self,
        idea_id: Uuid,
        update: &DecisionUpdate,
    ) -> Result<(), GatewayError>;

    // Votes.
    async fn fetch_votes_for_user(&self, user_id: Uuid) -> Result<Vec<Vote>, GatewayError>;
    async fn fetch_votes_for_idea(&self, idea_id: Uuid) -> Result<Vec<Vote>, GatewayError>;
    async fn insert_vote(&self, vote: &NewVote) -> Result<Vote, GatewayError>;
    async fn update_vote_rating(
        &self,
        vote_id: Uuid,
        kind: VoteKind,
        rating: i16,
    ) -> Result<(), GatewayError>;

    // Comments.
    async fn fetch_comments(&self, idea_id: Uuid) -> Result<Vec<Comment>, GatewayError>;
    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, GatewayError>;

    // Notifications.
    async fn fetch_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, GatewayError>;
    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<(), GatewayError>;
    async fn mark_notification_read(&self, id: Uuid) -> Result<(), GatewayError>;
    async fn mark_notifications_read(&self, ids: &[Uuid]) -> Result<(), GatewayError>;

    // Review cycles.
    async fn fetch_latest_cycle(&self) -> Result<Option<ReviewCycle>, GatewayError>;
}
