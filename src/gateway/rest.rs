use super::auth::{AuthEvent, Session};
use super::{Gateway, GatewayError};
use crate::backend::Backend;
use crate::domain::models::{
    Category, Comment, DecisionUpdate, Idea, IdeaScores, NewComment, NewIdea, NewNotification,
    NewProfile, NewVote, Notification, Profile, ProfileUpdate, ReviewCycle, Vote, VoteKind,
};
use async_trait::async_trait;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Joined select used wherever an idea is rendered with its author and
/// category resolved.
const IDEA_SELECT: &str = "*,author:profiles(*),category:categories(*)";
const COMMENT_SELECT: &str = "*,author:profiles(*)";
const NOTIFICATION_PAGE: usize = 50;

fn eq(id: Uuid) -> String {
    format!("eq.{id}")
}

#[async_trait]
impl Backend for Gateway {
    async fn current_session(&self) -> Option<Session> {
        self.auth().current_session().await
    }

    async fn restore_session(&self) -> Option<Session> {
        self.auth().restore().await
    }

    async fn sign_out(&self) {
        self.auth().sign_out().await;
    }

    fn subscribe_auth(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth().subscribe()
    }

    async fn fetch_profile(&self, id: Uuid) -> Result<Profile, GatewayError> {
        self.select_single(
            "profiles",
            &[("select", "*".to_string()), ("id", eq(id))],
        )
        .await
    }

    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, GatewayError> {
        self.insert_returning("profiles", &[], profile).await
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileUpdate,
    ) -> Result<Profile, GatewayError> {
        self.update_returning("profiles", &[("id", eq(id))], changes)
            .await
    }

    async fn fetch_categories(&self) -> Result<Vec<Category>, GatewayError> {
        self.select(
            "categories",
            &[("select", "*".to_string()), ("order", "name.asc".to_string())],
        )
        .await
    }

    async fn fetch_ideas(&self) -> Result<Vec<Idea>, GatewayError> {
        self.select(
            "ideas",
            &[
                ("select", IDEA_SELECT.to_string()),
                ("status", "neq.draft".to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    async fn fetch_idea(&self, id: Uuid) -> Result<Idea, GatewayError> {
        self.select_single(
            "ideas",
            &[("select", IDEA_SELECT.to_string()), ("id", eq(id))],
        )
        .await
    }

    async fn fetch_idea_scores(&self, id: Uuid) -> Result<IdeaScores, GatewayError> {
        self.select_single(
            "ideas",
            &[
                (
                    "select",
                    "quality_score,priority_score,quality_votes_count,priority_votes_count"
                        .to_string(),
                ),
                ("id", eq(id)),
            ],
        )
        .await
    }

    async fn insert_idea(&self, idea: &NewIdea) -> Result<Idea, GatewayError> {
        self.insert_returning("ideas", &[("select", IDEA_SELECT.to_string())], idea)
            .await
    }

    async fn apply_decision(
        &self,
        idea_id: Uuid,
        update: &DecisionUpdate,
    ) -> Result<(), GatewayError> {
        self.update("ideas", &[("id", eq(idea_id))], update).await
    }

    async fn fetch_votes_for_user(&self, user_id: Uuid) -> Result<Vec<Vote>, GatewayError> {
        self.select(
            "votes",
            &[("select", "*".to_string()), ("user_id", eq(user_id))],
        )
        .await
    }

    async fn fetch_votes_for_idea(&self, idea_id: Uuid) -> Result<Vec<Vote>, GatewayError> {
        self.select(
            "votes",
            &[("select", "*".to_string()), ("idea_id", eq(idea_id))],
        )
        .await
    }

    async fn insert_vote(&self, vote: &NewVote) -> Result<Vote, GatewayError> {
        self.insert_returning("votes", &[], vote).await
    }

    async fn update_vote_rating(
        &self,
        vote_id: Uuid,
        kind: VoteKind,
        rating: i16,
    ) -> Result<(), GatewayError> {
        self.update(
            "votes",
            &[("id", eq(vote_id))],
            &serde_json::json!({ kind.column(): rating }),
        )
        .await
    }

    async fn fetch_comments(&self, idea_id: Uuid) -> Result<Vec<Comment>, GatewayError> {
        self.select(
            "comments",
            &[
                ("select", COMMENT_SELECT.to_string()),
                ("idea_id", eq(idea_id)),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    async fn insert_comment(&self, comment: &NewComment) -> Result<Comment, GatewayError> {
        self.insert_returning("comments", &[("select", COMMENT_SELECT.to_string())], comment)
            .await
    }

    async fn fetch_notifications(&self, user_id: Uuid) -> Result<Vec<Notification>, GatewayError> {
        self.select(
            "notifications",
            &[
                ("select", "*".to_string()),
                ("user_id", eq(user_id)),
                ("order", "created_at.desc".to_string()),
                ("limit", NOTIFICATION_PAGE.to_string()),
            ],
        )
        .await
    }

    async fn insert_notification(
        &self,
        notification: &NewNotification,
    ) -> Result<(), GatewayError> {
        self.insert("notifications", notification).await
    }

    async fn mark_notification_read(&self, id: Uuid) -> Result<(), GatewayError> {
        self.update(
            "notifications",
            &[("id", eq(id))],
            &serde_json::json!({ "is_read": true }),
        )
        .await
    }

    async fn mark_notifications_read(&self, ids: &[Uuid]) -> Result<(), GatewayError> {
        if ids.is_empty() {
            return Ok(());
        }
        let id_list = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        self.update(
            "notifications",
            &[("id", format!("in.({id_list})"))],
            &serde_json::json!({ "is_read": true }),
        )
        .await
    }

    async fn fetch_latest_cycle(&self) -> Result<Option<ReviewCycle>, GatewayError> {
        let mut cycles: Vec<ReviewCycle> = self
            .select(
                "review_cycles",
                &[
                    ("select", "*".to_string()),
                    ("order", "cycle_number.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(if cycles.is_empty() {
            None
        } else {
            Some(cycles.remove(0))
        })
    }
}
