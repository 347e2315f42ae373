//! Response types for the feed API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Path of the aggregate user-activity endpoint.
pub const SUMMARY_PATH: &str = "/api/users/summary";

/// Public profile of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Lightweight metadata for a post referenced by likes or saves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMeta {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Post ids with their metadata (likes, saves).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCollection {
    #[serde(default)]
    pub posts: Vec<String>,
    #[serde(default)]
    pub post_meta: Vec<PostMeta>,
}

impl PostCollection {
    /// Whether `post_id` is part of this collection.
    #[must_use]
    pub fn contains(&self, post_id: &str) -> bool {
        self.posts.iter().any(|p| p == post_id)
    }
}

/// A mention of the current user in someone else's post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    pub id: String,
    #[serde(default)]
    pub post_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Aggregate read-only snapshot of the current user's activity.
///
/// A refresh replaces the whole snapshot; it is never merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub me: UserProfile,
    #[serde(default)]
    pub followers: Vec<UserProfile>,
    #[serde(default)]
    pub following: Vec<UserProfile>,
    #[serde(default)]
    pub likes: PostCollection,
    #[serde(default)]
    pub saves: PostCollection,
    #[serde(default)]
    pub mentions: Vec<Mention>,
}

impl UserSummary {
    /// Whether the current user follows `user_id`.
    #[must_use]
    pub fn is_following(&self, user_id: &str) -> bool {
        self.following.iter().any(|u| u.id == user_id)
    }
}
