use super::Validate;
use crate::application::actions::{
    ActionAdapter, CommentLikeAdapter, CreateCommentAdapter, DeleteCommentAdapter,
    DeletePostAdapter, EditCommentAdapter, EditPostAdapter, FollowAdapter, PostLikeAdapter,
};
use crate::application::services::MutationOutcome;
use crate::domain::value_objects::{ActionKind, CommentId, PostId, TargetId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_CONTENT_CHARS: usize = 5000;

/// One consumer-initiated action, tagged by `action`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    #[serde(rename_all = "camelCase")]
    Follow { user_id: String },
    #[serde(rename_all = "camelCase")]
    Unfollow { user_id: String },
    #[serde(rename_all = "camelCase")]
    LikePost { post_id: String },
    #[serde(rename_all = "camelCase")]
    UnlikePost { post_id: String },
    #[serde(rename_all = "camelCase")]
    LikeComment { comment_id: String, post_id: String },
    #[serde(rename_all = "camelCase")]
    UnlikeComment { comment_id: String, post_id: String },
    #[serde(rename_all = "camelCase")]
    CreateComment {
        post_id: String,
        content: String,
        #[serde(default)]
        parent_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    EditComment {
        comment_id: String,
        post_id: String,
        content: String,
    },
    #[serde(rename_all = "camelCase")]
    DeleteComment { comment_id: String, post_id: String },
    #[serde(rename_all = "camelCase")]
    EditPost { post_id: String, content: String },
    #[serde(rename_all = "camelCase")]
    DeletePost { post_id: String },
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Follow { .. } => ActionKind::Follow,
            ActionRequest::Unfollow { .. } => ActionKind::Unfollow,
            ActionRequest::LikePost { .. } => ActionKind::LikePost,
            ActionRequest::UnlikePost { .. } => ActionKind::UnlikePost,
            ActionRequest::LikeComment { .. } => ActionKind::LikeComment,
            ActionRequest::UnlikeComment { .. } => ActionKind::UnlikeComment,
            ActionRequest::CreateComment { .. } => ActionKind::CreateComment,
            ActionRequest::EditComment { .. } => ActionKind::EditComment,
            ActionRequest::DeleteComment { .. } => ActionKind::DeleteComment,
            ActionRequest::EditPost { .. } => ActionKind::EditPost,
            ActionRequest::DeletePost { .. } => ActionKind::DeletePost,
        }
    }

    fn content(&self) -> Option<&str> {
        match self {
            ActionRequest::CreateComment { content, .. }
            | ActionRequest::EditComment { content, .. }
            | ActionRequest::EditPost { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Builds the adapter for this action and the id it targets.
    pub fn into_adapter(self) -> Result<(Arc<dyn ActionAdapter>, TargetId), String> {
        let (adapter, target) = match self {
            ActionRequest::Follow { user_id } => shared(FollowAdapter::follow(), user_id),
            ActionRequest::Unfollow { user_id } => shared(FollowAdapter::unfollow(), user_id),
            ActionRequest::LikePost { post_id } => shared(PostLikeAdapter::like(), post_id),
            ActionRequest::UnlikePost { post_id } => shared(PostLikeAdapter::unlike(), post_id),
            ActionRequest::LikeComment {
                comment_id,
                post_id,
            } => shared(CommentLikeAdapter::like(PostId::new(post_id)?), comment_id),
            ActionRequest::UnlikeComment {
                comment_id,
                post_id,
            } => shared(CommentLikeAdapter::unlike(PostId::new(post_id)?), comment_id),
            ActionRequest::CreateComment {
                post_id,
                content,
                parent_id,
            } => {
                let parent_id = parent_id.map(CommentId::new).transpose()?;
                shared(CreateCommentAdapter::new(content, parent_id), post_id)
            }
            ActionRequest::EditComment {
                comment_id,
                post_id,
                content,
            } => shared(
                EditCommentAdapter::new(PostId::new(post_id)?, content),
                comment_id,
            ),
            ActionRequest::DeleteComment {
                comment_id,
                post_id,
            } => shared(DeleteCommentAdapter::new(PostId::new(post_id)?), comment_id),
            ActionRequest::EditPost { post_id, content } => {
                shared(EditPostAdapter::new(content), post_id)
            }
            ActionRequest::DeletePost { post_id } => shared(DeletePostAdapter, post_id),
        };
        Ok((adapter, TargetId::new(target)?))
    }
}

fn shared<A>(adapter: A, target: String) -> (Arc<dyn ActionAdapter>, String)
where
    A: ActionAdapter + 'static,
{
    (Arc::new(adapter), target)
}

impl Validate for ActionRequest {
    fn validate(&self) -> Result<(), String> {
        if let Some(content) = self.content() {
            if content.trim().is_empty() {
                return Err("Content cannot be empty".to_string());
            }
            if content.chars().count() > MAX_CONTENT_CHARS {
                return Err(format!(
                    "Content is too long (max {MAX_CONTENT_CHARS} characters)"
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MutationOutcomeDto {
    pub action: ActionKind,
    pub target_id: String,
    pub outcome: MutationOutcome,
}
