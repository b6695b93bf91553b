use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Follow,
    Unfollow,
    LikePost,
    UnlikePost,
    LikeComment,
    UnlikeComment,
    CreateComment,
    EditComment,
    DeleteComment,
    EditPost,
    DeletePost,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Follow => "follow",
            ActionKind::Unfollow => "unfollow",
            ActionKind::LikePost => "like_post",
            ActionKind::UnlikePost => "unlike_post",
            ActionKind::LikeComment => "like_comment",
            ActionKind::UnlikeComment => "unlike_comment",
            ActionKind::CreateComment => "create_comment",
            ActionKind::EditComment => "edit_comment",
            ActionKind::DeleteComment => "delete_comment",
            ActionKind::EditPost => "edit_post",
            ActionKind::DeletePost => "delete_post",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(ActionKind::Follow),
            "unfollow" => Ok(ActionKind::Unfollow),
            "like_post" => Ok(ActionKind::LikePost),
            "unlike_post" => Ok(ActionKind::UnlikePost),
            "like_comment" => Ok(ActionKind::LikeComment),
            "unlike_comment" => Ok(ActionKind::UnlikeComment),
            "create_comment" => Ok(ActionKind::CreateComment),
            "edit_comment" => Ok(ActionKind::EditComment),
            "delete_comment" => Ok(ActionKind::DeleteComment),
            "edit_post" => Ok(ActionKind::EditPost),
            "delete_post" => Ok(ActionKind::DeletePost),
            other => Err(format!("Unknown action kind: {other}")),
        }
    }
}
