use crate::domain::value_objects::{CommentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: CommentId,
    pub author_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub is_liked_by_viewer: bool,
    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn new(
        id: CommentId,
        author_id: UserId,
        content: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author_id,
            content,
            created_at,
            edited_at: None,
            like_count: 0,
            is_liked_by_viewer: false,
            replies: Vec::new(),
        }
    }

    pub fn liked(self) -> Self {
        if self.is_liked_by_viewer {
            return self;
        }
        Self {
            like_count: self.like_count.saturating_add(1),
            is_liked_by_viewer: true,
            ..self
        }
    }

    pub fn unliked(self) -> Self {
        if !self.is_liked_by_viewer {
            return self;
        }
        Self {
            like_count: self.like_count.saturating_sub(1),
            is_liked_by_viewer: false,
            ..self
        }
    }

    pub fn edited(self, content: String, edited_at: DateTime<Utc>) -> Self {
        Self {
            content,
            edited_at: Some(edited_at),
            ..self
        }
    }
}

/// Comments of one post: top-level nodes, each with a flat list of replies.
///
/// Replies never carry replies of their own; a reply to a reply is stored
/// under the top-level comment it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "Vec<CommentNode>", into = "Vec<CommentNode>")]
pub struct CommentThread {
    comments: Vec<CommentNode>,
}

impl CommentThread {
    pub fn new(nodes: Vec<CommentNode>) -> Self {
        let comments = nodes
            .into_iter()
            .map(|mut top| {
                let nested = std::mem::take(&mut top.replies);
                top.replies = flatten(nested);
                top
            })
            .collect();
        Self { comments }
    }

    pub fn comments(&self) -> &[CommentNode] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments
            .iter()
            .map(|top| 1 + top.replies.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn find(&self, id: &CommentId) -> Option<&CommentNode> {
        self.comments.iter().find_map(|top| {
            if &top.id == id {
                Some(top)
            } else {
                top.replies.iter().find(|reply| &reply.id == id)
            }
        })
    }

    /// Top-level comment that owns `id` (itself when `id` is top-level).
    pub fn root_of(&self, id: &CommentId) -> Option<&CommentId> {
        self.comments
            .iter()
            .find(|top| &top.id == id || top.replies.iter().any(|reply| &reply.id == id))
            .map(|top| &top.id)
    }

    /// Appends `node` at the top level, or under the root of `parent`.
    /// A missing parent leaves the thread unchanged.
    pub fn with_comment(mut self, mut node: CommentNode, parent: Option<&CommentId>) -> Self {
        let nested = std::mem::take(&mut node.replies);
        match parent {
            None => {
                node.replies = flatten(nested);
                self.comments.push(node);
            }
            Some(parent) => {
                let Some(root) = self.root_of(parent).cloned() else {
                    return self;
                };
                if let Some(top) = self.comments.iter_mut().find(|top| top.id == root) {
                    top.replies.push(node);
                    top.replies.extend(flatten(nested));
                }
            }
        }
        self
    }

    pub fn map_comment<F>(mut self, id: &CommentId, update: F) -> Self
    where
        F: FnOnce(CommentNode) -> CommentNode,
    {
        if let Some(index) = self.comments.iter().position(|top| &top.id == id) {
            let top = &mut self.comments[index];
            let replies = std::mem::take(&mut top.replies);
            let mut updated = update(top.clone());
            updated.replies = replies;
            *top = updated;
            return self;
        }
        for top in self.comments.iter_mut() {
            if let Some(reply) = top.replies.iter_mut().find(|reply| &reply.id == id) {
                let mut updated = update(reply.clone());
                updated.replies.clear();
                *reply = updated;
                break;
            }
        }
        self
    }

    /// Removes the comment; removing a top-level comment drops its replies too.
    pub fn without_comment(mut self, id: &CommentId) -> Self {
        self.comments.retain(|top| &top.id != id);
        for top in self.comments.iter_mut() {
            top.replies.retain(|reply| &reply.id != id);
        }
        self
    }

    /// Swaps a temporary id for the server-issued one in place.
    pub fn with_replaced_id(
        self,
        temporary: &CommentId,
        issued: CommentId,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.map_comment(temporary, |node| CommentNode {
            id: issued,
            created_at: created_at.unwrap_or(node.created_at),
            ..node
        })
    }
}

fn flatten(nodes: Vec<CommentNode>) -> Vec<CommentNode> {
    let mut flat = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        let nested = std::mem::take(&mut node.replies);
        flat.push(node);
        flat.extend(flatten(nested));
    }
    flat
}

impl From<Vec<CommentNode>> for CommentThread {
    fn from(nodes: Vec<CommentNode>) -> Self {
        Self::new(nodes)
    }
}

impl From<CommentThread> for Vec<CommentNode> {
    fn from(thread: CommentThread) -> Self {
        thread.comments
    }
}
