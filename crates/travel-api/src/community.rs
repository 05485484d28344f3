//! Community board: posts and comments

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};
use travel_session::{OutboundRequest, Session};

use crate::fetch;
use crate::models::{Comment, NewComment, NewPost, Post};
use crate::{Error, Result};

const POSTS_PATH: &str = "/api/community/posts/";

fn post_path(id: u64) -> String {
    format!("{POSTS_PATH}{id}/")
}

async fn get_json<T: DeserializeOwned>(session: &Session, path: &str) -> Result<T> {
    let url = session.endpoint(path)?;
    fetch(session, OutboundRequest::get(url)).await?.json()
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::Decode(format!("encoding request body: {e}")))
}

/// All posts, newest first as the server orders them. Empty on failure.
pub async fn list_posts(session: &Session) -> Vec<Post> {
    get_json(session, POSTS_PATH).await.unwrap_or_else(|e: Error| {
        warn!(error = %e, "listing posts failed");
        Vec::new()
    })
}

/// One post, `None` when missing or unreadable.
pub async fn get_post(session: &Session, id: u64) -> Option<Post> {
    match get_json(session, &post_path(id)).await {
        Ok(post) => Some(post),
        Err(e) => {
            warn!(error = %e, post_id = id, "loading post failed");
            None
        }
    }
}

pub async fn list_comments(session: &Session, post_id: u64) -> Vec<Comment> {
    let path = format!("{}comments/all/", post_path(post_id));
    get_json(session, &path).await.unwrap_or_else(|e: Error| {
        warn!(error = %e, post_id, "listing comments failed");
        Vec::new()
    })
}

/// Create a post as the logged-in user.
pub async fn create_post(session: &Session, post: &NewPost) -> Result<Post> {
    let url = session.endpoint(POSTS_PATH)?;
    let created: Post = fetch(session, OutboundRequest::post(url).json(to_body(post)?))
        .await?
        .json()?;
    info!(post_id = created.id, "post created");
    Ok(created)
}

/// Delete a post. Only its author may; others get `Error::Status` 403.
pub async fn delete_post(session: &Session, id: u64) -> Result<()> {
    let url = session.endpoint(&post_path(id))?;
    fetch(session, OutboundRequest::delete(url)).await?;
    info!(post_id = id, "post deleted");
    Ok(())
}

pub async fn create_comment(session: &Session, post_id: u64, comment: &NewComment) -> Result<Comment> {
    let url = session.endpoint(&format!("{}comments/", post_path(post_id)))?;
    let created: Comment = fetch(session, OutboundRequest::post(url).json(to_body(comment)?))
        .await?
        .json()?;
    info!(post_id, comment_id = created.id, "comment created");
    Ok(created)
}

pub async fn delete_comment(session: &Session, comment_id: u64) -> Result<()> {
    let url = session.endpoint(&format!("/api/community/comments/{comment_id}/"))?;
    fetch(session, OutboundRequest::delete(url)).await?;
    info!(comment_id, "comment deleted");
    Ok(())
}
