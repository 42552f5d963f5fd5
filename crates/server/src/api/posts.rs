//! Post listing and detail endpoints, annotated with view counts.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::NaiveDate;
use serde::Serialize;

use super::errors::ApiError;
use crate::content::{ContentError, ContentLibrary, Post};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub image: Option<String>,
    pub reading_minutes: usize,
    pub views: u64,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub views: u64,
}

async fn with_library<T, F>(library: &Arc<ContentLibrary>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ContentLibrary) -> Result<T, ContentError> + Send + 'static,
{
    let library = library.clone();
    tokio::task::spawn_blocking(move || f(&library))
        .await
        .map_err(|err| ApiError::Internal(format!("content task failed: {err}")))?
        .map_err(ApiError::from)
}

pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostSummary>>, ApiError> {
    let posts = with_library(&state.content, |library| library.list_posts()).await?;

    let slugs: Vec<String> = posts.iter().map(|p| p.slug.clone()).collect();
    let views = state.views.get_many(&slugs).await;

    let summaries = posts
        .into_iter()
        .map(|post| PostSummary {
            views: views.get(&post.slug).copied().unwrap_or(0),
            slug: post.slug,
            title: post.meta.title,
            date: post.meta.date,
            summary: post.meta.summary,
            tags: post.meta.tags,
            image: post.meta.image,
            reading_minutes: post.reading_minutes,
        })
        .collect();

    Ok(Json(summaries))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(raw_slug): Path<String>,
) -> Result<Json<PostDetail>, ApiError> {
    let post = with_library(&state.content, move |library| library.get_post(&raw_slug)).await?;
    if post.meta.draft {
        return Err(ApiError::NotFound(format!("post `{}` not found", post.slug)));
    }

    let views = state.views.get(&post.slug).await;
    Ok(Json(PostDetail { post, views }))
}
