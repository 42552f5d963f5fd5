//! Blog content loaded from markdown files with YAML frontmatter.
//!
//! Posts live as `{slug}.md` or `{slug}.mdx` in a single directory. Every
//! lookup goes through the slug normalizer first, so a request can never
//! name a path outside that directory.

pub mod frontmatter;

use std::path::{Path, PathBuf};

use serde::Serialize;

pub use frontmatter::PostMeta;
use frontmatter::{parse_meta, split_frontmatter};

use crate::validation::slug::normalize_slug;

const POST_EXTENSIONS: &[&str] = &["mdx", "md"];
const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("invalid slug")]
    InvalidSlug,

    #[error("post `{0}` not found")]
    NotFound(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bad frontmatter in {path}: {message}")]
    Frontmatter { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Post {
    pub slug: String,
    #[serde(flatten)]
    pub meta: PostMeta,
    pub body: String,
    pub reading_minutes: usize,
}

#[derive(Debug, Clone)]
pub struct ContentLibrary {
    posts_dir: PathBuf,
}

impl ContentLibrary {
    pub fn new(posts_dir: impl Into<PathBuf>) -> Self {
        Self {
            posts_dir: posts_dir.into(),
        }
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    /// All published posts, newest first. Drafts and files with unreadable
    /// frontmatter are left out.
    pub fn list_posts(&self) -> Result<Vec<Post>, ContentError> {
        let entries = match std::fs::read_dir(&self.posts_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("posts directory missing: {}", self.posts_dir.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(ContentError::Io {
                    path: self.posts_dir.clone(),
                    source,
                });
            }
        };

        let mut posts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ContentError::Io {
                path: self.posts_dir.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() || !has_post_extension(&path) {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(slug) = normalize_slug(stem).filter(|slug| slug == stem) else {
                tracing::warn!("skipping post with non-slug filename: {}", path.display());
                continue;
            };

            let post = match read_post(&path, slug) {
                Ok(post) => post,
                Err(err @ ContentError::Frontmatter { .. }) => {
                    tracing::warn!("skipping post: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if !post.meta.draft {
                posts.push(post);
            }
        }

        posts.sort_by(|a, b| {
            b.meta
                .date
                .cmp(&a.meta.date)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(posts)
    }

    /// Load a single post by untrusted slug.
    ///
    /// Drafts are returned; hiding them is the caller's decision.
    pub fn get_post(&self, raw_slug: &str) -> Result<Post, ContentError> {
        let slug = normalize_slug(raw_slug).ok_or(ContentError::InvalidSlug)?;

        for ext in POST_EXTENSIONS {
            let path = self.posts_dir.join(format!("{slug}.{ext}"));
            if path.is_file() {
                return read_post(&path, slug);
            }
        }

        Err(ContentError::NotFound(slug))
    }
}

fn has_post_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| POST_EXTENSIONS.contains(&ext))
}

fn read_post(path: &Path, slug: String) -> Result<Post, ContentError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let (yaml, body) = split_frontmatter(&raw);
    if yaml.is_empty() {
        return Err(ContentError::Frontmatter {
            path: path.to_path_buf(),
            message: "missing frontmatter block".to_string(),
        });
    }

    let meta = parse_meta(yaml).map_err(|err| ContentError::Frontmatter {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;

    Ok(Post {
        slug,
        meta,
        reading_minutes: reading_minutes(body),
        body: body.to_string(),
    })
}

fn reading_minutes(body: &str) -> usize {
    let words = body.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}
