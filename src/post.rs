use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spdlog::info;

use crate::content::front_matter::{split_front_matter, FrontMatter};
use crate::error::{Error, Result};

const UNTITLED: &str = "untitled";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Destination chat. When absent, the configured default channel is used at send time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Media paths, relative to the media root
    #[serde(default)]
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub content: String,
    pub filepath: PathBuf,
    pub metadata: PostMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
}

impl Display for Post {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "file={}, title={}, tags={:?}, channel={}\ncontent:\n{}",
               self.filepath.display(),
               self.metadata.title,
               self.metadata.tags,
               self.metadata.channel.as_deref().unwrap_or("<default>"),
               self.content
        )
    }
}

/// Example of post
/// ---
/// title: Weekly notes
/// tags: [rust, notes]
/// channel: @my_channel
/// attachments:
///   - images/cover.png
/// ---
/// # What happened this week
impl Post {
    pub async fn parse(file_name: &Path) -> Result<Post> {
        info!("Parsing post file {}", file_name.display());
        let document = tokio::fs::read_to_string(file_name).await.map_err(|source| Error::Read {
            path: file_name.to_path_buf(),
            source,
        })?;

        Ok(Self::from_string(file_name, &document))
    }

    pub fn from_string(file_name: &Path, document: &str) -> Post {
        let (front_matter, content) = match split_front_matter(document) {
            Some((front_matter, body)) => (front_matter, body),
            None => (FrontMatter::default(), document),
        };

        let title = front_matter.title.unwrap_or_else(|| default_title(file_name));

        Post {
            content: content.to_string(),
            filepath: file_name.to_path_buf(),
            metadata: PostMetadata {
                title,
                tags: front_matter.tags.unwrap_or_default(),
                channel: front_matter.channel,
                attachments: front_matter.attachments.unwrap_or_default(),
            },
            scheduled_time: None,
        }
    }

    /// Copy of this post due at `at`.
    pub fn scheduled_at(&self, at: DateTime<Utc>) -> Post {
        Post {
            scheduled_time: Some(at),
            ..self.clone()
        }
    }

    pub fn channel_or<'a>(&'a self, default_channel: &'a str) -> &'a str {
        self.metadata.channel.as_deref().unwrap_or(default_channel)
    }
}

/// File name without extension, or the whole file name if the stem is empty.
fn default_title(file_name: &Path) -> String {
    let stem = file_name.file_stem().map(|s| s.to_string_lossy().to_string());
    match stem {
        Some(stem) if !stem.trim().is_empty() => stem,
        _ => match file_name.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => UNTITLED.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::test_data::{POST_DATA, POST_WITHOUT_HEADER};

    use super::*;

    #[test]
    fn test_from_string() {
        let post = Post::from_string(Path::new("test.md"), POST_DATA);
        assert_eq!(post, Post {
            content: "Test content".to_string(),
            filepath: PathBuf::from("test.md"),
            metadata: PostMetadata {
                title: "Test Post".to_string(),
                tags: vec!["test".to_string(), "markdown".to_string()],
                channel: Some("@customChannel".to_string()),
                attachments: vec!["image.jpg".to_string(), "doc.pdf".to_string()],
            },
            scheduled_time: None,
        });
    }

    #[test]
    fn test_defaults_without_header() {
        let post = Post::from_string(Path::new("vault/2024/test.md"), POST_WITHOUT_HEADER);
        assert_eq!(post.content, POST_WITHOUT_HEADER);
        assert_eq!(post.metadata, PostMetadata {
            title: "test".to_string(),
            tags: vec![],
            channel: None,
            attachments: vec![],
        });
    }

    #[test]
    fn test_malformed_header_is_content() {
        let doc = "---\ntitle: Never closed\nSome text";
        let post = Post::from_string(Path::new("draft.md"), doc);
        assert_eq!(post.content, doc);
        assert_eq!(post.metadata.title, "draft");
    }

    #[test]
    fn test_default_title() {
        assert_eq!(default_title(Path::new("notes/hello world.md")), "hello world");
        assert_eq!(default_title(Path::new("README")), "README");
        assert_eq!(default_title(Path::new("archive.tar.gz")), "archive.tar");
        assert_eq!(default_title(Path::new(".md")), ".md");
        assert_eq!(default_title(Path::new("")), "untitled");
    }

    #[test]
    fn test_channel_or() {
        let post = Post::from_string(Path::new("a.md"), "text");
        assert_eq!(post.channel_or("@default"), "@default");
        let post = Post::from_string(Path::new("a.md"), POST_DATA);
        assert_eq!(post.channel_or("@default"), "@customChannel");
    }

    #[test]
    fn test_serialized_form() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc);
        let post = Post::from_string(Path::new("a.md"), "text").scheduled_at(at);
        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["scheduledTime"], "2024-05-01T10:00:00Z");
        assert_eq!(json["metadata"]["title"], "a");
        assert!(json["metadata"].get("channel").is_none());

        let back: Post = serde_json::from_value(json).unwrap();
        assert_eq!(back, post);
    }

    #[tokio::test]
    async fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weekly.md");
        std::fs::write(&path, "---\ntags: [a]\n---\nHello").unwrap();

        let post = Post::parse(&path).await.unwrap();
        assert_eq!(post.metadata.title, "weekly");
        assert_eq!(post.metadata.tags, vec!["a".to_string()]);
        assert_eq!(post.content, "Hello");
        assert_eq!(post.filepath, path);
    }

    #[tokio::test]
    async fn test_parse_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.md");

        let res = Post::parse(&path).await;
        assert!(matches!(res, Err(Error::Read { path: p, .. }) if p == path));
    }
}
