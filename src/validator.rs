use spdlog::error;

use crate::error::{Error, Result};
use crate::markup::{channel_length, to_channel_markup};
use crate::post::Post;

/// Checks that the converted content of a post fits in `max_length` characters,
/// counted the way the channel counts them (UTF-16 code units).
pub fn validate(post: &Post, max_length: usize) -> Result<()> {
    let length = channel_length(&to_channel_markup(&post.content));
    if length > max_length {
        error!("Post '{}' exceeds the maximum length: {} > {}", &post.metadata.title, length, max_length);
        return Err(Error::LengthExceeded {
            title: post.metadata.title.clone(),
            length,
            limit: max_length,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn post_with(content: &str) -> Post {
        Post::from_string(Path::new("test.md"), content)
    }

    #[test]
    fn test_validate_length() {
        assert!(validate(&post_with("Test content"), 1000).is_ok());

        let res = validate(&post_with(&"a".repeat(1001)), 1000);
        match res {
            Err(Error::LengthExceeded { title, length, limit }) => {
                assert_eq!(title, "test");
                assert_eq!(length, 1001);
                assert_eq!(limit, 1000);
            }
            _ => panic!("Expected LengthExceeded"),
        }
    }

    #[test]
    fn test_validate_boundary() {
        assert!(validate(&post_with(&"a".repeat(10)), 10).is_ok());
        assert!(validate(&post_with(&"a".repeat(11)), 10).is_err());
    }

    #[test]
    fn test_validate_counts_emoji_twice() {
        assert!(validate(&post_with(&"😀".repeat(2048)), 4096).is_ok());
        assert!(validate(&post_with(&"😀".repeat(3000)), 4096).is_err());

        let res = validate(&post_with("a😀"), 2);
        assert!(matches!(res, Err(Error::LengthExceeded { length: 3, limit: 2, .. })));
    }

    #[test]
    fn test_validate_measures_converted_content() {
        // 13 characters as written, 11 after **bold** collapses to *bold*
        let post = post_with("**Bold text**");
        assert!(validate(&post, 11).is_ok());
        assert!(validate(&post, 10).is_err());
    }

    #[test]
    fn test_validate_ignores_front_matter() {
        let post = post_with("---\ntitle: A rather long title for a post\n---\nshort");
        assert!(validate(&post, 5).is_ok());
    }
}
