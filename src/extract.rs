use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;

use crate::post::{Field, Post, RetweetOrigin, RetweetSource};

static MENTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(?P<handle>\w+)").unwrap());
static RETWEET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^RT @(?P<handle>\w+)").unwrap());

/// Every `@handle` in left-to-right order, duplicates included.
/// Handles are returned without the leading `@`.
pub fn extract_mentions(text: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.name("handle"))
        .map(|m| m.as_str().to_owned())
        .collect()
}

/// The handle of a text that starts with `RT @handle`.
pub fn extract_retweet_source(text: &str) -> Option<String> {
    RETWEET_RE
        .captures(text)
        .and_then(|caps| caps.name("handle"))
        .map(|m| m.as_str().to_owned())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFeatures {
    pub mentions: Vec<String>,
    pub retweet_source: Option<RetweetSource>,
}

/// Derives the features of a single post.
///
/// An explicit retweet column takes precedence over a leading `RT @handle`.
pub fn extract_features(post: &Post) -> TextFeatures {
    let text = post.text_or_empty();
    let retweet_source = match &post.retweet_of {
        Field::Known(handle) => Some(RetweetSource {
            handle: handle.clone(),
            origin: RetweetOrigin::Column,
        }),
        Field::Unknown => extract_retweet_source(text).map(|handle| RetweetSource {
            handle,
            origin: RetweetOrigin::Text,
        }),
    };

    TextFeatures {
        mentions: extract_mentions(text),
        retweet_source,
    }
}

/// Returns copies of `posts` with `mentions` and `retweet_source` filled in.
pub fn annotate_posts(posts: &[Post]) -> Vec<Post> {
    posts
        .par_iter()
        .map(|post| {
            let features = extract_features(post);
            Post {
                mentions: features.mentions,
                retweet_source: features.retweet_source,
                ..post.clone()
            }
        })
        .collect()
}

/// Mentions that should become mention edges.
///
/// When the retweet source came from a leading `RT @handle`, that handle is
/// reported as a retweet only and skipped here even though it is part of
/// `mentions`. With a retweet column it stays an ordinary mention.
pub fn mention_edge_targets(post: &Post) -> &[String] {
    let leading_retweet = matches!(
        post.retweet_source,
        Some(RetweetSource {
            origin: RetweetOrigin::Text,
            ..
        })
    );
    match post.mentions.split_first() {
        Some((_, rest)) if leading_retweet => rest,
        _ => &post.mentions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;
    use pretty_assertions::assert_eq;

    fn post_with(text: &str) -> Post {
        Post {
            text: Field::Known(text.to_owned()),
            ..Post::empty(0)
        }
    }

    #[test]
    fn test_mentions_keep_order_and_duplicates() {
        assert_eq!(
            extract_mentions("@bob hi @carol and @bob again"),
            vec!["bob", "carol", "bob"]
        );
    }

    #[test]
    fn test_mentions_need_word_characters() {
        assert_eq!(extract_mentions("@ nobody @! here"), Vec::<String>::new());
        assert_eq!(extract_mentions("mail me at x@example.com"), vec!["example"]);
    }

    #[test]
    fn test_retweet_must_be_anchored() {
        assert_eq!(extract_retweet_source("RT @alice bad news"), Some("alice".into()));
        assert_eq!(extract_retweet_source("lol RT @alice bad news"), None);
        assert_eq!(extract_retweet_source(" RT @alice"), None);
        assert_eq!(extract_retweet_source("rt @alice"), None);
        assert_eq!(extract_retweet_source("RT alice"), None);
    }

    #[test]
    fn test_missing_text_has_no_features() {
        assert_eq!(extract_features(&Post::empty(0)), TextFeatures::default());
        assert_eq!(extract_features(&post_with("")), TextFeatures::default());
    }

    #[test]
    fn test_column_attribution_wins() {
        let post = Post {
            retweet_of: Field::Known("dave".into()),
            ..post_with("RT @alice hello")
        };
        let features = extract_features(&post);
        assert_eq!(
            features.retweet_source,
            Some(RetweetSource {
                handle: "dave".into(),
                origin: RetweetOrigin::Column,
            })
        );
        assert_eq!(features.mentions, vec!["alice"]);
    }

    #[test]
    fn test_leading_retweet_is_not_a_mention_edge() {
        let posts = annotate_posts(&[post_with("RT @alice hey @bob @alice")]);
        assert_eq!(posts[0].mentions, vec!["alice", "bob", "alice"]);
        assert_eq!(mention_edge_targets(&posts[0]), ["bob", "alice"]);

        let posts = annotate_posts(&[post_with("hey @bob")]);
        assert_eq!(mention_edge_targets(&posts[0]), ["bob"]);
    }

    #[test]
    fn test_column_retweet_keeps_leading_mention() {
        let post = Post {
            author: Field::Known("bob".into()),
            retweet_of: Field::Known("dave".into()),
            ..post_with("RT @alice hello")
        };
        let posts = annotate_posts(&[post]);
        assert_eq!(mention_edge_targets(&posts[0]), ["alice"]);

        let graph = crate::graph::GraphBuilder::default().build(&posts);
        assert_eq!(graph.multiplicity("bob", "dave", EdgeKind::Retweet), 1);
        assert_eq!(graph.multiplicity("bob", "alice", EdgeKind::Mention), 1);
    }
}
