use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use time::Date;

use crate::post::{Post, SentimentLabel};

/// Posts per calendar day (UTC). Posts without a timestamp are left out.
pub fn daily_volume(posts: &[Post]) -> BTreeMap<Date, usize> {
    let mut volume = BTreeMap::new();
    for ts in posts.iter().filter_map(|p| p.created_at.known()) {
        *volume.entry(ts.date()).or_insert(0) += 1;
    }
    volume
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorActivity {
    pub author: String,
    pub posts: usize,
}

/// The `k` authors with the most posts, ties broken by handle.
pub fn most_active_authors(posts: &[Post], k: usize) -> Vec<AuthorActivity> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for author in posts.iter().filter_map(Post::actor) {
        *counts.entry(author).or_insert(0) += 1;
    }

    let mut activity: Vec<AuthorActivity> = counts
        .into_iter()
        .map(|(author, posts)| AuthorActivity {
            author: author.to_owned(),
            posts,
        })
        .collect();
    activity.sort_by(|a, b| b.posts.cmp(&a.posts).then_with(|| a.author.cmp(&b.author)));
    activity.truncate(k);
    activity
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountSummary {
    pub known: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
}

impl CountSummary {
    fn of(values: impl Iterator<Item = u64>) -> Option<Self> {
        let mut known = 0usize;
        let mut min = u64::MAX;
        let mut max = 0;
        let mut sum = 0u128;
        for v in values {
            known += 1;
            min = min.min(v);
            max = max.max(v);
            sum += u128::from(v);
        }
        (known > 0).then(|| Self {
            known,
            min,
            max,
            mean: sum as f64 / known as f64,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EngagementSummary {
    pub retweets: Option<CountSummary>,
    pub likes: Option<CountSummary>,
}

pub fn engagement(posts: &[Post]) -> EngagementSummary {
    EngagementSummary {
        retweets: CountSummary::of(posts.iter().filter_map(|p| p.retweet_count.known().copied())),
        likes: CountSummary::of(posts.iter().filter_map(|p| p.like_count.known().copied())),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    pub unlabeled: usize,
}

pub fn sentiment_distribution(posts: &[Post]) -> SentimentDistribution {
    posts
        .iter()
        .fold(SentimentDistribution::default(), |mut dist, post| {
            match post.sentiment {
                Some(SentimentLabel::Positive) => dist.positive += 1,
                Some(SentimentLabel::Negative) => dist.negative += 1,
                Some(SentimentLabel::Neutral) => dist.neutral += 1,
                None => dist.unlabeled += 1,
            }
            dist
        })
}

/// The first `limit` posts carrying `label`, in input order.
pub fn examples_for(posts: &[Post], label: SentimentLabel, limit: usize) -> Vec<&Post> {
    posts
        .iter()
        .filter(|p| p.sentiment == Some(label))
        .take(limit)
        .collect()
}

/// Everything the overview report shows, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub posts: usize,
    pub daily_volume: BTreeMap<String, usize>,
    pub most_active: Vec<AuthorActivity>,
    pub engagement: EngagementSummary,
    pub sentiment: SentimentDistribution,
}

pub fn overview(posts: &[Post], top_k: usize) -> Overview {
    Overview {
        posts: posts.len(),
        daily_volume: daily_volume(posts)
            .into_iter()
            .map(|(day, n)| (day.to_string(), n))
            .collect(),
        most_active: most_active_authors(posts, top_k),
        engagement: engagement(posts),
        sentiment: sentiment_distribution(posts),
    }
}
