//! Static knowledge base: articles, troubleshooting guides, community posts
//! and documentation, with simple text search.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Default number of entries returned by the "recent" and "top" listings
pub const DEFAULT_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub category: String,
    pub content: String,
    pub tags: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Guide {
    pub id: String,
    pub title: String,
    pub system: String,
    pub problem: String,
    pub steps: Vec<String>,
    pub verification: String,
    pub tags: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub question: String,
    pub accepted_answer: String,
    pub score: i64,
    pub tags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Doc {
    pub id: String,
    pub title: String,
    pub category: String,
    pub content: String,
    pub last_updated: DateTime<Utc>,
}

/// Combined search results
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub articles: Vec<Article>,
    pub guides: Vec<Guide>,
    pub posts: Vec<Post>,
    pub docs: Vec<Doc>,
}

impl SearchResults {
    pub fn total(&self) -> usize {
        self.articles.len() + self.guides.len() + self.posts.len() + self.docs.len()
    }
}

/// Most recent entries of each kind
#[derive(Debug, Clone, Serialize)]
pub struct RecentEntries {
    pub articles: Vec<Article>,
    pub guides: Vec<Guide>,
    pub top_posts: Vec<Post>,
    pub docs: Vec<Doc>,
}

/// Read-only knowledge base
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    articles: Vec<Article>,
    guides: Vec<Guide>,
    posts: Vec<Post>,
    docs: Vec<Doc>,
}

fn contains(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|t| t.to_string()).collect()
}

fn newest_first<T: Clone>(items: &[T], key: impl Fn(&T) -> DateTime<Utc>, limit: usize) -> Vec<T> {
    let mut sorted = items.to_vec();
    sorted.sort_by_key(|item| std::cmp::Reverse(key(item)));
    sorted.truncate(limit);
    sorted
}

impl KnowledgeBase {
    /// The built-in entries, dated relative to now
    pub fn new() -> Self {
        Self::seeded_at(Utc::now())
    }

    /// The built-in entries, dated relative to `now`
    pub fn seeded_at(now: DateTime<Utc>) -> Self {
        let articles = vec![
            Article {
                id: "KB001".to_string(),
                title: "Common System Issues and Solutions".to_string(),
                category: "Troubleshooting".to_string(),
                content: "# Common System Issues and Solutions\n\n\
                          ## High CPU Usage\n\
                          - Check for resource-intensive processes\n\
                          - Review application logs\n\
                          - Monitor system metrics\n\n\
                          ## Memory Leaks\n\
                          - Identify memory-consuming processes\n\
                          - Analyze heap dumps\n\
                          - Review application memory settings\n"
                    .to_string(),
                tags: tags(&["system", "cpu", "memory", "troubleshooting"]),
                last_updated: now - Duration::days(5),
            },
            Article {
                id: "KB002".to_string(),
                title: "Database Performance Optimization".to_string(),
                category: "Best Practices".to_string(),
                content: "# Database Performance Optimization\n\n\
                          ## Index Optimization\n\
                          - Review query execution plans\n\
                          - Analyze index usage\n\
                          - Implement missing indexes\n\n\
                          ## Query Tuning\n\
                          - Identify slow queries\n\
                          - Optimize query structure\n\
                          - Use query hints when necessary\n"
                    .to_string(),
                tags: tags(&["database", "performance", "optimization"]),
                last_updated: now - Duration::days(2),
            },
        ];

        let guides = vec![Guide {
            id: "TG001".to_string(),
            title: "Resolving High CPU Usage".to_string(),
            system: "Linux Servers".to_string(),
            problem: "System experiencing sustained high CPU usage".to_string(),
            steps: tags(&[
                "Check top processes using 'top' command",
                "Review system logs in /var/log/",
                "Monitor CPU usage patterns",
                "Identify and optimize resource-intensive applications",
            ]),
            verification: "CPU usage should return to normal levels (<70%)".to_string(),
            tags: tags(&["cpu", "performance", "linux"]),
            last_updated: now - Duration::days(1),
        }];

        let posts = vec![Post {
            id: "SO001".to_string(),
            title: "How to optimize PostgreSQL query performance?".to_string(),
            question: "I have a complex query that's running slowly...".to_string(),
            accepted_answer: "1. First, analyze the query using EXPLAIN ANALYZE\n\
                              2. Check for missing indexes\n\
                              3. Review query structure\n"
                .to_string(),
            score: 125,
            tags: tags(&["postgresql", "performance", "sql"]),
            timestamp: now - Duration::days(30),
        }];

        let docs = vec![Doc {
            id: "DOC001".to_string(),
            title: "System Architecture Overview".to_string(),
            category: "Architecture".to_string(),
            content: "# System Architecture\n\n\
                      ## Components\n\
                      - Web Servers\n\
                      - Application Servers\n\
                      - Database Servers\n\n\
                      ## Network Layout\n\
                      - DMZ Configuration\n\
                      - Internal Network\n\
                      - Backup Systems\n"
                .to_string(),
            last_updated: now - Duration::days(10),
        }];

        Self::from_entries(articles, guides, posts, docs)
    }

    pub fn from_entries(
        articles: Vec<Article>,
        guides: Vec<Guide>,
        posts: Vec<Post>,
        docs: Vec<Doc>,
    ) -> Self {
        Self {
            articles,
            guides,
            posts,
            docs,
        }
    }

    /// Articles whose title, content or any tag contains `query`
    pub fn search_articles(&self, query: &str) -> Vec<Article> {
        if query.is_empty() {
            return Vec::new();
        }
        let q = query.to_lowercase();
        self.articles
            .iter()
            .filter(|a| {
                contains(&a.title, &q)
                    || contains(&a.content, &q)
                    || a.tags.iter().any(|t| contains(t, &q))
            })
            .cloned()
            .collect()
    }

    pub fn search_guides(&self, query: &str) -> Vec<Guide> {
        if query.is_empty() {
            return Vec::new();
        }
        let q = query.to_lowercase();
        self.guides
            .iter()
            .filter(|g| contains(&g.title, &q) || contains(&g.problem, &q))
            .cloned()
            .collect()
    }

    pub fn search_posts(&self, query: &str) -> Vec<Post> {
        if query.is_empty() {
            return Vec::new();
        }
        let q = query.to_lowercase();
        self.posts
            .iter()
            .filter(|p| contains(&p.title, &q) || contains(&p.question, &q))
            .cloned()
            .collect()
    }

    pub fn search_docs(&self, query: &str) -> Vec<Doc> {
        if query.is_empty() {
            return Vec::new();
        }
        let q = query.to_lowercase();
        self.docs
            .iter()
            .filter(|d| contains(&d.title, &q) || contains(&d.content, &q))
            .cloned()
            .collect()
    }

    /// Search every collection at once
    pub fn search(&self, query: &str) -> SearchResults {
        SearchResults {
            articles: self.search_articles(query),
            guides: self.search_guides(query),
            posts: self.search_posts(query),
            docs: self.search_docs(query),
        }
    }

    pub fn recent_articles(&self, limit: usize) -> Vec<Article> {
        newest_first(&self.articles, |a| a.last_updated, limit)
    }

    pub fn recent_guides(&self, limit: usize) -> Vec<Guide> {
        newest_first(&self.guides, |g| g.last_updated, limit)
    }

    pub fn recent_docs(&self, limit: usize) -> Vec<Doc> {
        newest_first(&self.docs, |d| d.last_updated, limit)
    }

    /// Highest-scored posts first
    pub fn top_posts(&self, limit: usize) -> Vec<Post> {
        let mut posts = self.posts.clone();
        posts.sort_by_key(|p| std::cmp::Reverse(p.score));
        posts.truncate(limit);
        posts
    }

    pub fn recent(&self, limit: usize) -> RecentEntries {
        RecentEntries {
            articles: self.recent_articles(limit),
            guides: self.recent_guides(limit),
            top_posts: self.top_posts(limit),
            docs: self.recent_docs(limit),
        }
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}
