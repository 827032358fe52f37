use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::resource::PostResource;

pub type PostId = u64;

/// Status value the source system uses for publicly visible posts.
pub const PUBLISHED_STATUS: &str = "publish";

const UNCATEGORIZED: &str = "uncategorized";

/// Immutable snapshot of one blog post as it moves through the export.
///
/// Updates go through the consuming `with_*` methods; tags and category are
/// normalized on every path that sets them, including deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PostRecord {
    #[serde(default, skip_serializing_if = "is_zero")]
    id: PostId,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    status: String,
    #[serde(default, alias = "Date", skip_serializing_if = "Option::is_none")]
    published: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated: Option<DateTime<FixedOffset>>,
    #[serde(default, alias = "Name")]
    slug: String,
    #[serde(default)]
    title: String,
    #[serde(
        default,
        deserialize_with = "deserialize_category",
        skip_serializing_if = "Option::is_none"
    )]
    category: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_tags",
        skip_serializing_if = "Vec::is_empty"
    )]
    tags: Vec<String>,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    redirect_from: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    resources: Vec<PostResource>,
}

fn is_zero(id: &PostId) -> bool {
    *id == 0
}

fn deserialize_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<Vec<String>>::deserialize(deserializer)?;
    Ok(normalize_tags(raw.unwrap_or_default()))
}

fn deserialize_category<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(normalize_category(Option::<String>::deserialize(deserializer)?))
}

/// Trims, lower-cases and de-duplicates tags, keeping first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim().to_lowercase();
        if !tag.is_empty() && !normalized.contains(&tag) {
            normalized.push(tag);
        }
    }
    normalized
}

/// Drops blank categories and the source system's "uncategorized" placeholder.
pub fn normalize_category(category: Option<String>) -> Option<String> {
    let category = category?;
    let trimmed = category.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNCATEGORIZED) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl PostRecord {
    pub fn new(id: PostId, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            status: String::new(),
            published: None,
            updated: None,
            slug: slug.into(),
            title: title.into(),
            category: None,
            tags: Vec::new(),
            content: String::new(),
            redirect_from: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn id(&self) -> PostId {
        self.id
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn is_published(&self) -> bool {
        self.status == PUBLISHED_STATUS
    }

    pub fn published(&self) -> Option<DateTime<FixedOffset>> {
        self.published
    }

    pub fn updated(&self) -> Option<DateTime<FixedOffset>> {
        self.updated
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn redirect_from(&self) -> &[String] {
        &self.redirect_from
    }

    pub fn resources(&self) -> &[PostResource] {
        &self.resources
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_published(mut self, published: Option<DateTime<FixedOffset>>) -> Self {
        self.published = published;
        self
    }

    pub fn with_updated(mut self, updated: Option<DateTime<FixedOffset>>) -> Self {
        self.updated = updated;
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = normalize_category(category);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_redirect_from(mut self, redirect_from: Vec<String>) -> Self {
        self.redirect_from = redirect_from;
        self
    }

    pub fn with_resources(mut self, resources: Vec<PostResource>) -> Self {
        self.resources = resources;
        self
    }

    /// Adds a resource, replacing any earlier one with the same original reference.
    pub fn with_resource(mut self, resource: PostResource) -> Self {
        self.resources
            .retain(|existing| existing.original_url() != resource.original_url());
        self.resources.push(resource);
        self
    }
}
