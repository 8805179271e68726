use database::{
    schema::cms::{MediaKind, NewArticle, NewComment, NewGalleryItem},
    slug::slugify,
};
use rocket_dyn_templates::tera::escape_html;
use serde::Serialize;
use uuid::Uuid;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in both name and comment")]
    IncompleteComment,
    #[error("Please provide a title and content")]
    IncompleteArticle,
    #[error("Please provide a slug containing letters or numbers")]
    EmptySlug,
    #[error("Please provide a title and a media URL")]
    IncompleteGalleryItem,
    #[error("Media type must be image or video")]
    UnknownMediaType,
    #[error("For TikTok videos, please provide the embed code. Use \"Generate TikTok Embed\" to create it.")]
    TikTokEmbedRequired,
    #[error("Please enter a TikTok URL first")]
    NotTikTok,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(FromForm, Debug, Clone, Default, Serialize)]
pub struct CommentForm {
    pub author_name: String,
    pub comment_text: String,
}

impl CommentForm {
    pub fn validate(&self, article_id: Uuid) -> Result<NewComment, ValidationError> {
        let author_name = self.author_name.trim();
        let comment_text = self.comment_text.trim();
        if author_name.is_empty() || comment_text.is_empty() {
            return Err(ValidationError::IncompleteComment);
        }

        Ok(NewComment {
            article_id,
            author_name: author_name.to_string(),
            comment_text: comment_text.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticleAction {
    Draft,
    Publish,
}

impl ArticleAction {
    pub fn success_message(&self) -> &'static str {
        match self {
            ArticleAction::Draft => "Article saved as draft!",
            ArticleAction::Publish => "Article published!",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            ArticleAction::Draft => "Error saving article",
            ArticleAction::Publish => "Error publishing article",
        }
    }
}

#[derive(FromForm, Debug, Clone, Default, Serialize)]
pub struct ArticleForm {
    pub title: String,
    pub slug: Option<String>,
    pub content_markdown: String,
    pub cover_image_url: Option<String>,
    pub category: Option<String>,
    pub action: Option<String>,
}

impl ArticleForm {
    /// Anything other than an explicit `publish` saves a draft.
    pub fn action(&self) -> ArticleAction {
        match self.action.as_deref() {
            Some("publish") => ArticleAction::Publish,
            _ => ArticleAction::Draft,
        }
    }

    pub fn validate(&self) -> Result<NewArticle, ValidationError> {
        let title = self.title.trim();
        let content_markdown = self.content_markdown.trim();
        if title.is_empty() || content_markdown.is_empty() {
            return Err(ValidationError::IncompleteArticle);
        }

        let slug = match non_blank(self.slug.as_ref()) {
            Some(slug) => slugify(&slug),
            None => slugify(title),
        };
        if slug.is_empty() {
            return Err(ValidationError::EmptySlug);
        }

        Ok(NewArticle {
            title: title.to_string(),
            slug,
            content_markdown: self.content_markdown.clone(),
            cover_image_url: non_blank(self.cover_image_url.as_ref()),
            category: non_blank(self.category.as_ref()),
            is_published: self.action() == ArticleAction::Publish,
        })
    }
}

#[derive(FromForm, Debug, Clone, Serialize)]
pub struct GalleryForm {
    pub title: String,
    pub description: Option<String>,
    pub media_url: String,
    pub media_type: String,
    pub embed_html: Option<String>,
    pub category: Option<String>,
    pub action: Option<String>,
}

impl Default for GalleryForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: None,
            media_url: String::new(),
            media_type: MediaKind::Image.to_string(),
            embed_html: None,
            category: None,
            action: None,
        }
    }
}

pub fn is_tiktok_url(url: &str) -> bool {
    url.contains("tiktok.com")
}

/// The digits following `/video/` in a TikTok URL.
pub fn tiktok_video_id(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("/video/")?;
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let id = &rest[..end];
    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

pub fn tiktok_embed(url: &str) -> String {
    let video_id = tiktok_video_id(url)
        .map(|id| format!(" data-video-id=\"{}\"", id))
        .unwrap_or_default();

    format!(
        "<blockquote class=\"tiktok-embed\" cite=\"{}\"{} style=\"max-width: 605px;min-width: 325px;\">\n  <section></section>\n</blockquote>\n<script async src=\"https://www.tiktok.com/embed.js\"></script>",
        escape_html(url),
        video_id
    )
}

impl GalleryForm {
    pub fn generates_embed(&self) -> bool {
        self.action.as_deref() == Some("generate_embed")
    }

    /// Fills in TikTok embed markup for the submitted URL.
    pub fn generate_embed(&mut self) -> Result<(), ValidationError> {
        let media_url = self.media_url.trim();
        if !is_tiktok_url(media_url) {
            return Err(ValidationError::NotTikTok);
        }

        self.embed_html = Some(tiktok_embed(media_url));
        self.media_type = MediaKind::Video.to_string();
        Ok(())
    }

    pub fn validate(&self) -> Result<NewGalleryItem, ValidationError> {
        let title = self.title.trim();
        let media_url = self.media_url.trim();
        if title.is_empty() || media_url.is_empty() {
            return Err(ValidationError::IncompleteGalleryItem);
        }

        let media_type = self
            .media_type
            .trim()
            .parse::<MediaKind>()
            .map_err(|_| ValidationError::UnknownMediaType)?;
        let embed_html = match media_type {
            MediaKind::Video => non_blank(self.embed_html.as_ref()),
            MediaKind::Image => None,
        };
        if media_type == MediaKind::Video && is_tiktok_url(media_url) && embed_html.is_none() {
            return Err(ValidationError::TikTokEmbedRequired);
        }

        Ok(NewGalleryItem {
            title: title.to_string(),
            description: non_blank(self.description.as_ref()),
            media_url: media_url.to_string(),
            media_type,
            embed_html,
            category: non_blank(self.category.as_ref()),
            is_published: true,
        })
    }
}
