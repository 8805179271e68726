mod article;
mod comment;
mod gallery;

pub use self::{
    article::{Article, ArticleFilter, ArticleQuery, NewArticle},
    comment::{
        Comment, CommentChanges, CommentFilter, CommentQuery, CommentView, NewComment,
        UNKNOWN_ARTICLE_TITLE,
    },
    gallery::{GalleryFilter, GalleryItem, GalleryQuery, MediaKind, MediaKindError, NewGalleryItem},
};
