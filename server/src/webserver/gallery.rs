use database::{
    pagination::{PageNavigation, Paginator, GALLERY_PAGE_SIZE},
    schema::cms::GalleryItem,
};
use log::error;
use rocket::State;
use rocket_dyn_templates::Template;
use serde::Serialize;

use super::{content_store, RequestData, Store};

#[derive(Serialize)]
struct GalleryContext {
    request: RequestData,
    items: Vec<GalleryItem>,
    total_count: usize,
    navigation: PageNavigation,
    error_message: Option<String>,
}

/// A failed load still renders the page, with an empty grid and a message.
#[get("/gallery?<page>")]
pub async fn gallery(page: Option<&str>, store: &State<Store>, request: RequestData) -> Template {
    let paginator = Paginator::from_query(page, GALLERY_PAGE_SIZE);

    let (items, total_count, error_message) =
        match GalleryItem::list_published_page(content_store(store), &paginator).await {
            Ok(results) => {
                let total_count = results.total_count.unwrap_or(results.records.len());
                (results.records, total_count, None)
            }
            Err(err) => {
                error!("error loading gallery: {:?}", err);
                (
                    Vec::new(),
                    0,
                    Some(String::from("The gallery could not be loaded right now.")),
                )
            }
        };

    Template::render(
        "gallery",
        GalleryContext {
            request,
            items,
            total_count,
            navigation: paginator.navigation(total_count),
            error_message,
        },
    )
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;

    use crate::test_helpers;

    #[rocket::async_test]
    async fn gallery_is_paginated() -> anyhow::Result<()> {
        let (client, store) = test_helpers::test_client().await?;
        for index in 0..25 {
            test_helpers::seed_image(&store, &format!("Picture {:02}", index)).await?;
        }

        let first = client
            .get("/gallery")
            .dispatch()
            .await
            .into_string()
            .await
            .unwrap_or_default();
        assert!(first.contains("Picture 24"));
        assert!(first.contains("Picture 05"));
        assert!(!first.contains("Picture 04"));
        assert!(first.contains("Page 1 of 2"));
        assert!(first.contains("href=\"/gallery?page=2\""));
        assert!(!first.contains("href=\"/gallery?page=0\""));

        let second = client
            .get("/gallery?page=2")
            .dispatch()
            .await
            .into_string()
            .await
            .unwrap_or_default();
        assert!(second.contains("Picture 04"));
        assert!(second.contains("Picture 00"));
        assert!(!second.contains("Picture 05"));
        assert!(second.contains("href=\"/gallery?page=1\""));

        Ok(())
    }

    #[rocket::async_test]
    async fn out_of_range_pages_are_empty() -> anyhow::Result<()> {
        let (client, store) = test_helpers::test_client().await?;
        test_helpers::seed_image(&store, "Only Picture").await?;

        let response = client.get("/gallery?page=7").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap_or_default();
        assert!(!body.contains("Only Picture"));
        assert!(body.contains("Page 7 of 1"));

        let garbage = client
            .get("/gallery?page=banana")
            .dispatch()
            .await
            .into_string()
            .await
            .unwrap_or_default();
        assert!(garbage.contains("Only Picture"));
        assert!(garbage.contains("Page 1 of 1"));

        Ok(())
    }
}
