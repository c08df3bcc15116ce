use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgb};
use serde_json::json;

use crate::common::{MAX_UPLOAD_SIZE, TestApp, UploadFields, routes};

fn wide_png(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([30, 120, 200])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("Failed to encode test PNG");
    buf.into_inner()
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn stores_file_locally_and_serves_it() {
        let app = TestApp::spawn().await;
        let bytes = b"plain text attachment".to_vec();

        let res = app
            .upload("notes.txt", "text/plain", bytes.clone(), UploadFields::default())
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["original_filename"], "notes.txt");
        assert_eq!(res.body["file_type"], "other");
        assert_eq!(res.body["bucket_name"], "local");
        assert_eq!(res.body["size_bytes"], bytes.len() as i64);
        assert_eq!(res.body["original_size_bytes"], bytes.len() as i64);
        let key = res.body["file_path"].as_str().unwrap().to_string();
        assert!(key.starts_with("other/"));
        assert!(key.ends_with(".txt"));

        let served = app
            .client
            .get(app.url(&format!("/api/v1/storage/local/{key}")))
            .send()
            .await
            .expect("Failed to fetch stored object");
        assert_eq!(served.status().as_u16(), 200);
        assert_eq!(served.bytes().await.unwrap().to_vec(), bytes);
    }

    #[tokio::test]
    async fn html_is_served_as_download() {
        let app = TestApp::spawn().await;
        let res = app
            .upload(
                "page.html",
                "text/html",
                b"<script>alert(1)</script>".to_vec(),
                UploadFields::default(),
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        let key = res.body["file_path"].as_str().unwrap().to_string();
        let hash = res.body["content_hash"].as_str().unwrap().to_string();

        let served = app
            .client
            .get(app.url(&format!("/api/v1/storage/local/{key}")))
            .send()
            .await
            .expect("Failed to fetch stored object");
        assert_eq!(served.status().as_u16(), 200);
        let headers = served.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        let disposition = headers["content-disposition"].to_str().unwrap();
        assert!(disposition.starts_with("attachment;"), "{disposition}");
        assert!(disposition.contains("page.html"), "{disposition}");
        assert_eq!(headers["etag"].to_str().unwrap(), format!("\"{hash}\""));

        let cached = app
            .client
            .get(app.url(&format!("/api/v1/storage/local/{key}")))
            .header("if-none-match", format!("\"{hash}\""))
            .send()
            .await
            .expect("Failed to fetch stored object");
        assert_eq!(cached.status().as_u16(), 304);
    }

    #[tokio::test]
    async fn raster_images_are_served_inline() {
        let app = TestApp::spawn().await;
        let res = app
            .upload("dot.png", "image/png", wide_png(4, 4), UploadFields::default())
            .await;
        let key = res.body["file_path"].as_str().unwrap().to_string();

        let served = app
            .client
            .get(app.url(&format!("/api/v1/storage/local/{key}")))
            .send()
            .await
            .expect("Failed to fetch stored object");
        let headers = served.headers();
        assert_eq!(headers["content-type"], "image/png");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert!(headers["content-disposition"].to_str().unwrap().starts_with("inline;"));
    }

    #[tokio::test]
    async fn file_type_selects_folder_and_related_entity_is_kept() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                "cover.png",
                "image/png",
                wide_png(40, 20),
                UploadFields {
                    file_type: Some("blog_image"),
                    related_entity_id: Some(12),
                    compress: Some(false),
                },
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["file_type"], "blog_image");
        assert_eq!(res.body["related_entity_id"], 12);
        assert!(res.body["file_path"].as_str().unwrap().starts_with("blog_image/"));
    }

    #[tokio::test]
    async fn oversized_images_are_downscaled() {
        let app = TestApp::spawn().await;
        let original = wide_png(2400, 30);

        let res = app
            .upload("banner.png", "image/png", original.clone(), UploadFields::default())
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["original_size_bytes"], original.len() as i64);
        assert_eq!(res.body["content_type"], "image/png");

        let key = res.body["file_path"].as_str().unwrap();
        let stored = std::fs::read(app.storage_dir.path().join(key)).expect("stored file missing");
        let img = image::load_from_memory(&stored).expect("stored file is not an image");
        assert!(img.dimensions().0 <= 2000);
    }

    #[tokio::test]
    async fn compress_false_keeps_bytes() {
        let app = TestApp::spawn().await;
        let original = wide_png(2400, 30);

        let res = app
            .upload(
                "banner.png",
                "image/png",
                original.clone(),
                UploadFields {
                    compress: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["size_bytes"], original.len() as i64);
    }

    #[tokio::test]
    async fn rejects_oversized_upload() {
        let app = TestApp::spawn().await;
        let bytes = vec![b'a'; MAX_UPLOAD_SIZE as usize + 1];

        let res = app
            .upload("big.bin", "application/octet-stream", bytes, UploadFields::default())
            .await;
        assert_eq!(res.status, 413);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn rejects_empty_file_and_bad_fields() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("empty.txt", "text/plain", Vec::new(), UploadFields::default())
            .await;
        assert_eq!(res.status, 400);

        let res = app
            .upload(
                "x.txt",
                "text/plain",
                b"x".to_vec(),
                UploadFields {
                    file_type: Some("spreadsheet"),
                    ..Default::default()
                },
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn missing_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let form = reqwest::multipart::Form::new().text("file_type", "other");

        let res = app
            .client
            .post(app.url(routes::UPLOAD))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send upload");
        assert_eq!(res.status().as_u16(), 400);
    }
}

mod files {
    use super::*;

    #[tokio::test]
    async fn lists_with_filters() {
        let app = TestApp::spawn().await;
        app.upload("a.txt", "text/plain", b"a".to_vec(), UploadFields::default())
            .await;
        app.upload(
            "b.png",
            "image/png",
            wide_png(10, 10),
            UploadFields {
                file_type: Some("news_image"),
                ..Default::default()
            },
        )
        .await;

        let res = app.get(routes::FILES).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 2);

        let res = app
            .get(&format!("{}?file_type=news_image", routes::FILES))
            .await;
        assert_eq!(res.body["count"], 1);
        assert_eq!(res.body["files"][0]["original_filename"], "b.png");
    }

    #[tokio::test]
    async fn url_for_local_file() {
        let app = TestApp::spawn().await;
        let res = app
            .upload("doc.txt", "text/plain", b"doc".to_vec(), UploadFields::default())
            .await;
        let id = res.id();
        let public_url = res.body["public_url"].as_str().unwrap().to_string();

        let res = app.get(&routes::file_url(id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["url"], public_url.as_str());
        assert_eq!(res.body["expires_in"], 3600);

        let res = app.get(&format!("{}?expires_in=0", routes::file_url(id))).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn delete_removes_object_and_clears_references() {
        let app = TestApp::spawn().await;
        let res = app
            .upload("hero.png", "image/png", wide_png(10, 10), UploadFields::default())
            .await;
        let file = res.id();
        let key = res.body["file_path"].as_str().unwrap().to_string();

        let blog = app
            .post(
                routes::BLOGS,
                &json!({
                    "title": "Illustrated post",
                    "content": "x",
                    "featured_image_id": file,
                    "og_image_id": file,
                }),
            )
            .await;
        assert_eq!(blog.body["featured_image"]["id"], file);
        let blog = blog.id();

        assert_eq!(app.delete(&routes::file(file)).await.status, 204);
        assert_eq!(app.get(&routes::file(file)).await.status, 404);
        assert!(!app.storage_dir.path().join(&key).exists());

        let res = app.get(&routes::blog(blog)).await;
        assert!(res.body["featured_image_id"].is_null());
        assert!(res.body["og_image_id"].is_null());
    }

    #[tokio::test]
    async fn lists_backend_objects_by_prefix() {
        let app = TestApp::spawn().await;
        app.upload("one.txt", "text/plain", b"1".to_vec(), UploadFields::default())
            .await;
        app.upload(
            "two.png",
            "image/png",
            wide_png(8, 8),
            UploadFields {
                file_type: Some("blog_image"),
                ..Default::default()
            },
        )
        .await;

        let res = app.get(&format!("{}?prefix=other/", routes::OBJECTS)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["backend"], "local");
        assert_eq!(res.body["count"], 1);

        let res = app.get(routes::OBJECTS).await;
        assert_eq!(res.body["count"], 2);
    }

    #[tokio::test]
    async fn local_path_traversal_is_rejected() {
        let app = TestApp::spawn().await;
        let res = app.get("/api/v1/storage/local/..%2F..%2Fetc%2Fpasswd").await;
        assert!(res.status == 400 || res.status == 404, "got {}", res.status);
    }
}
