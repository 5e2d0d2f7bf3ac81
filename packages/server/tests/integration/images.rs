use car_server::entity::car;
use car_server::storage::StorageContext;
use reqwest::multipart::{Form, Part};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;

use crate::common::{FileSlot, TestApp, routes, test_config};

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";
const JPG_BYTES: &[u8] = b"\xff\xd8\xff\xe0fake-jpeg-body";

#[tokio::test]
async fn uploaded_image_is_served_back() {
    let app = TestApp::spawn().await;

    let res = app
        .create_with_files(
            &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
            &[FileSlot {
                name: "front.png",
                bytes: PNG_BYTES,
            }],
        )
        .await;
    assert_eq!(res.status, 201, "Response: {}", res.text);

    let id = res.body[0]["id"].as_i64().unwrap();
    let url = res.body[0]["image_url"].as_str().expect("image_url set");
    assert_eq!(url, format!("/images/car_{id}.png"));
    assert!(app.image_dir().join(format!("car_{id}.png")).exists());

    let served = app.get(url).await;
    assert_eq!(served.status, 200);
    assert_eq!(served.bytes, PNG_BYTES);

    // Nothing but finished images is exposed under the served directory.
    let entries: Vec<_> = std::fs::read_dir(app.image_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(entries, vec![format!("car_{id}.png")]);

    let fetched = app.get(&routes::car(id)).await;
    assert_eq!(fetched.body["image_url"], url);
}

#[tokio::test]
async fn files_pair_with_cars_by_position() {
    let app = TestApp::spawn().await;

    let res = app
        .create_with_files(
            &json!([
                { "make": "Toyota", "model": "Corolla", "year": 2020 },
                { "make": "Honda", "model": "Civic", "year": 2018 },
                { "make": "Ford", "model": "Focus", "year": 2015 },
            ]),
            &[
                FileSlot {
                    name: "a.png",
                    bytes: PNG_BYTES,
                },
                FileSlot {
                    name: "",
                    bytes: b"",
                },
                FileSlot {
                    name: "c.jpg",
                    bytes: JPG_BYTES,
                },
            ],
        )
        .await;
    assert_eq!(res.status, 201, "Response: {}", res.text);

    let cars = res.body.as_array().unwrap();
    assert_eq!(cars.len(), 3);
    let first = cars[0]["id"].as_i64().unwrap();
    let third = cars[2]["id"].as_i64().unwrap();
    assert_eq!(cars[0]["image_url"], format!("/images/car_{first}.png"));
    assert!(cars[1]["image_url"].is_null());
    assert_eq!(cars[2]["image_url"], format!("/images/car_{third}.jpg"));
}

#[tokio::test]
async fn file_count_mismatch_writes_nothing() {
    let app = TestApp::spawn().await;

    let res = app
        .create_with_files(
            &json!([
                { "make": "Toyota", "model": "Corolla", "year": 2020 },
                { "make": "Honda", "model": "Civic", "year": 2018 },
            ]),
            &[FileSlot {
                name: "a.png",
                bytes: PNG_BYTES,
            }],
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert_eq!(app.car_count().await, 0);
}

#[tokio::test]
async fn update_replaces_previous_image() {
    let app = TestApp::spawn().await;

    let res = app
        .create_with_files(
            &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
            &[FileSlot {
                name: "front.png",
                bytes: PNG_BYTES,
            }],
        )
        .await;
    assert_eq!(res.status, 201, "Response: {}", res.text);
    let id = res.body[0]["id"].as_i64().unwrap();
    let old_path = app.image_dir().join(format!("car_{id}.png"));
    assert!(old_path.exists());

    let form = Form::new().text("model", "Camry").part(
        "file",
        Part::bytes(JPG_BYTES.to_vec()).file_name("side.jpg"),
    );
    let updated = app.put_form(&routes::car(id), form).await;
    assert_eq!(updated.status, 200, "Response: {}", updated.text);
    assert_eq!(updated.body["model"], "Camry");
    assert_eq!(updated.body["image_url"], format!("/images/car_{id}.jpg"));

    assert!(!old_path.exists());
    let new_path = app.image_dir().join(format!("car_{id}.jpg"));
    assert_eq!(std::fs::read(new_path).unwrap(), JPG_BYTES);
}

#[tokio::test]
async fn update_without_file_keeps_image() {
    let app = TestApp::spawn().await;

    let res = app
        .create_with_files(
            &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
            &[FileSlot {
                name: "front.png",
                bytes: PNG_BYTES,
            }],
        )
        .await;
    let id = res.body[0]["id"].as_i64().unwrap();

    let updated = app.put_json(&routes::car(id), &json!({ "year": 2024 })).await;
    assert_eq!(updated.status, 200);
    assert_eq!(updated.body["image_url"], format!("/images/car_{id}.png"));
    assert!(app.image_dir().join(format!("car_{id}.png")).exists());
}

#[tokio::test]
async fn delete_removes_image_file() {
    let app = TestApp::spawn().await;

    let res = app
        .create_with_files(
            &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
            &[FileSlot {
                name: "front.png",
                bytes: PNG_BYTES,
            }],
        )
        .await;
    let id = res.body[0]["id"].as_i64().unwrap();
    let path = app.image_dir().join(format!("car_{id}.png"));
    assert!(path.exists());

    let deleted = app.delete(&routes::car(id)).await;
    assert_eq!(deleted.status, 200);
    assert!(!path.exists());
    assert_eq!(app.get(&routes::car(id)).await.status, 404);
}

#[tokio::test]
async fn delete_succeeds_when_image_already_gone() {
    let app = TestApp::spawn().await;

    let res = app
        .create_with_files(
            &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
            &[FileSlot {
                name: "front.png",
                bytes: PNG_BYTES,
            }],
        )
        .await;
    let id = res.body[0]["id"].as_i64().unwrap();
    std::fs::remove_file(app.image_dir().join(format!("car_{id}.png"))).unwrap();

    let deleted = app.delete(&routes::car(id)).await;
    assert_eq!(deleted.status, 200);
    assert_eq!(app.car_count().await, 0);
}

#[tokio::test]
async fn unsafe_filename_is_absorbed() {
    let app = TestApp::spawn().await;

    let res = app
        .create_with_files(
            &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
            &[FileSlot {
                name: "../../etc/passwd",
                bytes: PNG_BYTES,
            }],
        )
        .await;

    assert_eq!(res.status, 201, "Response: {}", res.text);
    assert!(res.body[0]["image_url"].is_null());
    assert_eq!(app.car_count().await, 1);
}

/// Create one car with `front.png` attached and return its id.
async fn create_with_png(app: &TestApp) -> i64 {
    let res = app
        .create_with_files(
            &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
            &[FileSlot {
                name: "front.png",
                bytes: PNG_BYTES,
            }],
        )
        .await;
    assert_eq!(res.status, 201, "Response: {}", res.text);
    res.body[0]["id"].as_i64().unwrap()
}

/// Overwrite the stored image key of a row directly in the database.
async fn set_image_key(app: &TestApp, id: i64, key: Option<&str>) {
    let row = car::Entity::find_by_id(id as i32)
        .one(&app.storage.db)
        .await
        .expect("query car")
        .expect("car exists");
    let mut active: car::ActiveModel = row.into();
    active.image_key = Set(key.map(str::to_string));
    active.update(&app.storage.db).await.expect("update car");
}

mod rows_without_key {
    use super::*;

    #[tokio::test]
    async fn delete_derives_key_from_reference() {
        let app = TestApp::spawn().await;
        let id = create_with_png(&app).await;
        set_image_key(&app, id, None).await;
        let path = app.image_dir().join(format!("car_{id}.png"));
        assert!(path.exists());

        let res = app.delete(&routes::car(id)).await;
        assert_eq!(res.status, 200, "Response: {}", res.text);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn update_derives_key_from_reference() {
        let app = TestApp::spawn().await;
        let id = create_with_png(&app).await;
        set_image_key(&app, id, None).await;
        let old_path = app.image_dir().join(format!("car_{id}.png"));

        let form = Form::new().part(
            "file",
            Part::bytes(JPG_BYTES.to_vec()).file_name("side.jpg"),
        );
        let res = app.put_form(&routes::car(id), form).await;
        assert_eq!(res.status, 200, "Response: {}", res.text);
        assert_eq!(res.body["image_url"], format!("/images/car_{id}.jpg"));

        assert!(!old_path.exists());
        assert!(app.image_dir().join(format!("car_{id}.jpg")).exists());
    }
}

mod url_prefix {
    use super::*;

    #[tokio::test]
    async fn custom_prefix_serves_images() {
        let app = TestApp::spawn_with(|images| images.local.url_prefix = "/static/cars/".into()).await;
        let id = create_with_png(&app).await;

        let fetched = app.get(&routes::car(id)).await;
        let url = fetched.body["image_url"].as_str().unwrap().to_string();
        assert_eq!(url, format!("/static/cars/car_{id}.png"));

        let served = app.get(&url).await;
        assert_eq!(served.status, 200);
        assert_eq!(served.bytes, PNG_BYTES);
    }

    #[tokio::test]
    async fn unusable_prefix_fails_startup() {
        for prefix in ["/", "", "images"] {
            let dir = tempfile::tempdir().unwrap();
            let mut config = test_config(dir.path());
            config.images.local.url_prefix = prefix.into();

            let result = StorageContext::init(&config).await;
            assert!(result.is_err(), "started with url_prefix {prefix:?}");
        }
    }
}

mod failure_policy {
    use super::*;

    #[tokio::test]
    async fn store_failure_is_absorbed_by_default() {
        let app = TestApp::spawn_with(|images| images.local.max_size = 4).await;

        let res = app
            .create_with_files(
                &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
                &[FileSlot {
                    name: "front.png",
                    bytes: PNG_BYTES,
                }],
            )
            .await;

        assert_eq!(res.status, 201, "Response: {}", res.text);
        assert!(res.body[0]["image_url"].is_null());
        assert_eq!(app.car_count().await, 1);
    }

    #[tokio::test]
    async fn store_failure_is_reported_when_configured() {
        let app = TestApp::spawn_with(|images| {
            images.local.max_size = 4;
            images.fail_on_error = true;
        })
        .await;

        let res = app
            .create_with_files(
                &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
                &[FileSlot {
                    name: "front.png",
                    bytes: PNG_BYTES,
                }],
            )
            .await;

        assert_eq!(res.status, 502, "Response: {}", res.text);
        assert_eq!(res.body["code"], "STORAGE_FAILURE");

        // The row was committed before the upload was attempted.
        let list = app.get(routes::CARS).await;
        assert_eq!(list.body.as_array().unwrap().len(), 1);
        assert!(list.body[0]["image_url"].is_null());
    }

    #[tokio::test]
    async fn failed_replacement_clears_image() {
        let app = TestApp::spawn_with(|images| images.local.max_size = 32).await;

        let res = app
            .create_with_files(
                &json!([{ "make": "Toyota", "model": "Corolla", "year": 2020 }]),
                &[FileSlot {
                    name: "front.png",
                    bytes: PNG_BYTES,
                }],
            )
            .await;
        let id = res.body[0]["id"].as_i64().unwrap();
        assert!(res.body[0]["image_url"].is_string());

        let oversized = vec![0u8; 64];
        let form = Form::new().part("file", Part::bytes(oversized).file_name("big.jpg"));
        let updated = app.put_form(&routes::car(id), form).await;

        assert_eq!(updated.status, 200, "Response: {}", updated.text);
        assert!(updated.body["image_url"].is_null());
        assert!(!app.image_dir().join(format!("car_{id}.png")).exists());
    }

    #[tokio::test]
    async fn failed_replacement_keeps_undeleted_image() {
        let app = TestApp::spawn_with(|images| images.local.max_size = 32).await;
        let id = create_with_png(&app).await;
        // A key the store refuses, so removing the old image fails.
        set_image_key(&app, id, Some("../car.png")).await;

        let oversized = vec![0u8; 64];
        let form = Form::new().part("file", Part::bytes(oversized).file_name("big.jpg"));
        let updated = app.put_form(&routes::car(id), form).await;

        assert_eq!(updated.status, 200, "Response: {}", updated.text);
        assert_eq!(updated.body["image_url"], format!("/images/car_{id}.png"));
        assert!(app.image_dir().join(format!("car_{id}.png")).exists());

        let stored = app.get(&routes::car(id)).await;
        assert_eq!(stored.body["image_url"], format!("/images/car_{id}.png"));
    }
}
