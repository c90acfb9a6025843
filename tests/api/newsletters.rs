use reqwest::{Method, StatusCode};

use serde_json::{json, Value};

use sqlx::PgPool;

use uuid::Uuid;

use wiremock::matchers::*;
use wiremock::{Mock, ResponseTemplate};

use blog_newsletter::model::SendStatus;
use blog_newsletter::repo::NewsletterLogRepo;

use crate::helpers::{TestApp, TestUser};

async fn dispatch(app: &TestApp, blog_id: impl ToString) -> (StatusCode, Value) {
    let res = app
        .send_newsletter(&json!({ "blogId": blog_id.to_string() }))
        .await
        .expect("Failed to send dispatch request");
    let status = res.status();
    (status, res.json().await.unwrap())
}

fn log_id(body: &Value) -> Uuid {
    body["logId"]
        .as_str()
        .expect("Missing log id")
        .parse()
        .expect("Log id is not a UUID")
}

#[sqlx::test]
async fn blog_id_is_required(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;

    for body in [json!({}), json!({ "blogId": "" }), json!({ "blogId": "  " })] {
        let res = app.send_newsletter(&body).await.unwrap();

        assert_eq!(StatusCode::BAD_REQUEST, res.status(), "{}", body);
        let body: Value = res.json().await.unwrap();
        assert_eq!(json!({ "error": "Blog ID is required" }), body);
    }

    Ok(())
}

#[sqlx::test]
async fn unknown_blog_is_not_found(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    app.seed_subscriber("reader@test.com", true).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    for blog_id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let (status, body) = dispatch(&app, &blog_id).await;

        assert_eq!(StatusCode::NOT_FOUND, status, "{}", blog_id);
        assert_eq!(json!({ "error": "Blog not found" }), body);
    }
    assert_eq!(0, app.log_count().await);

    Ok(())
}

#[sqlx::test]
async fn no_confirmed_subscribers_sends_nothing_and_logs_nothing(
    pool: PgPool,
) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let blog = app.seed_blog("Quiet post").await;
    app.seed_subscriber("pending@test.com", false).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let (status, body) = dispatch(&app, blog.id).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!(
        json!({ "success": true, "message": "No confirmed subscribers found" }),
        body
    );
    assert_eq!(0, app.log_count().await);

    Ok(())
}

#[sqlx::test]
async fn partial_failure_still_completes(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let blog = app.seed_blog("Partial post").await;
    for email in ["a@test.com", "b@test.com", "broken@test.com"] {
        app.seed_subscriber(email, true).await;
    }

    Mock::given(path("/emails"))
        .and(body_partial_json(json!({ "to": ["broken@test.com"] })))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .expect(1)
        .mount(&app.email_server)
        .await;
    Mock::given(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let (status, body) = dispatch(&app, blog.id).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!(true, body["success"]);
    assert_eq!("Newsletter sent to 2 of 3 subscribers", body["message"]);
    assert_eq!(3, body["totalSubscribers"]);
    assert_eq!(2, body["successfulSends"]);

    let log = NewsletterLogRepo::fetch_by_id(&pool, log_id(&body))
        .await?
        .expect("Missing newsletter log");
    assert_eq!(SendStatus::Completed, log.status);
    assert_eq!(2, log.recipients_count);
    assert_eq!("New Post: Partial post", log.subject);
    assert_eq!(Some(blog.id), log.blog_id);

    Ok(())
}

#[sqlx::test]
async fn total_failure_is_recorded_as_failed(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let blog = app.seed_blog("Unlucky post").await;
    app.seed_subscriber("a@test.com", true).await;
    app.seed_subscriber("b@test.com", true).await;
    Mock::given(path("/emails"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let (status, body) = dispatch(&app, blog.id).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!(false, body["success"]);
    assert_eq!("Newsletter sent to 0 of 2 subscribers", body["message"]);

    let log = NewsletterLogRepo::fetch_by_id(&pool, log_id(&body))
        .await?
        .unwrap();
    assert_eq!(SendStatus::Failed, log.status);
    assert_eq!(0, log.recipients_count);

    Ok(())
}

#[sqlx::test]
async fn unconfirmed_subscribers_are_skipped(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let blog = app.seed_blog("Selective post").await;
    app.seed_subscriber("confirmed@test.com", true).await;
    app.seed_subscriber("pending@test.com", false).await;
    Mock::given(path("/emails"))
        .and(body_partial_json(json!({ "to": ["confirmed@test.com"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let (status, body) = dispatch(&app, blog.id).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!(1, body["totalSubscribers"]);
    assert_eq!(1, body["successfulSends"]);

    Ok(())
}

#[sqlx::test]
async fn announcement_links_to_the_post(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let blog = app.seed_blog("Linked post").await;
    app.seed_subscriber("reader@test.com", true).await;
    Mock::given(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    dispatch(&app, blog.id).await;

    let email = app.last_email().await;
    let post_url = format!("http://site.test/blog/{}", blog.id);
    assert_eq!("New Post: Linked post", email["subject"]);
    assert_eq!("Test Blog <newsletter@test.com>", email["from"]);
    assert!(email["html"].as_str().unwrap().contains(&post_url));
    assert!(email["text"].as_str().unwrap().contains(&post_url));

    Ok(())
}

#[sqlx::test]
async fn subscribe_confirm_publish_dispatch(pool: PgPool) -> sqlx::Result<()> {
    let app = TestApp::spawn(&pool).await;
    let admin = TestUser::admin(&pool).await;

    // Two opt-ins, only the first one confirms
    {
        let _confirmation_mock = Mock::given(path("/emails"))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount_as_scoped(&app.email_server)
            .await;

        app.subscribe_email("a@x.com").await.unwrap();
        let link = app.last_verification_link().await;
        app.subscribe_email("b@x.com").await.unwrap();

        let res = app.client.get(link).send().await.unwrap();
        assert_eq!(StatusCode::FOUND, res.status());
    }

    let res = app
        .authorized_request(Method::POST, "admin/blogs", Some(&admin.credentials()))
        .json(&json!({
            "title": "Hello World",
            "excerpt": "A first post",
            "content": "Hello there",
            "coverImage": "",
            "authorName": "Admin",
            "tags": ["intro"],
            "featured": true,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(StatusCode::CREATED, res.status());
    let blog: Value = res.json().await.unwrap();

    Mock::given(path("/emails"))
        .and(body_partial_json(json!({ "to": ["a@x.com"] })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let (status, body) = dispatch(&app, blog["id"].as_str().unwrap()).await;

    assert_eq!(StatusCode::OK, status);
    assert_eq!(true, body["success"]);
    assert_eq!("Newsletter sent to 1 of 1 subscribers", body["message"]);

    let log = NewsletterLogRepo::fetch_by_id(&pool, log_id(&body))
        .await?
        .unwrap();
    assert_eq!(SendStatus::Completed, log.status);
    assert_eq!(1, log.recipients_count);
    assert_eq!("New Post: Hello World", log.subject);

    Ok(())
}
