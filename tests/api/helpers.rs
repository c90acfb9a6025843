use std::net::TcpListener;
use std::time::Duration;

use reqwest::{redirect, Client, Method, Response};

use sqlx::PgPool;

use secrecy::Secret;

use serde_json::Value;

use url::Url;

use uuid::Uuid;

use wiremock::MockServer;

use blog_newsletter::app::{self, AppContext};
use blog_newsletter::client::EmailClient;
use blog_newsletter::controller::newsletters::SendConcurrency;
use blog_newsletter::crypto::{SigningKey, VerificationTokens};
use blog_newsletter::domain::{PublicUrl, SiteUrl};
use blog_newsletter::model::{Blog, BlogDraft};
use blog_newsletter::repo::{BlogRepo, NewUser, SubscriberRepo, UsersRepo};

pub const SITE_URL: &str = "http://site.test";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub struct TestApp {
    addr: String,

    pub pool: PgPool,
    pub client: Client,
    pub email_server: MockServer,
}

impl TestApp {
    pub async fn spawn(pool: &PgPool) -> Self {
        Self::spawn_with_tokens(pool, VerificationTokens::Plain).await
    }

    /// Spawn an instance issuing signed verification tokens
    pub async fn spawn_signed(pool: &PgPool) -> Self {
        use rand::{distributions::Alphanumeric, Rng};

        let rand_key: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let key = SigningKey::new(&Secret::new(rand_key)).expect("Failed to create signing key");

        Self::spawn_with_tokens(pool, VerificationTokens::signed(key, None)).await
    }

    pub async fn spawn_with_tokens(pool: &PgPool, tokens: VerificationTokens) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to listen on random port");
        let port = listener.local_addr().unwrap().port();

        let addr = format!("http://127.0.0.1:{}", port);

        let email_server = MockServer::start().await;

        let email_client = {
            let sender = "newsletter@test.com"
                .parse()
                .expect("Failed to parse sender email address");
            let api_base_url =
                Url::parse(&email_server.uri()).expect("Failed to parse mock server uri");
            let api_auth_token = Secret::new("TestAuthorization".into());
            let api_timeout = Duration::from_secs(2);

            EmailClient::new(
                sender,
                Some("Test Blog"),
                api_timeout,
                api_base_url,
                api_auth_token,
            )
            .expect("Failed to create email client")
        };

        let context = AppContext {
            email_client,
            tokens,
            public_url: PublicUrl::new(Url::parse(&addr).unwrap()),
            site_url: SiteUrl::new(Url::parse(SITE_URL).unwrap()),
            send_concurrency: SendConcurrency(3),
        };

        let server =
            app::run(listener, pool.clone(), context).expect("Failed to spawn app instance");
        let _ = tokio::spawn(server);

        // Verification responses are redirects that tests inspect directly
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to build test client");

        Self {
            addr,
            pool: pool.clone(),
            client,
            email_server,
        }
    }

    pub fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", &self.addr, url);
        self.client.request(method, url)
    }

    pub fn authorized_request(
        &self,
        method: Method,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> reqwest::RequestBuilder {
        let req = self.request(method, url);
        if let Some(creds) = credentials {
            req.basic_auth(creds.username.clone(), Some(creds.password.clone()))
        } else {
            req
        }
    }

    pub async fn health_check(&self) -> reqwest::Result<Response> {
        self.request(Method::GET, "health_check").send().await
    }

    pub async fn subscribe(&self, body: &Value) -> reqwest::Result<Response> {
        self.request(Method::POST, "subscriptions")
            .json(body)
            .send()
            .await
    }

    pub async fn subscribe_email(&self, email: &str) -> reqwest::Result<Response> {
        self.subscribe(&serde_json::json!({ "email": email })).await
    }

    pub async fn verify(&self, token: Option<&str>) -> reqwest::Result<Response> {
        let req = self.request(Method::GET, "subscriptions/verify");
        let req = match token {
            Some(token) => req.query(&[("token", token)]),
            None => req,
        };
        req.send().await
    }

    pub async fn send_newsletter(&self, body: &Value) -> reqwest::Result<Response> {
        self.request(Method::POST, "newsletters/send")
            .json(body)
            .send()
            .await
    }

    /// Latest captured email request, as JSON
    pub async fn last_email(&self) -> Value {
        let requests = self
            .email_server
            .received_requests()
            .await
            .expect("Request recording is disabled");
        let last = requests.last().expect("No email was sent");

        serde_json::from_slice(&last.body).expect("Email body is not JSON")
    }

    /// Verification link from the latest confirmation email
    pub async fn last_verification_link(&self) -> Url {
        let email = self.last_email().await;

        let html_link = extract_link(email["html"].as_str().unwrap());
        let text_link = extract_link(email["text"].as_str().unwrap());
        assert_eq!(html_link, text_link);

        Url::parse(&text_link).expect("Failed to parse verification link")
    }

    pub async fn seed_subscriber(&self, email: &str, confirmed: bool) -> Uuid {
        let id = SubscriberRepo::insert(&self.pool, &email.parse().unwrap())
            .await
            .expect("Failed to seed subscriber");
        if confirmed {
            SubscriberRepo::confirm_by_id(&self.pool, id)
                .await
                .expect("Failed to confirm seeded subscriber");
        }
        id
    }

    pub async fn seed_blog(&self, title: &str) -> Blog {
        let draft = BlogDraft {
            title: title.into(),
            excerpt: format!("Excerpt of {}", title),
            content: "Some words about the post".into(),
            cover_image: "https://images.test/cover.png".into(),
            author_name: "Test Author".into(),
            author_avatar: None,
            tags: vec!["rust".into()],
            featured: false,
        };
        BlogRepo::insert(&self.pool, &draft)
            .await
            .expect("Failed to seed blog")
    }

    pub async fn log_count(&self) -> i64 {
        sqlx::query_scalar("select count(*) from newsletter_logs")
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count newsletter logs")
    }
}

/// Pull the single link out of an email body
pub fn extract_link(body: &str) -> String {
    let links: Vec<_> = linkify::LinkFinder::new()
        .links(body)
        .filter(|l| *l.kind() == linkify::LinkKind::Url)
        .filter(|l| l.as_str().contains("/subscriptions/verify"))
        .collect();
    assert_eq!(1, links.len(), "Expected one verification link in {}", body);

    links[0].as_str().to_owned()
}

/// `Location` header of a redirect response
pub fn location(res: &Response) -> &str {
    res.headers()
        .get(reqwest::header::LOCATION)
        .expect("Missing Location header")
        .to_str()
        .expect("Location header is not text")
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

impl TestUser {
    pub async fn register(pool: &PgPool, email: &str, password: &str) -> Self {
        use argon2::password_hash::SaltString;
        use argon2::{Argon2, PasswordHasher};

        let salt = SaltString::generate(&mut rand::thread_rng());

        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .expect("Failed to hash user password")
            .to_string();

        let new_user = NewUser {
            email: email.parse().expect("Failed to parse email address"),
            password_hash,
        };

        let id = UsersRepo::insert(pool, &new_user)
            .await
            .expect("Failed to insert test user");

        Self {
            id,
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    pub async fn admin(pool: &PgPool) -> Self {
        Self::register(pool, "admin@test.com", "correct horse battery staple").await
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.email.clone(),
            password: self.password.clone(),
        }
    }
}
