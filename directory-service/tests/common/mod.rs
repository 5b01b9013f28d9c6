#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use auth::Authenticator;
use auth::ManualClock;
use auth::TokenIssuer;
use auth::TokenSettings;
use directory_service::contact::service::ContactService;
use directory_service::contact::service::ContactSettings;
use directory_service::credential::service::CredentialService;
use directory_service::credential::service::CredentialSettings;
use directory_service::domain::notification::errors::EmailError;
use directory_service::domain::notification::ports::EmailSender;
use directory_service::domain::notification::service::EmailNotificationHandler;
use directory_service::inbound::http::router::create_router;
use directory_service::outbound::cache::MokaCacheStore;
use directory_service::outbound::events::consumer::ConsumerSettings;
use directory_service::outbound::events::consumer::HandlerFailurePolicy;
use directory_service::outbound::events::consumer::HandlerPolicy;
use directory_service::outbound::events::consumer::ReconnectPolicy;
use directory_service::outbound::events::EventConsumer;
use directory_service::outbound::events::InMemoryBroker;
use directory_service::outbound::events::InMemoryConnector;
use directory_service::outbound::events::InMemoryEventPublisher;
use directory_service::outbound::events::Topology;
use directory_service::repositories::InMemoryContactRepository;
use directory_service::repositories::InMemoryUserRepository;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const JWT_SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const NOTIFICATION_RECIPIENT: &str = "ops@example.com";
pub const QUEUE: &str = "directory.notifications";
pub const ROUTING_KEY: &str = "directory";
pub const RESET_WINDOW_MINUTES: i64 = 15;

/// A mail captured by [`RecordingEmailSender`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mail sender that records instead of sending; can be told to fail.
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentMail>>,
    failing: Mutex<bool>,
}

impl RecordingEmailSender {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, to: &str) -> Vec<SentMail> {
        self.sent()
            .into_iter()
            .filter(|mail| mail.to == to)
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        if *self.failing.lock().unwrap() {
            return Err(EmailError::Transport("connection refused".to_string()));
        }

        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub fn topology() -> Topology {
    Topology {
        exchange: "directory.events".to_string(),
        queue: QUEUE.to_string(),
        routing_key: ROUTING_KEY.to_string(),
    }
}

pub fn consumer_settings(failure_policy: HandlerFailurePolicy) -> ConsumerSettings {
    ConsumerSettings {
        routing_key: ROUTING_KEY.to_string(),
        reconnect: ReconnectPolicy {
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(50),
            max_attempts: 20,
        },
        handler: HandlerPolicy {
            max_attempts: 2,
            retry_delay: Duration::from_millis(5),
            failure_policy,
        },
    }
}

/// Poll `condition` until it holds or a few seconds pass.
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Test application that spawns a real server on in-memory adapters
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<MokaCacheStore>,
    pub broker: Arc<InMemoryBroker>,
    pub mailer: Arc<RecordingEmailSender>,
    pub shutdown: CancellationToken,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let tokens = Arc::new(
            TokenIssuer::new(
                TokenSettings {
                    secret: JWT_SECRET.to_string(),
                    issuer: "directory-service".to_string(),
                    audience: "directory-clients".to_string(),
                    access_ttl: chrono::Duration::minutes(60),
                    reset_ttl: chrono::Duration::minutes(RESET_WINDOW_MINUTES),
                },
                clock.clone(),
            )
            .expect("Failed to create token issuer"),
        );
        let authenticator = Arc::new(Authenticator::new(Arc::clone(&tokens)));

        let cache = Arc::new(MokaCacheStore::new(1_000));
        let mailer = Arc::new(RecordingEmailSender::default());
        let broker = InMemoryBroker::new();
        let event_publisher = Arc::new(InMemoryEventPublisher::new(
            Arc::clone(&broker),
            topology(),
        ));

        let credential_service = Arc::new(CredentialService::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::clone(&event_publisher),
            Arc::clone(&cache),
            Arc::clone(&mailer),
            authenticator,
            CredentialSettings {
                reset_link_base: Url::parse(&format!("{}/api/auth/reset-password", address))
                    .unwrap(),
                routing_key: ROUTING_KEY.to_string(),
            },
        ));
        let contact_service = Arc::new(ContactService::new(
            Arc::new(InMemoryContactRepository::new()),
            Arc::clone(&cache),
            event_publisher,
            clock.clone(),
            ContactSettings {
                contacts_ttl: Duration::from_secs(600),
                routing_key: ROUTING_KEY.to_string(),
            },
        ));

        let consumer = EventConsumer::new(
            InMemoryConnector::new(Arc::clone(&broker), topology()),
            Arc::new(EmailNotificationHandler::new(
                Arc::clone(&mailer),
                NOTIFICATION_RECIPIENT,
            )),
            consumer_settings(HandlerFailurePolicy::DeadLetter),
        );
        let consumer_health = consumer.health();
        let shutdown = CancellationToken::new();
        tokio::spawn(consumer.start_consuming(shutdown.clone()));

        let router = create_router(credential_service, contact_service, tokens, consumer_health)
            .expect("Failed to build router");

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            api_client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .expect("Failed to create reqwest client"),
            clock,
            cache,
            broker,
            mailer,
            shutdown,
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    /// Helper to make POST request with Bearer token
    pub fn post_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.post(path).bearer_auth(token)
    }

    /// Helper to make PUT request with Bearer token
    pub fn put_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .put(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Helper to make DELETE request with Bearer token
    pub fn delete_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.api_client
            .delete(&format!("{}{}", self.address, path))
            .bearer_auth(token)
    }

    /// Register an account, panicking on failure.
    pub async fn register(&self, full_name: &str, email: &str, password: &str) {
        let response = self
            .post("/api/auth/register")
            .json(&serde_json::json!({
                "full_name": full_name,
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    }

    /// Log in and return the access token, panicking on failure.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let response = self
            .post("/api/auth/login")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status(), reqwest::StatusCode::OK);

        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        body["data"]["token"]
            .as_str()
            .expect("Missing token")
            .to_string()
    }

    /// Register and log in a fresh account.
    pub async fn signed_in_user(&self) -> String {
        self.register("Alice Smith", "alice@example.com", "Secret123!")
            .await;
        self.login("alice@example.com", "Secret123!").await
    }

    /// Reset token from the latest reset mail sent to `email`.
    pub fn reset_token_for(&self, email: &str) -> String {
        let mail = self
            .mailer
            .sent_to(email)
            .into_iter()
            .last()
            .expect("No reset mail sent");
        let link = mail
            .body
            .split_whitespace()
            .last()
            .expect("Reset mail has no link");

        Url::parse(link)
            .expect("Invalid reset link")
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .expect("Reset link has no token")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
