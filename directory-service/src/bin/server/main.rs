use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::Clock;
use auth::DefaultClock;
use auth::TokenIssuer;
use auth::TokenSettings;
use directory_service::config::BrokerBackend;
use directory_service::config::CacheBackend;
use directory_service::config::Config;
use directory_service::config::StorageBackend;
use directory_service::contact::ports::ContactRepository;
use directory_service::contact::ports::ContactServicePort;
use directory_service::contact::service::ContactService;
use directory_service::contact::service::ContactSettings;
use directory_service::credential::ports::CredentialServicePort;
use directory_service::credential::ports::UserRepository;
use directory_service::credential::service::CredentialService;
use directory_service::credential::service::CredentialSettings;
use directory_service::domain::cache::CacheStore;
use directory_service::domain::events::ports::EventPublisher;
use directory_service::domain::notification::ports::EmailSender;
use directory_service::domain::notification::service::EmailNotificationHandler;
use directory_service::inbound::http::router::create_router;
use directory_service::outbound::cache::MokaCacheStore;
use directory_service::outbound::cache::RedisCacheStore;
use directory_service::outbound::email::SmtpEmailSender;
use directory_service::outbound::events::consumer::ConsumerError;
use directory_service::outbound::events::consumer::ConsumerSettings;
use directory_service::outbound::events::ConsumerHealth;
use directory_service::outbound::events::EventConsumer;
use directory_service::outbound::events::InMemoryBroker;
use directory_service::outbound::events::InMemoryConnector;
use directory_service::outbound::events::InMemoryEventPublisher;
use directory_service::outbound::events::KafkaConnector;
use directory_service::outbound::events::KafkaEventPublisher;
use directory_service::outbound::events::Topology;
use directory_service::repositories::InMemoryContactRepository;
use directory_service::repositories::InMemoryUserRepository;
use directory_service::repositories::PostgresContactRepository;
use directory_service::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

type ConsumerTask = JoinHandle<Result<(), ConsumerError>>;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "directory_service=debug,auth=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "directory-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        storage = ?config.storage.backend,
        cache = ?config.cache.backend,
        broker = ?config.broker.backend,
        exchange = %config.broker.exchange,
        queue = %config.broker.queue,
        "Configuration loaded"
    );

    // Refuses to start with a missing or weak signing secret
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let tokens = Arc::new(TokenIssuer::new(
        TokenSettings {
            secret: config.jwt.secret.clone(),
            issuer: config.jwt.issuer.clone(),
            audience: config.jwt.audience.clone(),
            access_ttl: chrono::Duration::minutes(config.jwt.access_expiration_minutes),
            reset_ttl: chrono::Duration::minutes(config.jwt.reset_expiration_minutes),
        },
        Arc::clone(&clock),
    )?);
    let authenticator = Arc::new(Authenticator::new(Arc::clone(&tokens)));

    let user_repository: Arc<dyn UserRepository>;
    let contact_repository: Arc<dyn ContactRepository>;
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
            contact_repository = Arc::new(PostgresContactRepository::new(pg_pool));
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            user_repository = Arc::new(InMemoryUserRepository::new());
            contact_repository = Arc::new(InMemoryContactRepository::new());
        }
    }

    let cache: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::Redis => {
            let store = RedisCacheStore::new(&config.cache.url).await?;
            tracing::info!(cache = "redis", "Cache connected");
            Arc::new(store)
        }
        CacheBackend::Memory => {
            tracing::info!(
                cache = "memory",
                max_entries = config.cache.max_entries,
                "Cache created"
            );
            Arc::new(MokaCacheStore::new(config.cache.max_entries))
        }
    };

    let mailer: Arc<dyn EmailSender> = Arc::new(SmtpEmailSender::new(&config.email)?);

    let shutdown = CancellationToken::new();
    let (event_publisher, consumer_health, consumer_task) =
        start_event_pipeline(&config, Arc::clone(&mailer), shutdown.clone())?;

    let credential_service: Arc<dyn CredentialServicePort> = Arc::new(CredentialService::new(
        user_repository,
        Arc::clone(&event_publisher),
        Arc::clone(&cache),
        Arc::clone(&mailer),
        authenticator,
        CredentialSettings {
            reset_link_base: Url::parse(&config.reset.link_base_url)?,
            routing_key: config.broker.routing_key.clone(),
        },
    ));
    let contact_service: Arc<dyn ContactServicePort> = Arc::new(ContactService::new(
        contact_repository,
        cache,
        event_publisher,
        clock,
        ContactSettings {
            contacts_ttl: config.cache.contacts_ttl(),
            routing_key: config.broker.routing_key.clone(),
        },
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application =
        create_router(credential_service, contact_service, tokens, consumer_health)?;

    let signal = shutdown.clone();
    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Failed to listen for shutdown signal");
                    }
                }
                _ = signal.cancelled() => {}
            }
            tracing::info!("Shutdown signal received");
        })
        .await?;

    shutdown.cancel();
    match consumer_task.await {
        Ok(Ok(())) => tracing::info!("Event consumer exited successfully"),
        Ok(Err(e)) => tracing::error!(error = %e, "Event consumer failed"),
        Err(e) => tracing::error!(error = %e, "Event consumer task panicked"),
    }

    Ok(())
}

/// Create the publisher for the configured broker and spawn the notification consumer.
fn start_event_pipeline(
    config: &Config,
    mailer: Arc<dyn EmailSender>,
    shutdown: CancellationToken,
) -> Result<
    (
        Arc<dyn EventPublisher>,
        watch::Receiver<ConsumerHealth>,
        ConsumerTask,
    ),
    anyhow::Error,
> {
    let topology = Topology::from_config(&config.broker);
    let settings = ConsumerSettings::from_config(&config.broker);
    let timeout = Duration::from_secs(config.broker.publish_timeout_secs);
    let handler = Arc::new(EmailNotificationHandler::new(
        mailer,
        config.email.notification_recipient.clone(),
    ));

    tracing::info!(
        consumer = "notifications",
        broker = ?config.broker.backend,
        "Starting event consumer"
    );

    match config.broker.backend {
        BrokerBackend::Kafka => {
            let publisher =
                KafkaEventPublisher::new(&config.broker.brokers, topology.clone(), timeout)?;
            let connector = KafkaConnector::new(&config.broker.brokers, topology, timeout);

            let consumer = EventConsumer::new(connector, handler, settings);
            let health = consumer.health();
            let task = tokio::spawn(consumer.start_consuming(shutdown));

            Ok((Arc::new(publisher), health, task))
        }
        BrokerBackend::Memory => {
            let broker = InMemoryBroker::new();
            let publisher = InMemoryEventPublisher::new(Arc::clone(&broker), topology.clone());
            let connector = InMemoryConnector::new(broker, topology);

            let consumer = EventConsumer::new(connector, handler, settings);
            let health = consumer.health();
            let task = tokio::spawn(consumer.start_consuming(shutdown));

            Ok((Arc::new(publisher), health, task))
        }
    }
}
