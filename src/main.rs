use callcard::application::{CallCardService, CallListPublisher, CoordinatorDeps, InCallNotifier};
use callcard::config::Config;
use callcard::domain::account::PhoneAccount;
use callcard::domain::call::{Call, CallState};
use callcard::domain::shared::clock::SystemClock;
use callcard::domain::shared::value_objects::{CallId, Handle, Icon, PhoneAccountHandle, Photo};
use callcard::infrastructure::{
    CallListTelecomAdapter, ContactInfoCache, ContactRecord, InMemoryContactDirectory,
    StaticAccountProvider,
};
use callcard::interface::call_card::RecordingCallCardUi;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "callcard")]
#[command(about = "In-call screen coordinator demo")]
struct Args {
    /// Path to TOML config file; CALLCARD__* environment variables override it
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting call card coordinator");
    info!("Configuration loaded: {:?}", config);

    demo_call_card(&config).await?;

    info!("Call card coordinator stopped");
    Ok(())
}

/// Drive a running call card through a typical two-call session
async fn demo_call_card(config: &Config) -> anyhow::Result<()> {
    info!("=== Call Card Demo ===");

    let sim = PhoneAccountHandle::new("telephony", "sim1");
    let accounts = StaticAccountProvider::new(&config.telephony).with_account(
        PhoneAccount::new(sim.clone())
            .with_label("SIM 1")
            .with_icon(Icon::new("ic_sim_1"))
            .with_subscription_number("6505550000"),
    );

    let directory = InMemoryContactDirectory::new()
        .with_contact(
            "6505551234",
            ContactRecord {
                name: Some("Alice".to_string()),
                label: Some("Mobile".to_string()),
                photo_uri: Some("photo://alice".to_string()),
                contact_uri: Some("contact://alice".to_string()),
                ..Default::default()
            },
        )
        .with_contact(
            "6505555678",
            ContactRecord {
                name: Some("Bob".to_string()),
                label: Some("Work".to_string()),
                ..Default::default()
            },
        )
        .with_photo("photo://alice", Photo::new("photo://alice", vec![0u8; 16]))
        .with_latency(Duration::from_millis(50));

    let notifier = InCallNotifier::new(config.coordinator.event_buffer);
    let publisher = Arc::new(CallListPublisher::new(notifier.clone()));

    let deps = CoordinatorDeps {
        registry: publisher.calls(),
        resolver: Arc::new(ContactInfoCache::new(Arc::new(directory), &config.contacts)),
        accounts: Arc::new(accounts),
        clock: Arc::new(SystemClock),
    };
    let telecom = Arc::new(CallListTelecomAdapter::new(publisher.clone()));
    let (handle, service) = CallCardService::spawn(deps, telecom, notifier, &config.coordinator);

    let ui = Arc::new(RecordingCallCardUi::new());
    handle.init(None).await?;
    handle.ui_ready(ui.clone()).await?;
    // Make sure the subscription is live before publishing
    handle.snapshot().await?;

    // Alice calls in
    let alice = Call::new(CallId::new(), CallState::Incoming)
        .with_handle(Handle::tel("6505551234"))
        .with_account_handle(sim.clone());
    publisher.update_call(alice.clone())?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    info!("Ringing: {:?}", ui.primaries().last());

    // Answer
    let alice = alice
        .with_state(CallState::Active)
        .with_connect_time(Utc::now());
    publisher.update_call(alice.clone())?;
    tokio::time::sleep(config.coordinator.tick_interval() * 2).await;
    info!("Elapsed: {:?}", ui.elapsed_times().last());

    // Hold Alice and dial Bob
    publisher.update_call(alice.clone().with_state(CallState::Background))?;
    let bob = Call::new(CallId::new(), CallState::Outgoing)
        .with_handle(Handle::tel("6505555678"))
        .with_account_handle(sim);
    publisher.update_call(bob.clone())?;
    publisher.update_call(bob.with_state(CallState::Active).with_connect_time(Utc::now()))?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    info!("Secondary: {:?}", ui.secondaries().last());

    // Swap back to Alice, then hang up on her
    handle.secondary_info_clicked().await?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.end_call_clicked().await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let snapshot = handle.snapshot().await?;
    info!(
        "Card now shows primary {:?}, secondary {:?}",
        snapshot.primary, snapshot.secondary
    );
    info!("Call state: {:?}", ui.last_call_state());
    info!("Display pushes: {}", ui.commands().len());

    handle.ui_unready().await?;
    drop(handle);
    service.await?;

    info!("=== Call Card Demo Complete ===");
    Ok(())
}
