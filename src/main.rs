//! sweep - command-line entry point.
//!
//! Scans the connected mailbox and prints the sender list. The user id
//! is taken from `SWEEP_USER`, and the OAuth client registration from
//! `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET`; tokens come from the OS
//! keychain.

use std::sync::Arc;

use anyhow::Context;
use sweep::config::Settings;
use sweep::domain::UserId;
use sweep::providers::mail::{GmailOauth, GmailProvider};
use sweep::services::ScanService;
use sweep::storage::{CredentialStore, KeychainCredentialStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting sweep");

    let settings = Settings::load().context("load settings")?;

    let user_id = UserId::from(
        std::env::var("SWEEP_USER").context("SWEEP_USER must name the connected user")?,
    );
    let oauth = GmailOauth {
        client_id: std::env::var("GOOGLE_CLIENT_ID").context("GOOGLE_CLIENT_ID not set")?,
        client_secret: std::env::var("GOOGLE_CLIENT_SECRET")
            .context("GOOGLE_CLIENT_SECRET not set")?,
    };

    let store = KeychainCredentialStore::new();
    let credentials = store
        .get(&user_id)
        .await
        .context("fetch mail credentials")?;

    let mut provider = GmailProvider::new(oauth, credentials);
    provider.authenticate().await.context("authenticate")?;
    // Persist back in case the access token was refreshed.
    store.put(&user_id, provider.credentials()).await?;

    let scanner = ScanService::new(Arc::new(provider), settings.scan);
    let senders = scanner.scan_senders().await.context("scan mailbox")?;

    for sender in &senders {
        println!(
            "{:>6}  {}  {}{}{}",
            sender.message_count,
            sender.email_address,
            sender.display_name,
            if sender.has_http { "  [http]" } else { "" },
            if sender.has_mailto { "  [mailto]" } else { "" },
        );
    }

    Ok(())
}
