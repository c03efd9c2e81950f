use std::{sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    ChannelNavigator, HttpAuthGateway, LoginEvent, LoginFlow, SessionStore, SubmitOutcome,
};

mod config;

#[derive(Parser, Debug)]
struct Args {
    /// Overrides `api_base_url` from client.toml / APP__API_BASE_URL.
    #[arg(long)]
    api_base_url: Option<String>,
    #[arg(long, default_value = "")]
    email: String,
    #[arg(long, default_value = "")]
    password: String,
    /// Follow the sign-up link instead of logging in.
    #[arg(long)]
    register: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(api_base_url) = args.api_base_url {
        settings.api_base_url = api_base_url;
    }
    let client_config = settings.into_client_config()?;
    let timings = client_config.timings;
    let gateway =
        HttpAuthGateway::new(&client_config).context("failed to set up auth gateway")?;
    tracing::info!(url = %gateway.login_url(), "auth endpoint configured");

    let store = SessionStore::new();
    let (navigator, mut routes) = ChannelNavigator::channel();
    let flow = LoginFlow::new(
        Arc::new(gateway),
        Arc::clone(&store),
        Arc::new(navigator),
        timings,
    );

    if args.register {
        flow.open_registration();
        if let Some(route) = routes.recv().await {
            println!("Navigate to {route}");
        }
        return Ok(());
    }

    let mut events = flow.subscribe_events();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                LoginEvent::StateChanged(state) => println!("state: {}", state.label()),
                LoginEvent::Notified(notification) => println!(
                    "[{}] {}",
                    notification.severity.as_str(),
                    notification.message
                ),
            }
        }
    });

    flow.set_email(args.email).await;
    flow.set_password(args.password).await;
    let outcome = flow.submit().await;

    if outcome == SubmitOutcome::Succeeded {
        if let Some(session) = store.current_session().await {
            println!("Logged in as {}", session.identity.display_name());
            println!("{}", serde_json::to_string_pretty(&session.identity)?);
        }
        let wait = timings.redirect_delay + Duration::from_secs(1);
        match tokio::time::timeout(wait, routes.recv()).await {
            Ok(Some(route)) => println!("Navigate to {route}"),
            _ => tracing::warn!("redirect did not fire"),
        }
    } else if let Some(message) = flow.inline_error().await {
        eprintln!("error: {message}");
    }

    flow.teardown().await;
    drop(flow);
    let _ = printer.await;

    if outcome != SubmitOutcome::Succeeded {
        bail!("login did not succeed");
    }
    Ok(())
}
