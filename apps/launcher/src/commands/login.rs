use anyhow::{Context, Result, bail};
use clap::Args;

use crate::auth::{self, CLIENT_ID_ENV, ReqwestHttpClient};
use crate::paths;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Azure application (client) id used for the Microsoft device-code flow.
    #[arg(long)]
    client_id: Option<String>,
}

pub async fn run(args: LoginArgs) -> Result<()> {
    let Some(client_id) = auth::resolve_client_id(args.client_id) else {
        bail!("No Microsoft client id configured. Pass --client-id or set {CLIENT_ID_ENV}.");
    };
    let store = paths::auth_store_path().map_err(anyhow::Error::msg)?;
    let http = ReqwestHttpClient::new();

    let device = auth::start_device_code(&http, &client_id)
        .await
        .context("Failed to start Microsoft sign-in")?;
    match device
        .message
        .as_deref()
        .map(str::trim)
        .filter(|message| !message.is_empty())
    {
        Some(message) => println!("{message}"),
        None => println!(
            "Open {} and enter the code {}",
            device.verification_uri, device.user_code
        ),
    }
    println!("Waiting for authorization...");

    let session = auth::complete_device_code(&http, &client_id, &device)
        .await
        .context("Microsoft sign-in failed")?;
    auth::save_session(&store, &session).context("Failed to store Microsoft session")?;
    println!("Signed in as {}.", session.profile.name);
    Ok(())
}
