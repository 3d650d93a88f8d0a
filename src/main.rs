//! hms-client - command line access to the HMS REST API

use anyhow::{anyhow, Context};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use hms_client::{
    config::{Args, ClaimsCommand, Command},
    filter_items, logging, ApiClient, AuthService, ClaimCreate, ClaimStatus, ClaimUpdate, FileSession,
    LoginCredentials, QueryCache, RemoteSearch, Resource, SearchOptions,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(&args.log_level, args.log_json);

    let config = args.client_config();
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }
    debug!(api_url = %config.base_url, session = %args.session_file.display(), "Starting");

    let session = Arc::new(FileSession::new(args.session_file.clone()));
    let client = ApiClient::new(config, session)?;

    run(client, args.command).await
}

async fn run(client: ApiClient, command: Command) -> anyhow::Result<()> {
    let auth = AuthService::new(client.clone());

    match command {
        Command::Login { email, password } => {
            let user = auth
                .login(&LoginCredentials { email, password })
                .await
                .context("login failed")?;
            print_json(&user)
        }
        Command::Logout => {
            auth.logout()?;
            Ok(())
        }
        Command::Whoami => match auth.current_user() {
            Some(user) => print_json(&user),
            None => Err(anyhow!("not logged in")),
        },
        Command::Claims(claims) => run_claims(&client, claims).await,
        Command::Search { endpoint, term } => {
            let rows = remote_search(client, &endpoint, &term).await?;
            print_json(&rows)
        }
        Command::Filter { endpoint, term, fields } => {
            let rows: Vec<serde_json::Value> = client.get_json(&endpoint).await?;
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            print_json(&filter_items(Some(rows.as_slice()), &term, &fields, &[]))
        }
    }
}

async fn run_claims(client: &ApiClient, command: ClaimsCommand) -> anyhow::Result<()> {
    match command {
        ClaimsCommand::List => print_json(&client.fetch_claims().await?),
        ClaimsCommand::Create {
            patient_id,
            scheme,
            amount,
            description,
        } => {
            let claim = ClaimCreate {
                patient_id,
                scheme,
                amount,
                description,
            };
            print_json(&client.create_claim(&claim).await?)
        }
        ClaimsCommand::Update { id, status, outcome } => {
            let status = status
                .map(|s| s.parse::<ClaimStatus>())
                .transpose()
                .map_err(|e| anyhow!(e))?;
            let update = ClaimUpdate {
                status,
                outcome,
                ..Default::default()
            };
            print_json(&client.update_claim(id, &update).await?)
        }
        ClaimsCommand::Delete { id } => {
            let response = client.delete_claim(id).await?;
            println!("{}", response.status);
            Ok(())
        }
    }
}

/// One-shot remote search: start at `term` and wait for its result
async fn remote_search(client: ApiClient, endpoint: &str, term: &str) -> anyhow::Result<Vec<serde_json::Value>> {
    let search_key = Resource::parse(endpoint)
        .map(|r| format!("{}-search", r.detail_name()))
        .unwrap_or_else(|| endpoint.to_string());
    let options = SearchOptions::new(endpoint, search_key);
    let key = options.key_for(term);

    let search = RemoteSearch::with_term(client, QueryCache::new(), options, term);
    let state = search
        .subscribe()
        .wait_for(|s| s.is_settled_for(&key))
        .await?
        .clone();

    if let Some(e) = state.error {
        return Err(anyhow!("search failed: {}", e));
    }
    Ok(state.data.unwrap_or_default())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
