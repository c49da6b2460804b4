use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use clinic_auth::{
    CredentialProvider, HttpClientBuilderExt, LoginClient, NoCredential, SecretString,
    SessionClaims, SessionCredential, StaticCredential,
};
use clinic_http::{HttpClient, HttpClientBuilder};
use clinic_resource::{FetchOutcome, ListState, QuerySpec, SortDirection};
use clinic_sdk::{
    Appointment, AppointmentStatus, Assessment, ClinicApi, ClinicClient, MedicalRecord, Patient,
    Prediction, Resource, User,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use url::Url;

use crate::config::ConsoleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    Patients,
    Appointments,
    Assessments,
    Predictions,
    MedicalRecords,
    Users,
}

/// Runs `$body` with `$r` bound to the model type of `$kind`.
macro_rules! with_resource {
    ($kind:expr, $r:ident => $body:expr) => {
        match $kind {
            ResourceKind::Patients => {
                type $r = Patient;
                $body
            }
            ResourceKind::Appointments => {
                type $r = Appointment;
                $body
            }
            ResourceKind::Assessments => {
                type $r = Assessment;
                $body
            }
            ResourceKind::Predictions => {
                type $r = Prediction;
                $body
            }
            ResourceKind::MedicalRecords => {
                type $r = MedicalRecord;
                $body
            }
            ResourceKind::Users => {
                type $r = User;
                $body
            }
        }
    };
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and print the session token
    Login {
        /// Defaults to `email` from the config
        #[arg(long)]
        email: Option<String>,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the claims of the configured token
    Whoami,
    /// Fetch one page of a collection
    List {
        resource: ResourceKind,
        #[arg(long, default_value_t = 1)]
        page: i64,
        #[arg(long)]
        page_size: Option<i64>,
        /// `key=value`, repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        #[arg(long)]
        sort: Option<String>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Fetch one item by id
    Get { resource: ResourceKind, id: String },
    /// Delete one item and show the refreshed first page
    Delete { resource: ResourceKind, id: String },
    /// Change an appointment's status
    Status {
        appointment_id: String,
        #[arg(value_parser = parse_status)]
        status: AppointmentStatus,
    },
    /// Score an assessment with the prediction service
    Predict { assessment_id: String },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected key=value, got `{raw}`")),
    }
}

fn parse_status(raw: &str) -> Result<AppointmentStatus, String> {
    match raw {
        "pending" => Ok(AppointmentStatus::Pending),
        "done" => Ok(AppointmentStatus::Done),
        "cancelled" => Ok(AppointmentStatus::Cancelled),
        other => Err(format!("unknown status `{other}` (pending, done, cancelled)")),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageOutput<'a, T> {
    items: &'a [T],
    page: u32,
    total_pages: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

fn api_base(config: &ConsoleConfig) -> Result<Url> {
    Url::parse(&config.api.base_url)
        .with_context(|| format!("invalid api.base_url `{}`", config.api.base_url))
}

/// HTTP client carrying the configured token, if any.
///
/// # Errors
/// Fails if TLS setup fails or the user agent is not a valid header.
pub fn build_http(config: &ConsoleConfig) -> Result<HttpClient> {
    let provider: Arc<dyn CredentialProvider> = match &config.token {
        Some(token) => {
            warn_if_expired(token);
            Arc::new(StaticCredential::new(token.clone()))
        }
        None => Arc::new(NoCredential),
    };
    HttpClientBuilder::with_config(config.http.client_config())
        .with_credentials(provider)
        .build()
        .context("failed to build HTTP client")
}

fn warn_if_expired(token: &SecretString) {
    match SessionClaims::peek(token.expose()) {
        Ok(claims) if claims.is_expired_at(Utc::now()) => {
            warn!(user_id = %claims.user_id, "configured token has expired; run `login` again");
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "configured token is not a readable JWT"),
    }
}

/// # Errors
/// Any failed request, with the backend's message where it sent one.
pub async fn run(command: Command, config: &ConsoleConfig) -> Result<()> {
    match command {
        Command::Login { email, password } => login(config, email, password).await,
        Command::Whoami => whoami(config),
        Command::List {
            resource,
            page,
            page_size,
            filters,
            sort,
            desc,
        } => {
            let mut spec = QuerySpec::new().page(page);
            if let Some(size) = page_size {
                spec = spec.page_size(size);
            }
            for (key, value) in filters {
                spec = spec.filter(key, value);
            }
            if let Some(field) = sort {
                let direction = if desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
                spec = spec.sort_by(field, direction);
            }
            let clinic = clinic(config)?;
            with_resource!(resource, R => list::<R>(&clinic, &spec).await)
        }
        Command::Get { resource, id } => {
            let clinic = clinic(config)?;
            with_resource!(resource, R => get::<R>(&clinic, &id).await)
        }
        Command::Delete { resource, id } => {
            let clinic = clinic(config)?;
            with_resource!(resource, R => delete::<R>(&clinic, &id).await)
        }
        Command::Status {
            appointment_id,
            status,
        } => {
            let ack = clinic(config)?
                .change_appointment_status(&appointment_id, status)
                .await
                .with_context(|| format!("status change of {appointment_id} failed"))?;
            println!("{}", ack.message);
            Ok(())
        }
        Command::Predict { assessment_id } => {
            let prediction = clinic(config)?
                .run_prediction(&assessment_id)
                .await
                .with_context(|| format!("prediction for {assessment_id} failed"))?;
            print_json(&prediction)
        }
    }
}

fn clinic(config: &ConsoleConfig) -> Result<ClinicClient> {
    ClinicClient::new(build_http(config)?, &config.api).context("invalid api configuration")
}

async fn login(config: &ConsoleConfig, email: Option<String>, password: Option<String>) -> Result<()> {
    let Some(email) = email.or_else(|| config.email.clone()) else {
        bail!("no email given; pass --email or set `email` in the config");
    };
    let password = match password {
        Some(password) => SecretString::new(password),
        None => read_password().await?,
    };

    // The login route is public; the session token is set from its answer.
    let http = HttpClientBuilder::with_config(config.http.client_config())
        .build()
        .context("failed to build HTTP client")?;
    let login = LoginClient::new(http, &api_base(config)?, SessionCredential::new())?;
    let session = login
        .login(&email, &password)
        .await
        .context("login failed")?;

    match SessionClaims::peek(session.token.expose()) {
        Ok(claims) => match claims.expires_at() {
            Some(exp) => info!(role = %session.role, expires_at = %exp, "session issued"),
            None => info!(role = %session.role, "session issued without expiry"),
        },
        Err(err) => warn!(error = %err, "session token is not a readable JWT"),
    }
    println!("{}", session.token.expose());
    Ok(())
}

async fn read_password() -> Result<SecretString> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        bail!("empty password on stdin");
    }
    Ok(SecretString::new(password))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WhoamiOutput<'a> {
    user_id: &'a str,
    role: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<String>,
    expired: bool,
}

fn whoami(config: &ConsoleConfig) -> Result<()> {
    let Some(token) = &config.token else {
        bail!("no token configured; set CLINIC__TOKEN or `token` in the config");
    };
    let claims = SessionClaims::peek(token.expose()).context("token is not a readable JWT")?;
    print_json(&WhoamiOutput {
        user_id: &claims.user_id,
        role: &claims.role,
        expires_at: claims.expires_at().map(|exp| exp.to_rfc3339()),
        expired: claims.is_expired_at(Utc::now()),
    })
}

async fn list<R: Resource + Serialize>(clinic: &ClinicClient, spec: &QuerySpec) -> Result<()> {
    let page = clinic
        .list::<R>(spec)
        .await
        .with_context(|| format!("listing {} failed", R::NAME))?;
    print_json(&PageOutput {
        items: &page.items,
        page: page.current_page,
        total_pages: page.total_pages,
        total: page.total,
    })
}

async fn get<R: Resource + Serialize>(clinic: &ClinicClient, id: &str) -> Result<()> {
    let item = clinic
        .get::<R>(id)
        .await
        .with_context(|| format!("{}/{id} not available", R::NAME))?;
    print_json(&item)
}

async fn delete<R: Resource + Serialize>(clinic: &ClinicClient, id: &str) -> Result<()> {
    let watched = clinic.watch::<R>(QuerySpec::new());
    if watched.refetch().await == FetchOutcome::Failed {
        warn!(resource = R::NAME, "first page could not be loaded before delete");
    }

    clinic
        .remove::<R>(id)
        .await
        .with_context(|| format!("deleting {}/{id} failed", R::NAME))?;
    info!(resource = R::NAME, id, "deleted");

    match watched.snapshot() {
        ListState::Loaded(page) => print_json(&PageOutput {
            items: &page.items,
            page: page.current_page,
            total_pages: page.total_pages,
            total: page.total,
        }),
        ListState::Failed { error, .. } => {
            bail!("deleted {}/{id}, but refreshing the list failed: {error}", R::NAME)
        }
        ListState::Idle | ListState::Loading { .. } => Ok(()),
    }
}
