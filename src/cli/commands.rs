//! CLI command implementations

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::models::{DonationFilter, DonationStatus, UserFilter, UserStatus};
use crate::api::validation::RegistrationForm;
use crate::app::AppContext;
use crate::cli::{
    error, info, print_funding_table, print_identity, print_request_detail, print_request_table, print_role,
    print_route_table, print_user_table, render_formatted, success, warn, FundingAction, OutputFormat,
    RequestsAction, UsersAction,
};
use crate::config::{self, loader::CONFIG_FILENAME};
use crate::routes::{dashboard_menu, GuardOutcome};

const STATE_DIR: &str = ".donorlink";

/// Initialize a new donorlink.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    fs::write(config_path, config::loader::default_config_content())?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Edit the API URL if needed and run 'donorlink register' to create an account");

    Ok(())
}

/// Register a donor account
pub async fn register(mut form: RegistrationForm, password: Option<String>) -> Result<()> {
    match password {
        Some(password) => {
            form.confirm_password = password.clone();
            form.password = password;
        }
        None => {
            form.password = Password::with_theme(&ColorfulTheme::default())
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?;
            form.confirm_password = form.password.clone();
        }
    }

    let app = context().await?;
    info(&format!("Registering {}", form.email));

    let result = app.register_donor(&form).await;
    app.shutdown();
    match result {
        Ok(user) => {
            success(&format!("Registered {} ({}) as a donor", user.name, user.blood_group));
            Ok(())
        }
        Err(e) => {
            error(&format!("Registration failed: {}", e));
            Err(e.into())
        }
    }
}

/// Sign in with a password or the federated provider
pub async fn login(email: Option<String>, google: bool, password: Option<String>) -> Result<()> {
    let app = context().await?;

    let result = if google {
        app.session().sign_in_with_google().await
    } else {
        let email = email.ok_or_else(|| anyhow::anyhow!("--email is required"))?;
        let password = match password {
            Some(password) => password,
            None => Password::with_theme(&ColorfulTheme::default())
                .with_prompt("Password")
                .interact()?,
        };
        app.session().login_user(&email, &password).await
    };
    app.shutdown();

    match result {
        Ok(identity) => {
            success(&format!("Signed in as {}", identity.email.as_deref().unwrap_or(&identity.uid)));
            Ok(())
        }
        Err(e) => {
            error(&format!("Sign-in failed: {}", e));
            Err(e.into())
        }
    }
}

/// Sign out
pub async fn logout() -> Result<()> {
    let app = context().await?;

    if app.session().session().current_user.is_none() {
        info("Not signed in");
        app.shutdown();
        return Ok(());
    }

    let result = app.session().log_out_user().await;
    app.shutdown();
    match result {
        Ok(()) => {
            success("Signed out");
            Ok(())
        }
        Err(e) => {
            error(&format!("Sign-out failed: {}", e));
            Err(e.into())
        }
    }
}

/// Show the signed-in user
pub async fn whoami(format: OutputFormat) -> Result<()> {
    let app = context().await?;
    let session = app.session().consumer().ready().await?;
    app.shutdown();

    match session.current_user {
        Some(identity) => match format {
            OutputFormat::Table => print_identity(&identity),
            _ => print_formatted(&identity, format)?,
        },
        None => info("Not signed in. Run 'donorlink login' first"),
    }
    Ok(())
}

/// Show the role of the signed-in user
pub async fn role() -> Result<()> {
    let app = context().await?;
    app.session().consumer().ready().await?;

    let result = app.roles().resolve_role().await;
    app.shutdown();
    match result {
        Ok(role) => {
            print_role(role, &dashboard_menu(role));
            Ok(())
        }
        Err(e) => {
            error(&format!("Could not resolve role: {}", e));
            Err(e.into())
        }
    }
}

/// List application routes
pub async fn routes(format: OutputFormat) -> Result<()> {
    let table = crate::routes::RouteTable::standard();
    match format {
        OutputFormat::Table => print_route_table(table.routes()),
        _ => print_formatted(table.routes(), format)?,
    }
    Ok(())
}

/// Open a route through its guard
pub async fn visit(path: &str) -> Result<()> {
    let app = context().await?;
    let result = app.visit(path).await;
    app.shutdown();

    match result {
        Ok(GuardOutcome::Render) => {
            success(&format!("Opened {}", path));
            Ok(())
        }
        Ok(GuardOutcome::Redirect { to, from }) => {
            warn(&format!("Access to {} denied, redirected to {}", from, to));
            Ok(())
        }
        Ok(GuardOutcome::Spinner) => {
            info(&format!("{} is still resolving", path));
            Ok(())
        }
        Err(e) => {
            error(&format!("Cannot open {}: {}", path, e));
            Err(e.into())
        }
    }
}

/// Donation request commands
pub async fn requests(action: RequestsAction) -> Result<()> {
    let app = context().await?;
    let result = run_requests(&app, action).await;
    app.shutdown();
    result
}

async fn run_requests(app: &AppContext, action: RequestsAction) -> Result<()> {
    let client = app.secure_client();

    match action {
        RequestsAction::List {
            status,
            mine,
            page,
            format,
        } => {
            let status = status
                .map(|s| s.parse::<DonationStatus>())
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?;
            let filter = DonationFilter::page(page).with_status(status);

            let requests = if mine {
                let session = app.session().consumer().ready().await?;
                let email = session
                    .email()
                    .ok_or_else(|| anyhow::anyhow!("Not signed in. Run 'donorlink login' first"))?;
                client.my_donation_requests(email, &filter).await?
            } else {
                client.list_donation_requests(&filter).await?
            };

            match format {
                OutputFormat::Table => print_request_table(&requests),
                _ => print_formatted(&requests, format)?,
            }
            Ok(())
        }
        RequestsAction::Show { id, format } => {
            let request = client.get_donation_request(&id).await?;
            match format {
                OutputFormat::Table => print_request_detail(&request),
                _ => print_formatted(&request, format)?,
            }
            Ok(())
        }
        RequestsAction::Status { id, status } => {
            let next: DonationStatus = status.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            app.session().consumer().ready().await?;

            let result = if next == DonationStatus::InProgress {
                app.claim_donation(&id).await
            } else {
                match client.get_donation_request(&id).await {
                    Ok(request) => client.update_donation_status(&id, request.status, next, None).await,
                    Err(e) => Err(e),
                }
            };

            match result {
                Ok(()) => {
                    success(&format!("Request {} is now {}", id, next));
                    Ok(())
                }
                Err(e) => {
                    error(&format!("Failed to update request {}: {}", id, e));
                    Err(e.into())
                }
            }
        }
        RequestsAction::Delete { id, force } => {
            if !force {
                let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("Are you sure you want to delete donation request '{}'?", id))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    info("Cancelled");
                    return Ok(());
                }
            }

            match client.delete_donation_request(&id).await {
                Ok(()) => {
                    success(&format!("Deleted donation request: {}", id));
                    Ok(())
                }
                Err(e) => {
                    error(&format!("Failed to delete donation request: {}", e));
                    Err(e.into())
                }
            }
        }
    }
}

/// User commands
pub async fn users(action: UsersAction) -> Result<()> {
    let app = context().await?;
    let client = app.secure_client();

    let result = match action {
        UsersAction::List { status, page, format } => {
            let status = status
                .map(|s| s.parse::<UserStatus>())
                .transpose()
                .map_err(|e| anyhow::anyhow!(e))?;
            match client.list_users(&UserFilter::page(page).with_status(status)).await {
                Ok(users) => match format {
                    OutputFormat::Table => {
                        print_user_table(&users);
                        Ok(())
                    }
                    _ => print_formatted(&users, format),
                },
                Err(e) => {
                    error(&format!("Failed to list users: {}", e));
                    Err(e.into())
                }
            }
        }
    };

    drop(client);
    app.shutdown();
    result
}

/// Funding commands
pub async fn funding(action: FundingAction) -> Result<()> {
    let app = context().await?;
    let client = app.secure_client();

    let result = match action {
        FundingAction::List { page, format } => match client.list_funding(page).await {
            Ok(funding) => match format {
                OutputFormat::Table => {
                    print_funding_table(&funding);
                    Ok(())
                }
                _ => print_formatted(&funding, format),
            },
            Err(e) => {
                error(&format!("Failed to list funding: {}", e));
                Err(e.into())
            }
        },
    };

    drop(client);
    app.shutdown();
    result
}

fn print_formatted<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<()> {
    if let Some(text) = render_formatted(value, format)? {
        println!("{}", text);
    }
    Ok(())
}

/// Context for one command; session state lives under `.donorlink/` unless configured
async fn context() -> Result<AppContext> {
    let mut config = config::load_config().map_err(|e| anyhow::anyhow!("{}", e))?;
    config
        .identity
        .state_file
        .get_or_insert_with(|| PathBuf::from(STATE_DIR).join("identity.json"));
    config
        .storage
        .path
        .get_or_insert_with(|| PathBuf::from(STATE_DIR).join("storage.json"));

    let app = AppContext::from_config(config).map_err(|e| anyhow::anyhow!("{}", e))?;
    app.session().consumer().ready().await?;
    Ok(app)
}
