use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donorlink::api::validation::RegistrationForm;
use donorlink::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "donorlink=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Register {
            email,
            name,
            blood_group,
            district,
            upazila,
            avatar,
            password,
        } => {
            let form = RegistrationForm {
                name,
                email,
                avatar,
                blood_group,
                district,
                upazila,
                ..RegistrationForm::default()
            };
            cli::commands::register(form, password).await
        }
        Commands::Login {
            email,
            google,
            password,
        } => cli::commands::login(email, google, password).await,
        Commands::Logout => cli::commands::logout().await,
        Commands::Whoami { format } => cli::commands::whoami(format).await,
        Commands::Role => cli::commands::role().await,
        Commands::Routes { format } => cli::commands::routes(format).await,
        Commands::Visit { path } => cli::commands::visit(&path).await,
        Commands::Requests { action } => cli::commands::requests(action).await,
        Commands::Users { action } => cli::commands::users(action).await,
        Commands::Funding { action } => cli::commands::funding(action).await,
    }
}
