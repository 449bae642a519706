use anyhow::Result;
use dialoguer::{Input, Password};
use std::sync::Arc;

use partilio_client::auth::{LoginCredentials, RegisterData};
use partilio_client::config::{Command, Config};
use partilio_client::context::SessionContext;
use partilio_client::dashboard::{DashboardData, DashboardPeriod};
use partilio_client::runtime::NativeRuntime;
use partilio_client::session::UserProfile;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;

    // Initialize logging with the configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let Some(command) = command else {
        print_banner(&config);
        return Ok(());
    };

    let ctx = SessionContext::new(&config, Arc::new(NativeRuntime))?;

    // Rebuild the session from persisted credentials before dispatching
    let session = ctx.auth.hydrate().await;
    if let Some(ref session) = session {
        tracing::debug!(user = %session.user.email, "Resumed persisted session");
    }

    match command {
        Command::Login { email } => {
            let email: String = match email {
                Some(email) => email,
                None => Input::new().with_prompt("Email").interact_text()?,
            };
            let password = Password::new().with_prompt("Password").interact()?;

            let session = ctx
                .auth
                .login(LoginCredentials { email, password })
                .await?;

            tracing::info!("✅ Logged in");
            print_profile(&session.user);
        }

        Command::Register => {
            let name: String = Input::new().with_prompt("Name").interact_text()?;
            let email: String = Input::new().with_prompt("Email").interact_text()?;
            let password = Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?;

            let session = ctx
                .auth
                .register(RegisterData {
                    name,
                    email,
                    password,
                })
                .await?;

            tracing::info!("✅ Account created");
            print_profile(&session.user);
        }

        Command::Logout => {
            ctx.auth.logout().await;
            println!("Logged out.");
        }

        Command::Profile => {
            if session.is_none() {
                anyhow::bail!("not logged in - run `partilio login` first");
            }
            let profile = ctx.auth.fetch_profile().await?;
            print_profile(&profile);
        }

        Command::Dashboard { month, year } => {
            if session.is_none() {
                anyhow::bail!("not logged in - run `partilio login` first");
            }

            let period = match (month, year) {
                (Some(month), Some(year)) => Some(DashboardPeriod { month, year }),
                (None, None) => None,
                _ => anyhow::bail!("--month and --year must be given together"),
            };

            let data = ctx.dashboard.fetch(period).await?;
            print_dashboard(&data);
        }
    }

    Ok(())
}

fn print_banner(config: &Config) {
    let banner = r#"
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║                Partilio - shared expenses                 ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
"#;

    println!("{}", banner);
    println!("  Version:    {}", env!("CARGO_PKG_VERSION"));
    println!("  Backend:    {}", config.api_base_url);
    println!("  Log level:  {}", config.log_level);
    println!();
    println!("  Run `partilio --help` for available commands.");
    println!();
}

fn print_profile(profile: &UserProfile) {
    println!();
    println!("  {} <{}>", profile.name, profile.email);
    println!("  Member since: {}", profile.created_at.format("%Y-%m-%d"));
    println!(
        "  Onboarding:   {}",
        if profile.onboarding_completed {
            "completed"
        } else {
            "pending"
        }
    );
    println!();
}

fn print_dashboard(data: &DashboardData) {
    println!();
    println!("  {} {}", data.summary.month, data.summary.year);
    println!("  ─────────────────────────────");
    println!("  Expenses:  {:>10.2}", data.summary.total_amount);
    println!("  Paid:      {:>10.2}", data.summary.paid_amount);
    println!("  Pending:   {:>10.2}", data.summary.pending_amount);
    println!("  Count:     {:>10}", data.summary.expenses_count);

    if !data.category_breakdown.is_empty() {
        println!();
        println!("  By category:");
        for entry in &data.category_breakdown {
            println!(
                "    {:<20} {:>10.2}  ({:.1}%)",
                entry.category_name, entry.amount, entry.percentage
            );
        }
    }

    if !data.payer_breakdown.is_empty() {
        println!();
        println!("  By payer:");
        for entry in &data.payer_breakdown {
            println!(
                "    {:<20} {:>10.2}  ({:.1}%)",
                entry.payer_name, entry.amount, entry.percentage
            );
        }
    }

    if !data.upcoming_payments.is_empty() {
        println!();
        println!("  Upcoming payments:");
        for payment in &data.upcoming_payments {
            println!(
                "    {}  {:<24} {:>10.2}  {:?}",
                payment.due_date.format("%Y-%m-%d"),
                payment.description,
                payment.amount,
                payment.status
            );
        }
    }

    println!();
}
