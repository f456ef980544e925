use std::net::IpAddr;

use clap::Parser;
use gatehouse::{Gatehouse, GatehouseBuilder, RateLimitConfig, Role, SqliteRepositoryProvider};
use tracing_subscriber::EnvFilter;

/// Command line interface for Gatehouse administration
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database connection string
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://gatehouse.db")]
    database_url: String,

    /// Attempts allowed per address inside one window
    #[arg(long, env = "GATEHOUSE_MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,

    /// Length of the rate limit window in seconds
    #[arg(long, env = "GATEHOUSE_WINDOW_SECONDS", default_value_t = 300)]
    window_seconds: i64,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum RoleArg {
    Staff,
    Customer,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Staff => Role::Staff,
            RoleArg::Customer => Role::Customer,
        }
    }
}

/// Available CLI commands
#[derive(clap::Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Create an account
    AddUser {
        login: String,
        password: String,
        #[arg(long, value_enum, default_value = "customer")]
        role: RoleArg,
    },
    /// Block an address, or the inclusive range START..=END
    Block { start: IpAddr, end: Option<IpAddr> },
    /// Deactivate a blocked range
    Unblock { id: i64 },
    /// List blocked ranges as JSON
    Ranges,
    /// Show the rate limit counter for an address as JSON
    Attempts { address: IpAddr },
    /// Clear the rate limit counter for an address
    ResetAttempts { address: IpAddr },
    /// Print version information
    Version,
}

fn init_tracing() {
    let default_level = match std::env::var("GATEHOUSE_ENV").as_deref() {
        Ok("development") => "debug",
        _ => "info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_version() {
    println!("Gatehouse v{}", env!("CARGO_PKG_VERSION"));
}

async fn run(
    gatehouse: Gatehouse<SqliteRepositoryProvider>,
    command: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Migrate => {
            gatehouse.migrate().await?;
            println!("Migrations applied");
        }
        Commands::AddUser {
            login,
            password,
            role,
        } => {
            let user = gatehouse
                .create_user(&login, &password, role.into())
                .await?;
            println!("Created {} ({}) as {}", user.login, user.id, user.role);
        }
        Commands::Block { start, end } => {
            let entry = match end {
                Some(end) => gatehouse.block_range(start, end).await?,
                None => gatehouse.block_address(start).await?,
            };
            println!(
                "Blocked range {}: {} - {}",
                entry.id, entry.range_start, entry.range_end
            );
        }
        Commands::Unblock { id } => {
            if !gatehouse.set_range_active(id, false).await? {
                return Err(format!("No range with id {id}").into());
            }
            println!("Range {id} deactivated");
        }
        Commands::Ranges => {
            let ranges = gatehouse.list_ranges().await?;
            println!("{}", serde_json::to_string_pretty(&ranges)?);
        }
        Commands::Attempts { address } => {
            let record = gatehouse.rate_limit_status(address).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::ResetAttempts { address } => {
            if gatehouse.reset_rate_limit(address).await? {
                println!("Counter for {address} cleared");
            } else {
                println!("No counter for {address}");
            }
        }
        Commands::Version => print_version(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    if let Commands::Version = cli.command {
        print_version();
        return Ok(());
    }

    let gatehouse = GatehouseBuilder::new()
        .with_sqlite(&cli.database_url)
        .await?
        .with_rate_limit(RateLimitConfig::new(cli.max_attempts, cli.window_seconds))
        .build()
        .await?;

    run(gatehouse, cli.command).await
}
