//! Creates the first admin account.
//!
//! ```bash
//! # Prompt for name, email and password
//! create-admin
//!
//! # Create admin@example.com / admin123 unless it already exists
//! create-admin --default
//! ```
//!
//! Reads `MONGODB_URI` and `DATABASE_NAME` from the environment or `.env`.

use std::io::{self, BufRead, Write};

use clap::Parser;
use validator::ValidateEmail;

use catalog_admin::config::DEFAULT_DATABASE_NAME;
use catalog_admin::db;
use catalog_admin::errors::AppError;
use catalog_admin::users;

const DEFAULT_NAME: &str = "Admin User";
const DEFAULT_EMAIL: &str = "admin@example.com";
const DEFAULT_PASSWORD: &str = "admin123";
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Parser)]
#[command(name = "create-admin")]
#[command(about = "Create an admin account for the catalog admin API")]
struct Cli {
    /// Create the default admin (admin@example.com / admin123) without prompting
    #[arg(long)]
    default: bool,
}

fn prompt(stdin: &mut impl BufRead, label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    stdin.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let uri = std::env::var("MONGODB_URI")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| AppError::Config("MONGODB_URI environment variable is not set".into()))?;
    let database_name =
        std::env::var("DATABASE_NAME").unwrap_or_else(|_| DEFAULT_DATABASE_NAME.to_string());

    log::info!("Connecting to MongoDB...");
    let database = db::connect(&uri, &database_name).await?;
    db::ensure_indexes(&database).await?;
    let collection = db::users(&database);

    if cli.default {
        if let Some(existing) = users::find_by_email(&collection, DEFAULT_EMAIL).await? {
            println!("Admin user already exists:");
            println!("  Email: {}", existing.email);
            println!("  Role:  {:?}", existing.role);
            return Ok(());
        }

        let admin =
            users::create_admin(&collection, DEFAULT_NAME, DEFAULT_EMAIL, DEFAULT_PASSWORD).await?;
        println!("Admin user created:");
        println!("  Email:    {}", admin.email);
        println!("  Password: {}", DEFAULT_PASSWORD);
        println!("  Name:     {}", admin.name);
        println!("Change the password after the first sign-in.");
        return Ok(());
    }

    let mut stdin = io::stdin().lock();
    let name = prompt(&mut stdin, "Enter admin name: ")?;
    let email = prompt(&mut stdin, "Enter admin email: ")?;
    let password = prompt(
        &mut stdin,
        &format!("Enter admin password (min {} characters): ", MIN_PASSWORD_LEN),
    )?;

    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()).into());
    }
    if !email.validate_email() {
        return Err(AppError::BadRequest("Invalid email address".into()).into());
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        ))
        .into());
    }

    let admin = users::create_admin(&collection, &name, &email, &password).await?;
    println!("Admin user created:");
    println!("  Name:  {}", admin.name);
    println!("  Email: {}", admin.email);
    println!("  Role:  {:?}", admin.role);
    Ok(())
}

#[actix_web::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()).await {
        log::error!("Error creating admin: {}", e);
        std::process::exit(1);
    }
}
