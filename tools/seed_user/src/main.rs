use std::env;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use dotenvy::dotenv;
use reqwest::Client;
use serde::Serialize;

const DEFAULT_DATA_API_BASE: &str = "http://127.0.0.1:5000/data-api/rest";
const USAGE: &str =
    "usage: seed_user <user_id> <instructor|student> <username> <password> [--argon2] [--apply]";

fn is_dry_run(args: &[String]) -> bool {
    !args.iter().any(|a| a == "--apply")
}

#[derive(Debug, Serialize)]
struct UserRow {
    user_id: i64,
    role: String,
    username: String,
    password: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let args: Vec<String> = env::args().skip(1).collect();
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let [user_id, role, username, password] = positional.as_slice() else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    let user_id: i64 = user_id.parse()?;
    if role.as_str() != "instructor" && role.as_str() != "student" {
        eprintln!("role must be instructor or student");
        std::process::exit(2);
    }

    let row = UserRow {
        user_id,
        role: role.to_string(),
        username: username.to_string(),
        password: hash_password(password, args.iter().any(|a| a == "--argon2"))?,
    };

    let base = env::var("DATA_API_BASE").unwrap_or_else(|_| DEFAULT_DATA_API_BASE.to_string());
    let url = format!("{}/Users", base.trim_end_matches('/'));

    if is_dry_run(&args) {
        println!("[DRY RUN] Would POST {}", url);
        println!("{}", serde_json::to_string_pretty(&row)?);
        return Ok(());
    }

    Client::new()
        .post(&url)
        .json(&row)
        .send()
        .await?
        .error_for_status()?;

    println!("Created user {} ({})", row.user_id, row.role);
    Ok(())
}

/// bcrypt unless `use_argon2` is set; the portal verifies either.
fn hash_password(plain: &str, use_argon2: bool) -> Result<String, Box<dyn std::error::Error>> {
    if !use_argon2 {
        return Ok(bcrypt::hash(plain, bcrypt::DEFAULT_COST)?);
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| e.to_string())?;
    Ok(hash.to_string())
}
