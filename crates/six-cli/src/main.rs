//! six-contacts CLI tool
//!
//! Normalises or syncs a device contact export.
//!
//! Usage:
//!   six-contacts normalize <contacts.json>
//!   six-contacts sync <contacts.json>

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use six_backend::{BackendConfig, SixBackend};
use six_contacts::{
    normalize, ContactSync, ContactSyncConfig, MemoryContactProvider, RawContact, Session,
    SignedInUser,
};
use six_logging::AppEnv;

fn print_usage() {
    eprintln!("six-contacts - Normalise and sync Six contact exports");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  six-contacts normalize <contacts.json>   Print phone identifiers, one per line");
    eprintln!("  six-contacts sync <contacts.json>        Match and connect contacts on the backend");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SIX_APP_ENV             development | production (default: development)");
    eprintln!("  SIX_SUPABASE_URL        Supabase project URL (sync)");
    eprintln!("  SIX_SUPABASE_ANON_KEY   Supabase anon key (sync)");
    eprintln!("  SIX_BACKEND_URL         Graph backend base URL (sync)");
    eprintln!("  SIX_USER_ID             Signed-in user id (sync)");
    eprintln!("  SIX_ACCESS_TOKEN        Signed-in user access token (sync)");
    eprintln!("  SIX_HTTP_TIMEOUT_MS     Per-request timeout (default: 30000)");
    eprintln!("  SIX_CONTACT_FRESHNESS_MS  Contact cache window (default: 30000)");
}

enum Command {
    Normalize(PathBuf),
    Sync(PathBuf),
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let name = args.get(1).map(String::as_str);
    let file = || {
        args.get(2)
            .map(PathBuf::from)
            .ok_or_else(|| format!("{} requires a contacts file argument", args[1]))
    };

    match name {
        Some("normalize") => Ok(Command::Normalize(file()?)),
        Some("sync") => Ok(Command::Sync(file()?)),
        Some(other) => Err(format!("Unknown command: {other}")),
        None => Err("Missing command".to_string()),
    }
}

fn read_contacts(path: &Path) -> anyhow::Result<Vec<RawContact>> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("{} is not a contact export", path.display()))
}

fn session_from_env() -> anyhow::Result<Session> {
    let user_id = std::env::var("SIX_USER_ID").context("SIX_USER_ID is not set")?;
    let token = std::env::var("SIX_ACCESS_TOKEN").context("SIX_ACCESS_TOKEN is not set")?;
    Ok(Session::signed_in(SignedInUser::new(user_id, token)))
}

fn run_normalize(path: &Path) -> anyhow::Result<()> {
    let contacts = read_contacts(path)?;
    let phones = normalize(&contacts);
    tracing::info!(contacts = contacts.len(), identifiers = phones.len(), "Normalised export");

    for id in &phones {
        println!("{id}");
    }
    Ok(())
}

async fn run_sync(path: &Path) -> anyhow::Result<()> {
    let contacts = read_contacts(path)?;
    let session = session_from_env()?;

    let backend = SixBackend::new(BackendConfig::from_env()?, session.clone())?;
    let provider = MemoryContactProvider::granted(contacts);
    let sync = ContactSync::new(
        Arc::new(provider),
        Arc::new(backend),
        session,
        ContactSyncConfig::from_env()?,
    );

    let outcome = sync.check_and_load(true).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    if matches!(args.get(1).map(String::as_str), Some("-h" | "--help" | "help")) {
        print_usage();
        return;
    }

    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e}");
            print_usage();
            std::process::exit(1);
        }
    };

    let env = match AppEnv::from_env() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = six_logging::init(env) {
        eprintln!("Warning: {e}");
    }

    let result = match command {
        Command::Normalize(path) => run_normalize(&path),
        Command::Sync(path) => run_sync(&path).await,
    };

    if let Err(e) = result {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("six-contacts")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn parses_commands() {
        assert!(matches!(
            parse_args(&args(&["normalize", "c.json"])),
            Ok(Command::Normalize(p)) if p == Path::new("c.json")
        ));
        assert!(matches!(parse_args(&args(&["sync", "c.json"])), Ok(Command::Sync(_))));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["sync"])).is_err());
        assert!(parse_args(&args(&["upload", "c.json"])).is_err());
    }

    #[test]
    fn reads_device_export() {
        let path = std::env::temp_dir().join(format!("six-cli-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[{"name": "Ada", "phoneNumbers": [{"number": "+1 (555) 123-4567"}]}]"#,
        )
        .unwrap();

        let contacts = read_contacts(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(normalize(&contacts).as_slice(), ["5551234567"]);
    }
}
