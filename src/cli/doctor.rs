//! Environment readiness check.

use crate::config;
use crate::db::{Database, PgDatabase};
use anyhow::Result;
use std::fs;

/// Check state directory, database connectivity, translator config, and
/// the CSV opener.
pub async fn run() -> Result<()> {
    println!("Quill Doctor");
    println!("============");
    println!();

    // OS and architecture
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    // Check state directory
    let state_dir = config::state_dir();
    let state_ok = match fs::create_dir_all(&state_dir) {
        Ok(()) => {
            let probe = state_dir.join(".doctor_probe");
            match fs::write(&probe, b"ok") {
                Ok(()) => {
                    let _ = fs::remove_file(&probe);
                    true
                }
                Err(_) => false,
            }
        }
        Err(_) => false,
    };
    if state_ok {
        println!("[OK] State directory is writable: {}", state_dir.display());
    } else {
        println!(
            "[!!] State directory is NOT writable: {}",
            state_dir.display()
        );
    }

    // Check database configuration and connectivity
    let db_ok = match config::database_url() {
        Ok(url) => match PgDatabase::connect(&url).await {
            Ok(db) => match db.execute("SELECT 1").await {
                Ok(_) => {
                    println!("[OK] Database reachable");
                    true
                }
                Err(e) => {
                    println!("[!!] Database connected but query failed: {e}");
                    false
                }
            },
            Err(e) => {
                println!("[!!] Database NOT reachable: {e}");
                false
            }
        },
        Err(e) => {
            println!("[!!] Database not configured: {e}");
            false
        }
    };

    // Check translator configuration
    match config::TranslatorConfig::from_env() {
        Some(cfg) => println!("[OK] Translator configured (model: {})", cfg.model),
        None => println!(
            "[??] No API key set — `ask:` prompts will fail. Set QUILL_OPENAI_API_KEY."
        ),
    }

    // Check file opener for exported CSVs
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    match which::which(opener) {
        Ok(path) => println!("[OK] File opener found: {}", path.display()),
        Err(_) => println!("[??] No `{opener}` on PATH — exports will not auto-open"),
    }

    println!();
    if state_ok && db_ok {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
        if !db_ok {
            println!("  Set QUILL_DATABASE_URL or the PG* environment variables.");
        }
    }

    Ok(())
}
