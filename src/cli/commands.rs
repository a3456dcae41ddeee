// Keysafe — CLI Command Handlers
//
// Each function handles one CLI subcommand. Secret commands build a
// `SecretManager` from the resolved configuration and delegate to it; missing
// `--key`/`--value` flags are prompted for interactively.

use std::path::{Path, PathBuf};

use dialoguer::{Confirm, Input, Password};

use crate::audit::{AuditSink, SqliteAuditSink, TracingAuditSink};
use crate::cache::{Cache, MemoryCache};
use crate::cipher::{generate_key_hex, AesGcmCipher};
use crate::config::{default_config_path, SecretsConfig, StoreBackend};
use crate::error::{KeysafeError, Result};
use crate::manager::{CachePolicy, SecretError, SecretManager};
use crate::store::{Database, MemoryRecordStore, SqliteRecordStore, StoreError};

use super::{Cli, Commands};

/// Everything a command needs besides its own arguments.
struct Context {
    config: SecretsConfig,
    config_path: Option<PathBuf>,
    encryption_key: Option<String>,
    actor: Option<String>,
}

/// Execute the parsed CLI command.
pub fn execute(cli: Cli) -> Result<()> {
    let mut config = SecretsConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.database {
        config.database_path = Some(path);
    }

    let ctx = Context {
        config,
        config_path: cli.config,
        encryption_key: cli.encryption_key,
        actor: cli.actor,
    };

    match cli.command {
        Commands::Init => cmd_init(&ctx),
        Commands::Add { key, value, force } => cmd_add(&ctx, key, value, force),
        Commands::Get { key } => cmd_get(&ctx, key),
        Commands::Update { key, value } => cmd_update(&ctx, key, value),
        Commands::Delete { key, yes } => cmd_delete(&ctx, key, yes),
        Commands::List { json } => cmd_list(&ctx, json),
        Commands::Audit { key, limit } => cmd_audit(&ctx, key, limit),
    }
}

// ─── Init ────────────────────────────────────────────────────────────────────

fn cmd_init(ctx: &Context) -> Result<()> {
    let db_path = ctx.config.database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let _db = Database::open(&db_path)
        .map_err(|e| KeysafeError::Other(format!("Failed to initialize database: {}", e)))?;

    let config_path = ctx.config_path.clone().unwrap_or_else(default_config_path);
    let wrote_config = write_default_config(&config_path, &ctx.config)?;

    println!("✓ Keysafe initialized successfully");
    println!("  Database: {}", db_path.display());
    if wrote_config {
        println!("  Config:   {} (created)", config_path.display());
    } else {
        println!("  Config:   {} (kept existing)", config_path.display());
    }

    if ctx.encryption_key.is_none() {
        let key = generate_key_hex();
        println!();
        println!("Generated encryption key. Store it somewhere safe; it is not saved:");
        println!();
        println!("  export KEYSAFE_ENCRYPTION_KEY={}", key.as_str());
    }

    println!();
    println!("Next: add a secret with `keysafe add --key <name>`");

    Ok(())
}

/// Write `config` to `path` unless a file is already there.
fn write_default_config(path: &Path, config: &SecretsConfig) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, config.to_toml_string()?)?;
    tracing::debug!(path = %path.display(), "Wrote default config");
    Ok(true)
}

// ─── Add / Update ────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum AddOutcome {
    Created,
    Overwritten,
}

fn cmd_add(ctx: &Context, key: Option<String>, value: Option<String>, force: bool) -> Result<()> {
    let key = key_or_prompt(key)?;
    let value = value_or_prompt(value)?;

    with_manager(ctx, |manager| {
        match add_secret(manager, &key, &value, force)? {
            AddOutcome::Created => println!("✓ Secret '{}' stored", key),
            AddOutcome::Overwritten => println!("✓ Secret '{}' overwritten", key),
        }
        Ok(())
    })
}

/// `store`, falling through to `update` on a conflict when `force` is set.
fn add_secret(manager: &SecretManager<'_>, key: &str, value: &str, force: bool) -> Result<AddOutcome> {
    match manager.store(key, value) {
        Ok(()) => Ok(AddOutcome::Created),
        Err(SecretError::AlreadyExists(_)) if force => {
            manager.update(key, value)?;
            Ok(AddOutcome::Overwritten)
        }
        Err(e) => Err(e.into()),
    }
}

fn cmd_update(ctx: &Context, key: Option<String>, value: Option<String>) -> Result<()> {
    let key = key_or_prompt(key)?;
    let value = value_or_prompt(value)?;

    with_manager(ctx, |manager| {
        manager.update(&key, &value)?;
        println!("✓ Secret '{}' updated", key);
        Ok(())
    })
}

// ─── Get ─────────────────────────────────────────────────────────────────────

fn cmd_get(ctx: &Context, key: Option<String>) -> Result<()> {
    let key = key_or_prompt(key)?;

    with_manager(ctx, |manager| {
        match manager.retrieve(&key)? {
            Some(value) => println!("{}", value.as_str()),
            None => println!("Secret '{}' not found", key),
        }
        Ok(())
    })
}

// ─── Delete ──────────────────────────────────────────────────────────────────

fn cmd_delete(ctx: &Context, key: Option<String>, yes: bool) -> Result<()> {
    let key = key_or_prompt(key)?;

    if !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete secret '{}'?", key))
            .default(false)
            .interact()
            .map_err(|e| KeysafeError::Prompt(e.to_string()))?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    with_manager(ctx, |manager| {
        if manager.delete(&key)? {
            println!("✓ Secret '{}' deleted", key);
        } else {
            println!("Secret '{}' not found", key);
        }
        Ok(())
    })
}

// ─── List ────────────────────────────────────────────────────────────────────

fn cmd_list(ctx: &Context, json: bool) -> Result<()> {
    with_manager(ctx, |manager| {
        let records = manager.list_keys()?;

        if json {
            let rendered = serde_json::to_string_pretty(&records)
                .map_err(|e| KeysafeError::Other(format!("Failed to render JSON: {}", e)))?;
            println!("{}", rendered);
            return Ok(());
        }

        if records.is_empty() {
            println!("No secrets stored yet.");
            println!("Add one with: keysafe add --key <name>");
            return Ok(());
        }

        println!("Stored secrets ({}):\n", records.len());
        for record in &records {
            println!("  {}", record);
        }
        Ok(())
    })
}

// ─── Audit ───────────────────────────────────────────────────────────────────

fn cmd_audit(ctx: &Context, key: Option<String>, limit: usize) -> Result<()> {
    if ctx.config.store_backend != StoreBackend::Sqlite {
        return Err(KeysafeError::Other(
            "Audit history is only kept with the sqlite backend".to_string(),
        ));
    }

    let db = open_db(&ctx.config)?;
    let sink = SqliteAuditSink::new(&db);

    let entries = match key {
        Some(ref key) => sink.entries_for(key)?,
        None => sink.recent(limit)?,
    };

    if entries.is_empty() {
        match key {
            Some(key) => println!("No audit logs found for secret: {}", key),
            None => println!("No audit logs recorded yet."),
        }
        return Ok(());
    }

    println!("{:-<80}", "");
    for entry in entries {
        println!("{}", entry);
    }
    println!("{:-<80}", "");

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Build a `SecretManager` over the configured backend and run `f` with it.
///
/// The database (if any) lives for the duration of this call only.
fn with_manager<T>(ctx: &Context, f: impl FnOnce(&SecretManager<'_>) -> Result<T>) -> Result<T> {
    let cipher = AesGcmCipher::from_config(ctx.encryption_key.as_deref(), &ctx.config.key_salt)?;
    let cache: Option<Box<dyn Cache>> = if ctx.config.use_cache {
        Some(Box::new(MemoryCache::new(ctx.config.cache_capacity)))
    } else {
        None
    };
    let policy = CachePolicy {
        prefix: ctx.config.cache_prefix.clone(),
        ttl: ctx.config.cache_ttl(),
    };

    match ctx.config.store_backend {
        StoreBackend::Sqlite => {
            let db = open_db(&ctx.config)?;
            let audit: Option<Box<dyn AuditSink + '_>> = if ctx.config.use_log {
                Some(Box::new(SqliteAuditSink::new(&db)))
            } else {
                None
            };
            let manager = SecretManager::new(
                Box::new(cipher),
                Box::new(SqliteRecordStore::new(&db)),
                cache,
                audit,
                policy,
            );
            let manager = with_actor(manager, ctx);
            f(&manager)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the memory backend; secrets are discarded when the process exits");
            let audit: Option<Box<dyn AuditSink>> = if ctx.config.use_log {
                Some(Box::new(TracingAuditSink))
            } else {
                None
            };
            let manager = SecretManager::new(
                Box::new(cipher),
                Box::new(MemoryRecordStore::new()),
                cache,
                audit,
                policy,
            );
            let manager = with_actor(manager, ctx);
            f(&manager)
        }
    }
}

fn with_actor<'a>(manager: SecretManager<'a>, ctx: &Context) -> SecretManager<'a> {
    match ctx.actor {
        Some(ref actor) => manager.with_actor(actor.as_str()),
        None => manager,
    }
}

/// Open the configured database, which must already have been created by `init`.
fn open_db(config: &SecretsConfig) -> Result<Database> {
    let path = config.database_path();
    Database::open_existing(&path).map_err(|e| match e {
        StoreError::NotInitialized(_) => KeysafeError::Other(format!(
            "Database not found at {}. Run `keysafe init` first.",
            path.display()
        )),
        other => other.into(),
    })
}

fn key_or_prompt(key: Option<String>) -> Result<String> {
    match key {
        Some(key) => Ok(key),
        None => Input::<String>::new()
            .with_prompt("Key")
            .interact_text()
            .map_err(|e| KeysafeError::Prompt(e.to_string())),
    }
}

/// Values are read without echo.
fn value_or_prompt(value: Option<String>) -> Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Password::new()
            .with_prompt("Value")
            .interact()
            .map_err(|e| KeysafeError::Prompt(e.to_string())),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
