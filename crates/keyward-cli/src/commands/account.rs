//! Account commands.
//!
//! Provides `keyward import|list|show|select|sign|verify-password|remove`
//! on top of the `keyward-accounts` registry. Each invocation is its own
//! session: `sign` unlocks, signs and locks again before exiting.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use keyward_accounts::{Account, AccountRegistry, DisplayAccount, ExportedKeypair};
use keyward_core::{Config, SecretString};
use tracing::debug;
use zeroize::Zeroizing;

/// Where to read a password from.
#[derive(Args, Debug, Default)]
pub struct PasswordArgs {
    /// Read the password from this environment variable instead of prompting
    #[arg(long, value_name = "VAR")]
    pub password_env: Option<String>,
}

#[derive(clap::Subcommand)]
pub enum AccountCommand {
    /// Import an exported keypair (JSON) and encrypt it under a password
    Import {
        /// File holding `{"schema":"ED25519","privateKey":"..."}` (stdin if omitted or `-`)
        file: Option<PathBuf>,

        /// Make the imported account the selected one
        #[arg(long)]
        select: bool,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// List accounts
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one account (the selected one by default)
    Show {
        /// Account id or address
        account: Option<String>,
    },

    /// Make an account the selected one
    Select {
        /// Account id or address
        account: String,
    },

    /// Unlock an account, sign a message, and lock it again
    Sign {
        /// Message to sign (UTF-8 unless --hex)
        message: String,

        /// Treat the message as hex-encoded bytes
        #[arg(long)]
        hex: bool,

        /// Account id or address (the selected one by default)
        #[arg(short, long)]
        account: Option<String>,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Check an account password without unlocking
    VerifyPassword {
        /// Account id or address (the selected one by default)
        #[arg(short, long)]
        account: Option<String>,

        #[command(flatten)]
        password: PasswordArgs,
    },

    /// Delete an account and its encrypted key material
    Remove {
        /// Account id or address
        account: String,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// Run an account command.
pub async fn run(command: AccountCommand, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = Config::load_or_default_from(config_path)?;
    config.validate()?;
    let registry = AccountRegistry::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize account store: {}", e))?;
    debug!(
        iterations = config.cipher.iterations,
        auto_lock = ?config.auto_lock(),
        "account registry ready"
    );

    match command {
        AccountCommand::Import {
            file,
            select,
            password,
        } => {
            let raw = read_key_source(file.as_deref())?;
            let exported = ExportedKeypair::from_json(raw.trim())?;
            let password = read_password(&password, "New account password: ", true)?;
            if password.is_empty() {
                anyhow::bail!("Password must not be empty");
            }

            let display = registry.create_imported(exported, &password).await?;
            if select {
                registry.select(&display.id).await?;
            }

            println!("Imported account {}", style(&display.address).bold());
            println!("  id: {}", display.id);
        }

        AccountCommand::List { json } => {
            let accounts = registry.list().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
            } else if accounts.is_empty() {
                println!("No accounts. Run 'keyward import' to add one.");
            } else {
                println!("  {:<38} {:<68} {}", "ID", "ADDRESS", "LAST UNLOCKED");
                println!("{}", "-".repeat(124));
                for account in &accounts {
                    let marker = if account.selected {
                        style("*").green().to_string()
                    } else {
                        " ".to_string()
                    };
                    println!(
                        "{} {:<38} {:<68} {}",
                        marker,
                        account.id,
                        account.address,
                        last_unlocked(account)
                    );
                }
                println!("\n{} account(s) total.", accounts.len());
            }
        }

        AccountCommand::Show { account } => {
            let account = resolve(&registry, account.as_deref()).await?;
            let display = account.to_display_serialized().await?;
            println!("{}", serde_json::to_string_pretty(&display)?);
        }

        AccountCommand::Select { account } => {
            let account = registry.resolve(&account).await?;
            registry.select(account.id()).await?;
            println!("Selected account '{}'.", account.id());
        }

        AccountCommand::Sign {
            message,
            hex,
            account,
            password,
        } => {
            let data = if hex {
                hex::decode(message.trim_start_matches("0x"))
                    .map_err(|e| anyhow::anyhow!("Invalid hex message: {}", e))?
            } else {
                message.into_bytes()
            };

            let account = resolve(&registry, account.as_deref()).await?;
            if !account.can_sign() {
                anyhow::bail!("Account '{}' cannot sign", account.id());
            }
            let password = read_password(&password, "Account password: ", false)?;

            account.unlock(&password).await?;
            let signed = account.sign_data(&data).await;
            account.lock(false).await?;

            println!("{}", signed?);
        }

        AccountCommand::VerifyPassword { account, password } => {
            let account = resolve(&registry, account.as_deref()).await?;
            let password = read_password(&password, "Account password: ", false)?;

            account.verify_password(&password).await?;
            println!("Password is correct.");
        }

        AccountCommand::Remove { account, yes } => {
            let account = registry.resolve(&account).await?;
            if !yes {
                anyhow::bail!(
                    "Refusing to remove '{}' without --yes. Its key material cannot be recovered.",
                    account.id()
                );
            }
            registry.remove(account.id()).await?;
            println!("Account '{}' removed.", account.id());
        }
    }

    Ok(())
}

/// The named account, or the selected one when no name is given.
async fn resolve(registry: &AccountRegistry, account: Option<&str>) -> anyhow::Result<Account> {
    match account {
        Some(key) => Ok(registry.resolve(key).await?),
        None => registry.selected().await?.ok_or_else(|| {
            anyhow::anyhow!("No account selected. Pass an account id or address, or run 'keyward select'.")
        }),
    }
}

fn read_password(
    source: &PasswordArgs,
    prompt: &str,
    confirm: bool,
) -> anyhow::Result<SecretString> {
    if let Some(var) = &source.password_env {
        return SecretString::from_env(var)
            .ok_or_else(|| anyhow::anyhow!("Environment variable '{}' is not set", var));
    }

    let password = SecretString::new(
        rpassword::prompt_password(prompt)
            .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?,
    );
    if confirm {
        let again = SecretString::new(
            rpassword::prompt_password("Repeat password: ")
                .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))?,
        );
        if again != password {
            anyhow::bail!("Passwords do not match");
        }
    }
    Ok(password)
}

fn read_key_source(file: Option<&Path>) -> anyhow::Result<Zeroizing<String>> {
    let mut raw = Zeroizing::new(String::new());
    match file {
        Some(path) if path != Path::new("-") => {
            *raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        }
        _ => {
            std::io::stdin()
                .read_to_string(&mut raw)
                .map_err(|e| anyhow::anyhow!("Failed to read key from stdin: {}", e))?;
        }
    }
    Ok(raw)
}

fn last_unlocked(account: &DisplayAccount) -> String {
    account
        .last_unlocked_on
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}
