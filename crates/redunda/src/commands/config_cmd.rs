//! Config subcommand handlers.

use redunda_config::{self as config, Profile};
use redunda_core::files::codec;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, InitArgs};
use crate::config::active_profile_name;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load_config()?;
            for profile in cfg.profiles.values_mut() {
                if profile.api_key.is_some() {
                    profile.api_key = Some(REDACTED.into());
                }
            }

            let toml_str = toml::to_string_pretty(&cfg).map_err(|e| CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            })?;
            let out = output::render_single(
                &global.output,
                &cfg,
                |_| toml_str.trim_end().to_owned(),
                |c| c.profile_names().join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Init ────────────────────────────────────────────────────
        ConfigCommand::Init(init) => handle_init(init, global),
    }
}

fn handle_init(args: InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;
    let profile_name = global.profile.clone().unwrap_or_else(|| {
        if cfg.profiles.is_empty() {
            "default".into()
        } else {
            active_profile_name(global, &cfg)
        }
    });

    if cfg.profiles.contains_key(&profile_name) && !args.force {
        return Err(CliError::Validation {
            field: "profile".into(),
            reason: format!("profile '{profile_name}' already exists, pass --force to replace it"),
        });
    }

    for file in &args.track {
        codec::check_identifier(file)?;
    }

    // API key: keyring, plaintext, or neither (env var at runtime)
    let api_key = match (&global.api_key, args.keyring) {
        (Some(key), true) => {
            config::store_api_key(&profile_name, key)?;
            eprintln!("   ✓ API key stored in system keyring");
            None
        }
        (None, true) => {
            return Err(CliError::Validation {
                field: "keyring".into(),
                reason: "--keyring needs a key to store, pass --api-key".into(),
            });
        }
        (key, false) => key.clone(),
    };
    if api_key.is_none() && args.api_key_env.is_none() && !args.keyring {
        eprintln!("   ! No API key configured; pass --api-key at runtime or set REDUNDA_API_KEY");
    }

    let endpoint = global
        .endpoint
        .as_deref()
        .map(|raw| config::parse_endpoint(raw).map(|_| raw.to_owned()))
        .transpose()?;

    let profile = Profile {
        endpoint,
        api_key,
        api_key_env: args.api_key_env,
        bot_version: global.bot_version.clone(),
        tracked_files: args.track,
        timeout: global.timeout,
        ..Profile::default()
    };

    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(profile_name.clone());
    }
    cfg.profiles.insert(profile_name.clone(), profile);

    let path = config::save_config(&cfg)?;
    eprintln!("✓ Configuration written to {}", path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Test it: redunda status --profile {profile_name}");
    Ok(())
}
