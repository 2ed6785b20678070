#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
//! `winch` binary: config loading, logging setup, and dispatch to the
//! control loop.

mod cli;
mod error_fmt;
mod logging;
mod rt;
mod run;

use clap::Parser;
use cli::{Cli, Commands, RtLock};
use eyre::WrapErr;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();

    let text = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("read config {}", args.config.display()))?;
    let cfg = winch_config::load_toml(&text)
        .wrap_err_with(|| format!("parse config {}", args.config.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("validate config {}", args.config.display()))?;

    // the config file may pin a level; an explicit CLI flag wins
    let level = if args.log_level == "info" {
        cfg.logging.level.clone().unwrap_or(args.log_level.clone())
    } else {
        args.log_level.clone()
    };
    logging::init(&level, args.json, cfg.logging.file.as_deref())?;

    match args.cmd {
        Commands::Run {
            sim,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            rt::setup_rt_once(rt, rt_prio, rt_lock.unwrap_or_else(RtLock::os_default), rt_cpu);
            let shutdown = run::install_shutdown_handler()?;
            if let Err(err) = run::run(&cfg, sim, shutdown) {
                eprintln!("{}", error_fmt::humanize(&err));
                return Err(err);
            }
            Ok(())
        }
        Commands::Check => {
            let hardware_built = cfg!(all(feature = "hardware", target_os = "linux"));
            println!(
                "config ok: {} (hardware support: {})",
                args.config.display(),
                if hardware_built { "built in" } else { "sim only" }
            );
            Ok(())
        }
    }
}
