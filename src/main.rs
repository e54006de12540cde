// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{LevelFilter, info};
use rand::Rng;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use campanile::app_state::AppState;
use campanile::config::{CONFIG_FILE_NAME, Config, ValidatedConfig};
use campanile::iam::{JwtAuthMiddlewareFactory, Role, UserServices};
use campanile::runtime_paths::RuntimePaths;
use campanile::{admin, public};

fn main() {
    std::process::exit(run());
}

fn run() -> i32 {
    let root = match parse_args() {
        Ok(root) => root,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if let Err(error) = write_default_config_if_missing(&root) {
        eprintln!("❌ Bootstrap error: {}", error);
        return 1;
    }

    let validated_config = match Config::load_and_validate(&root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    init_logging(&validated_config);

    match System::new().block_on(run_server(root, validated_config)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

/// The only accepted flag is `-C <root>`; the runtime root defaults to the
/// current directory.
fn parse_args() -> Result<PathBuf, String> {
    let mut root = PathBuf::from(".");
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-C" => match args.next() {
                Some(value) => root = PathBuf::from(value),
                None => return Err("-C requires a directory argument".to_string()),
            },
            other => return Err(format!("Unknown argument '{}'", other)),
        }
    }
    Ok(root)
}

/// First run: write a config file with a freshly generated JWT secret so
/// the server can boot without manual editing.
fn write_default_config_if_missing(root: &Path) -> Result<(), String> {
    let path = root.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Ok(());
    }
    std::fs::create_dir_all(root)
        .map_err(|err| format!("Failed to create {}: {}", root.display(), err))?;

    let secret: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(48)
        .map(char::from)
        .collect();
    let content = format!(
        "auth:\n  jwt:\n    secret: \"{}\"\n",
        secret
    );
    std::fs::write(&path, content)
        .map_err(|err| format!("Failed to write {}: {}", path.display(), err))?;
    eprintln!("[bootstrap] created {} with a generated JWT secret", path.display());
    Ok(())
}

fn init_logging(config: &ValidatedConfig) {
    let log_level = match config.logging.level.as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// First run: an empty account list gets a seeded admin whose generated
/// password is printed once to stderr.
fn seed_admin_if_empty(users: &UserServices) -> Result<(), String> {
    if users.count() > 0 {
        return Ok(());
    }
    let password: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(20)
        .map(char::from)
        .collect();
    users
        .create_user("admin@localhost", "Administrator", Some(&password), Role::Admin)
        .map_err(|err| err.to_string())?;
    eprintln!("[bootstrap] created admin@localhost with password: {}", password);
    Ok(())
}

async fn run_server(root: PathBuf, validated_config: ValidatedConfig) -> std::io::Result<()> {
    let config = Arc::new(validated_config);
    let runtime_paths = RuntimePaths::from_root(&root)
        .map_err(|err| std::io::Error::other(err.to_string()))?;

    let user_services = UserServices::from_file(&config, runtime_paths.users_file.clone())
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    seed_admin_if_empty(&user_services).map_err(std::io::Error::other)?;
    let user_services = Arc::new(user_services);

    let app_state = Arc::new(
        AppState::new(config.clone(), runtime_paths).map_err(std::io::Error::other)?,
    );

    let host = config.server.host.clone();
    let port = config.server.port;
    let workers = config.server.workers;
    let admin_path = config.admin.path.clone();

    info!("Starting {} on {}:{}", config.app.name, host, port);
    info!("Manage surface mounted at {}", admin_path);

    let config_for_app = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(config_for_app.clone()))
            .app_data(web::Data::from(app_state.clone()))
            .app_data(web::Data::from(user_services.clone()))
            .wrap(Logger::new("%a \"%r\" %s %b %Dms"))
            .wrap(JwtAuthMiddlewareFactory)
            .service(admin::manage_scope(&admin_path))
            .configure(public::configure)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
