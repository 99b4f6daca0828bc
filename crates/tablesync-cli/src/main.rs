// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tablesync_app::{NotificationKind, Resource, SyncController, run_until_idle};
use tablesync_client::ResourceClient;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

const LOG_ENV: &str = "TABLESYNC_LOG";

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let interactive = !options.list_only && !options.check_only;
    init_logging(&options.config_path, interactive)?;

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `tablesync --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let url = config.resource_url(options.url.as_deref())?;
    let render = config.render_options();
    let mut client = ResourceClient::new(&url, &config.client_options()?).with_context(|| {
        format!(
            "invalid [resource] config in {}; fix url/timeout/csrf values",
            options.config_path.display()
        )
    })?;
    info!(url = %client.base_url(), timeout = ?client.timeout(), "starting");

    let (mut controller, events) = SyncController::initialize(client.base_url(), render);
    if !interactive {
        fetch_once(&mut controller, &mut client, events)?;
        if options.list_only {
            print!("{}", render_rows(&controller));
        } else {
            println!(
                "ok: {} rows from {}",
                controller.rows().len(),
                controller.resource_url()
            );
        }
        return Ok(());
    }

    tablesync_tui::run_app(controller, events, client)
}

/// Drives the initial refresh to completion and fails if it did not land.
fn fetch_once<R: Resource>(
    controller: &mut SyncController,
    resource: &mut R,
    events: Vec<tablesync_app::SyncEvent>,
) -> Result<()> {
    run_until_idle(controller, resource, events);
    if let Some(note) = controller.notification()
        && note.kind == NotificationKind::Error
    {
        bail!(
            "fetch {} failed: {}",
            controller.resource_url(),
            note.text.replace('\n', "; ")
        );
    }
    Ok(())
}

/// Tab-separated header plus one line per row.
fn render_rows(controller: &SyncController) -> String {
    let columns = controller.columns();
    let mut out = columns
        .iter()
        .map(|column| column.label())
        .collect::<Vec<_>>()
        .join("\t");
    out.push('\n');
    for row in controller.rows().rows() {
        let line = columns
            .iter()
            .map(|column| row.cell(&column.name))
            .collect::<Vec<_>>()
            .join("\t");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Interactive runs log to a file beside the config; the terminal belongs to
/// the table.
fn init_logging(config_path: &Path, interactive: bool) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV)
        .from_env()
        .with_context(|| format!("invalid {LOG_ENV} filter"))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = if interactive {
        let path = log_path(config_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open log file {}", path.display()))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        builder.with_writer(std::io::stderr).try_init()
    };
    installed.map_err(|error| anyhow!("install logger: {error}"))
}

fn log_path(config_path: &Path) -> PathBuf {
    config_path.with_file_name("tablesync.log")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    url: Option<String>,
    print_config_path: bool,
    print_example: bool,
    list_only: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        url: None,
        print_config_path: false,
        print_example: false,
        list_only: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--url requires a resource URL"))?;
                options.url = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--list" => {
                options.list_only = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("tablesync");
    println!("  --config <path>          Use a specific config path");
    println!("  --url <resource-url>     Override [resource].url");
    println!("  --list                   Fetch once and print rows as TSV");
    println!("  --check                  Validate config and fetch once");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, Config, fetch_once, log_path, parse_cli_args, render_rows};
    use anyhow::Result;
    use std::path::{Path, PathBuf};
    use tablesync_app::{ResourceError, SyncController};
    use tablesync_testkit::{MEALS_URL, StubResource, meal_options, seed_meals};

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/tablesync-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                url: None,
                print_config_path: false,
                print_example: false,
                list_only: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_and_url_overrides() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml", "--url", "http://h/meals"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        assert_eq!(options.url.as_deref(), Some("http://h/meals"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--url"], default_options_path())
            .expect_err("missing url value should fail");
        assert!(error.to_string().contains("--url requires"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_sets_mode_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--list", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.list_only);
        assert!(options.check_only);
        assert!(!options.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }

    #[test]
    fn log_file_sits_next_to_config() {
        assert_eq!(
            log_path(Path::new("/home/me/.config/tablesync/config.toml")),
            PathBuf::from("/home/me/.config/tablesync/tablesync.log")
        );
    }

    #[test]
    fn list_output_is_tab_separated_under_labels() -> Result<()> {
        let mut stub = StubResource::new(seed_meals(2));
        let (mut controller, events) = SyncController::initialize(MEALS_URL, meal_options());
        fetch_once(&mut controller, &mut stub, events)?;
        assert_eq!(
            render_rows(&controller),
            "Date/Time\tDescription\tCalories\n\
             2020-01-30T10:00\tBreakfast\t500\n\
             2020-01-30T16:00\tLunch\t1000\n"
        );
        Ok(())
    }

    #[test]
    fn fetch_once_reports_failed_refresh() {
        let mut stub = StubResource::new(Vec::new());
        stub.fail_next(ResourceError::from_response(503, "maintenance"));
        let (mut controller, events) = SyncController::initialize(MEALS_URL, meal_options());
        let error =
            fetch_once(&mut controller, &mut stub, events).expect_err("failed fetch should error");
        let message = error.to_string();
        assert!(message.contains("request failed (HTTP 503)"));
        assert!(message.contains("maintenance"));
    }

    #[test]
    fn missing_config_with_url_lists_first_row_columns() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let options = parse_cli_args(
            vec!["--url", "http://localhost:8080/rest/meals", "--list"],
            temp.path().join("config.toml"),
        )?;
        let config = Config::load(&options.config_path)?;
        let url = config.resource_url(options.url.as_deref())?;

        let mut stub = StubResource::new(seed_meals(1));
        let (mut controller, events) = SyncController::initialize(&url, config.render_options());
        fetch_once(&mut controller, &mut stub, events)?;
        assert_eq!(
            render_rows(&controller),
            "calories\tdateTime\tdescription\n500\t2020-01-30T10:00\tBreakfast\n"
        );
        Ok(())
    }
}
