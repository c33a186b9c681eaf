// Command dispatcher: maps each CLI verb onto the config store, archiver,
// submission client and renderer, and turns the outcome into an exit code.

use anyhow::Result;
use crossterm::style::Color;
use crossterm::tty::IsTty;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

use crate::api::{ApiClient, SubmissionRequest};
use crate::archive::create_archive;
use crate::cli::{AnalyzeArgs, Cli, Commands, ConfigArgs, InitArgs};
use crate::config::{
    default_config_path, ConfigStore, Settings, DEFAULT_SERVER_URL, KEY_API_KEY, KEY_DEVELOPER_EMAIL,
    KEY_DEVELOPER_NAME, KEY_SERVER_URL,
};
use crate::error::AliceError;
use crate::model::AnalysisResult;
use crate::report::{render_failure, render_report, Outcome};
use crate::ui::{self, InitAnswers, InitAnswersPrefill, Palette, Spinner, API_KEY_PREFIX};

/// Run one CLI invocation and return the process exit code.
pub fn run(cli: Cli) -> u8 {
    // An unreadable file must not block the verbs that repair it.
    let store = if rewrites_config(&cli.command) {
        Ok(ConfigStore::open_or_reset(default_config_path()))
    } else {
        ConfigStore::open_default()
    };
    let result = store.and_then(|mut store| match cli.command {
        Commands::Init(args) => init(args, &mut store),
        Commands::Analyze(args) => analyze(&args, &store),
        Commands::Status => status(&store),
        Commands::Config(args) => config(args, &mut store),
    });
    match result {
        Ok(code) => code,
        Err(err) => {
            let palette = Palette::for_stdout();
            let mut stderr = std::io::stderr().lock();
            let _ = match err.downcast_ref::<AliceError>() {
                Some(alice) => render_failure(&mut stderr, alice, &palette),
                None => writeln!(stderr, "{} {err:#}", palette.paint("Error:", Color::Red)),
            };
            1
        }
    }
}

/// `alice init`: prompt (or read flags/env) and persist the answers.
pub fn init(args: InitArgs, store: &mut ConfigStore) -> Result<u8> {
    let non_interactive = args.non_interactive
        || std::env::var_os("CI").is_some()
        || !std::io::stdin().is_tty();
    let prefill = InitAnswersPrefill {
        api_key: non_empty(args.api_key),
        server_url: non_empty(args.server_url),
        developer_name: non_empty(args.name),
        developer_email: non_empty(args.email),
    };

    let answers = if non_interactive {
        resolve_non_interactive(prefill, store)?
    } else {
        let palette = Palette::for_stdout();
        println!("{}", palette.bold_color("\nALICE SDK Configuration\n", Color::Cyan));
        ui::prompt_init(&prefill, &store.get_or(KEY_SERVER_URL, DEFAULT_SERVER_URL))?
    };

    store.set(KEY_API_KEY, answers.api_key);
    store.set(KEY_SERVER_URL, answers.server_url);
    store.set(KEY_DEVELOPER_NAME, answers.developer_name);
    store.set(KEY_DEVELOPER_EMAIL, answers.developer_email);
    store.save()?;
    info!(path = %store.path().display(), "configuration saved");

    let palette = Palette::for_stdout();
    println!("{}", palette.paint("\n✓ Configuration saved successfully!\n", Color::Green));
    Ok(0)
}

/// Whether the verb writes the config file and so can recover a corrupt one.
fn rewrites_config(command: &Commands) -> bool {
    match command {
        Commands::Init(_) => true,
        Commands::Config(args) => args.set_key.is_some() || args.set_server.is_some(),
        Commands::Analyze(_) | Commands::Status => false,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fill init answers from flags/env, falling back to what is already stored.
pub fn resolve_non_interactive(
    prefill: InitAnswersPrefill,
    store: &ConfigStore,
) -> Result<InitAnswers, AliceError> {
    let api_key = prefill.api_key.ok_or_else(|| {
        AliceError::Configuration(
            "no API key provided; pass --api-key or set ALICE_API_KEY".into(),
        )
    })?;
    if !api_key.starts_with(API_KEY_PREFIX) {
        warn!("API key does not start with {API_KEY_PREFIX}; saving it anyway");
    }
    Ok(InitAnswers {
        api_key,
        server_url: prefill
            .server_url
            .unwrap_or_else(|| store.get_or(KEY_SERVER_URL, DEFAULT_SERVER_URL)),
        developer_name: prefill
            .developer_name
            .or_else(|| store.get(KEY_DEVELOPER_NAME))
            .unwrap_or_default(),
        developer_email: prefill
            .developer_email
            .or_else(|| store.get(KEY_DEVELOPER_EMAIL))
            .unwrap_or_default(),
    })
}

/// `alice analyze`: archive, upload, render, gate.
pub fn analyze(args: &AnalyzeArgs, store: &ConfigStore) -> Result<u8> {
    let settings = Settings::resolve(store, args.timeout)?;
    let palette = Palette::for_stdout();

    let spinner = Spinner::start("Preparing code for analysis...", args.silent);
    let outcome = match run_pipeline(&args.path, &settings, &spinner) {
        Ok(result) => {
            spinner.succeed("Analysis complete!");
            Outcome::Completed(result)
        }
        Err(err) => {
            spinner.fail("Analysis failed");
            Outcome::Failed(err)
        }
    };

    present(
        &outcome,
        args.silent,
        &palette,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    );
    Ok(outcome.exit_code())
}

/// Print the outcome. Output is best effort: a closed or failing stream
/// (e.g. `alice analyze | head -1`) is logged and never changes the verdict.
pub fn present(
    outcome: &Outcome,
    silent: bool,
    palette: &Palette,
    out: &mut impl Write,
    err_out: &mut impl Write,
) {
    let written = match outcome {
        Outcome::Completed(result) => {
            info!(
                analysis_id = %result.analysis_id,
                status = %result.deployment_status,
                score = result.quality_score,
                "analysis finished"
            );
            if silent {
                if result.is_blocked() {
                    warn!(analysis_id = %result.analysis_id, "deployment blocked");
                }
                Ok(())
            } else {
                render_report(out, result, palette)
            }
        }
        Outcome::Failed(err) => render_failure(err_out, err, palette),
    };
    if let Err(e) = written {
        warn!(error = %e, "could not write analysis output");
    }
}

/// The three sequential stages. The archive is removed before returning,
/// whatever the upload outcome.
pub fn run_pipeline(
    source: &Path,
    settings: &Settings,
    spinner: &Spinner,
) -> Result<AnalysisResult, AliceError> {
    settings.require_api_key()?;
    let client = ApiClient::from_settings(settings).map_err(|e| AliceError::Transport {
        status: None,
        message: format!("{e:#}"),
        payload: None,
    })?;

    spinner.set_message("Creating archive...");
    let archive = create_archive(source)?;
    info!(
        entries = archive.entry_count(),
        bytes = archive.size_bytes(),
        "archive created"
    );

    spinner.set_message("Uploading to ALICE server...");
    let result = SubmissionRequest::new(&archive, settings).and_then(|req| client.submit(&req));

    if let Err(e) = archive.close() {
        warn!(error = %e, "failed to remove temporary archive");
    }
    result
}

/// `alice status`: show config, or exit 1 when there is no API key.
pub fn status(store: &ConfigStore) -> Result<u8> {
    let settings = Settings::from_store(store)?;
    let palette = Palette::for_stdout();
    let mut stdout = std::io::stdout().lock();
    if !settings.is_configured() {
        ui::print_not_configured(&mut stdout, &palette)?;
        return Ok(1);
    }
    ui::show_config(&mut stdout, &settings, &palette)?;
    Ok(0)
}

/// `alice config`: update key and/or server, then optionally show.
pub fn config(args: ConfigArgs, store: &mut ConfigStore) -> Result<u8> {
    let palette = Palette::for_stdout();
    let mut stdout = std::io::stdout().lock();
    let mut changed = false;

    if let Some(key) = &args.set_key {
        let key = key.trim();
        if key.is_empty() {
            return Err(AliceError::Configuration("API key must not be empty".into()).into());
        }
        store.set(KEY_API_KEY, key);
        changed = true;
    }
    if let Some(url) = &args.set_server {
        let url = url.trim();
        if url.is_empty() {
            return Err(AliceError::Configuration("server URL must not be empty".into()).into());
        }
        store.set(KEY_SERVER_URL, url);
        changed = true;
    }

    if changed {
        store.save()?;
        if args.set_key.is_some() {
            writeln!(stdout, "{}", palette.paint("✓ API key updated", Color::Green))?;
        }
        if args.set_server.is_some() {
            writeln!(stdout, "{}", palette.paint("✓ Server URL updated", Color::Green))?;
        }
    }

    if args.show || !changed {
        let settings = Settings::from_store(store)?;
        ui::show_config(&mut stdout, &settings, &palette)?;
    }
    Ok(0)
}
