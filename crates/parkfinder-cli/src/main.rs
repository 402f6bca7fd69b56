// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ParkFinder contributors

mod render;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use parkfinder_core::api::HttpBackend;
use parkfinder_core::config::Config;
use parkfinder_core::geo::{
    DeniedGeolocator, FixedGeolocator, GeoError, Geolocator, LatLon, SelectedLocation,
};
use parkfinder_core::insights::{default_state, find_state, InsightsDashboard};
use parkfinder_core::restrictions::{find_restriction_matches, render_explanation};
use parkfinder_core::runtime::Runtime;
use parkfinder_core::session::{
    Controller, Message, PredictionSession, RealtimeSession, UiEffect,
};
use parkfinder_core::time::parse_local_datetime;
use parkfinder_core::ValidationError;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const INTERACTIVE_HELP: &str = "\
Type to search. Commands:
  :pick N         select dropdown row N (0 is My Location)
  :enter          submit the field (empty field picks My Location on the prediction page)
  :pin LAT LON    use coordinates directly
  :at DATETIME    predict for a time, e.g. 2026-10-15T09:00
  :clear          reset the page
  :quit";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to config.json in the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(short, long, env = "PARKFINDER_BACKEND_URL", global = true)]
    backend: Option<String>,

    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PlaceArgs {
    /// Place to search for
    text: Option<String>,

    /// Dropdown row to select (0 is "My Location")
    #[arg(long, default_value_t = 1)]
    pick: usize,

    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Print popups as HTML fragments
    #[arg(long)]
    html: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up place suggestions
    Search { text: String },
    /// Bays that are free right now near a place
    Realtime {
        #[command(flatten)]
        place: PlaceArgs,
    },
    /// Predicted availability near a place at a future time
    Predict {
        #[command(flatten)]
        place: PlaceArgs,
        /// Local date and time, e.g. 2026-10-15T09:00 (defaults to the next quarter hour)
        #[arg(long)]
        at: Option<String>,
    },
    /// Vehicle ownership and population trends
    Insights {
        /// State name (defaults to Victoria)
        #[arg(long)]
        state: Option<String>,
    },
    /// Line-driven session against one page
    Interactive {
        #[arg(long, value_enum, default_value_t = Mode::Prediction)]
        mode: Mode,
    },
    /// Explain the restriction codes found in a sign text, e.g. "1P MP2P"
    Explain { text: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Realtime,
    Prediction,
}

/// "My Location" source: the configured home position, or a refusal.
enum HomeGeolocator {
    Fixed(FixedGeolocator),
    Denied(DeniedGeolocator),
}

impl HomeGeolocator {
    fn new(home: Option<LatLon>) -> Self {
        match home {
            Some(position) => HomeGeolocator::Fixed(FixedGeolocator(position)),
            None => HomeGeolocator::Denied(DeniedGeolocator),
        }
    }
}

impl Geolocator for HomeGeolocator {
    async fn locate(&self) -> Result<LatLon, GeoError> {
        match self {
            HomeGeolocator::Fixed(inner) => inner.locate().await,
            HomeGeolocator::Denied(inner) => inner.locate().await,
        }
    }
}

type AppRuntime = Runtime<HttpBackend, HomeGeolocator>;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => std::env::var("PARKFINDER_LOG")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(LevelFilter::Warn),
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("parkfinder")
        .build();
    // Only fails when a logger is already installed
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

fn connect(config: &Config) -> Result<(Arc<HttpBackend>, AppRuntime)> {
    info!("Using backend — url={}", config.backend_url);
    let backend = Arc::new(
        HttpBackend::new(&config.backend_url, config.request_timeout())
            .context("Failed to create backend client")?,
    );
    let geolocator = Arc::new(HomeGeolocator::new(config.home_location));
    let runtime = Runtime::new(Arc::clone(&backend), geolocator);
    Ok((backend, runtime))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_backend_override(cli.backend);

    match cli.command {
        Commands::Explain { text } => {
            for line in render_explanation(&find_restriction_matches(&text)) {
                println!("{line}");
            }
        }
        Commands::Search { text } => {
            let (_, mut runtime) = connect(&config)?;
            let mut session =
                RealtimeSession::new(config.search_options(false), config.initial_viewport());
            runtime.dispatch(&mut session, Message::Input(text));
            report(&runtime.settle(&mut session).await);
            render::print_rows(session.search().rows());
        }
        Commands::Realtime { place } => {
            let (_, mut runtime) = connect(&config)?;
            let mut session =
                RealtimeSession::new(config.search_options(false), config.initial_viewport());
            let html = place.html;
            report(&select_place(&mut runtime, &mut session, place).await?);
            report(&runtime.settle(&mut session).await);
            render::print_overlay(&session, html);
        }
        Commands::Predict { place, at } => {
            let (_, mut runtime) = connect(&config)?;
            let mut session =
                PredictionSession::new(config.search_options(true), config.initial_viewport());
            let html = place.html;
            let mut effects = select_place(&mut runtime, &mut session, place).await?;
            effects.extend(runtime.settle(&mut session).await);
            report(&effects);

            let Some(suggested) = effects.iter().find_map(|effect| match effect {
                UiEffect::OpenTimePicker { suggested } => Some(*suggested),
                UiEffect::Notice(_) => None,
            }) else {
                return Err(ValidationError::NoLocation.into());
            };

            runtime.dispatch(&mut session, Message::TimePickerOpened);
            let at = match at {
                Some(text) => parse_local_datetime(&text)?,
                None => suggested,
            };
            debug!("Committing prediction time — at={at}");
            report(&runtime.dispatch(&mut session, Message::TimeCommitted(at)));
            report(&runtime.settle(&mut session).await);
            render::print_overlay(&session, html);
        }
        Commands::Insights { state } => {
            let (backend, _) = connect(&config)?;
            let mut dashboard = InsightsDashboard::new(backend);
            let states = dashboard
                .load_states()
                .await
                .context("Failed to load states")?
                .to_vec();

            let chosen = match &state {
                Some(name) => find_state(&states, name)
                    .with_context(|| format!("Unknown state {name:?}"))?,
                None => default_state(&states).context("Backend listed no states")?,
            };
            let (vehicles, population) = dashboard
                .both(chosen.state_id)
                .await
                .with_context(|| format!("Failed to load trends for {}", chosen.state_name))?;

            println!("{}", chosen.state_name);
            println!();
            render::print_series(&vehicles);
            println!();
            render::print_series(&population);
        }
        Commands::Interactive { mode } => {
            let (_, mut runtime) = connect(&config)?;
            match mode {
                Mode::Realtime => {
                    let mut session = RealtimeSession::new(
                        config.search_options(false),
                        config.initial_viewport(),
                    );
                    interactive(&mut runtime, &mut session).await?;
                }
                Mode::Prediction => {
                    let mut session = PredictionSession::new(
                        config.search_options(true),
                        config.initial_viewport(),
                    );
                    interactive(&mut runtime, &mut session).await?;
                }
            }
        }
    }

    Ok(())
}

fn report(effects: &[UiEffect]) {
    for effect in effects {
        match effect {
            UiEffect::Notice(notice) => render::print_notice(notice),
            UiEffect::OpenTimePicker { suggested } => render::print_suggested_time(suggested),
        }
    }
}

/// Selects a location from `--lat/--lon` or by searching and picking a row.
async fn select_place<C: Controller>(
    runtime: &mut AppRuntime,
    session: &mut C,
    place: PlaceArgs,
) -> Result<Vec<UiEffect>> {
    let message = match (place.lat, place.lon, place.text) {
        (Some(lat), Some(lon), _) => Message::UseLocation(SelectedLocation::new(
            lat,
            lon,
            format!("{lat:.5}, {lon:.5}"),
        )),
        (_, _, Some(text)) => {
            runtime.dispatch(session, Message::Input(text));
            report(&runtime.settle(session).await);

            let rows = session.search().rows();
            if !rows.get(place.pick).is_some_and(|row| row.is_selectable()) {
                render::print_rows(rows);
                bail!("No selectable suggestion at row {}", place.pick);
            }
            Message::Pick(place.pick)
        }
        _ => bail!("Give a place to search for, or both --lat and --lon"),
    };
    Ok(runtime.dispatch(session, message))
}

enum LineCommand {
    Send(Message),
    Help,
    Quit,
}

fn parse_line(line: &str) -> Result<LineCommand> {
    let Some(rest) = line.trim().strip_prefix(':') else {
        return Ok(LineCommand::Send(Message::Input(line.to_string())));
    };
    let (verb, arg) = rest
        .split_once(char::is_whitespace)
        .map(|(verb, arg)| (verb, arg.trim()))
        .unwrap_or((rest, ""));

    let message = match verb {
        "quit" | "q" => return Ok(LineCommand::Quit),
        "help" | "h" => return Ok(LineCommand::Help),
        "pick" | "p" => Message::Pick(
            arg.parse()
                .with_context(|| format!("Not a row number: {arg:?}"))?,
        ),
        "enter" => Message::Submit,
        "clear" => Message::Clear,
        "at" => Message::TimeCommitted(parse_local_datetime(arg)?),
        "pin" => {
            let mut parts = arg.split_whitespace().map(str::parse::<f64>);
            let (Some(Ok(lat)), Some(Ok(lon)), None) = (parts.next(), parts.next(), parts.next())
            else {
                bail!("Usage: :pin LAT LON");
            };
            Message::UseLocation(SelectedLocation::new(lat, lon, format!("{lat:.5}, {lon:.5}")))
        }
        other => bail!("Unknown command :{other} (try :help)"),
    };
    Ok(LineCommand::Send(message))
}

async fn interactive<C: Controller>(runtime: &mut AppRuntime, session: &mut C) -> Result<()> {
    println!("{INTERACTIVE_HELP}");
    render::print_status(session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let (effects, quiet) = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(LineCommand::Send(message)) => (runtime.dispatch(session, message), false),
                    Ok(LineCommand::Help) => {
                        println!("{INTERACTIVE_HELP}");
                        continue;
                    }
                    Ok(LineCommand::Quit) => break,
                    Err(e) => {
                        eprintln!("{e:#}");
                        continue;
                    }
                }
            }
            Some(message) = runtime.recv() => {
                let quiet = matches!(message, Message::DebounceElapsed(_));
                (runtime.dispatch(session, message), quiet)
            }
        };

        for effect in &effects {
            if let UiEffect::OpenTimePicker { .. } = effect {
                runtime.dispatch(session, Message::TimePickerOpened);
            }
        }
        report(&effects);
        if !quiet {
            render::print_status(session);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_input() {
        match parse_line("Flinders").unwrap() {
            LineCommand::Send(Message::Input(text)) => assert_eq!(text, "Flinders"),
            _ => panic!("expected input"),
        }
    }

    #[test]
    fn test_colon_commands() {
        assert!(matches!(
            parse_line(":pick 2").unwrap(),
            LineCommand::Send(Message::Pick(2))
        ));
        assert!(matches!(parse_line(":q").unwrap(), LineCommand::Quit));
        assert!(matches!(
            parse_line(":clear").unwrap(),
            LineCommand::Send(Message::Clear)
        ));
        assert!(matches!(
            parse_line(":at 2030-01-01T09:00").unwrap(),
            LineCommand::Send(Message::TimeCommitted(_))
        ));
        match parse_line(":pin -37.81 144.96").unwrap() {
            LineCommand::Send(Message::UseLocation(location)) => {
                assert_eq!(location.position(), LatLon::new(-37.81, 144.96));
            }
            _ => panic!("expected a pinned location"),
        }
    }

    #[test]
    fn test_bad_commands_are_errors() {
        assert!(parse_line(":pick two").is_err());
        assert!(parse_line(":pin 1").is_err());
        assert!(parse_line(":fly").is_err());
    }

    #[test]
    fn test_bad_time_is_reported() {
        let err = match parse_line(":at soon") {
            Err(err) => err,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.to_string().contains("Use YYYY-MM-DDTHH:MM"));
    }

    #[test]
    fn test_html_flag() {
        let cli = Cli::try_parse_from(["parkfinder", "realtime", "Flinders", "--html"]).unwrap();
        match cli.command {
            Commands::Realtime { place } => {
                assert!(place.html);
                assert_eq!(place.text.as_deref(), Some("Flinders"));
            }
            _ => panic!("expected realtime"),
        }
    }

    #[test]
    fn test_cli_parses_place_args() {
        let cli = Cli::try_parse_from([
            "parkfinder", "predict", "--lat", "-37.81", "--lon", "144.96", "--at",
            "2030-01-01T09:00",
        ])
        .unwrap();
        match cli.command {
            Commands::Predict { place, at } => {
                assert_eq!(place.lat, Some(-37.81));
                assert!(!place.html);
                assert_eq!(at.as_deref(), Some("2030-01-01T09:00"));
            }
            _ => panic!("expected predict"),
        }
    }
}
