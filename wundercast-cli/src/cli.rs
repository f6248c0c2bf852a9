use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use wundercast_core::{
    ACCURACY_THRESHOLD_METERS, Config, LocationConfig, LocationSample, ManualLocationProvider,
    MapToggle, Orchestrator, ProviderId, WeatherLabels,
    provider::{default_provider_from_config, provider_from_config},
    view::bind,
};

use crate::terminal::{TerminalView, format_labels};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wundercast", version, about = "Current weather by city or position")]
pub struct Cli {
    /// Use this provider instead of the configured default.
    #[arg(long, global = true)]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        #[arg(id = "name", value_name = "PROVIDER")]
        provider: String,

        /// API key; prompted for when absent.
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Store the position used for location lookups.
    SetLocation {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Horizontal accuracy in meters.
        #[arg(long, default_value_t = 10.0)]
        accuracy: f64,
    },

    /// Show current weather once.
    Show {
        /// City name.
        #[arg(required_unless_present = "here")]
        city: Option<String>,

        /// Look up the current position instead of a city.
        #[arg(long, conflicts_with = "city")]
        here: bool,

        #[command(flatten)]
        position: PositionArgs,
    },

    /// Interactive session: type a city, `:geo`, `:map` or `:quit`.
    Run {
        #[command(flatten)]
        position: PositionArgs,
    },
}

/// Position override for location lookups; falls back to the configured one.
#[derive(Debug, Clone, clap::Args)]
pub struct PositionArgs {
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,
    #[arg(long)]
    pub accuracy: Option<f64>,
}

impl PositionArgs {
    fn resolve(&self, config: &Config) -> Option<LocationSample> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(LocationSample::new(
                lat,
                lon,
                self.accuracy.unwrap_or(0.0),
            )),
            _ => config.location_sample().map(|mut sample| {
                if let Some(accuracy) = self.accuracy {
                    sample.accuracy_meters = accuracy;
                }
                sample
            }),
        }
    }
}

/// A screen session: orchestrator plus the position source feeding it.
struct Session {
    orchestrator: Orchestrator,
    location: Arc<ManualLocationProvider>,
    position: Option<LocationSample>,
    locates: usize,
}

impl Session {
    fn start(cli_provider: Option<&str>, config: &Config, position: &PositionArgs) -> Result<Self> {
        let provider = match cli_provider {
            Some(name) => provider_from_config(ProviderId::try_from(name)?, config)?,
            None => default_provider_from_config(config)?,
        };
        tracing::debug!("Starting weather session");
        let location = Arc::new(ManualLocationProvider::new());
        let orchestrator = Orchestrator::spawn(provider, location.clone());

        Ok(Self { orchestrator, location, position: position.resolve(config), locates: 0 })
    }

    /// Trigger a location lookup and feed it the session's position.
    async fn locate(&mut self) -> Result<()> {
        let sample = self.position.ok_or_else(|| {
            anyhow!(
                "No position available.\n\
                 Hint: pass --lat/--lon or run `wundercast set-location --lat <LAT> --lon <LON>`."
            )
        })?;
        if !sample.is_qualifying() {
            bail!(
                "Position accuracy {}m is too coarse; it must be below {}m.",
                sample.accuracy_meters,
                ACCURACY_THRESHOLD_METERS
            );
        }

        tracing::debug!("Feeding position ({}, {})", sample.latitude, sample.longitude);
        if !self.orchestrator.locate() {
            bail!("Weather lookups have stopped; restart the session.");
        }
        self.locates += 1;
        self.location.wait_for_starts(self.locates).await;
        self.location.push(sample);
        Ok(())
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure { provider, api_key } => configure(&provider, api_key),
            Command::SetLocation { lat, lon, accuracy } => set_location(lat, lon, accuracy),
            Command::Show { city, here, position } => {
                let config = Config::load()?;
                let mut session = Session::start(self.provider.as_deref(), &config, &position)?;
                show(&mut session, city, here).await
            }
            Command::Run { position } => {
                let config = Config::load()?;
                let session = Session::start(self.provider.as_deref(), &config, &position)?;
                interactive(session).await
            }
        }
    }
}

fn configure(provider: &str, api_key: Option<String>) -> Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = match api_key {
        Some(key) => key,
        None => inquire::Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .with_display_mode(inquire::PasswordDisplayMode::Masked)
            .prompt()
            .context("Failed to read API key")?,
    };
    let api_key = api_key.trim().to_string();
    if api_key.is_empty() {
        bail!("API key must not be empty.");
    }

    config.upsert_provider_api_key(id, api_key);
    config.save()?;

    println!("Stored API key for {id} in {}", Config::config_file_path()?.display());
    Ok(())
}

fn set_location(latitude: f64, longitude: f64, accuracy_meters: f64) -> Result<()> {
    let mut config = Config::load()?;
    config.location = Some(LocationConfig { latitude, longitude, accuracy_meters });
    config.save()?;

    println!("Stored position ({latitude}, {longitude}) ±{accuracy_meters}m");
    Ok(())
}

async fn show(session: &mut Session, city: Option<String>, here: bool) -> Result<()> {
    let mut results = session.orchestrator.results();

    if here {
        session.locate().await?;
    } else {
        let city = city.unwrap_or_default();
        if !session.orchestrator.search_city(city) {
            bail!("City name must not be empty.");
        }
    }

    let result = results.recv().await.context("Lookup ended without a result")?;
    println!("{}", format_labels(&WeatherLabels::from(&result)));
    Ok(())
}

async fn interactive(mut session: Session) -> Result<()> {
    let view = Arc::new(TerminalView::default());
    let _binding = bind(&session.orchestrator, view.clone());
    let mut map = MapToggle::default();

    println!("Type a city name, :geo for your position, :map to toggle the map, :quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match line.trim() {
            ":quit" | ":q" => break,
            ":map" => {
                map.toggle(view.as_ref());
            }
            ":geo" => {
                if let Err(e) = session.locate().await {
                    eprintln!("{e}");
                }
            }
            text => {
                session.orchestrator.search_city(text);
            }
        }
    }

    session.orchestrator.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_show_city() {
        let cli = Cli::try_parse_from(["wundercast", "show", "Paris"]).unwrap();
        match cli.command {
            Command::Show { city, here, .. } => {
                assert_eq!(city.as_deref(), Some("Paris"));
                assert!(!here);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn configure_positional_does_not_fill_global_provider() {
        let cli = Cli::try_parse_from(["wundercast", "configure", "openweather"]).unwrap();
        assert_eq!(cli.provider, None);
        match cli.command {
            Command::Configure { provider, .. } => assert_eq!(provider, "openweather"),
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from([
            "wundercast",
            "--provider",
            "weatherapi",
            "configure",
            "openweather",
        ])
        .unwrap();
        assert_eq!(cli.provider.as_deref(), Some("weatherapi"));
    }

    #[tokio::test]
    async fn locate_fails_once_lookups_have_stopped() {
        let mut config = Config::default();
        config.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());
        let position = PositionArgs { lat: Some(1.0), lon: Some(2.0), accuracy: None };

        let mut session = Session::start(None, &config, &position).unwrap();
        session.orchestrator.stop().await;

        let err = tokio::time::timeout(std::time::Duration::from_secs(2), session.locate())
            .await
            .expect("locate must not hang")
            .unwrap_err();
        assert!(err.to_string().contains("stopped"));
        assert_eq!(session.locates, 0);
    }

    #[test]
    fn show_requires_city_or_here() {
        assert!(Cli::try_parse_from(["wundercast", "show"]).is_err());
        assert!(Cli::try_parse_from(["wundercast", "show", "--here"]).is_ok());
    }

    #[test]
    fn lat_requires_lon() {
        assert!(Cli::try_parse_from(["wundercast", "run", "--lat", "1.0"]).is_err());
        assert!(Cli::try_parse_from(["wundercast", "run", "--lat", "1.0", "--lon", "-2.0"]).is_ok());
    }

    #[test]
    fn position_args_override_config() {
        let mut config = Config::default();
        config.location = Some(LocationConfig { latitude: 1.0, longitude: 2.0, accuracy_meters: 30.0 });

        let args = PositionArgs { lat: None, lon: None, accuracy: Some(5.0) };
        assert_eq!(args.resolve(&config), Some(LocationSample::new(1.0, 2.0, 5.0)));

        let args = PositionArgs { lat: Some(3.0), lon: Some(4.0), accuracy: None };
        assert_eq!(args.resolve(&config), Some(LocationSample::new(3.0, 4.0, 0.0)));

        let args = PositionArgs { lat: None, lon: None, accuracy: None };
        assert_eq!(args.resolve(&Config::default()), None);
    }
}
