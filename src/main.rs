//! Pi Lights - HTTP control for a Raspberry Pi light.
//!
//! Usage: `pi_lights [OPTIONS] [PORT]`

use clap::Parser;
use pi_lights::{
    open_gpio, start_web_server, Gpio, LightController, PinConfig, WebConfig, DEFAULT_LIGHT_PIN,
    DEFAULT_POWER_PIN, DEFAULT_WEB_PORT,
};
use std::ffi::OsString;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{filter::LevelFilter, EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "pi_lights")]
#[command(about = "💡 Pi Lights - HTTP control for a Raspberry Pi light")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Web server port
    #[arg(default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// BCM pin driving the power relay
    #[arg(long, default_value_t = DEFAULT_POWER_PIN)]
    power_pin: u8,

    /// BCM pin reading the light sensor
    #[arg(long, default_value_t = DEFAULT_LIGHT_PIN)]
    light_pin: u8,

    /// Use in-memory pins instead of hardware (useful for non-Pi systems)
    #[arg(long)]
    no_gpio: bool,

    /// Enable permissive CORS headers
    #[arg(long)]
    cors: bool,

    /// Reject malformed power requests with 400 instead of ignoring them
    #[arg(long)]
    strict: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(cli) = parse_cli(std::env::args_os()) else {
        return Ok(());
    };

    init_logging(&cli)?;

    print_banner();

    serve_command(&cli).await?;

    Ok(())
}

/// Usage errors (and `--help`/`--version`) print and yield `None`.
fn parse_cli<I, T>(args: I) -> Option<Cli>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Some(cli),
        Err(e) => {
            let _ = e.print();
            None
        }
    }
}

fn log_level(cli: &Cli) -> Level {
    if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    }
}

/// `RUST_LOG` directives win; without them the flag-derived level applies.
fn log_filter(level: Level, directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(directives.unwrap_or_default())
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(log_level(cli), directives.as_deref()))
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn print_banner() {
    println!("💡 Pi Lights");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn web_config(cli: &Cli) -> WebConfig {
    WebConfig::new(&cli.host, cli.port)
        .with_cors(cli.cors)
        .with_strict_json(cli.strict)
}

fn pin_config(cli: &Cli) -> PinConfig {
    PinConfig::new(cli.power_pin, cli.light_pin)
}

async fn setup_light(
    gpio: Arc<dyn Gpio>,
    pins: PinConfig,
) -> Result<Arc<LightController>, Box<dyn std::error::Error>> {
    info!("GPIO backend: {}", gpio.name());
    let light = LightController::initialize(gpio, pins).await?;
    Ok(Arc::new(light))
}

async fn serve_command(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let pins = pin_config(cli);
    pins.validate()?;

    let gpio = open_gpio(!cli.no_gpio)?;
    let light = setup_light(gpio, pins).await?;

    info!("Web server configuration:");
    info!("  - Bind address: {}:{}", cli.host, cli.port);
    info!("  - Power pin: BCM {}", pins.power_pin);
    info!("  - Light sensor pin: BCM {}", pins.light_pin);
    info!("  - CORS enabled: {}", cli.cors);
    info!("  - Strict request parsing: {}", cli.strict);

    start_web_server(web_config(cli), light).await?;

    Ok(())
}
