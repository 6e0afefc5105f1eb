use anyhow::Result;
use clap::Parser;
use std::net::IpAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tunebridge_driver_osascript::OsaScriptDriver;
use tunebridge_gateway::{
    advertise, auth, AppState, AuthToken, Config, EventBroadcaster, GatewayServer, MusicMonitor,
    ServiceAdvertiser, TrustedDeviceStore,
};

/// Remote-control gateway for Music.app
#[derive(Parser, Debug)]
#[command(name = "tunebridge", version, about)]
struct Args {
    /// Address to bind (overrides TUNEBRIDGE_HOST)
    #[arg(long)]
    host: Option<IpAddr>,

    /// Port to listen on (overrides TUNEBRIDGE_PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Skip mDNS service advertisement
    #[arg(long)]
    no_advertise: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tunebridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!("Starting TuneBridge");
    tracing::info!("Config directory: {}", config.config_dir.display());

    // A gateway without a token cannot authorize anything; failing to
    // load or persist one aborts startup.
    let token = AuthToken::load_or_generate(&config.config_dir)?;
    display_token(&token, &config);

    let devices = Arc::new(TrustedDeviceStore::open(&config.config_dir));
    let driver = Arc::new(OsaScriptDriver::new());
    let broadcaster = EventBroadcaster::new();

    let mut monitor =
        MusicMonitor::with_interval(driver.clone(), broadcaster.clone(), config.poll_interval);

    let state = AppState {
        driver,
        broadcaster,
        latest: monitor.latest(),
        token,
        devices,
    };

    let mut server = GatewayServer::new(config.bind_addr(), state);
    server.start().await?;

    monitor.start();

    let advertiser = if args.no_advertise {
        None
    } else {
        match ServiceAdvertiser::register(server.addr().port()) {
            Ok(advertiser) => Some(advertiser),
            Err(e) => {
                tracing::warn!("mDNS advertisement unavailable: {e}");
                None
            }
        }
    };

    if let Ok(ip) = advertise::get_local_ip() {
        tracing::info!("Access at: http://{}:{}", ip, server.addr().port());
    }
    tracing::info!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");

    monitor.stop().await;
    server.stop().await;
    if let Some(advertiser) = advertiser {
        advertiser.shutdown();
    }

    Ok(())
}

/// Print the token prominently; pairing copies it from the terminal.
fn display_token(token: &AuthToken, config: &Config) {
    println!();
    println!("============================================================");
    println!("  AUTHENTICATION TOKEN");
    println!("============================================================");
    println!();
    println!("  {}", token.expose());
    println!();
    println!(
        "  Saved in: {}",
        auth::token_path(&config.config_dir).display()
    );
    println!("  Keep this token secure; it grants full playback control.");
    println!("============================================================");
    println!();
}
