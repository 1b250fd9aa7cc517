use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use peerdrop::common::config::{apply_overrides, load_config, AppConfig, ConfigOverrides};
use peerdrop::common::config_commands::{run_config_path, run_config_show};
use peerdrop::connection::{ConnectAttempt, ConnectionEvent, ConnectionHandler, HandlerSettings};
use peerdrop::output::{
    byte_spinner, finish_spinner_error, finish_spinner_success, follow_progress, join_progress,
    print_success, print_warning, spinner, transfer_bar,
};
use peerdrop::receive::FileReceiver;
use peerdrop::send::{send_file_with_progress, SendFileHandle};
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "peerdrop")]
#[command(about = "Send one file straight to another machine over TCP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print this machine's LAN address
    Ip,

    /// Wait for a sender and receive one file
    Receive {
        /// Address of the peer allowed to connect
        #[arg(long)]
        from: IpAddr,
        /// Local address to listen on (defaults to the LAN address)
        #[arg(long)]
        bind: Option<IpAddr>,
        #[arg(long)]
        port: Option<u16>,
        /// Directory to write the file into
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Connect to a waiting receiver and send one file
    Send {
        /// Receiver address
        host: IpAddr,
        #[arg(help = "Path to file to send")]
        file: PathBuf,
        #[arg(long)]
        port: Option<u16>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location
    Path,
    /// Print the config file, or the defaults when there is none
    Show,
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("peerdrop=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ip => {
            let config = load_config()?;
            let handler = ConnectionHandler::with_settings(HandlerSettings::from(&config));
            println!("{}", handler.local_ip()?);
            Ok(())
        }
        Commands::Receive {
            from,
            bind,
            port,
            out,
        } => {
            let overrides = ConfigOverrides {
                port,
                output_dir: out,
            };
            let config = apply_overrides(load_config()?, &overrides)?;
            run_receive(&config, from, bind).await
        }
        Commands::Send { host, file, port } => {
            // fail fast on no file
            if !file.is_file() {
                bail!("File not found: {}", file.display());
            }
            let overrides = ConfigOverrides {
                port,
                ..Default::default()
            };
            let config = apply_overrides(load_config()?, &overrides)?;
            run_send(&config, host, file).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Path => run_config_path(),
            ConfigAction::Show => run_config_show(),
        },
    }
}

async fn run_receive(config: &AppConfig, from: IpAddr, bind: Option<IpAddr>) -> Result<()> {
    let handler = ConnectionHandler::with_settings(HandlerSettings::from(config));

    let ip = match bind {
        Some(ip) => ip,
        None => handler.local_ip().context("Pass --bind to choose an address")?,
    };
    let listener = handler.host(ip, config.port)?;
    println!("Listening on {}", listener.local_addr()?);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let attempt = handler
        .accept_connection_from(&listener, from, Arc::new(tx))
        .context("A connection attempt is already running")?;

    let waiting = spinner(&format!("Waiting for {from}..."));
    let stream = match wait_for_connection(&attempt, &mut rx).await {
        Ok(stream) => {
            finish_spinner_success(&waiting, "Sender connected");
            stream
        }
        Err(e) => {
            finish_spinner_error(&waiting, "No connection");
            return Err(e);
        }
    };

    let (progress_tx, progress_rx) = watch::channel(0u64);
    let bar = follow_progress(byte_spinner("Receiving"), progress_rx);

    let receiver = FileReceiver::new(&config.output_dir).with_progress(progress_tx);
    let received = receiver.receive(stream).await;
    drop(receiver);
    join_progress(bar).await;

    let received = received.context("Failed to receive file")?;
    if received.size_mismatch() {
        print_warning(&format!(
            "Sender announced {} bytes but sent {}",
            received.declared_size, received.bytes_written
        ));
    }
    print_success(&format!(
        "Received {} ({} bytes)",
        received.path.display(),
        received.bytes_written
    ));
    Ok(())
}

async fn run_send(config: &AppConfig, host: IpAddr, path: PathBuf) -> Result<()> {
    let handler = ConnectionHandler::with_settings(HandlerSettings::from(config));
    let mut file = SendFileHandle::open(&path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let size = file.size().await?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let attempt = handler
        .connect_to_host(host, config.port, Arc::new(tx))
        .context("A connection attempt is already running")?;

    let connecting = spinner(&format!("Connecting to {host}:{}...", config.port));
    let stream = match wait_for_connection(&attempt, &mut rx).await {
        Ok(stream) => {
            finish_spinner_success(&connecting, "Connected");
            stream
        }
        Err(e) => {
            finish_spinner_error(&connecting, "Connection failed");
            return Err(e);
        }
    };

    let (progress_tx, progress_rx) = watch::channel(0u64);
    let bar = follow_progress(transfer_bar(size, file.name()), progress_rx);

    let sent = send_file_with_progress(stream, &mut file, Some(&progress_tx)).await;
    drop(progress_tx);
    join_progress(bar).await;

    let sent = sent.context("Failed to send file")?;
    print_success(&format!("Sent {} ({} bytes)", file.name(), sent));
    Ok(())
}

/// Wait for the attempt's outcome, cancelling it on Ctrl+C.
async fn wait_for_connection(
    attempt: &ConnectAttempt,
    events: &mut mpsc::UnboundedReceiver<ConnectionEvent>,
) -> Result<TcpStream> {
    tokio::select! {
        event = events.recv() => match event {
            Some(ConnectionEvent::Connected { stream, .. }) => Ok(stream),
            Some(ConnectionEvent::Failed(e)) => Err(e.into()),
            None => bail!("Connection task ended without reporting a result"),
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received - cancelling connection attempt");
            attempt.cancel();
            bail!("Interrupted")
        }
    }
}
