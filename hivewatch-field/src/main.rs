//! hivewatch-field - submit a colony sighting from the command line
//!
//! Drives the same capture -> verify -> countdown -> store workflow a
//! mobile shell would, printing progress as it goes.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use hivewatch_common::models::{Gps, LocationType, UserRole};
use hivewatch_field::capture::{FallbackLocation, FixedLocation, LocationProvider, MediaCapture, NoFix};
use hivewatch_field::geocode::ReverseGeocoder;
use hivewatch_field::workflow::{AUTO_STORE_DELAY_SECS, SubmissionWorkflow};
use hivewatch_field::{ApiClient, Command, SubmissionDraft, WorkflowEvent};

/// Command-line arguments for hivewatch-field
#[derive(Parser, Debug)]
#[command(name = "hivewatch-field")]
#[command(about = "Report a rock-bee colony sighting")]
#[command(version)]
struct Args {
    /// Server base URL
    #[arg(long, default_value = "http://localhost:5001", env = "HIVEWATCH_SERVER_URL")]
    server: String,

    /// Photo of the colony
    #[arg(long)]
    image: PathBuf,

    /// Where the colony was found (Buildings, Farm, Tall Cliffs/Tree,
    /// Bridges, Other)
    #[arg(long, default_value = "Other")]
    location: String,

    /// Who is reporting (Farmer, General Public, Authorized Person,
    /// Researcher, Student)
    #[arg(long, default_value = "General Public")]
    role: String,

    /// Contact phone number
    #[arg(long)]
    phone: Option<String>,

    /// Known address; skips the reverse-geocoding lookup
    #[arg(long)]
    address: Option<String>,

    /// Device latitude, when known
    #[arg(long)]
    lat: Option<f64>,

    /// Device longitude, when known
    #[arg(long)]
    long: Option<f64>,

    /// Store immediately instead of waiting out the countdown
    #[arg(long)]
    confirm_now: bool,

    /// Seconds before a verified report auto-stores
    #[arg(long, default_value_t = AUTO_STORE_DELAY_SECS)]
    confirm_delay: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let location_type: LocationType = args
        .location
        .parse()
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    let user_role: UserRole = args.role.parse().map_err(|e| anyhow::anyhow!("{}", e))?;

    let client = Arc::new(ApiClient::new(args.server.clone()));
    match client.health().await {
        Ok(health) if !health.model_loaded => {
            warn!("Server is up but the model is still loading; verification may briefly return 503");
        }
        Ok(_) => info!("Server reachable at {}", args.server),
        Err(e) => warn!("{}", e),
    }

    // Acquiring the image also acquires the location fix
    let positioning: Box<dyn LocationProvider> = match (args.lat, args.long) {
        (Some(lat), Some(long)) => Box::new(FixedLocation(Gps { lat, long })),
        _ => Box::new(NoFix),
    };
    let capture = MediaCapture::new(FallbackLocation(positioning));
    let (image, gps) = capture.from_file(&args.image).await?;
    info!("Location fix: {:.4}, {:.4}", gps.lat, gps.long);

    let address = match args.address {
        Some(address) => Some(address),
        None => ReverseGeocoder::new().lookup(&gps).await,
    };
    if let Some(address) = &address {
        info!("Resolved address: {}", address);
    }

    let mut draft = SubmissionDraft::new(gps);
    draft.image = Some(image);
    draft.location_type = Some(location_type);
    draft.user_role = user_role;
    draft.address = address;
    draft.phone_number = args.phone;

    let (command_tx, command_rx) = mpsc::channel(4);
    let (event_tx, mut event_rx) = mpsc::channel(32);

    if args.confirm_now {
        let _ = command_tx.send(Command::Confirm).await;
    } else {
        // Ctrl-C discards the pending draft instead of leaving a
        // timer racing a dead process
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                let _ = command_tx.send(Command::Discard).await;
            }
        });
    }

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                WorkflowEvent::StateChanged(state) => info!("State: {:?}", state),
                WorkflowEvent::Verdict(verdict) => {
                    info!(
                        "Verdict: {} (confidence {}%)",
                        if verdict.is_honeybee { "colony detected" } else { "rejected" },
                        verdict.confidence
                    );
                    for label in &verdict.labels {
                        info!("  {}", label);
                    }
                }
                WorkflowEvent::CountdownTick(remaining) => {
                    if remaining % 10 == 0 || remaining <= 5 {
                        info!("Auto-saving in {}s (Ctrl-C to discard)", remaining);
                    }
                }
                WorkflowEvent::ContactAvailable(contact) => {
                    info!(
                        "Emergency contact: {} ({}) {}",
                        contact.contact_name, contact.designation, contact.phone_number
                    );
                }
                WorkflowEvent::Guidance(guidance) => {
                    for item in &guidance.dos {
                        info!("DO: {}", item);
                    }
                    for item in &guidance.donts {
                        info!("DON'T: {}", item);
                    }
                }
                WorkflowEvent::StorageFailed(message) => {
                    warn!("Storing failed: {} (Ctrl-C to discard, re-run to retry)", message);
                }
                WorkflowEvent::Stored(report) => {
                    info!("Report {} stored at {}", report.id, report.timestamp);
                }
            }
        }
    });

    let workflow = SubmissionWorkflow::new(client).with_confirm_delay(args.confirm_delay);
    let result = workflow.run(draft, command_rx, event_tx).await;
    drop(command_tx);
    let _ = printer.await;

    match result {
        Ok(Some(report)) => {
            println!("Report stored: {} -> {}", report.id, report.image);
            Ok(())
        }
        Ok(None) => {
            println!("No report stored (rejected or discarded). Retry with a clearer photo.");
            Ok(())
        }
        Err(e) => Err(anyhow::anyhow!("{}", e)),
    }
}
