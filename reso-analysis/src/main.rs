use anyhow::{Context, Result};
use clap::Parser;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use reso_analysis::{
    AnalysisConfig, AnalysisStage, HistogramManager, ReactionInput, ResoAnalysisStage,
    SpectrumManager, event::read_events,
};
use specter_common::{
    init_tracer,
    metrics::{
        component_info_metric,
        failures::{self, FailureKind},
        names::{EVENTS_PROCESSED, FAILURES, HITS_RECEIVED, HITS_UNMAPPED},
    },
    tracer::TracerOptions,
};
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    net::SocketAddr,
    path::PathBuf,
};
use tracing::{debug, info, warn};

#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Cli {
    /// JSON analysis configuration, the built-in SE-RESO setup is used if absent
    #[clap(long)]
    config: Option<PathBuf>,

    /// Events as JSON lines, read from stdin if absent
    #[clap(long)]
    events: Option<PathBuf>,

    /// Beam kinetic energy in MeV, overrides the configuration
    #[clap(long)]
    beam_tke: Option<f64>,

    /// Fragment kinetic energy in MeV, overrides the configuration
    #[clap(long)]
    frag_tke: Option<f64>,

    /// If set, Prometheus metrics are served on this address
    #[clap(long, env)]
    observability_address: Option<SocketAddr>,
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let _tracer = init_tracer!(TracerOptions::default())?;

    if let Some(address) = args.observability_address {
        PrometheusBuilder::new()
            .with_http_listener(address)
            .install()
            .with_context(|| format!("Cannot serve metrics on {address}"))?;
    }
    describe_metrics();
    component_info_metric("reso-analysis");

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };
    if let Some(beam_tke) = args.beam_tke {
        config.input.beam_tke = beam_tke;
    }
    if let Some(frag_tke) = args.frag_tke {
        config.input.frag_tke = frag_tke;
    }

    let mut input = ReactionInput::default();
    input
        .apply(&config.input)
        .context("Invalid reaction settings")?;

    let mut manager = HistogramManager::default();
    let mut stage = ResoAnalysisStage::new(&config, &mut manager, &input)
        .context("Cannot set up the analysis stage")?;

    let reader: Box<dyn BufRead> = match &args.events {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Cannot open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    for line in read_events(reader) {
        let (number, event) = line.context("Cannot read events")?;
        match event {
            Ok(event) => {
                debug!("Event on line {number}: {} hits", event.len());
                stage.analyze_event(&event);
                manager.update(stage.parameters());
            }
            Err(e) => {
                warn!("Cannot decode event on line {number}: {e}");
                counter!(
                    FAILURES,
                    &[failures::get_label(FailureKind::UnableToDecodeEvent)]
                )
                .increment(1);
            }
        }
    }

    info!("Finished {} stage", stage.name());
    manager.report();
    Ok(())
}

fn describe_metrics() {
    metrics::describe_counter!(
        EVENTS_PROCESSED,
        metrics::Unit::Count,
        "Number of events analysed"
    );
    metrics::describe_counter!(
        HITS_RECEIVED,
        metrics::Unit::Count,
        "Number of hits received"
    );
    metrics::describe_counter!(
        HITS_UNMAPPED,
        metrics::Unit::Count,
        "Number of hits on channels missing from the channel map"
    );
    metrics::describe_counter!(
        FAILURES,
        metrics::Unit::Count,
        "Number of failures encountered"
    );
}
