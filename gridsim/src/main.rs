use anyhow::{Context, bail};
use clap::Parser;
use gridsim::events::emit_event;
use gridsim::{Circuit, GridSimulator, ProbabilityMap, SimulatorApi};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Simulates a gate-grid quantum circuit and prints its measurement distribution
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The circuit grid as JSON (an array of rows). If not provided, reads from stdin.
    #[arg(short, long)]
    input_file: Option<PathBuf>,

    /// The output file to write JSON results to. If not provided, writes to stdout.
    #[arg(short, long)]
    output_file: Option<PathBuf>,

    /// Emit one JSON event per line for every column instead of the final report.
    #[arg(long)]
    trace: bool,

    /// Also sample this many measurement shots from the final state.
    #[arg(long)]
    shots: Option<u32>,

    /// Seed for shot sampling.
    #[arg(long, requires = "shots")]
    seed: Option<u64>,

    /// Refuse circuits wider than this; memory grows as 4^qubits.
    #[arg(long, default_value_t = 12)]
    max_qubits: usize,
}

#[derive(Serialize)]
struct Report {
    probabilities: ProbabilityMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    counts: Option<BTreeMap<String, u32>>,
}

fn read_input(path: Option<&PathBuf>) -> anyhow::Result<String> {
    let mut input = String::new();
    match path {
        Some(path) => {
            input = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
        }
        None => {
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read circuit from stdin")?;
        }
    }
    Ok(input)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let input = read_input(cli.input_file.as_ref())?;
    let circuit = Circuit::from_json(&input).context("failed to decode circuit")?;
    if circuit.num_qubits() > cli.max_qubits {
        bail!(
            "circuit has {} qubits, more than --max-qubits {}",
            circuit.num_qubits(),
            cli.max_qubits
        );
    }
    info!(
        num_qubits = circuit.num_qubits(),
        num_slots = circuit.num_slots(),
        "loaded circuit"
    );

    let mut writer: Box<dyn Write> = match &cli.output_file {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut sim = GridSimulator::new(circuit.num_qubits());
    if cli.trace {
        for event in sim.run_with_trace(&circuit)? {
            emit_event(&event, &mut writer)?;
        }
    } else {
        sim.run(&circuit)?;
        let counts = match cli.shots {
            Some(shots) => {
                let mut rng = match cli.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                Some(sim.sample(shots, &mut rng)?)
            }
            None => None,
        };
        let report = Report {
            probabilities: sim.probabilities(),
            counts,
        };
        serde_json::to_writer_pretty(&mut writer, &report)?;
        writeln!(writer)?;
    }
    writer.flush()?;

    let total = sim.statevector().total_probability();
    if (total - 1.0).abs() > 1e-9 {
        warn!(total, "probabilities drifted from 1");
    }
    Ok(())
}
