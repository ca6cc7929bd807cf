//! seqnet CLI: builds a feed-forward network, runs it on a random batch and
//! prints its structure, predictions and parameters.

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use seqnet::math::tensor::checked_numel;
use seqnet::{predict, select_device, BackendAvailability, Device, ModelSpec, Stage, Tensor};

#[derive(Parser)]
#[command(name = "seqnet")]
#[command(version)]
#[command(about = "Build a sequential network and run a forward pass on random input")]
struct Cli {
    /// Architecture JSON file (defaults to the 784-20-10 quickstart network)
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Force a device (cuda, mps, xpu, cpu) instead of selecting from SEQNET_BACKENDS
    #[arg(long)]
    device: Option<Device>,

    /// Number of random examples in the input batch
    #[arg(long, default_value_t = 3)]
    batch: usize,

    /// Seed for the input batch and the parameter initialization
    #[arg(long)]
    seed: Option<u64>,

    /// Print the batch shape after every stage
    #[arg(long)]
    walkthrough: bool,

    /// Print every named parameter with its size and leading rows
    #[arg(long)]
    show_params: bool,

    /// Write the resolved architecture JSON to this path and exit
    #[arg(long)]
    write_spec: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut spec = match &cli.spec {
        Some(path) => ModelSpec::load_json(path)
            .with_context(|| format!("reading architecture from {}", path.display()))?,
        None => ModelSpec::quickstart(),
    };
    if cli.seed.is_some() {
        spec.seed = cli.seed;
    }

    if let Some(path) = &cli.write_spec {
        spec.save_json(path)
            .with_context(|| format!("writing architecture to {}", path.display()))?;
        println!("Wrote {} to {}", spec.name, path.display());
        return Ok(());
    }

    let device = cli
        .device
        .unwrap_or_else(|| select_device(&BackendAvailability::from_env()));
    println!("Using {device} device");

    let model = spec.build(device)?;
    println!("{model}\n");

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };
    let mut input_shape = vec![cli.batch];
    input_shape.extend_from_slice(&spec.input_shape);
    checked_numel(&input_shape)?;
    let input = Tensor::rand_with(&input_shape, &mut rng).to(device);

    let logits = model.forward(&input)?;
    let prediction = predict(&logits)?;
    println!("Logits shape: {:?}", logits.shape());
    println!("Predicted class: {:?}\n", prediction.classes);

    if cli.walkthrough {
        println!("Input shape: {:?}", input.shape());
        let mut current = input.clone();
        for (i, stage) in model.stages().iter().enumerate() {
            let next = stage.forward(&current)?;
            if let Stage::Activation(_) = stage {
                println!("Before {stage}: {current}\n");
                println!("After {stage}: {next}\n");
            }
            println!("({i}) {stage}: {:?} -> {:?}", current.shape(), next.shape());
            current = next;
        }
        println!();
    }

    if cli.show_params {
        println!("Model structure: {model}\n");
        for (name, param) in model.named_parameters() {
            println!("Layer: {name} | Size: {:?} | Values : {} \n", param.shape(), param.head(2));
        }
        println!("Total parameters: {}", model.parameter_count());
    }

    Ok(())
}
