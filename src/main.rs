//! SPATIAL TESTER - CLI Entry Point
//!
//! Statistical acceptance tests for distance-dependent connectivity.

use clap::{Args, Parser, Subcommand};
use spatial_tester::{
    BackendKind, Config, Dimensions, KernelKind, NetworkExport, SpatialBackend, SpatialTester,
    TestKind,
};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "spatial-tester")]
#[command(version)]
#[command(about = "Statistical acceptance tests for spatially structured connectivity")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every command that builds a population
#[derive(Args)]
struct Setup {
    /// Configuration file (YAML); defaults are used when it does not exist
    #[arg(short, long, default_value = "spatial.yaml")]
    config: PathBuf,

    /// Backend (csa, topology)
    #[arg(short, long)]
    backend: Option<BackendKind>,

    /// Kernel (constant, linear, exponential, gaussian)
    #[arg(short, long)]
    kernel: Option<KernelKind>,

    /// Number of target nodes
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Side length of the square / cube
    #[arg(short = 'L', long)]
    side_length: Option<f64>,

    /// Spatial dimensions (2 or 3)
    #[arg(short, long)]
    dimensions: Option<u8>,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,
}

impl Setup {
    fn load(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = if self.config.exists() {
            Config::from_file(&self.config)?
        } else {
            Config::default()
        };
        if let Some(backend) = self.backend {
            config.population.backend = backend;
        }
        if let Some(kernel) = self.kernel {
            if kernel != config.kernel.name {
                config.kernel.params.clear();
            }
            config.kernel.name = kernel;
        }
        if let Some(nodes) = self.nodes {
            config.population.nodes = nodes;
        }
        if let Some(side) = self.side_length {
            config.population.side_length = side;
        }
        if let Some(dims) = self.dimensions {
            config.population.dimensions = Dimensions::try_from(dims)?;
        }
        if self.seed.is_some() {
            config.testing.seed = self.seed;
        }
        config.validate()?;
        init_logging(&config.logging.log_level);
        if self.config.exists() {
            log::info!("Loaded config from {:?}", self.config);
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the KS test and the Z-test once
    Run {
        #[command(flatten)]
        setup: Setup,

        /// Test ideal samples instead of backend connections
        #[arg(long)]
        control: bool,

        /// Write the trial report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a series of seeds and check the p-values for uniformity
    Trials {
        #[command(flatten)]
        setup: Setup,

        /// Test to repeat (ks, z)
        #[arg(short, long, default_value = "ks")]
        test: TestKind,

        /// Number of trials
        #[arg(long)]
        trials: Option<usize>,

        /// Test ideal samples instead of backend connections
        #[arg(long)]
        control: bool,

        /// Also run one KS test on distances pooled over all trials
        #[arg(long)]
        pooled: bool,

        /// Write the series report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print observed and expected connection counts per distance bin
    Bins {
        #[command(flatten)]
        setup: Setup,

        /// Number of bins
        #[arg(long)]
        bins: Option<usize>,
    },

    /// Dump positions and distances of one connected population as JSON
    Export {
        #[command(flatten)]
        setup: Setup,

        /// Output path
        #[arg(short, long, default_value = "network.json")]
        output: PathBuf,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "spatial.yaml")]
        output: PathBuf,
    },
}

fn init_logging(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            setup,
            control,
            output,
        } => run_once(setup, control, output),

        Commands::Trials {
            setup,
            test,
            trials,
            control,
            pooled,
            output,
        } => run_trials(setup, test, trials, control, pooled, output),

        Commands::Bins { setup, bins } => run_bins(setup, bins),

        Commands::Export { setup, output } => export_network(setup, output),

        Commands::Init { output } => generate_config(output),
    }
}

fn build_tester(
    config: &Config,
) -> Result<SpatialTester<Box<dyn SpatialBackend>>, Box<dyn std::error::Error>> {
    let tester = SpatialTester::new(config.build_backend()?)?;
    println!(
        "Backend: {} | {}D | L = {} | N = {} | kernel: {}",
        config.population.backend,
        config.population.dimensions.count(),
        config.population.side_length,
        config.population.nodes,
        config.kernel.name
    );
    Ok(tester)
}

fn run_once(
    setup: Setup,
    control: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = setup.load()?;
    let mut tester = build_tester(&config)?;
    let control = config.control_mode(control);

    let start = Instant::now();
    let report = if control {
        let seed = config.testing.seed;
        let ks = tester.ks_test(true, seed)?;
        let z = tester.z_test(true, seed)?;
        println!("p-value of KS-test (control): {}", ks.p_value);
        println!("p-value of Z-test (control): {}", z.p_value);
        None
    } else {
        let report = tester.report(config.testing.seed)?;
        println!("p-value of KS-test: {}", report.ks.p_value);
        println!("p-value of Z-test: {}", report.z.p_value);
        println!();
        println!("{}", report.summary());
        Some(report)
    };
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());

    if let (Some(report), Some(path)) = (report, output) {
        report.save_json(&path)?;
        println!("Report: {:?}", path);
    }
    Ok(())
}

fn run_trials(
    setup: Setup,
    test: TestKind,
    trials: Option<usize>,
    control: bool,
    pooled: bool,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = setup.load()?;
    let mut tester = build_tester(&config)?;
    let trials = trials.unwrap_or(config.testing.trials);
    let control = config.control_mode(control);
    let base_seed = config.testing.seed.unwrap_or_else(rand::random);

    println!("Running {} {} trials from seed {}", trials, test, base_seed);
    let start = Instant::now();
    let series = tester.trial_series(test, trials, control, base_seed)?;

    println!();
    println!("=== Trial Series ===");
    println!("{}", series.summary());
    if pooled {
        let outcome = tester.pooled_ks_test(trials, control, base_seed)?;
        println!(
            "Pooled KS: D = {:.5}, p = {:.4}",
            outcome.statistic, outcome.p_value
        );
    }
    println!("Time: {:.2}s", start.elapsed().as_secs_f64());

    if let Some(path) = output {
        series.save_json(&path)?;
        println!("Series report: {:?}", path);
    }
    Ok(())
}

fn run_bins(setup: Setup, bins: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let config = setup.load()?;
    let mut tester = build_tester(&config)?;
    let bins = bins.unwrap_or(config.testing.bins);

    let counts = tester.binned_counts(bins, config.testing.seed)?;
    println!();
    println!("=== Binned Connection Counts ===");
    for bin in &counts {
        println!("{}", bin.summary());
    }
    let observed: usize = counts.iter().map(|b| b.observed).sum();
    let expected: f64 = counts.iter().map(|b| b.expected).sum();
    println!("Total: observed {} | expected {:.1}", observed, expected);
    Ok(())
}

fn export_network(setup: Setup, output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = setup.load()?;
    let mut tester = build_tester(&config)?;

    let seed = tester.run_trial(config.testing.seed)?;
    let export = NetworkExport::capture(tester.backend())?;
    export.save_json(&output)?;
    println!(
        "Seed {}: {} of {} targets connected",
        seed,
        export.target_distances.len(),
        export.distances.len()
    );
    println!("Network saved to: {:?}", output);
    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
