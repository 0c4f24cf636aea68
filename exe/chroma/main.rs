mod app_config;

use std::{error::Error, path::PathBuf};

use app_config::AppConfig;
use chroma::{
  utils, CancelToken, ComplementNet, Rgb, StepReport, SwatchRow, Trainer, TrainingConfig,
  TrainingSummary,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
  /// Log every step, not only reporting steps
  #[arg(short, long, global = true)]
  verbose: bool,
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Train the network, printing swatches on every reporting step
  Train {
    /// YAML file with training options
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
    #[arg(long, value_name = "INT")]
    steps: Option<usize>,
    #[arg(long, value_name = "INT")]
    dataset_size: Option<usize>,
    #[arg(long, value_name = "INT")]
    batch_size: Option<usize>,
    #[arg(long, value_name = "FLOAT")]
    learning_rate: Option<f32>,
    #[arg(long, value_name = "INT")]
    report_every: Option<usize>,
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,
    /// Color row to visualise, repeatable
    #[arg(long = "color", value_name = "R,G,B")]
    colors: Vec<String>,
    /// Write the final swatch rows and summary as JSON
    #[arg(long, value_name = "PATH")]
    report_out: Option<PathBuf>,
  },
  /// Print the analytic complement of a color
  Complement {
    #[arg(value_name = "R,G,B")]
    color: String,
  },
}

#[derive(Serialize)]
struct RunReport<'a> {
  config: &'a TrainingConfig,
  summary: TrainingSummary,
  rows: Vec<SwatchRow>,
}

fn swatch(rgb: Rgb) -> String {
  format!(
    "\x1b[48;2;{};{};{}m      \x1b[0m {}",
    rgb.r, rgb.g, rgb.b, rgb
  )
}

fn print_rows(header: &str, rows: &[SwatchRow]) {
  println!("{header}");
  println!("  {:<15} {:<15} {:<15}", "original", "complement", "predicted");
  for row in rows {
    println!(
      "  {}  {}  {}",
      swatch(row.original),
      swatch(row.analytic),
      swatch(row.predicted)
    );
  }
}

async fn train(config_path: Option<PathBuf>, cli_config: AppConfig) -> Result<(), Box<dyn Error>> {
  let file_config = match config_path {
    Some(path) => AppConfig::from_file(&path)?,
    None => AppConfig::default(),
  };
  let app_config = file_config.merge(cli_config);
  let training = app_config.training_config();
  let palette = app_config.palette()?;
  info!(?training, "starting training");

  let mut trainer = Trainer::new(training.clone())?;

  let cancel = CancelToken::new();
  let on_ctrl_c = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_ctrl_c.cancel();
    }
  });

  let mut observer = |report: &StepReport, model: &ComplementNet| {
    let header = format!("step {} cost {:.6}", report.step, report.cost);
    print_rows(&header, &palette.rows(model));
  };
  let summary = trainer.run(&mut observer, &cancel).await?;

  let rows = palette.rows(trainer.model());
  print_rows(
    &format!("finished after {} steps", summary.steps_completed),
    &rows,
  );

  if let Some(path) = app_config.report_out {
    let report = RunReport {
      config: &training,
      summary,
      rows,
    };
    utils::serialize_to_file(&path, &report)?;
    info!(path = %path.display(), "wrote report");
  }
  Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
  let args = Cli::parse();
  let level = if args.verbose { Level::DEBUG } else { Level::INFO };
  utils::init_logging(level)?;

  match args.command {
    Command::Train {
      config,
      steps,
      dataset_size,
      batch_size,
      learning_rate,
      report_every,
      seed,
      colors,
      report_out,
    } => {
      let cli_config = AppConfig {
        dataset_size,
        batch_size,
        steps,
        learning_rate,
        report_every,
        seed,
        palette: (!colors.is_empty()).then_some(colors),
        report_out,
      };
      train(config, cli_config).await?;
    }
    Command::Complement { color } => {
      let rgb: Rgb = color.parse()?;
      let complement = rgb.complement();
      println!("{}  ->  {}", swatch(rgb), swatch(complement));
      let [r, g, b] = complement.channels();
      println!("{r},{g},{b}");
    }
  }
  Ok(())
}
