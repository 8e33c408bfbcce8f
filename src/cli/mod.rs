// ============================================================
// Layer 1 - CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and routes each subcommand to its use case in Layer 2.
//
//   train     full pipeline: fit, evaluate, report, export
//   evaluate  report on a saved model
//   export    quantize a saved model
//   predict   classify one pose with the quantized model

pub mod commands;

use anyhow::{bail, Result};
use clap::Parser;
use commands::{Commands, PredictArgs};

use crate::application::{
    evaluate_use_case::EvaluateUseCase,
    export_use_case::ExportUseCase,
    predict_use_case::{parse_floats, PredictUseCase},
    train_use_case::TrainUseCase,
};

#[derive(Parser, Debug)]
#[command(
    name = "keypoint-classifier",
    version,
    about = "Train a hand-keypoint gesture classifier and export it as an int8 model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Routes only; the use cases do the work.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => {
                tracing::info!("Training on '{}'", args.data.dataset);
                TrainUseCase::new(args.into()).execute()?;
                println!("Training complete.");
                Ok(())
            }
            Commands::Evaluate(args) => EvaluateUseCase::new(args.into()).execute(),
            Commands::Export(args) => {
                ExportUseCase::new(args.into()).execute()?;
                Ok(())
            }
            Commands::Predict(args) => run_predict(args),
        }
    }
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let use_case = PredictUseCase::new(&args.quantized_path, &args.labels)?;

    let prediction = match (&args.features, &args.landmarks) {
        (Some(f), _) => use_case.predict_features(&parse_floats(f)?)?,
        (None, Some(l)) => use_case.predict_landmarks(&parse_floats(l)?)?,
        (None, None) => bail!("Pass either --features or --landmarks"),
    };

    println!("{:?}", prediction.probabilities);
    println!(
        "{} ({}) - confidence {:.4}",
        prediction.name, prediction.class_id, prediction.confidence
    );
    Ok(())
}
