// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Four subcommands: `train`, `evaluate`, `export`, `predict`.
// Every flag defaults to the fixed paths and hyperparameters
// of the original training script, so `train` with no flags
// reproduces it.

use clap::{ArgGroup, Args, Subcommand};

use crate::application::{
    evaluate_use_case::EvaluateConfig,
    export_use_case::ExportConfig,
    train_use_case::{
        TrainConfig, DEFAULT_DATASET, DEFAULT_LABELS, DEFAULT_MODEL_DIR, DEFAULT_QUANTIZED_PATH,
    },
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the classifier, report on the test split and export it
    Train(TrainArgs),

    /// Evaluate a saved model on the test split
    Evaluate(EvaluateArgs),

    /// Quantize a saved model and check parity
    Export(ExportArgs),

    /// Classify one hand pose with the quantized model
    Predict(PredictArgs),
}

/// Dataset location and how it is split. Shared by several commands.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// CSV of `label, 42 floats` rows
    #[arg(long, default_value = DEFAULT_DATASET)]
    pub dataset: String,

    /// Number of gesture classes
    #[arg(long, default_value_t = 26)]
    pub num_classes: usize,

    /// Fraction of rows used for training; the rest is the test split
    #[arg(long, default_value_t = 0.75)]
    pub train_fraction: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Counts that must be at least 1.
fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Directory for the checkpoint and the inference model
    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: String,

    /// Output path of the quantized model
    #[arg(long, default_value = DEFAULT_QUANTIZED_PATH)]
    pub quantized_path: String,

    /// One gesture name per line, in class id order
    #[arg(long, default_value = DEFAULT_LABELS)]
    pub labels: String,

    /// Upper bound on epochs; early stopping usually ends sooner
    #[arg(long, default_value_t = 1000, value_parser = parse_positive)]
    pub epochs: usize,

    #[arg(long, default_value_t = 128, value_parser = parse_positive)]
    pub batch_size: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    /// Epochs without val_loss improvement before stopping
    #[arg(long, default_value_t = 20)]
    pub patience: usize,

    /// Continue from the checkpoint in --model-dir
    #[arg(long)]
    pub resume: bool,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset:        a.data.dataset,
            model_dir:      a.model_dir,
            quantized_path: a.quantized_path,
            labels:         a.labels,
            num_classes:    a.data.num_classes,
            epochs:         a.epochs,
            batch_size:     a.batch_size,
            lr:             a.lr,
            patience:       a.patience,
            train_fraction: a.data.train_fraction,
            seed:           a.data.seed,
            resume:         a.resume,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: String,

    #[arg(long, default_value = DEFAULT_LABELS)]
    pub labels: String,

    #[arg(long, default_value_t = 128, value_parser = parse_positive)]
    pub batch_size: usize,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            dataset:        a.data.dataset,
            model_dir:      a.model_dir,
            labels:         a.labels,
            num_classes:    a.data.num_classes,
            batch_size:     a.batch_size,
            train_fraction: a.data.train_fraction,
            seed:           a.data.seed,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[arg(long, default_value = DEFAULT_MODEL_DIR)]
    pub model_dir: String,

    #[arg(long, default_value = DEFAULT_QUANTIZED_PATH)]
    pub quantized_path: String,
}

impl From<ExportArgs> for ExportConfig {
    fn from(a: ExportArgs) -> Self {
        ExportConfig {
            dataset:        a.data.dataset,
            model_dir:      a.model_dir,
            quantized_path: a.quantized_path,
            num_classes:    a.data.num_classes,
            train_fraction: a.data.train_fraction,
            seed:           a.data.seed,
        }
    }
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["features", "landmarks"])))]
pub struct PredictArgs {
    #[arg(long, default_value = DEFAULT_QUANTIZED_PATH)]
    pub quantized_path: String,

    #[arg(long, default_value = DEFAULT_LABELS)]
    pub labels: String,

    /// Normalized feature row: "f1,...,f42"
    #[arg(long, allow_hyphen_values = true)]
    pub features: Option<String>,

    /// Raw landmark coordinates: "x0,y0,...,x20,y20"
    #[arg(long, allow_hyphen_values = true)]
    pub landmarks: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["keypoint-classifier", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };

        let cfg: TrainConfig = args.into();
        let default = TrainConfig::default();
        assert_eq!(cfg.dataset, default.dataset);
        assert_eq!(cfg.model_dir, default.model_dir);
        assert_eq!(cfg.quantized_path, default.quantized_path);
        assert_eq!(cfg.num_classes, default.num_classes);
        assert_eq!(cfg.epochs, default.epochs);
        assert_eq!(cfg.batch_size, default.batch_size);
        assert_eq!(cfg.patience, default.patience);
        assert_eq!(cfg.seed, default.seed);
        assert!(!cfg.resume);
    }

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("keypoint-classifier").chain(args.iter().copied()))
    }

    #[test]
    fn test_zero_counts_are_rejected() {
        assert!(parse(&["train", "--epochs", "0"]).is_err());
        assert!(parse(&["train", "--batch-size", "0"]).is_err());
        assert!(parse(&["evaluate", "--batch-size", "0"]).is_err());
        assert!(parse(&["train", "--epochs", "5", "--batch-size", "1"]).is_ok());
    }

    #[test]
    fn test_predict_requires_one_input() {
        assert!(Cli::try_parse_from(["keypoint-classifier", "predict"]).is_err());
        assert!(Cli::try_parse_from([
            "keypoint-classifier", "predict", "--features", "1", "--landmarks", "2",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["keypoint-classifier", "predict", "--features", "-0.5,1"]).is_ok());
    }
}
