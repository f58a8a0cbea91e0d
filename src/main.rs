// projeto: rnnwindow
// file: src/main.rs
// Command-line driver: window a series or a text file and build the matching model

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, error, info, warn};

use rnnwindow::neural::storage::{save_json, save_model_json};
use rnnwindow::{
    AppConfig, CharVocabulary, ModelFactory, NdarrayBackend, SeriesDataset, TextDataset, WindowError,
    as_sequence_batch, clean_text,
};

#[derive(Parser, Debug)]
#[command(
    name = "rnn-window",
    version,
    about = "Prepare windowed datasets for series and character RNNs",
    long_about = "Slices a numeric series or a text file into (window, target) pairs and builds the LSTM network whose input shape matches them."
)]
struct Cli {
    /// TOML file with window sizes, strides and model sizes
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Modo verboso de logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Window a numeric series (values separated by whitespace or commas)
    Series {
        #[arg(long)]
        input: PathBuf,

        #[arg(long, help = "Values per window (overrides the config)")]
        window_size: Option<usize>,

        /// Write the windowed dataset as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Run the untrained regressor over every window
        #[arg(long)]
        predict: bool,
    },

    /// Clean a text file and cut it into strided character windows
    Text {
        #[arg(long)]
        input: PathBuf,

        #[arg(long)]
        window_size: Option<usize>,

        #[arg(long)]
        step_size: Option<usize>,

        /// Keep the text as-is instead of cleaning it first
        #[arg(long)]
        raw: bool,

        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Build one of the networks and print its layers
    Summary {
        #[arg(long, value_enum, default_value = "part1")]
        model: ModelArg,

        #[arg(long)]
        window_size: Option<usize>,

        /// Vocabulary size for the character model
        #[arg(long, default_value_t = 33)]
        num_chars: usize,

        /// Save the freshly initialised weights as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ModelArg {
    Part1,
    Part2,
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let start_time = Instant::now();
    info!("🚀 rnn-window iniciado em {}", Utc::now().format("%Y-%m-%d %H:%M:%S"));

    match run(&cli) {
        Ok(()) => {
            info!("✅ Concluído em {:.2}s", start_time.elapsed().as_secs_f64());
        }
        Err(e) => {
            error!("❌ Erro: {}", e);
            std::process::exit(1);
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

fn run(cli: &Cli) -> Result<(), WindowError> {
    let config = AppConfig::load_or_default(cli.config.as_ref())?;
    debug!("⚙️ Config: {:?}", config);

    let factory = build_factory(&config);

    match &cli.command {
        Command::Series { input, window_size, output, predict } => {
            let window_size = window_size.unwrap_or(config.series.window_size);
            run_series(&factory, input, window_size, output.as_deref(), *predict)
        }
        Command::Text { input, window_size, step_size, raw, output } => {
            let window_size = window_size.unwrap_or(config.text.window_size);
            let step_size = step_size.unwrap_or(config.text.step_size);
            run_text(&factory, input, window_size, step_size, *raw, output.as_deref())
        }
        Command::Summary { model, window_size, num_chars, output } => {
            let built = match model {
                ModelArg::Part1 => factory.part1(
                    config.series.step_size,
                    window_size.unwrap_or(config.series.window_size),
                )?,
                ModelArg::Part2 => factory.part2(window_size.unwrap_or(config.text.window_size), *num_chars)?,
            };
            built.log_summary();
            if let Some(path) = output {
                save_model_json(path, &built)?;
            }
            Ok(())
        }
    }
}

fn build_factory(config: &AppConfig) -> ModelFactory<NdarrayBackend> {
    let backend = match config.model.seed {
        Some(seed) => NdarrayBackend::with_seed(seed),
        None => NdarrayBackend::default(),
    };
    ModelFactory::new(backend).with_units(config.model.regressor_units, config.model.classifier_units)
}

fn parse_series(contents: &str) -> Result<Vec<f64>, WindowError> {
    contents
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<f64>().map_err(|e| {
                WindowError::DataProcessing(format!("invalid value {:?}: {}", token, e))
            })
        })
        .collect()
}

/// `as_sequence_batch` yields one value per timestep.
const SERIES_FEATURES: usize = 1;

fn run_series(
    factory: &ModelFactory<NdarrayBackend>,
    input: &Path,
    window_size: usize,
    output: Option<&Path>,
    predict: bool,
) -> Result<(), WindowError> {
    info!("📥 Lendo série de {}", input.display());
    let series = parse_series(&fs::read_to_string(input)?)?;
    info!("✅ {} valores carregados", series.len());

    let dataset = SeriesDataset::from_series(&series, window_size);
    info!("📊 Janela {} -> X {:?} | y {:?}", window_size, dataset.inputs.dim(), dataset.targets.dim());
    if dataset.is_empty() {
        warn!("⚠️ Janela {} não cabe em {} valores; nenhum par gerado", window_size, series.len());
    }

    if let Some(path) = output {
        save_json(path, &dataset)?;
    }

    if predict && !dataset.is_empty() {
        let model = factory.part1(SERIES_FEATURES, window_size)?;
        model.log_summary();
        let predictions = model.predict_batch(&as_sequence_batch(&dataset.inputs))?;
        for (i, (pred, target)) in predictions.column(0).iter().zip(dataset.targets.column(0).iter()).take(5).enumerate() {
            info!("   ├── [{}] previsto {:.6} | alvo {:.6}", i, pred, target);
        }
        info!("   └── {} previsões", predictions.nrows());
    }

    Ok(())
}

fn run_text(
    factory: &ModelFactory<NdarrayBackend>,
    input: &Path,
    window_size: usize,
    step_size: usize,
    raw: bool,
    output: Option<&Path>,
) -> Result<(), WindowError> {
    info!("📥 Lendo texto de {}", input.display());
    let mut text = fs::read_to_string(input)?;
    if !raw {
        text = clean_text(&text.to_lowercase());
        debug!("🧹 Texto limpo: {} caracteres", text.chars().count());
    }

    let dataset = TextDataset::from_text(&text, window_size, step_size)?;
    info!("📊 Janela {} / passo {} -> {} entradas | {} saídas",
          window_size, step_size, dataset.inputs.len(), dataset.outputs.chars().count());

    let vocab = CharVocabulary::from_text(&text);
    info!("🔤 Vocabulário: {} caracteres", vocab.len());

    if let Some(path) = output {
        save_json(path, &dataset)?;
    }

    if !vocab.is_empty() && window_size > 0 {
        let model = factory.part2(window_size, vocab.len())?;
        model.log_summary();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_series_mixed_separators() {
        let values = parse_series("1, 2.5\n3\t-4e-1,,\n").unwrap();
        assert_eq!(values, vec![1.0, 2.5, 3.0, -0.4]);
    }

    #[test]
    fn test_parse_series_rejects_garbage() {
        assert!(matches!(parse_series("1 2 abc"), Err(WindowError::DataProcessing(_))));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "rnn-window", "text", "--input", "book.txt", "--window-size", "50", "--step-size", "3", "--verbose",
        ]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Text { window_size, step_size, raw, .. } => {
                assert_eq!(window_size, Some(50));
                assert_eq!(step_size, Some(3));
                assert!(!raw);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_factory_uses_config_units() {
        let mut config = AppConfig::default();
        config.model.regressor_units = 3;
        config.model.seed = Some(1);
        let model = build_factory(&config).part1(1, 4).unwrap();
        // 4 * (3 * (1 + 3) + 3) + (3 + 1)
        assert_eq!(model.num_parameters(), 64);
    }

    #[test]
    fn test_series_predict_ignores_config_step_size() {
        let mut config = AppConfig::default();
        config.series.step_size = 2;
        config.model.seed = Some(4);
        let factory = build_factory(&config);

        let input = std::env::temp_dir().join(format!("rnnwindow_{}_series.txt", std::process::id()));
        fs::write(&input, "1 2 3 4 5 6 7 8 9 10").unwrap();
        let result = run_series(&factory, &input, 3, None, true);
        fs::remove_file(&input).ok();

        assert!(result.is_ok(), "series prediction failed: {:?}", result);
    }
}
