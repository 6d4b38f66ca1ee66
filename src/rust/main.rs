use emojiml::{Classifier, ClassificationResult, EncoderConfig, ModelBundle, Vocabulary};
use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bundle directory holding model.onnx, vocab.txt and labels.txt
    /// (defaults to $EMOJIML_HOME/bundle or the platform data directory)
    #[arg(short, long, conflicts_with_all = ["model", "vocab", "labels"])]
    bundle: Option<PathBuf>,

    /// ONNX model file
    #[arg(long, requires_all = ["vocab", "labels"])]
    model: Option<PathBuf>,

    /// Dictionary file with "<word> <index>" lines
    #[arg(long, requires = "labels")]
    vocab: Option<PathBuf>,

    /// Label file with one label per line
    #[arg(long, requires = "vocab")]
    labels: Option<PathBuf>,

    /// Number of positions in the encoded sequence
    #[arg(long, default_value_t = EncoderConfig::DEFAULT_SEQUENCE_LENGTH)]
    sequence_length: usize,

    /// Show only the K most confident labels
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Pad the last sequence position too
    #[arg(long)]
    pad_final_position: bool,

    /// Check the bundle against its checksum file before loading
    #[arg(long, conflicts_with_all = ["model", "vocab", "labels"])]
    verify: bool,

    /// Write a checksum file for the bundle and exit
    #[arg(long, conflicts_with_all = ["model", "vocab", "labels"])]
    write_checksums: bool,

    /// Print the encoded sequence instead of classifying
    #[arg(long)]
    encode_only: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Texts to classify; read one per line from stdin when omitted
    texts: Vec<String>,
}

struct Sources {
    model: Option<PathBuf>,
    vocab: PathBuf,
    labels: PathBuf,
}

fn resolve_sources(args: &Args) -> Result<Option<Sources>> {
    if let (Some(vocab), Some(labels)) = (&args.vocab, &args.labels) {
        if args.model.is_none() && !args.encode_only {
            bail!("--model is required unless --encode-only is given");
        }
        return Ok(Some(Sources {
            model: args.model.clone(),
            vocab: vocab.clone(),
            labels: labels.clone(),
        }));
    }

    let bundle = match &args.bundle {
        Some(dir) => ModelBundle::open(dir),
        None => ModelBundle::open_default(),
    }
    .context("Failed to open model bundle")?;

    if args.write_checksums {
        bundle.write_checksums().context("Failed to write checksums")?;
        return Ok(None);
    }
    if args.verify {
        bundle.verify().context("Bundle verification failed")?;
    }

    Ok(Some(Sources {
        model: Some(bundle.model_path()),
        vocab: bundle.vocab_path(),
        labels: bundle.labels_path(),
    }))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let Some(sources) = resolve_sources(&args)? else {
        return Ok(());
    };

    let start_time = Instant::now();
    let vocabulary = Vocabulary::from_files(&sources.vocab, &sources.labels)?;

    let mut builder = Classifier::builder()
        .with_vocabulary(vocabulary)
        .with_sequence_length(args.sequence_length)?
        .pad_final_position(args.pad_final_position);
    if let Some(k) = args.top_k {
        builder = builder.with_top_k(k)?;
    }

    let classifier = match &sources.model {
        Some(model) if !args.encode_only => builder.with_model(model)?.build()?,
        // Encoding never reaches the engine
        _ => builder
            .with_engine(|_: &emojiml::EncodedInput| -> Result<Vec<f32>, emojiml::ClassifierError> {
                Err(emojiml::ClassifierError::ModelError("No model loaded".into()))
            })?
            .build()?,
    };
    info!("Classifier built in {:.2?}", start_time.elapsed());

    let classify_start = Instant::now();
    let mut processed = 0u32;

    if args.texts.is_empty() {
        processed = process_lines(&classifier, io::stdin().lock(), &args)?;
    } else {
        for text in &args.texts {
            process_text(&classifier, text, &args)?;
            processed += 1;
        }
    }

    if processed > 0 {
        info!(
            "Processed {} inputs in {:.2?} ({:.2?} each)",
            processed,
            classify_start.elapsed(),
            classify_start.elapsed() / processed
        );
    }
    Ok(())
}

/// Classifies each line as soon as it is read.
fn process_lines<R: BufRead>(classifier: &Classifier, reader: R, args: &Args) -> Result<u32> {
    let mut processed = 0;
    for line in reader.lines() {
        let text = line.context("Failed to read text from stdin")?;
        process_text(classifier, &text, args)?;
        processed += 1;
    }
    Ok(processed)
}

fn process_text(classifier: &Classifier, text: &str, args: &Args) -> Result<()> {
    if args.encode_only {
        let encoded = classifier.encode(text)?;
        let sequence: Vec<i32> = encoded.iter().copied().collect();
        if args.json {
            println!("{}", serde_json::to_string(&sequence)?);
        } else {
            let rendered: Vec<String> = sequence.iter().map(i32::to_string).collect();
            println!("{}", rendered.join(" "));
        }
        return Ok(());
    }

    let results = classifier
        .classify(text)
        .with_context(|| format!("Failed to classify {:?}", text))?;
    print_results(text, &results, args.json)
}

fn print_results(text: &str, results: &[ClassificationResult], json: bool) -> Result<()> {
    if json {
        let line = serde_json::json!({ "text": text, "results": results });
        println!("{}", line);
        return Ok(());
    }

    println!("{}", text);
    for result in results {
        println!("  {} ({}): {:.1}%", result.label, result.id, result.confidence * 100.0);
    }
    Ok(())
}
