use clap::{Parser, Subcommand, ValueEnum};
use finident::batch::{validate_csv, BatchSummary};
use finident::country::COUNTRY_FORMATS;
use finident::generator::{generate_identifiers, GeneratorConfig};
use finident::issuer::ordered_ranges;
use finident::logging;
use finident::models::IdentifierRow;
use finident::{
    guess_iban_country, validate_bban, validate_iban_with, validate_pan, LengthPolicy,
};
use rand::Rng;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "finident")]
#[command(about = "IBAN, BBAN and payment card number validator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Iban(IbanArgs),
    Bban(BbanArgs),
    Guess(GuessArgs),
    Pan(PanArgs),
    Batch(BatchArgs),
    Generate(GenerateArgs),
    Formats,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Minimum,
    Exact,
    Structural,
}

impl From<PolicyArg> for LengthPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Minimum => LengthPolicy::Minimum,
            PolicyArg::Exact => LengthPolicy::Exact,
            PolicyArg::Structural => LengthPolicy::Structural,
        }
    }
}

#[derive(Parser)]
struct IbanArgs {
    value: String,
    #[arg(long, default_value_t = false)]
    no_cleanup: bool,
    #[arg(long, value_enum, default_value_t = PolicyArg::Exact)]
    length_policy: PolicyArg,
}

#[derive(Parser)]
struct BbanArgs {
    value: String,
    #[arg(long)]
    country: String,
    #[arg(long, default_value_t = false)]
    no_cleanup: bool,
}

#[derive(Parser)]
struct GuessArgs {
    value: String,
    #[arg(long, default_value_t = false)]
    no_cleanup: bool,
}

#[derive(Parser)]
struct PanArgs {
    value: String,
}

#[derive(Parser)]
struct BatchArgs {
    #[arg(long, default_value = "data/identifiers.csv")]
    input: PathBuf,
    #[arg(long, default_value = "data/identifiers_validated.csv")]
    output: PathBuf,
    #[arg(long, value_enum, default_value_t = PolicyArg::Exact)]
    length_policy: PolicyArg,
}

#[derive(Parser)]
struct GenerateArgs {
    #[arg(long, default_value_t = 100)]
    count: usize,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 0.5)]
    iban_ratio: f64,
    #[arg(long, default_value_t = 0.0)]
    invalid_ratio: f64,
    #[arg(long)]
    countries: Option<String>,
    #[arg(long, default_value = "data/identifiers.csv")]
    output: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    logging::init_logging("finident")?;
    let cli = Cli::parse();
    match cli.command {
        Command::Iban(args) => run_iban(args),
        Command::Bban(args) => run_bban(args),
        Command::Guess(args) => run_guess(args),
        Command::Pan(args) => run_pan(args),
        Command::Batch(args) => run_batch(args),
        Command::Generate(args) => run_generate(args),
        Command::Formats => run_formats(),
    }
}

fn run_iban(args: IbanArgs) -> Result<(), String> {
    let record = validate_iban_with(&args.value, !args.no_cleanup, args.length_policy.into());
    match (&record.parts, &record.error) {
        (Some(parts), None) => {
            emit_info_line(&format!("{} is a valid IBAN", record.normalized));
            emit_info_line(&format!(
                "Country code: {}, check digits: {}, BBAN: {}",
                parts.country_code, parts.check_digits, parts.bban
            ));
            Ok(())
        }
        (_, Some(err)) => Err(format!("{}: {}", record.normalized, err)),
        (None, None) => Err(format!("{}: no decomposition", record.normalized)),
    }
}

fn run_bban(args: BbanArgs) -> Result<(), String> {
    let country = args.country.trim().to_uppercase();
    let record = validate_bban(&args.value, &country, !args.no_cleanup);
    if let Some(err) = &record.error {
        return Err(format!("{}: {}", record.normalized, err));
    }
    emit_info_line(&format!(
        "{} is a valid BBAN for {}",
        record.normalized, record.country_code
    ));
    Ok(())
}

fn run_guess(args: GuessArgs) -> Result<(), String> {
    let candidates = guess_iban_country(&args.value, !args.no_cleanup);
    if candidates.is_empty() {
        return Err(format!("no country matches {}", args.value.trim()));
    }
    emit_info_line(&format!("{} candidate country(ies)", candidates.len()));
    for (country, candidate) in &candidates {
        emit_info_line(&format!("{}: {}", country, candidate));
    }
    Ok(())
}

fn run_pan(args: PanArgs) -> Result<(), String> {
    let record = validate_pan(&args.value);
    if let Some(err) = &record.error {
        let issuer = record
            .issuer
            .as_ref()
            .map(|issuer| format!(" (issuer {})", issuer.issuer_name))
            .unwrap_or_default();
        return Err(format!("{}: {}{}", record.normalized, err, issuer));
    }
    emit_info_line(&format!("{} is a valid PAN", record.normalized));
    if let Some(issuer) = &record.issuer {
        emit_info_line(&format!(
            "Issuer: {}, IIN: {}, algorithm: {}",
            issuer.issuer_name, issuer.iin, issuer.algorithm
        ));
    }
    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<(), String> {
    ensure_parent(&args.output)?;
    let start = Instant::now();
    let summary = validate_csv(&args.input, &args.output, args.length_policy.into())?;
    let elapsed = start.elapsed();

    emit_info_line(&format!(
        "Batch: input={} output={}",
        args.input.display(),
        args.output.display()
    ));
    log_batch_summary(&summary);
    emit_info_line(&format!("Validation time: {} ms", elapsed.as_millis()));
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<(), String> {
    let seed = args.seed.unwrap_or_else(random_seed);
    let countries = match args.countries {
        Some(value) => {
            let parsed = parse_country_list(&value)?;
            if parsed.is_empty() {
                None
            } else {
                Some(parsed)
            }
        }
        None => None,
    };
    let config = GeneratorConfig {
        count: args.count,
        iban_ratio: args.iban_ratio,
        invalid_ratio: args.invalid_ratio,
        countries,
    };

    log::info!(
        "Generating {} identifiers (iban_ratio={}, invalid_ratio={}, seed {})",
        config.count,
        config.iban_ratio,
        config.invalid_ratio,
        seed
    );
    let start = Instant::now();
    let rows = generate_identifiers(&config, seed)?;
    let elapsed = start.elapsed();

    ensure_parent(&args.output)?;
    write_csv(&args.output, &rows)?;
    emit_info_line(&format!(
        "Generated {} identifiers to {} (seed {})",
        rows.len(),
        args.output.display(),
        seed
    ));
    emit_info_line(&format!("Generation time: {} ms", elapsed.as_millis()));
    Ok(())
}

fn run_formats() -> Result<(), String> {
    for format in COUNTRY_FORMATS {
        println!(
            "{}  length {:>2}  bban {}",
            format.country_code, format.total_length, format.bban
        );
    }
    println!();
    for range in ordered_ranges() {
        println!(
            "{}-{}  {} [{}-{}] {}",
            range.prefix_low,
            range.prefix_high,
            range.issuer_name,
            range.min_length,
            range.max_length,
            range.algorithm
        );
    }
    Ok(())
}

fn parse_country_list(input: &str) -> Result<Vec<String>, String> {
    let mut countries: Vec<String> = Vec::new();
    for raw in input.split(',') {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        let code = trimmed.to_uppercase();
        if code.len() != 2 || !code.chars().all(|ch| ch.is_ascii_alphabetic()) {
            return Err(format!("invalid country code in --countries: {}", trimmed));
        }
        if !countries.contains(&code) {
            countries.push(code);
        }
    }
    Ok(countries)
}

fn random_seed() -> u64 {
    let mut rng = rand::rngs::OsRng;
    rng.gen()
}

fn ensure_parent(path: &Path) -> Result<(), String> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            create_dir_all(parent).map_err(|err| err.to_string())
        }
        _ => Ok(()),
    }
}

fn write_csv(output: &Path, rows: &[IdentifierRow]) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(output).map_err(|err| err.to_string())?;
    for row in rows {
        writer.serialize(row).map_err(|err| err.to_string())?;
    }
    writer.flush().map_err(|err| err.to_string())
}

fn log_batch_summary(summary: &BatchSummary) {
    emit_info_line(&format!(
        "Identifiers: total={} valid={} invalid={}",
        summary.total_records, summary.valid_records, summary.invalid_records
    ));

    let mut items: Vec<(&String, &usize)> = summary.failures.iter().collect();
    items.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    for (kind, count) in items {
        emit_info_line(&format!("Failures: {} = {}", kind, count));
    }
}

fn emit_info_line(message: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{}", message);
    } else {
        println!("{message}");
    }
}
