use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const AWS_CRATE: &str = "lake_pipeline_aws";
const CORE_CRATE: &str = "lake_pipeline_core";
const INGEST_BIN: &str = "ingest_lambda";
const CURATE_BIN: &str = "curate_job";
const DIST_DIR: &str = "dist";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the lake pipeline workspace",
    long_about = "Builds, checks, and packages the Kinesis ingest Lambda and\n\
                  the curate job binary."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the ingest Lambda and curate job for deployment
    Package {
        /// Compilation target triple for the binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting and clippy
    Lint,
    /// Unit and integration tests
    Test,
    /// Run lint + test
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn run_cargo(args: &[&str]) {
    eprintln!("+ cargo {}", args.join(" "));
    let status: ExitStatus = Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo");
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn ensure_rust_target_installed(target: &str) {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(value) => value,
        Err(error) => {
            eprintln!("warning: could not run rustup ({error}); skipping target preflight");
            return;
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if output.status.success() && !installed.lines().any(|line| line.trim() == target) {
        panic!(
            "rust target `{target}` is not installed. run `rustup target add {target}` and retry `cargo run -p xtask -- package`"
        );
    }
}

fn built_binary(target: &str, profile: BuildProfile, bin_name: &str) -> PathBuf {
    let file_name = if target.contains("windows") {
        format!("{bin_name}.exe")
    } else {
        bin_name.to_string()
    };
    Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(file_name)
}

/// Zips `binary_path` as the `bootstrap` entry the `provided.al2023` Lambda
/// runtime executes.
fn package_lambda_zip(binary_path: &Path, zip_path: &Path) {
    let binary = fs::read(binary_path)
        .unwrap_or_else(|error| panic!("missing binary '{}': {error}", binary_path.display()));
    let file = fs::File::create(zip_path).expect("failed to create lambda zip");
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .expect("failed to start bootstrap entry in lambda zip");
    zip.write_all(&binary)
        .expect("failed to write bootstrap entry");
    zip.finish().expect("failed to finish lambda zip");
}

fn package(target: &str, profile: BuildProfile) {
    ensure_rust_target_installed(target);

    step("Build pipeline binaries");
    let mut cargo_args = vec![
        "build", "-p", AWS_CRATE, "--target", target, "--bin", INGEST_BIN, "--bin", CURATE_BIN,
    ];
    if let Some(flag) = profile.as_cargo_flag() {
        cargo_args.push(flag);
    }
    run_cargo(&cargo_args);

    step("Package deployment artifacts");
    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).expect("failed to create dist directory");

    let ingest_zip = dist_dir.join(format!("{INGEST_BIN}.zip"));
    package_lambda_zip(&built_binary(target, profile, INGEST_BIN), &ingest_zip);

    let curate_binary = dist_dir.join(CURATE_BIN);
    fs::copy(built_binary(target, profile, CURATE_BIN), &curate_binary)
        .expect("failed to copy curate job binary");

    eprintln!(
        "\nPackaged artifacts:\n- {}\n- {}",
        ingest_zip.display(),
        curate_binary.display()
    );
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_lint() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&["clippy", "--all-targets", "--", "-D", "warnings"]);
}

fn ci_test() {
    step("Test lake_pipeline_core");
    run_cargo(&["test", "-p", CORE_CRATE]);

    step("Test lake_pipeline_aws");
    run_cargo(&["test", "-p", AWS_CRATE]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { job } => {
            match job {
                CiJob::Lint => ci_lint(),
                CiJob::Test => ci_test(),
                CiJob::Check => {
                    ci_lint();
                    ci_test();
                }
            }
            eprintln!("\nCI job passed.");
        }
        Commands::Package { target, profile } => package(&target, profile),
    }
}
