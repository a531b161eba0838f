use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "x")]
#[command(about = "Development automation for mcdrx")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Library modules that carry their own `tests/` directory
const MODULES: [(&str, &str); 10] = [
    ("gate-array", "core::gate_array"),
    ("word-ram", "core::word_ram"),
    ("cdc", "core::cdc"),
    ("cdd", "core::cdd"),
    ("cdrom", "core::cdrom"),
    ("pcm", "core::pcm"),
    ("gfx", "core::gfx"),
    ("interrupt", "core::interrupt"),
    ("memory", "core::memory"),
    ("system", "core::system"),
];

/// Criterion groups in `benches/asic_bench.rs`
const BENCH_GROUPS: [&str; 4] = ["gfx_operation", "pcm_render", "cell_byte_offset", "system_tick"];

/// Accepted boot ROM sizes (128 KB and the 256 KB dumps of later models)
const BOOT_ROM_SIZES: [u64; 2] = [128 * 1024, 256 * 1024];

#[derive(Args)]
struct TestArgs {
    /// Run only the doc tests
    #[arg(long)]
    doc: bool,
    /// Run only the integration tests under tests/
    #[arg(long, conflicts_with = "doc")]
    integration: bool,
    /// Include #[ignore] tests
    #[arg(long)]
    ignored: bool,
    /// Restrict to library modules (gate-array, word-ram, cdc, cdd, cdrom,
    /// pcm, gfx, interrupt, memory, system); repeatable
    #[arg(short = 'm', long = "module", value_parser = module_path)]
    modules: Vec<&'static str>,
}

#[derive(Subcommand)]
enum Commands {
    /// fmt check, clippy, build and the full test suite
    Ci {
        #[arg(long)]
        verbose: bool,
    },
    /// fmt check and clippy
    Check {
        #[arg(long)]
        verbose: bool,
    },
    /// Format the workspace
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Lint the library, binary, tests and benches
    Clippy {
        #[arg(long)]
        fix: bool,
    },
    /// Build the library and the mcdrx binary
    Build {
        #[arg(long)]
        release: bool,
    },
    /// Run tests
    Test(TestArgs),
    /// Run the ASIC benchmarks, optionally one criterion group
    Bench {
        #[arg(value_parser = BENCH_GROUPS)]
        group: Option<String>,
    },
    /// Run the mcdrx binary against a boot ROM
    BootRom {
        /// Path to the expansion unit boot ROM
        #[arg(default_value = "BOOT.BIN")]
        rom_path: String,
        /// Optional raw disc image to insert
        #[arg(short = 'd', long)]
        disc: Option<String>,
        /// Number of frames to run
        #[arg(short = 'n', long, default_value = "300")]
        frames: u32,
        /// Write a save state when the run ends
        #[arg(short = 's', long)]
        save_state: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Dump the table of contents of a raw disc image as JSON
    Toc {
        disc: String,
    },
    /// Install the git pre-commit hook (runs `cargo x check`)
    InstallHooks,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ci { verbose } => pipeline("CI", &CI_STEPS, verbose),
        Commands::Check { verbose } => pipeline("Quick Checks", &CHECK_STEPS, verbose),
        Commands::Fmt { check } => run(fmt(check)),
        Commands::Clippy { fix } => run(clippy(fix)),
        Commands::Build { release } => run(build(release)),
        Commands::Test(args) => test(&args),
        Commands::Bench { group } => {
            let mut cmd = cargo("bench");
            cmd.args(["--bench", "asic_bench"]);
            if let Some(group) = group {
                cmd.arg("--").arg(group);
            }
            run(cmd)
        }
        Commands::BootRom {
            rom_path,
            disc,
            frames,
            save_state,
            release,
        } => boot_rom(&rom_path, disc.as_deref(), frames, save_state.as_deref(), release),
        Commands::Toc { disc } => {
            let mut cmd = mcdrx(false);
            cmd.args(["--disc", &disc, "--dump-toc"]);
            run(cmd)
        }
        Commands::InstallHooks => install_hooks(),
    }
}

fn module_path(name: &str) -> Result<&'static str, String> {
    MODULES
        .iter()
        .find(|(flag, _)| *flag == name)
        .map(|(_, path)| *path)
        .ok_or_else(|| format!("unknown module '{}'", name))
}

// ----------------------------------------------------------------------
// Cargo invocations
// ----------------------------------------------------------------------

fn cargo(subcommand: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg(subcommand);
    cmd
}

fn fmt(check: bool) -> Command {
    let mut cmd = cargo("fmt");
    cmd.arg("--all");
    if check {
        cmd.args(["--", "--check"]);
    }
    cmd
}

fn clippy(fix: bool) -> Command {
    let mut cmd = cargo("clippy");
    cmd.args(["--workspace", "--all-targets"]);
    if fix {
        cmd.args(["--fix", "--allow-dirty"]);
    } else {
        cmd.args(["--", "-D", "warnings"]);
    }
    cmd
}

fn build(release: bool) -> Command {
    let mut cmd = cargo("build");
    cmd.args(["--workspace", "--bins"]);
    if release {
        cmd.arg("--release");
    }
    cmd
}

/// `cargo run` of the mcdrx binary, arguments follow `--`
fn mcdrx(release: bool) -> Command {
    let mut cmd = cargo("run");
    if release {
        cmd.arg("--release");
    }
    cmd.args(["--bin", "mcdrx", "--"]);
    cmd
}

fn run(mut cmd: Command) -> Result<()> {
    let status = cmd
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()?;

    if !status.success() {
        anyhow::bail!("Command failed with exit code: {}", status);
    }

    Ok(())
}

// ----------------------------------------------------------------------
// Pipelines
// ----------------------------------------------------------------------

type Step = (&'static str, fn() -> Result<()>);

const CHECK_STEPS: [Step; 2] = [("Format Check", fmt_check), ("Clippy", clippy_deny)];

const CI_STEPS: [Step; 4] = [
    ("Format Check", fmt_check),
    ("Clippy", clippy_deny),
    ("Build", build_debug),
    ("Test", test_all),
];

fn fmt_check() -> Result<()> {
    run(fmt(true))
}

fn clippy_deny() -> Result<()> {
    run(clippy(false))
}

fn build_debug() -> Result<()> {
    run(build(false))
}

fn test_all() -> Result<()> {
    run(test_command(false, false, &[]))
}

fn pipeline(title: &str, steps: &[Step], verbose: bool) -> Result<()> {
    println!("{}", format!("=== Running {} ===", title).bold().blue());

    let start = Instant::now();
    for (name, step) in steps {
        print!("{} {} ... ", "→".blue(), name);
        let step_start = Instant::now();
        if let Err(e) = step() {
            println!("{}", "✗".red().bold());
            return Err(e);
        }
        if verbose {
            println!(
                "{} ({:.2}s)",
                "✓".green().bold(),
                step_start.elapsed().as_secs_f64()
            );
        } else {
            println!("{}", "✓".green().bold());
        }
    }

    println!(
        "\n{} {}",
        format!("✓ {} passed in", title).green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

// ----------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------

fn test_command(doc: bool, integration: bool, filters: &[&str]) -> Command {
    let mut cmd = cargo("test");
    if doc {
        cmd.arg("--doc");
    } else if integration {
        cmd.args(["--test", "integration_test"]);
    } else if !filters.is_empty() {
        cmd.arg("--lib");
    }
    cmd.args(filters);
    cmd
}

fn test(args: &TestArgs) -> Result<()> {
    if args.modules.is_empty() {
        let mut cmd = test_command(args.doc, args.integration, &[]);
        if args.ignored {
            cmd.args(["--", "--include-ignored"]);
        }
        return run(cmd);
    }

    // One cargo invocation per module so a failure names its module
    let mut failed = Vec::new();
    for module in &args.modules {
        println!("{} Running {} tests...", "→".blue(), module.bold());
        let mut cmd = test_command(false, false, &[*module]);
        if args.ignored {
            cmd.args(["--", "--include-ignored"]);
        }
        match run(cmd) {
            Ok(()) => println!("{} {} passed\n", "✓".green(), module),
            Err(_) => {
                println!("{} {} failed\n", "✗".red(), module);
                failed.push(*module);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Failing modules: {}", failed.join(", "))
    }
}

// ----------------------------------------------------------------------
// Boot ROM run
// ----------------------------------------------------------------------

fn boot_rom(
    rom_path: &str,
    disc: Option<&str>,
    frames: u32,
    save_state: Option<&str>,
    release: bool,
) -> Result<()> {
    println!("{}", "=== Boot ROM Run ===".bold().blue());

    let rom = Path::new(rom_path);
    if !rom.exists() {
        println!("{} Boot ROM not found: {}", "✗".red().bold(), rom_path.yellow());
        println!(
            "\n{} Place a dump of the expansion unit boot ROM in the project root.",
            "ℹ".blue()
        );
        anyhow::bail!("Boot ROM not found");
    }

    let size = std::fs::metadata(rom)?.len();
    if !BOOT_ROM_SIZES.contains(&size) {
        println!(
            "{} Unexpected boot ROM size: {} bytes (expected 131072 or 262144)",
            "✗".red().bold(),
            size
        );
        anyhow::bail!("Invalid boot ROM size");
    }

    if let Some(disc) = disc {
        if !Path::new(disc).exists() {
            anyhow::bail!("Disc image not found: {}", disc);
        }
    }

    println!("{} Boot ROM: {}", "✓".green(), rom_path.cyan());
    println!("{} Disc: {}", "→".blue(), disc.unwrap_or("none").cyan());
    println!("{} Frames: {}", "→".blue(), frames.to_string().bold());
    println!();

    let mut cmd = mcdrx(release);
    cmd.arg(rom_path).args(["-n", &frames.to_string()]);
    if let Some(disc) = disc {
        cmd.args(["--disc", disc]);
    }
    if let Some(path) = save_state {
        cmd.args(["--save-state", path]);
    }

    let start = Instant::now();
    if let Err(e) = run(cmd) {
        println!("\n{} Boot ROM run failed", "✗".red().bold());
        return Err(e);
    }

    println!(
        "\n{} Boot ROM run completed in {}",
        "✓".green().bold(),
        format!("{:.2}s", start.elapsed().as_secs_f64()).bold()
    );
    Ok(())
}

fn install_hooks() -> Result<()> {
    let hook_path = Path::new(".git/hooks/pre-commit");
    if !hook_path.parent().is_some_and(Path::exists) {
        anyhow::bail!("No .git/hooks directory; run from the repository root");
    }

    std::fs::write(hook_path, "#!/bin/sh\nset -e\ncargo x check\n")?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(hook_path, std::fs::Permissions::from_mode(0o755))?;
    }

    println!("{} pre-commit hook installed (cargo x check)", "✓".green());
    Ok(())
}
