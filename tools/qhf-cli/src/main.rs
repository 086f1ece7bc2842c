use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

mod render;

#[derive(Parser, Debug)]
#[command(name = "QHF CLI")]
#[command(about, author, version, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a QHF file or a directory of QHF files to JSON or TXT
    #[command(arg_required_else_help = true)]
    Convert {
        /// QHF file or a directory containing QHF files
        input: PathBuf,
        /// Output file or directory (stdout for a single file when omitted)
        out: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "json")]
        format: Format,
        /// Overwrite files
        #[arg(short = 'F', long, default_value_t = false, value_name = "TRUE|FALSE")]
        force: bool,
    },
    /// Print debugging information on a QHF file
    #[command(arg_required_else_help = true)]
    Info {
        /// QHF file
        file: PathBuf,
    },
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum Format {
    Json,
    Txt,
}

impl Format {
    fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Txt => "txt",
        }
    }
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new().filter_level(level).init();

    let stdout = console::Term::stdout();

    match cli.command {
        Commands::Convert {
            input,
            out,
            format,
            force,
        } => command_convert(stdout, input, out, format, force)?,
        Commands::Info { file } => command_info(stdout, file)?,
    }

    Ok(())
}

fn command_convert(
    stdout: console::Term,
    input: PathBuf,
    out: Option<PathBuf>,
    format: Format,
    force: bool,
) -> Result<()> {
    if input.is_dir() {
        convert_directory(stdout, &input, out, format, force)
    } else {
        convert_file(stdout, &input, out, format, force)
    }
}

fn convert_file(
    stdout: console::Term,
    input: &Path,
    out: Option<PathBuf>,
    format: Format,
    force: bool,
) -> Result<()> {
    if !is_history_file(input) {
        log::warn!("input file {} does not have a .qhf extension", input.display());
    }

    let content = render_file(input, format)?;

    match out {
        None => stdout.write_line(&content).into_diagnostic()?,
        Some(path) => write_output(&path, &content, force)?,
    }

    Ok(())
}

fn convert_directory(
    stdout: console::Term,
    input: &Path,
    out: Option<PathBuf>,
    format: Format,
    force: bool,
) -> Result<()> {
    let out_dir = out.unwrap_or_else(|| PathBuf::from(format!("qhf_{}_output", format.extension())));
    if !out_dir.exists() {
        std::fs::create_dir_all(&out_dir).into_diagnostic()?;
    } else if !out_dir.is_dir() {
        miette::bail!(
            "output path \"{}\" exists but is not a directory",
            out_dir.display()
        );
    }

    let files = collect_history_files(input)?;
    let bar = indicatif::ProgressBar::new(files.len() as u64);
    bar.set_style(get_bar_style()?);

    let mut converted: u32 = 0;
    let mut failed: u32 = 0;

    for path in &files {
        let name = path
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .unwrap_or_default();
        bar.set_message(name);

        let target = out_dir
            .join(path.file_stem().unwrap_or_default())
            .with_extension(format.extension());

        match render_file(path, format).and_then(|content| write_output(&target, &content, force)) {
            Ok(()) => converted += 1,
            Err(error) => {
                log::warn!("skipping {}: {error}", path.display());
                failed += 1;
            }
        }

        bar.inc(1);
    }

    bar.finish();

    let text = format!(
        "Total files: {};\nConverted: {};\nFailed: {};",
        files.len(),
        converted,
        failed
    );
    stdout.write_line(&text).into_diagnostic()?;

    if failed > 0 {
        miette::bail!("failed to convert {} of {} files", failed, files.len());
    }

    Ok(())
}

fn command_info(stdout: console::Term, file: PathBuf) -> Result<()> {
    let buffer = std::fs::read(&file).into_diagnostic()?;
    let record = libqhf::reader::decode_history(&buffer).into_diagnostic()?;

    let total_text_size: usize = record
        .messages
        .iter()
        .map(|message| message.text.len())
        .sum();

    let text = format!(
        "UIN: {};\nNickname: {};\nFormat version: {};\nDeclared size: {} (bytes);\nDeclared messages: {};\nActual size: {} (bytes);\nActual messages: {};\nTotal text size: {} (bytes);",
        record.header.uin,
        record.header.nickname,
        record.header.version,
        record.header.declared_size,
        record.header.declared_count,
        buffer.len(),
        record.messages.len(),
        total_text_size
    );
    stdout.write_line(&text).into_diagnostic()?;

    Ok(())
}

fn render_file(input: &Path, format: Format) -> Result<String> {
    let buffer = std::fs::read(input).into_diagnostic()?;
    let record = libqhf::reader::decode_history(&buffer).into_diagnostic()?;

    match format {
        Format::Json => render::to_json(&record),
        Format::Txt => Ok(render::to_txt(&record)),
    }
}

fn write_output(path: &Path, content: &str, force: bool) -> Result<()> {
    if !force && path.exists() {
        let message = format!("File \"{}\" exists. Overwrite it?", path.display());

        if !dialoguer::Confirm::new()
            .with_prompt(message)
            .interact()
            .into_diagnostic()?
        {
            return Ok(());
        }
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).into_diagnostic()?;
        }
    }

    std::fs::write(path, content).into_diagnostic()?;
    Ok(())
}

fn collect_history_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(root).into_diagnostic()? {
        let entry = entry.into_diagnostic()?;
        let path = entry.path();

        if path.is_file() && is_history_file(&path) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn is_history_file(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.eq_ignore_ascii_case("qhf"))
        .unwrap_or(false)
}

fn get_bar_style() -> Result<indicatif::ProgressStyle> {
    Ok(
        indicatif::ProgressStyle::with_template("[{bar:32}] {pos:>7}/{len:7} {msg}")
            .into_diagnostic()?
            .progress_chars("=>-"),
    )
}
