use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;

use ssmerge_core::config::Settings;
use ssmerge_core::logging::init_logging;
use ssmerge_engine::files::has_conflict_markers;
use ssmerge_engine::{
    semistructured_merge, three_way_textual_merge, MergeConfig, MergeError, StrategyKind,
};

#[derive(Parser)]
#[command(
    name = "ssmerge",
    about = "Semistructured three-way merge for Java source files"
)]
struct Cli {
    /// Your revision (MINE)
    mine: PathBuf,
    /// The common ancestor (BASE)
    base: PathBuf,
    /// Their revision (YOURS)
    yours: PathBuf,

    /// Write the result here instead of stdout (git merge drivers pass
    /// the MINE path)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run as a git merge driver: accept arbitrary file names, stay quiet
    #[arg(short = 'g', long)]
    git: bool,

    /// Include the base contribution in conflict blocks
    #[arg(long)]
    show_base: bool,

    /// Compare lines byte-for-byte instead of ignoring whitespace
    #[arg(long)]
    keep_whitespace: bool,

    /// Textual merge strategy backing the content merger
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Skip the semistructured pipeline and run a plain textual merge
    #[arg(long)]
    textual_only: bool,

    #[arg(long)]
    no_type_ambiguity: bool,
    #[arg(long)]
    no_new_element: bool,
    #[arg(long)]
    no_renaming: bool,
    #[arg(long)]
    no_init_blocks: bool,
    /// Multi-block initializer handling (implies --no-init-blocks)
    #[arg(long)]
    init_blocks_multiple: bool,
    #[arg(long)]
    no_duplicated_declaration: bool,

    /// Data directory for settings and logs
    #[arg(long, default_value = ".ssmerge")]
    data_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Diff3,
    CsdiffDiff3,
}

fn build_config(cli: &Cli, settings: &Settings) -> MergeConfig {
    let strategy = match cli.strategy {
        Some(StrategyArg::Diff3) => StrategyKind::Diff3,
        Some(StrategyArg::CsdiffDiff3) => StrategyKind::CsDiffAndDiff3,
        None => match settings.merge.strategy.as_str() {
            "csdiff-diff3" => StrategyKind::CsDiffAndDiff3,
            _ => StrategyKind::Diff3,
        },
    };
    MergeConfig {
        show_base: cli.show_base || settings.merge.show_base,
        ignore_whitespace: settings.merge.ignore_whitespace && !cli.keep_whitespace,
        is_git: cli.git,
        strategy,
        type_ambiguity_error_handler: settings.handlers.type_ambiguity && !cli.no_type_ambiguity,
        new_element_referencing_edited_one_handler: settings
            .handlers
            .new_element_referencing_edited_one
            && !cli.no_new_element,
        method_and_constructor_renaming_and_deletion_handler: settings
            .handlers
            .renaming_and_deletion
            && !cli.no_renaming,
        initialization_blocks_handler: settings.handlers.initialization_blocks
            && !cli.no_init_blocks
            && !cli.init_blocks_multiple,
        initialization_blocks_handler_multiple_blocks: settings
            .handlers
            .initialization_blocks_multiple
            || cli.init_blocks_multiple,
        duplicated_declaration_handler: settings.handlers.duplicated_declaration
            && !cli.no_duplicated_declaration,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(result) => {
            if has_conflict_markers(&result) {
                // Same contract as git merge-file: conflicts exit nonzero.
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("ssmerge: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<String> {
    let _guard = init_logging(&cli.data_dir.join("logs"))?;
    let settings = Settings::load_or_default(&cli.data_dir.join("settings.json"));
    let cfg = build_config(cli, &settings);

    let result = if cli.textual_only {
        three_way_textual_merge(&cli.mine, &cli.base, &cli.yours, cfg.ignore_whitespace)?
    } else {
        match semistructured_merge(&cli.mine, &cli.base, &cli.yours, &cfg) {
            Ok(merged) => merged,
            Err(MergeError::Parse(e)) if !cli.git => return Err(e.into()),
            Err(e) => {
                // The structured pipeline gave up; a plain textual merge of
                // the whole file is always available.
                tracing::warn!(error = %e, "falling back to textual merge");
                three_way_textual_merge(
                    &cli.mine,
                    &cli.base,
                    &cli.yours,
                    cfg.ignore_whitespace,
                )?
            }
        }
    };

    match &cli.output {
        Some(path) => std::fs::write(path, &result)?,
        None => print!("{result}"),
    }
    Ok(result)
}
