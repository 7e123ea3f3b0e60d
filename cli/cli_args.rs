use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ProjectConfigOpts {
    #[arg(
        long,
        help = "Specify the target project directory (default: current dir).",
        help_heading = "Project Setup",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,

    #[arg(
        long,
        help = "Specify path/filename of the TOML config file (default: .xtools/xsnapshot/xsnapshot.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Project Setup"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config",
        help_heading = "Project Setup"
    )]
    pub no_config: bool,

    #[arg(
        long,
        help = "Specify the project name (overrides config/dir name).",
        value_name = "NAME",
        help_heading = "Project Setup"
    )]
    pub project_name: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterGroup {
    #[arg(long = "include", value_name = "REGEX", action = clap::ArgAction::Append, help = "Keep paths matching REGEX even if a default exclusion applies.", help_heading = "Filtering")]
    pub include: Vec<String>,

    #[arg(long = "exclude", value_name = "REGEX", action = clap::ArgAction::Append, help = "Skip paths matching REGEX.", help_heading = "Filtering")]
    pub exclude: Vec<String>,

    #[arg(
        long,
        value_name = "MB",
        help = "Skip files larger than MB mebibytes [default: 5].",
        help_heading = "Filtering"
    )]
    pub max_file_mb: Option<u64>,

    #[arg(
        long,
        help = "Do not force-keep manifest files such as Cargo.toml or package.json.",
        help_heading = "Filtering"
    )]
    pub no_preserve_manifests: bool,

    #[arg(
        long,
        help = "Respect .gitignore files [default: enabled].",
        overrides_with = "disable_gitignore",
        help_heading = "Filtering"
    )]
    pub enable_gitignore: bool,
    #[arg(
        long,
        help = "Do not respect .gitignore files.",
        overrides_with = "enable_gitignore",
        help_heading = "Filtering"
    )]
    pub disable_gitignore: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Print structured output instead of a table.", value_name = "FORMAT", value_parser = ["json", "yaml"], help_heading = "Output Formatting")]
    pub format: Option<String>,

    #[arg(
        long,
        help = "Print JSON on a single line.",
        help_heading = "Output Formatting"
    )]
    pub minify: bool,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Snapshot a project's source into a redacted, shareable text bundle.",
    long_about = "xsnapshot walks a project, skips binaries, build output, lockfiles and secret files, \nredacts credentials from what remains and writes a bundle \n(contents.txt, tree.txt, summary.txt, optional metadata.json).",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  xsnapshot generate\n  xsnapshot generate --exclude '^docs/' --metadata\n  xsnapshot explain -f json\n  xsnapshot metrics",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(
        visible_alias = "g",
        visible_alias = "gen",
        about = "Scan the project and write the snapshot bundle."
    )]
    Generate(GenerateArgs),

    #[command(
        visible_alias = "e",
        about = "Show the keep/skip decision and reason for every file."
    )]
    Explain(ExplainArgs),

    #[command(
        visible_alias = "m",
        about = "Calculate and display statistics of the kept files."
    )]
    Metrics(MetricsArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),

    #[command(about = "Show or save the default configuration file.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterGroup,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Write the bundle into DIR [default: .xtools/xsnapshot/snapshot].",
        help_heading = "Output Control",
        conflicts_with = "stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        help = "Print the concatenated contents to standard output instead of writing files.",
        help_heading = "Output Control"
    )]
    pub stdout: bool,

    #[arg(
        long,
        help = "Also write metadata.json.",
        help_heading = "Output Control"
    )]
    pub metadata: bool,

    #[arg(long, help = "Do not write tree.txt.", help_heading = "Output Control")]
    pub no_tree: bool,

    #[arg(
        long,
        help = "Disable secret redaction.",
        help_heading = "Redaction"
    )]
    pub no_redact: bool,

    #[arg(
        long,
        help = "Do not include recent git history in the summary.",
        conflicts_with = "git_commits",
        help_heading = "Git"
    )]
    pub no_git: bool,

    #[arg(
        long,
        value_name = "N",
        help = "Number of recent commits to include [default: 20].",
        help_heading = "Git"
    )]
    pub git_commits: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct ExplainArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterGroup,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,

    #[arg(
        long,
        help = "Only list skipped files.",
        conflicts_with = "kept"
    )]
    pub skipped: bool,

    #[arg(long, help = "Only list kept files.", conflicts_with = "skipped")]
    pub kept: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricsArgs {
    #[clap(flatten)]
    pub project_config: ProjectConfigOpts,
    #[clap(flatten)]
    pub filters: FilterGroup,
    #[clap(flatten)]
    pub format_output: FormatOutputOpts,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (fish, bash, zsh) [default: fish]"
    )]
    pub shell: Option<String>,
    #[arg(long, help = "Save completion script to the default location.")]
    pub save: bool,
    #[arg(long, requires = "save", help = "Overwrite an existing completion script.")]
    pub force: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Specify the target project directory (default: current dir).",
        value_name = "PATH"
    )]
    pub project_root: Option<PathBuf>,
    #[arg(
        long,
        help = "Save the default config to .xtools/xsnapshot/xsnapshot.toml."
    )]
    pub save: bool,
    #[arg(long, requires = "save", help = "Overwrite an existing config file.")]
    pub force: bool,
}
