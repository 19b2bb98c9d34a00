use anyhow::{Context, Result};
use api_evidence::config::{load_json, out_root};
use api_evidence::envelope::{request_envelope, response_envelope, to_pretty_json};
use api_evidence::evidence::{
    capture_evidence, manifest_value, timestamp_iso, write_json_pretty, write_text_file,
    EvidenceManifest, EvidenceNames,
};
use api_evidence::highlight::annotate;
use api_evidence::page::render_page;
use api_evidence::{
    plan_capture, CapturedResponse, FieldValidator, GroupingProfile, LayoutReport, Scope,
    TestConfig, ValidationResult,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "api-evidence",
    version,
    about = "Validate highlight fields, render API evidence pages and crop grouped screenshots"
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print supported commands in JSON
    Commands,
    /// Validate the configured highlight fields and print the result JSON
    Validate(ValidateArgs),
    /// Render the highlighted request/response evidence page
    Render(RenderArgs),
    /// Group highlighted element boxes from a layout report into capture clips
    Regions(RegionsArgs),
    /// Crop grouped evidence images from a full-page screenshot
    Capture(CaptureArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Test configuration JSON (or - for stdin)
    #[arg(long)]
    config: PathBuf,
    /// Captured response JSON; response fields are skipped without it
    #[arg(long)]
    response: Option<PathBuf>,
    /// Print the human-readable summary instead of the full result
    #[arg(long, action = ArgAction::SetTrue)]
    summary: bool,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Test configuration JSON (or - for stdin)
    #[arg(long)]
    config: PathBuf,
    /// Captured response JSON
    #[arg(long)]
    response: PathBuf,
    /// Output HTML path (default: <out-root>/render/<prefix>_<ts>.html)
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RegionsArgs {
    /// Layout report JSON (or - for stdin)
    #[arg(long)]
    layout: PathBuf,
    #[command(flatten)]
    profile: ProfileArgs,
}

#[derive(Args, Debug)]
struct CaptureArgs {
    /// Test configuration JSON
    #[arg(long)]
    config: PathBuf,
    /// Captured response JSON
    #[arg(long)]
    response: PathBuf,
    /// Layout report JSON with container and highlight boxes per section
    #[arg(long)]
    layout: PathBuf,
    /// Full-page screenshot of the rendered evidence page
    #[arg(long)]
    image: PathBuf,
    /// Directory for cropped images (default: <out-root>/capture)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// Manifest sidecar path (default: <out-dir>/<prefix>_<ts>.json)
    #[arg(long)]
    sidecar: Option<PathBuf>,
    #[command(flatten)]
    profile: ProfileArgs,
}

/// Overrides for the standard grouping profile.
#[derive(Args, Debug, Default)]
struct ProfileArgs {
    /// Largest vertical gap (px) that keeps boxes in one group
    #[arg(long)]
    gap: Option<f64>,
    /// Horizontal padding (px) around a group
    #[arg(long)]
    hpad: Option<f64>,
    /// Vertical padding (px) around a group
    #[arg(long)]
    vpad: Option<f64>,
    /// Multiplier applied to the horizontal padding
    #[arg(long)]
    width_factor: Option<f64>,
    /// Multiplier applied to the vertical padding
    #[arg(long)]
    height_factor: Option<f64>,
}

impl ProfileArgs {
    fn resolve(&self) -> GroupingProfile {
        let base = GroupingProfile::STANDARD;
        GroupingProfile {
            vertical_gap_threshold: self.gap.unwrap_or(base.vertical_gap_threshold),
            horizontal_padding: self.hpad.unwrap_or(base.horizontal_padding),
            vertical_padding: self.vpad.unwrap_or(base.vertical_padding),
            width_expansion: self.width_factor.unwrap_or(base.width_expansion),
            height_expansion: self.height_factor.unwrap_or(base.height_expansion),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Commands => print_commands(),
        Commands::Validate(args) => command_validate(args),
        Commands::Render(args) => command_render(args),
        Commands::Regions(args) => command_regions(args),
        Commands::Capture(args) => command_capture(args),
    }
}

fn print_commands() -> Result<()> {
    let rows = vec![
        json!({
            "name": "validate",
            "description": "Check highlight fields against request body and response data, with suggestions."
        }),
        json!({
            "name": "render",
            "description": "Write the HTML evidence page with highlighted request/response fields."
        }),
        json!({
            "name": "regions",
            "description": "Group highlighted element boxes into padded capture clips."
        }),
        json!({
            "name": "capture",
            "description": "Crop grouped evidence images from a screenshot and write a manifest sidecar."
        }),
    ];
    print_json(&json!({ "commands": rows }))
}

fn command_validate(args: ValidateArgs) -> Result<()> {
    let config = read_config(&args.config)?;
    let response = match &args.response {
        Some(path) => Some(read_response(path)?),
        None => None,
    };

    let result = validate(&config, response.as_ref());
    if args.summary {
        print_json(&serde_json::to_value(result.summary())?)
    } else {
        print_json(&serde_json::to_value(&result)?)
    }
}

fn command_render(args: RenderArgs) -> Result<()> {
    let config = read_config(&args.config)?;
    let response = read_response(&args.response)?;
    let validation = validate(&config, Some(&response));
    let fields = &validation.corrected_fields;

    let request_text = to_pretty_json(&request_envelope(&config))?;
    let response_text = to_pretty_json(&response_envelope(&response))?;
    let html = render_page(&request_text, &response_text, fields, &timestamp_iso());

    let out = match args.out {
        Some(path) => path,
        None => EvidenceNames::new(out_root().join("render"), &config.evidence_prefix).page(),
    };
    write_text_file(&out, &html)
        .with_context(|| format!("failed to write evidence page: {}", out.display()))?;

    let request_out = out.with_extension("request.txt");
    let response_out = out.with_extension("response.txt");
    write_text_file(
        &request_out,
        &annotate(&request_text, &fields.request, Scope::Request.class_name()),
    )
    .with_context(|| format!("failed to write {}", request_out.display()))?;
    write_text_file(
        &response_out,
        &annotate(&response_text, &fields.response, Scope::Response.class_name()),
    )
    .with_context(|| format!("failed to write {}", response_out.display()))?;

    info!(page = %out.display(), "evidence page written");
    print_json(&json!({
        "page": out,
        "request_text": request_out,
        "response_text": response_out,
        "status": response.status,
        "passed": response.is_success(),
        "validation": validation,
    }))
}

fn command_regions(args: RegionsArgs) -> Result<()> {
    let layout: LayoutReport = load_json(&args.layout)
        .with_context(|| format!("failed to read layout report: {}", args.layout.display()))?;
    let profile = args.profile.resolve();

    let mut plans = Map::new();
    for (scope, section) in [
        (Scope::Request, &layout.request),
        (Scope::Response, &layout.response),
    ] {
        let Some(section) = section else {
            continue;
        };
        let entry = match plan_capture(&section.boxes, &section.container, &profile) {
            Ok(plan) => serde_json::to_value(plan)?,
            Err(err) => {
                warn!(%scope, error = %err, "cannot plan capture");
                json!({ "error": err.to_string() })
            }
        };
        plans.insert(scope.to_string(), entry);
    }

    print_json(&json!({ "profile": profile, "plans": plans }))
}

fn command_capture(args: CaptureArgs) -> Result<()> {
    let config = read_config(&args.config)?;
    let response = read_response(&args.response)?;
    let layout: LayoutReport = load_json(&args.layout)
        .with_context(|| format!("failed to read layout report: {}", args.layout.display()))?;
    let profile = args.profile.resolve();

    let validation = validate(&config, Some(&response));
    let out_dir = args.out_dir.unwrap_or_else(|| out_root().join("capture"));
    let names = EvidenceNames::new(out_dir, &config.evidence_prefix);

    let (full_page, scopes) = capture_evidence(&args.image, &layout, &profile, &names)
        .with_context(|| format!("failed to capture evidence from {}", args.image.display()))?;

    let mut manifest = EvidenceManifest::new(&config, &response, validation);
    manifest.full_page = Some(full_page);
    manifest.scopes = scopes;

    let sidecar = args.sidecar.unwrap_or_else(|| names.manifest());
    write_json_pretty(&sidecar, &manifest)
        .with_context(|| format!("failed to write manifest: {}", sidecar.display()))?;
    info!(
        manifest = %sidecar.display(),
        images = manifest.images().len(),
        "evidence manifest written"
    );

    let mut payload = manifest_value(&manifest)?;
    if let Value::Object(map) = &mut payload {
        map.insert("manifest_path".to_string(), json!(sidecar));
    }
    print_json(&payload)
}

fn validate(config: &TestConfig, response: Option<&CapturedResponse>) -> ValidationResult {
    let result = FieldValidator::default().validate(config, response.map(|r| &r.data));
    if result.valid {
        info!(
            request = result.corrected_fields.request.len(),
            response = result.corrected_fields.response.len(),
            "highlight fields validated"
        );
    } else {
        for issue in &result.issues {
            warn!(
                field = %issue.field,
                scope = %issue.scope,
                suggestions = ?issue.suggestions,
                "{}",
                issue.reason
            );
        }
        for warning in &result.warnings {
            warn!("{warning}");
        }
    }
    result
}

fn read_config(path: &Path) -> Result<TestConfig> {
    load_json(path).with_context(|| format!("failed to read test config: {}", path.display()))
}

fn read_response(path: &Path) -> Result<CapturedResponse> {
    load_json(path).with_context(|| format!("failed to read captured response: {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_flags_override_standard_values() {
        let args = ProfileArgs {
            gap: Some(40.0),
            width_factor: Some(1.0),
            ..ProfileArgs::default()
        };
        let profile = args.resolve();
        assert_eq!(profile.vertical_gap_threshold, 40.0);
        assert_eq!(profile.width_expansion, 1.0);
        assert_eq!(profile.horizontal_padding, 50.0);
        assert_eq!(profile.vertical_padding, 80.0);
        assert_eq!(profile.height_expansion, 2.0);
    }

    #[test]
    fn cli_parses_capture_with_profile_flags() {
        let cli = Cli::try_parse_from([
            "api-evidence",
            "capture",
            "--config",
            "c.json",
            "--response",
            "r.json",
            "--layout",
            "l.json",
            "--image",
            "page.png",
            "--gap",
            "60",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Capture(args) => {
                assert_eq!(args.image, PathBuf::from("page.png"));
                assert_eq!(args.profile.resolve().vertical_gap_threshold, 60.0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn validate_requires_config() {
        assert!(Cli::try_parse_from(["api-evidence", "validate"]).is_err());
    }
}
