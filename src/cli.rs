use crate::document::SwaggerDocument;
use crate::manager::{DocumentationOnly, SwagApiManager};
use crate::manifest::Manifest;
use crate::scaffold::{ScaffoldConfig, ScaffoldWriter};
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::server::{self, DEFAULT_STATIC_URL_PATH};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, info};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Swagger document generator for auto-generated REST APIs
#[derive(Parser, Debug)]
#[command(name = "restless-swagger")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the Swagger document (and optionally test stubs) from a model manifest
    Generate(GenerateArgs),
    /// Serve the Swagger document over HTTP
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Path to the model manifest (YAML or JSON)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Write integration test stubs into this directory
    #[arg(long = "tests-dir", value_name = "DIR")]
    pub tests_dir: Option<PathBuf>,

    /// Directory with test template overrides
    #[arg(long = "templates", value_name = "DIR", requires = "tests_dir")]
    pub templates_dir: Option<PathBuf>,

    /// Environment variable holding the API key used by generated tests
    #[arg(long = "api-key-env", default_value = "SWAGGER_API_KEY")]
    pub api_key_env: String,

    /// Base URL generated tests run against
    #[arg(long = "base-url", default_value = "http://localhost:5000/api")]
    pub base_url: String,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to the model manifest (YAML or JSON)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Address to listen on
    #[arg(long = "addr", default_value = "127.0.0.1:5000")]
    pub addr: SocketAddr,

    /// Static namespace the document is mounted under
    #[arg(long = "static-path", default_value = DEFAULT_STATIC_URL_PATH)]
    pub static_path: String,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    let manifest = match &args.command {
        Command::Generate(generate) => &generate.manifest,
        Command::Serve(serve) => &serve.manifest,
    };
    if !manifest.is_file() {
        anyhow::bail!("Manifest file does not exist: {}", manifest.display());
    }
    info!("Manifest: {}", manifest.display());

    if let Command::Generate(generate) = &args.command {
        info!("Output format: {:?}", generate.output_format);
        match &generate.output_path {
            Some(output) => info!("Output file: {}", output.display()),
            None => info!("Output: stdout"),
        }
        if let Some(templates) = &generate.templates_dir {
            if !templates.is_dir() {
                anyhow::bail!("Template directory does not exist: {}", templates.display());
            }
        }
    }

    Ok(args)
}

/// Registers every model the manifest marks for registration.
pub fn build_document(manifest: &Manifest, scaffold: Option<ScaffoldWriter>) -> Result<SwaggerDocument> {
    let catalog = manifest.catalog();
    let mut manager = SwagApiManager::new(DocumentationOnly);
    if let Some(scaffold) = scaffold {
        manager = manager.with_scaffold(scaffold);
    }
    manifest.api.apply(manager.document_mut());

    for (name, options) in manifest.registrations() {
        manager
            .register(&catalog, name, options)
            .with_context(|| format!("Failed to register model {}", name))?;
    }

    let document = manager.finalize();
    info!(
        "Documented {} paths and {} definitions",
        document.paths.len(),
        document.definitions.len()
    );
    Ok(document)
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::from_path(path).with_context(|| format!("Failed to load {}", path.display()))
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Generate(generate) => run_generate(generate),
        Command::Serve(serve) => run_serve(serve),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let manifest = load_manifest(&args.manifest)?;

    let scaffold = match &args.tests_dir {
        Some(tests_dir) => {
            let config = ScaffoldConfig {
                tests_dir: tests_dir.clone(),
                templates_dir: args.templates_dir.clone(),
                api_key_env: args.api_key_env.clone(),
                base_url: args.base_url.clone(),
            };
            Some(ScaffoldWriter::begin(&config).context("Failed to prepare test scaffolding")?)
        }
        None => None,
    };

    let document = build_document(&manifest, scaffold)?;

    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        info!("Successfully wrote Swagger document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let manifest = load_manifest(&args.manifest)?;
    let document = build_document(&manifest, None)?;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(server::serve(document, args.addr, &args.static_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_generate_args() {
        let args = CliArgs::parse_from([
            "restless-swagger",
            "generate",
            "models.yaml",
            "-f",
            "yaml",
            "-o",
            "out.yaml",
            "-v",
        ]);
        assert!(args.verbose);
        let Command::Generate(generate) = args.command else {
            panic!("expected generate");
        };
        assert!(matches!(generate.output_format, OutputFormat::Yaml));
        assert_eq!(generate.output_path, Some(PathBuf::from("out.yaml")));
        assert!(generate.tests_dir.is_none());
    }

    #[test]
    fn test_parse_serve_defaults() {
        let args = CliArgs::parse_from(["restless-swagger", "serve", "models.yaml"]);
        let Command::Serve(serve) = args.command else {
            panic!("expected serve");
        };
        assert_eq!(serve.addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(serve.static_path, "/static");
    }

    #[test]
    fn test_missing_manifest_is_rejected() {
        let args = CliArgs::parse_from(["restless-swagger", "generate", "/nonexistent/models.yaml"]);
        assert!(parse_args_from_parsed(args).is_err());
    }

    #[test]
    fn test_generate_writes_output() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = temp_dir.path().join("models.yaml");
        fs::write(
            &manifest,
            "models:\n  - name: Tag\n    table_name: tags\n    columns:\n      - { name: id, type: INTEGER, primary_key: true }\n    register: {}\n",
        )
        .unwrap();
        let output = temp_dir.path().join("swagger.json");

        run(CliArgs {
            command: Command::Generate(GenerateArgs {
                manifest,
                output_format: OutputFormat::Json,
                output_path: Some(output.clone()),
                tests_dir: None,
                templates_dir: None,
                api_key_env: "SWAGGER_API_KEY".to_string(),
                base_url: "http://localhost:5000/api".to_string(),
            }),
            verbose: false,
        })
        .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert!(written["paths"]["/tags/{TagId}"]["get"].is_object());
    }
}
