// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for reportsmith

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reportsmith")]
#[command(about = "Render HTML reports from templates and JSON/YAML data")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a template against a data file
    Render {
        #[arg(help = "Template file path or builtin:<name>")]
        template: String,

        #[arg(short, long, help = "JSON or YAML data file")]
        data: PathBuf,

        #[arg(short, long = "partials", help = "Directory of partial templates (repeatable)")]
        partials: Vec<PathBuf>,

        #[arg(
            short = 'V',
            long = "var",
            help = "Extra template variables available under `vars` (key=value)"
        )]
        vars: Vec<String>,

        #[arg(short, long, help = "Write the report to this file instead of stdout")]
        output: Option<PathBuf>,
    },

    /// Check a template for syntax problems without rendering it
    Validate {
        #[arg(help = "Template file path or builtin:<name>")]
        template: String,

        #[arg(short, long = "partials", help = "Directory of partial templates (repeatable)")]
        partials: Vec<PathBuf>,
    },

    /// Create a starter template and sample data file
    Init {
        #[arg(help = "Name of the report to create")]
        name: String,

        #[arg(short, long, help = "Output directory", default_value = ".")]
        output_dir: PathBuf,

        #[arg(long, help = "Starter template type (basic or assessment)", default_value = "basic")]
        template: String,
    },

    /// List the helpers available to templates
    Helpers,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse variables from key=value format
    pub fn parse_variables(
        vars: &[String],
    ) -> anyhow::Result<std::collections::HashMap<String, String>> {
        let mut variables = std::collections::HashMap::new();

        for var in vars {
            match var.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    variables.insert(key.trim().to_string(), value.to_string());
                }
                _ => {
                    return Err(anyhow::anyhow!(
                        "Invalid variable format '{}'. Expected 'key=value'",
                        var
                    ))
                }
            }
        }

        Ok(variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variables() {
        let vars = vec![
            "org=Acme Corp".to_string(),
            "quarter=Q3".to_string(),
            "formula=a=b".to_string(),
        ];

        let parsed = Args::parse_variables(&vars).unwrap();

        assert_eq!(parsed.get("org"), Some(&"Acme Corp".to_string()));
        assert_eq!(parsed.get("quarter"), Some(&"Q3".to_string()));
        assert_eq!(parsed.get("formula"), Some(&"a=b".to_string()));
    }

    #[test]
    fn test_parse_variables_invalid() {
        assert!(Args::parse_variables(&["invalid_format".to_string()]).is_err());
        assert!(Args::parse_variables(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_render_command_parsing() {
        let args = Args::try_parse_from([
            "reportsmith",
            "render",
            "builtin:assessment",
            "--data",
            "data.yaml",
            "--partials",
            "a",
            "--partials",
            "b",
            "--var",
            "org=Acme",
        ])
        .unwrap();

        match args.command {
            Commands::Render {
                template,
                partials,
                vars,
                output,
                ..
            } => {
                assert_eq!(template, "builtin:assessment");
                assert_eq!(partials.len(), 2);
                assert_eq!(vars, vec!["org=Acme"]);
                assert!(output.is_none());
            }
            _ => panic!("expected render command"),
        }
    }

    #[test]
    fn test_render_requires_data() {
        assert!(Args::try_parse_from(["reportsmith", "render", "t.html"]).is_err());
    }
}
