// ABOUTME: Main application orchestration for the reportsmith CLI
// ABOUTME: Coordinates between CLI arguments, configuration, and command execution

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::{Args, Commands, Config};

pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Initialize logging based on configuration. Logs go to stderr so
    /// rendered reports can be piped from stdout.
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            self.config.logging.level.as_str()
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_ansi(!no_color)
            .with_target(false)
            .with_writer(std::io::stderr);

        let result = match self.config.logging.format.as_str() {
            "compact" => builder.compact().try_init(),
            _ => builder.try_init(),
        };
        // a subscriber may already be installed when embedded or under test
        if let Err(e) = result {
            debug!("Logging already initialized: {}", e);
        }

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub async fn run(&mut self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting reportsmith v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        if let Commands::Render { vars, .. } = &args.command {
            let variables = Args::parse_variables(vars)?;
            self.config.merge_variables(variables);
        }

        match args.command {
            Commands::Render {
                template,
                data,
                partials,
                output,
                ..
            } => commands::render_report(&template, data, partials, output, &self.config).await,

            Commands::Validate { template, partials } => {
                commands::validate_template(&template, partials, &self.config).await
            }

            Commands::Init {
                name,
                output_dir,
                template,
            } => commands::init_report(name, output_dir, template, &self.config).await,

            Commands::Helpers => commands::list_helpers(&self.config),
        }
    }

    /// Create application from parsed command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}
