//! Init command implementation

use clap::Args;
use portico_core::PorticoError;
use std::fs;
use std::path::Path;
use tracing::info;

const CONFIG_TEMPLATE: &str = r#"# Portico configuration
#
# Any value may reference an environment variable with a dollar sign
# followed by its name (optionally in braces). A .env file next to this
# file is read as well; double the dollar sign for a literal one.

# Certificates
# autocert:
#   provider: cloudflare
#   email: admin@example.com
#   domains: ["*.example.com"]
#   options:
#     auth_token: your-cloudflare-token

# Middlewares applied to every request
entrypoint:
  middlewares:
    - use: redirect_http
  # access_log:
  #   path: /var/log/portico/access.log
  #   format: combined

providers:
  # Route files, relative to this file
  include:
    - apps.yml
  # docker:
  #   local: unix:///var/run/docker.sock

match_domains:
  - example.com

homepage:
  use_default_categories: true

# Seconds to wait for connections to drain on shutdown
timeout_shutdown: 5
"#;

const APPS_TEMPLATE: &str = r#"# Routes: each key is a route name, also used as the default alias

whoami:
  host: 127.0.0.1
  port: 8080
  healthcheck:
    path: /health
    interval: 10s
  homepage:
    name: Who am I
    category: Tools

# A listening:target port pair makes this a tcp stream
postgres:
  port: "5433:5432"

docs:
  scheme: fileserver
  root: /srv/docs
"#;

/// Init command arguments
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: String,

    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    /// Execute the init command
    pub async fn execute(&self) -> Result<(), PorticoError> {
        let output_dir = Path::new(&self.output);
        if !output_dir.exists() {
            fs::create_dir_all(output_dir)?;
        }

        for (name, content) in [("config.yml", CONFIG_TEMPLATE), ("apps.yml", APPS_TEMPLATE)] {
            let path = output_dir.join(name);
            if path.exists() && !self.force {
                return Err(PorticoError::Internal(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                )));
            }
            fs::write(&path, content)?;
            info!("Created: {}", path.display());
        }

        println!("\nPortico configuration initialized!");
        println!("\nNext steps:");
        println!("  1. Edit apps.yml to point routes at your services");
        println!("  2. Run: portico check -f {}", output_dir.join("config.yml").display());

        Ok(())
    }
}
