//! Dump command implementation
//!
//! Prints the canonical configuration as documents that load back to the
//! same configuration: defaults filled in, aliases resolved, middleware
//! references expanded.

use clap::{Args, ValueEnum};
use portico_core::PorticoError;
use portico_parser::{encode, parse_file, DocumentFormat, DocumentParser, EncodedDocuments};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DumpFormat {
    Yaml,
    Json,
}

impl From<DumpFormat> for DocumentFormat {
    fn from(format: DumpFormat) -> Self {
        match format {
            DumpFormat::Yaml => DocumentFormat::Yaml,
            DumpFormat::Json => DocumentFormat::Json,
        }
    }
}

/// Dump command arguments
#[derive(Args, Debug)]
pub struct DumpCommand {
    /// Output format of the main document
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: DumpFormat,

    /// Write the main document and include files into this directory
    #[arg(short = 'o', long)]
    pub out: Option<String>,
}

impl DumpCommand {
    pub async fn execute(&self, config_path: &str) -> Result<(), PorticoError> {
        let loaded = parse_file(config_path)?;
        let encoded = encode(&loaded.config)?;

        match &self.out {
            Some(out) => self.write_dir(&encoded, Path::new(out)),
            None => {
                print!("{}", self.render(&encoded)?);
                Ok(())
            }
        }
    }

    /// Main document followed by each include file, separated by name comments
    fn render(&self, encoded: &EncodedDocuments) -> Result<String, PorticoError> {
        let mut text = encoded.render_main(self.format.into())?;
        for (name, node) in &encoded.includes {
            text.push_str(&format!("\n# --- {}\n", name));
            text.push_str(&DocumentParser::render(node, self.format.into())?);
        }
        Ok(text)
    }

    fn write_dir(&self, encoded: &EncodedDocuments, out: &Path) -> Result<(), PorticoError> {
        fs::create_dir_all(out)?;

        let main_name = match self.format {
            DumpFormat::Yaml => "config.yml",
            DumpFormat::Json => "config.json",
        };
        fs::write(out.join(main_name), encoded.render_main(self.format.into())?)?;
        info!("Created: {}", out.join(main_name).display());

        for (name, node) in &encoded.includes {
            let path = out.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, DocumentParser::render(node, DocumentFormat::Yaml)?)?;
            info!("Created: {}", path.display());
        }
        Ok(())
    }
}
