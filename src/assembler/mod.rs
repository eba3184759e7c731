//! Configuration assembly subsystem.
//!
//! # Data Flow
//! ```text
//! base-config slot → template.rs (parse)
//! active stores    → Sections {routes, receivers, inhibit_rules}
//!     → render (routes re-indented under the root route)
//!     → validator.rs (accept / reject)
//!     → accepted: alertmanager.yml replaced atomically
//!     → rejected: alertmanager.yml untouched
//! ```

pub mod template;
pub mod validator;

pub use template::{Sections, Template, TemplateError};
pub use validator::{AlertmanagerValidator, ConfigValidator, ValidationError};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::InstanceIdentity;
use crate::fragment::FragmentKind;
use crate::store::{StoreError, StoreSet};

/// Indentation inserted after every newline of the routes section.
const ROUTE_INDENT: &str = "\n  ";

/// Errors that can occur while assembling a configuration.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("template '{0}' not found")]
    MissingTemplate(String),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("configuration rejected: {0}")]
    Invalid(#[from] ValidationError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for assembly operations.
pub type AssembleResult<T> = Result<T, AssembleError>;

/// Builds alertmanager.yml from the stores and the template.
#[derive(Clone)]
pub struct Assembler {
    template_name: String,
    output_path: PathBuf,
    validator: Arc<dyn ConfigValidator>,
}

impl Assembler {
    /// Assembler for an instance's standard layout.
    pub fn new(identity: &InstanceIdentity, validator: Arc<dyn ConfigValidator>) -> Self {
        Self::with_paths(identity.template_name(), identity.output_path(), validator)
    }

    pub fn with_paths(
        template_name: impl Into<String>,
        output_path: impl Into<PathBuf>,
        validator: Arc<dyn ConfigValidator>,
    ) -> Self {
        Self {
            template_name: template_name.into(),
            output_path: output_path.into(),
            validator,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Current contents of the three active stores.
    pub fn sections(&self, stores: &StoreSet) -> AssembleResult<Sections> {
        Ok(Sections {
            routes: stores.active(FragmentKind::Route).read_all()?,
            receivers: stores.active(FragmentKind::Receiver).read_all()?,
            inhibit_rules: stores.active(FragmentKind::InhibitRule).read_all()?,
        })
    }

    /// Render and validate, without touching the output file.
    pub fn check(&self, stores: &StoreSet, sections: &Sections) -> AssembleResult<String> {
        let template_text = stores
            .active(FragmentKind::BaseConfig)
            .read(&self.template_name)?
            .ok_or_else(|| AssembleError::MissingTemplate(self.template_name.clone()))?;
        let template = Template::parse(&template_text)?;

        let rendered = template.render(&Sections {
            routes: sections.routes.replace('\n', ROUTE_INDENT),
            receivers: sections.receivers.clone(),
            inhibit_rules: sections.inhibit_rules.clone(),
        });

        self.validator.validate(&rendered)?;
        Ok(rendered)
    }

    /// Assemble from the current stores and replace the output file on success.
    pub fn build(&self, stores: &StoreSet) -> AssembleResult<()> {
        let sections = self.sections(stores)?;
        let rendered = match self.check(stores, &sections) {
            Ok(rendered) => rendered,
            Err(e) => {
                if let AssembleError::Invalid(_) = e {
                    tracing::debug!(error = %e, "Assembled configuration rejected");
                } else {
                    tracing::error!(error = %e, "Failed to assemble configuration");
                }
                return Err(e);
            }
        };
        self.write_output(&rendered)
    }

    fn write_output(&self, rendered: &str) -> AssembleResult<()> {
        let output_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| AssembleError::Output { path, source }
        };

        if let Some(parent) = self.output_path.parent() {
            fs::create_dir_all(parent).map_err(output_error(parent))?;
        }
        let staging = self.output_path.with_extension("yml.tmp");
        fs::write(&staging, rendered).map_err(output_error(&staging))?;
        fs::rename(&staging, &self.output_path).map_err(output_error(&self.output_path))?;

        tracing::info!(path = %self.output_path.display(), "Wrote alertmanager configuration");
        Ok(())
    }
}

impl std::fmt::Debug for Assembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assembler")
            .field("template_name", &self.template_name)
            .field("output_path", &self.output_path)
            .finish()
    }
}
