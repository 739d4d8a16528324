use std::io::{self, Write};

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use thiserror::Error;

use crate::model::resolved::ResolvedModule;

/// One line per module: name, version, bracketed licenses and archive path.
pub const DEFAULT_TEMPLATE: &str = "{{Module}} {{Version}} {{Licenses}} {{Path}}";

const TEMPLATE_NAME: &str = "module";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid template: {0}")]
    Template(#[from] TemplateError),
    #[error("Failed to render {module}: {source}")]
    Render {
        module: String,
        #[source]
        source: RenderError,
    },
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
}

/// The fields a template can refer to.
#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct Row<'a> {
    module: &'a str,
    version: &'a str,
    /// Licenses formatted as `[A B]`.
    licenses: String,
    license_list: &'a [String],
    path: String,
}

impl<'a> From<&'a ResolvedModule> for Row<'a> {
    fn from(module: &'a ResolvedModule) -> Self {
        Row {
            module: &module.coordinate.name,
            version: &module.coordinate.version,
            licenses: format!("[{}]", module.licenses.join(" ")),
            license_list: &module.licenses,
            path: module
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        }
    }
}

pub struct Report {
    handlebars: Handlebars<'static>,
}

impl Report {
    pub fn new(template: &str) -> Result<Self, ReportError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_template_string(TEMPLATE_NAME, template)?;
        Ok(Report { handlebars })
    }

    pub fn render(&self, module: &ResolvedModule) -> Result<String, ReportError> {
        self.handlebars
            .render(TEMPLATE_NAME, &Row::from(module))
            .map_err(|source| ReportError::Render {
                module: module.coordinate.to_string(),
                source,
            })
    }

    /// Writes one rendered line per module, in order.
    pub fn write_all(
        &self,
        modules: &[ResolvedModule],
        out: &mut impl Write,
    ) -> Result<(), ReportError> {
        for module in modules {
            writeln!(out, "{}", self.render(module)?)?;
        }
        Ok(())
    }
}
