use minijinja::{path_loader, AutoEscape, Environment};
use std::path::Path;

use crate::domain::{
    campaign::{errors::CampaignError, models::message::EmailHtmlContent, ports::TemplateRenderer},
    recipient::models::recipient::Recipient,
};

/// Jinja-compatible renderer for a single template file.
///
/// Templates are loaded relative to the template's own directory, so
/// `{% include %}` and `{% extends %}` resolve against its siblings. Every
/// column of the recipient row is a template variable; unknown variables
/// render as an empty string and values are inserted without escaping.
#[derive(Debug)]
pub struct MiniJinjaRenderer {
    env: Environment<'static>,
    template_name: String,
}

impl MiniJinjaRenderer {
    #[tracing::instrument(
        name = "Load email template",
        skip(template_path),
        fields(template_path = %template_path.display())
    )]
    pub fn new(template_path: &Path) -> Result<Self, CampaignError> {
        let template_dir = template_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let template_name = template_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                CampaignError::TemplateError(format!(
                    "{} does not name a template file",
                    template_path.display()
                ))
            })?
            .to_string();
        tracing::debug!(
            template_dir = %template_dir.display(),
            %template_name,
            "Resolved template location"
        );

        let mut env = Environment::new();
        env.set_loader(path_loader(template_dir.to_path_buf()));
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.get_template(&template_name)
            .map_err(|e| CampaignError::TemplateError(e.to_string()))?;
        tracing::debug!("Loaded template");

        Ok(Self { env, template_name })
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render(&self, recipient: &Recipient) -> Result<EmailHtmlContent, CampaignError> {
        let html = self
            .env
            .get_template(&self.template_name)
            .and_then(|template| template.render(recipient))
            .map_err(|e| CampaignError::TemplateError(e.to_string()))?;
        Ok(EmailHtmlContent::try_from(html)?)
    }
}
