use axum::response::Html;
use tera::{Context, Tera};

use crate::errors::AppError;

/// HTML templates compiled into the binary.
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn load() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("../templates/base.html")),
            ("macros.html", include_str!("../templates/macros.html")),
            ("jobs.html", include_str!("../templates/jobs.html")),
            ("job_detail.html", include_str!("../templates/job_detail.html")),
            ("resumes.html", include_str!("../templates/resumes.html")),
            (
                "resume_analytics.html",
                include_str!("../templates/resume_analytics.html"),
            ),
            ("matching.html", include_str!("../templates/matching.html")),
            ("analytics.html", include_str!("../templates/analytics.html")),
            ("search.html", include_str!("../templates/search.html")),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(&self, template: &str, context: &Context) -> Result<Html<String>, AppError> {
        Ok(Html(self.tera.render(template, context)?))
    }
}
