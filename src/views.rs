use axum::response::Html;
use minijinja::{Environment, Value};
use std::sync::Arc;

use crate::error::AppError;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("admin.html", include_str!("../templates/admin.html")),
    ("new-user.html", include_str!("../templates/new-user.html")),
    ("edit-user.html", include_str!("../templates/edit-user.html")),
    ("user.html", include_str!("../templates/user.html")),
    ("forbidden.html", include_str!("../templates/forbidden.html")),
];

/// Views
///
/// Server-side page rendering. Templates are compiled into the binary and loaded
/// once at startup; `.html` templates are auto-escaped.
pub struct Views {
    env: Environment<'static>,
}

pub type ViewsState = Arc<Views>;

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, context: Value) -> Result<Html<String>, AppError> {
        let template = self.env.get_template(name)?;
        Ok(Html(template.render(context)?))
    }
}
