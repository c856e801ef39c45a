// Template engine for generating HTML output

use crate::error::Result;
use crate::highlight::highlight_filter;
use crate::routing;
use crate::views::{HomePage, KlassDetail, ModulePage, VersionPage};
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

/// Template engine wrapping Tera with custom filters and templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("base.html", include_str!("../../templates/base.html.tera")),
            ("nav_list.html", include_str!("../../templates/nav_list.html.tera")),
            ("home.html", include_str!("../../templates/home.html.tera")),
            ("version.html", include_str!("../../templates/version.html.tera")),
            ("module.html", include_str!("../../templates/module.html.tera")),
            ("klass_detail.html", include_str!("../../templates/klass_detail.html.tera")),
            ("not_found.html", include_str!("../../templates/not_found.html.tera")),
            ("redirect.html", include_str!("../../templates/redirect.html.tera")),
        ])?;

        register(&mut tera);
        Ok(Self { tera })
    }

    pub fn render_home(&self, page: &HomePage) -> Result<String> {
        self.render_view("home.html", page)
    }

    pub fn render_version(&self, page: &VersionPage) -> Result<String> {
        self.render_view("version.html", page)
    }

    pub fn render_module(&self, page: &ModulePage) -> Result<String> {
        self.render_view("module.html", page)
    }

    pub fn render_klass(&self, page: &KlassDetail) -> Result<String> {
        self.render_view("klass_detail.html", page)
    }

    pub fn render_not_found(&self, message: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("message", message);
        self.render("not_found.html", &context)
    }

    /// Page that forwards the browser to `url`
    pub fn render_redirect(&self, name: &str, url: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("name", name);
        context.insert("url", url);
        self.render("redirect.html", &context)
    }

    fn render_view<T: Serialize>(&self, template_name: &str, view: &T) -> Result<String> {
        let context = Context::from_serialize(view)?;
        self.render(template_name, &context)
    }

    /// Render a custom template with context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

fn register(tera: &mut Tera) {
    tera.register_filter("highlight", highlight_filter);
    tera.register_filter("pluralize", pluralize);
    tera.register_filter("slugify", slugify_filter);
    tera.register_filter("first_line", first_line);
    tera.register_function("static_url", static_url);
}

/// `static_url(name="style.css")`
fn static_url(args: &HashMap<String, Value>) -> tera::Result<Value> {
    match args.get("name").and_then(Value::as_str) {
        Some(name) => Ok(Value::String(routing::static_url(name))),
        None => Err(tera::Error::msg("static_url requires a `name` argument")),
    }
}

/// Pluralize a word based on count
fn pluralize(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let count = value.as_u64().unwrap_or(0);
    let singular = args
        .get("singular")
        .and_then(|v| v.as_str())
        .unwrap_or("item");
    let default_plural = format!("{}s", singular);
    let plural = args
        .get("plural")
        .and_then(|v| v.as_str())
        .unwrap_or(&default_plural);

    if count == 1 {
        Ok(Value::String(format!("{} {}", count, singular)))
    } else {
        Ok(Value::String(format!("{} {}", count, plural)))
    }
}

/// Summary line of a docstring
fn first_line(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value.as_str().unwrap_or("");
    Ok(Value::String(
        s.lines().next().unwrap_or_default().trim().to_string(),
    ))
}

/// Convert text to URL-friendly slug
fn slugify_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value.as_str().unwrap_or("");
    Ok(Value::String(slugify(s)))
}

/// Convert text to URL-friendly slug
pub fn slugify(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{django_catalog, EDIT};
    use crate::config::Config;
    use crate::views::Pages;

    fn render_update_view() -> String {
        let catalog = django_catalog();
        let config = Config::default();
        let detail = Pages::new(&catalog, &config)
            .klass("Django", "4.2", EDIT, "UpdateView")
            .unwrap();
        TemplateEngine::new().unwrap().render_klass(&detail).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("django.views.generic.edit"), "django-views-generic-edit");
        assert_eq!(slugify("  spaced  out  "), "spaced-out");
        assert_eq!(slugify("UpdateView"), "updateview");
    }

    #[test]
    fn test_pluralize() {
        let mut args = HashMap::new();
        args.insert("singular".to_string(), Value::String("class".to_string()));
        args.insert("plural".to_string(), Value::String("classes".to_string()));

        let one = pluralize(&Value::Number(1.into()), &args).unwrap();
        assert_eq!(one.as_str().unwrap(), "1 class");
        let many = pluralize(&Value::Number(12.into()), &args).unwrap();
        assert_eq!(many.as_str().unwrap(), "12 classes");
    }

    #[test]
    fn test_first_line() {
        let value = Value::String("Summary.\n\nDetails follow.".to_string());
        let result = first_line(&value, &HashMap::new()).unwrap();
        assert_eq!(result.as_str().unwrap(), "Summary.");
    }

    #[test]
    fn test_static_url_function() {
        let mut args = HashMap::new();
        args.insert("name".to_string(), Value::String("classy.js".to_string()));
        assert_eq!(static_url(&args).unwrap(), Value::String("/static/classy.js".to_string()));
        assert!(static_url(&HashMap::new()).is_err());
    }

    #[test]
    fn test_templates_parse() {
        assert!(TemplateEngine::new().is_ok());
    }

    #[test]
    fn test_klass_page_ancestors() {
        let html = render_update_view();
        assert!(html.contains("<h1>class UpdateView</h1>"));
        assert!(html.contains("<li class=\"subject\">"));
        assert_eq!(html.matches("<li class=\"direct\">").count(), 2);
        assert!(html.contains("id=\"ancestors\" class=\"span12\""));
        assert!(!html.contains("id=\"descendants\""));
    }

    #[test]
    fn test_klass_page_attributes() {
        let html = render_update_view();
        // template_name on UpdateView itself is plain text, the inherited one is overridden
        assert!(html.contains("<td>UpdateView</td>"));
        assert!(html.contains("<tr class=\"overridden\">"));
    }

    #[test]
    fn test_klass_page_namesakes() {
        let html = render_update_view();
        assert!(html.contains("<div class=\"method namesakes\" id=\"get_context_data\">"));
        assert!(html.contains("<button type=\"button\" class=\"toggle-namesake\">SingleObjectMixin</button>"));
        assert!(html.contains("highlighttable"));
    }

    #[test]
    fn test_not_found_page() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine.render_not_found("No class called Nope").unwrap();
        assert!(html.contains("No class called Nope"));
    }

    #[test]
    fn test_redirect_page() {
        let engine = TemplateEngine::new().unwrap();
        let html = engine.render_redirect("UpdateView", "/projects/Django/4.2/m/UpdateView/").unwrap();
        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("<title>UpdateView | Classy</title>"));
    }
}
