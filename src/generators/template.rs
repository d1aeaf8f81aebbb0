//! `{{name}}` placeholder substitution.
//!
//! Only brace pairs wrapping a bare identifier are placeholders, so Angular
//! interpolation such as `{{ item.id }}` passes through untouched.

use crate::error::AppError;

/// Replaces every `{{key}}` in `template` with its value in one pass.
///
/// Substituted values are copied verbatim and never scanned again. Fails on
/// the first placeholder without a value.
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String, AppError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(name) = placeholder_name(after) else {
            out.push_str("{{");
            rest = after;
            continue;
        };
        let value = values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
            .ok_or_else(|| {
                AppError::Generation(format!("template placeholder '{}' has no value", name))
            })?;
        out.push_str(value);
        rest = &after[name.len() + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// Identifier between `{{` (already consumed) and the next `}}`, if the
/// pair is a placeholder.
fn placeholder_name(after: &str) -> Option<&str> {
    let end = after.find("}}")?;
    let name = &after[..end];
    let is_identifier =
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_identifier.then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_occurrences() {
        let out = render("class {{name}} { {{name}}() {} }", &[("name", "Order")]).unwrap();
        assert_eq!(out, "class Order { Order() {} }");
    }

    #[test]
    fn test_render_reports_missing_value() {
        let err = render("package {{package}};", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Code generation failed: template placeholder 'package' has no value"
        );
    }

    #[test]
    fn test_interpolation_is_not_a_placeholder() {
        let out = render("<td>{{ item.id }}</td><h2>{{title}}</h2>", &[("title", "Orders")]).unwrap();
        assert_eq!(out, "<td>{{ item.id }}</td><h2>Orders</h2>");
    }

    #[test]
    fn test_values_are_not_rendered_again() {
        let out = render(
            "// {{note}}\npackage {{package}};",
            &[("note", "keep {{package}} literal"), ("package", "com.acme")],
        )
        .unwrap();
        assert_eq!(out, "// keep {{package}} literal\npackage com.acme;");

        let out = render("{{body}}", &[("body", "uses {{unknown}}")]).unwrap();
        assert_eq!(out, "uses {{unknown}}");
    }

    #[test]
    fn test_unclosed_braces_pass_through() {
        let out = render("a {{ b {{name}} c {{", &[("name", "x")]).unwrap();
        assert_eq!(out, "a {{ b x c {{");
    }
}
