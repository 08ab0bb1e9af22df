//! services/render_service.rs
//! Personalización de plantillas: reemplaza tokens `{campo}` por valores del contacto.

use crate::models::contact_model::Contact;

/// Valores disponibles para una plantilla. `None` se renderiza como cadena vacía.
#[derive(Debug, Clone, Default)]
pub struct TemplateFields<'a> {
    entries: Vec<(&'static str, Option<&'a str>)>,
}

impl<'a> TemplateFields<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: Option<&'a str>) -> Self {
        self.entries.push((key, value));
        self
    }

    /// Campos del asunto: `{name}` y `{company}`.
    pub fn subject_for(contact: &'a Contact) -> Self {
        Self::new()
            .with("name", Some(contact.name.as_str()))
            .with("company", contact.company.as_deref())
    }

    /// Campos del cuerpo: `{name}`, `{email}`, `{company}` y `{role}`.
    pub fn body_for(contact: &'a Contact) -> Self {
        Self::new()
            .with("name", Some(contact.name.as_str()))
            .with("email", Some(contact.email.as_str()))
            .with("company", contact.company.as_deref())
            .with("role", contact.role.as_deref())
    }

    fn lookup(&self, key: &str) -> Option<Option<&'a str>> {
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }
}

/// Reemplaza todas las ocurrencias de cada `{campo}` conocido.
///
/// Una sola pasada: los valores insertados no se vuelven a escanear. Tokens que
/// no están en `fields` quedan tal cual.
pub fn render(template: &str, fields: &TemplateFields<'_>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find(|c: char| c == '}' || c == '{') {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = &after[..close];
                match fields.lookup(key) {
                    Some(value) => out.push_str(value.unwrap_or("")),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                // Llave suelta: se copia y seguimos desde el siguiente carácter.
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Saltos de línea a `<br>` para el canal HTML. Sin más escapado.
pub fn to_html(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "<br>")
}
