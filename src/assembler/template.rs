//! alertmanager.yml template parsing and rendering.
//!
//! Supported actions are `{{ .Routes }}`, `{{ .Receivers }}` and
//! `{{ .InhibitRules }}`. A leading `{{-` trims whitespace before the action
//! and a trailing `-}}` trims whitespace after it.

use thiserror::Error;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Template errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated action at byte {0}")]
    Unterminated(usize),

    #[error("unknown field '{field}' at byte {offset}")]
    UnknownField { field: String, offset: usize },
}

/// Values substituted into the template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    pub routes: String,
    pub receivers: String,
    pub inhibit_rules: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Routes,
    Receivers,
    InhibitRules,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Parse template text.
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;
        let mut trim_next = false;

        while let Some(start) = rest.find(OPEN) {
            let mut literal = &rest[..start];
            if trim_next {
                literal = literal.trim_start();
            }
            let after_open = &rest[start + OPEN.len()..];
            let end = after_open
                .find(CLOSE)
                .ok_or(TemplateError::Unterminated(offset + start))?;
            let mut action = &after_open[..end];

            let trim_before = action.starts_with('-');
            if trim_before {
                action = &action[1..];
                literal = literal.trim_end();
            }
            trim_next = action.ends_with('-');
            if trim_next {
                action = &action[..action.len() - 1];
            }

            if !literal.is_empty() {
                segments.push(Segment::Text(literal.to_string()));
            }
            let field = match action.trim() {
                ".Routes" => Field::Routes,
                ".Receivers" => Field::Receivers,
                ".InhibitRules" => Field::InhibitRules,
                other => {
                    return Err(TemplateError::UnknownField {
                        field: other.to_string(),
                        offset: offset + start,
                    })
                }
            };
            segments.push(Segment::Field(field));

            let consumed = start + OPEN.len() + end + CLOSE.len();
            rest = &rest[consumed..];
            offset += consumed;
        }

        let tail = if trim_next { rest.trim_start() } else { rest };
        if !tail.is_empty() {
            segments.push(Segment::Text(tail.to_string()));
        }
        Ok(Self { segments })
    }

    /// Substitute sections into the template.
    pub fn render(&self, sections: &Sections) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(Field::Routes) => out.push_str(&sections.routes),
                Segment::Field(Field::Receivers) => out.push_str(&sections.receivers),
                Segment::Field(Field::InhibitRules) => out.push_str(&sections.inhibit_rules),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> Sections {
        Sections {
            routes: "R".into(),
            receivers: "V".into(),
            inhibit_rules: "I".into(),
        }
    }

    #[test]
    fn test_render_all_fields() {
        let template =
            Template::parse("a {{ .Routes }} b {{.Receivers}} c {{ .InhibitRules }}").unwrap();
        assert_eq!(template.render(&sections()), "a R b V c I");
    }

    #[test]
    fn test_trim_markers() {
        let template = Template::parse("x:\n  {{- .Routes -}}  \nend").unwrap();
        assert_eq!(template.render(&sections()), "x:Rend");
    }

    #[test]
    fn test_plain_text() {
        let template = Template::parse("route:\n  receiver: default\n").unwrap();
        assert_eq!(template.render(&Sections::default()), "route:\n  receiver: default\n");
    }

    #[test]
    fn test_unknown_field() {
        let err = Template::parse("ok {{ .Silences }}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownField {
                field: ".Silences".into(),
                offset: 3
            }
        );
    }

    #[test]
    fn test_unterminated() {
        let err = Template::parse("{{ .Routes }} {{ .Receivers").unwrap_err();
        assert_eq!(err, TemplateError::Unterminated(14));
    }
}
