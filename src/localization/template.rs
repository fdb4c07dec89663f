/// A positional argument for a catalog template.
///
/// `None` renders as an empty string, the same as an argument that was never
/// supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateArg(pub Option<String>);

impl From<&str> for TemplateArg {
    fn from(value: &str) -> Self {
        Self(Some(value.to_string()))
    }
}

impl From<String> for TemplateArg {
    fn from(value: String) -> Self {
        Self(Some(value))
    }
}

impl From<&String> for TemplateArg {
    fn from(value: &String) -> Self {
        Self(Some(value.clone()))
    }
}

impl From<Option<&str>> for TemplateArg {
    fn from(value: Option<&str>) -> Self {
        Self(value.map(str::to_string))
    }
}

impl From<Option<String>> for TemplateArg {
    fn from(value: Option<String>) -> Self {
        Self(value)
    }
}

/// Collect anything convertible into template arguments
pub fn collect_args<I>(args: I) -> Vec<Option<String>>
where
    I: IntoIterator,
    I::Item: Into<TemplateArg>,
{
    args.into_iter().map(|arg| arg.into().0).collect()
}

/// Substitute `{N}` placeholders with positional arguments.
///
/// Missing or absent arguments render as the empty string. Brace groups that
/// are not a plain index are copied through unchanged.
pub fn render_template(template: &str, args: &[Option<String>]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        match after.find('}') {
            Some(close) => {
                let inner = &after[..close];
                if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
                    if let Some(value) = inner
                        .parse::<usize>()
                        .ok()
                        .and_then(|index| args.get(index))
                        .and_then(|arg| arg.as_deref())
                    {
                        out.push_str(value);
                    }
                    rest = &after[close + 1..];
                } else {
                    out.push('{');
                    rest = after;
                }
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}
