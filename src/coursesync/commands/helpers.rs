use crate::error::{Result, SyncError};

pub const MAX_NAME_CHARS: usize = 255;

/// Trim and check a display name: required, at most [`MAX_NAME_CHARS`].
pub fn display_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(SyncError::validation("display name cannot be empty"));
    }
    check_length(name)?;
    Ok(name.to_string())
}

/// Section names may be blank, in which case the section keeps its default
/// ("Section N") label.
pub fn section_name(raw: &str) -> Result<Option<String>> {
    let name = raw.trim();
    if name.is_empty() {
        return Ok(None);
    }
    check_length(name)?;
    Ok(Some(name.to_string()))
}

fn check_length(name: &str) -> Result<()> {
    let chars = name.chars().count();
    if chars > MAX_NAME_CHARS {
        return Err(SyncError::validation(format!(
            "name is {} characters long, the limit is {}",
            chars, MAX_NAME_CHARS
        )));
    }
    Ok(())
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
