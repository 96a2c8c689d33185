//! The minimal markup envelope for plain-text note content.

pub const DOCUMENT_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<!DOCTYPE en-note SYSTEM \"http://xml.evernote.com/pub/enml2.dtd\">\
<en-note>";

pub const DOCUMENT_FOOTER: &str = "</en-note>";

/// Wrap plain text in the fixed markup envelope, inserting a `<br />`
/// before every line break. The original break characters are preserved.
pub fn wrap_plain_text(content: &str) -> String {
    let mut doc = String::with_capacity(DOCUMENT_HEADER.len() + content.len() + DOCUMENT_FOOTER.len());
    doc.push_str(DOCUMENT_HEADER);
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                doc.push_str("<br />\r");
                if chars.peek() == Some(&'\n') {
                    chars.next();
                    doc.push('\n');
                }
            }
            '\n' => doc.push_str("<br />\n"),
            other => doc.push(other),
        }
    }
    doc.push_str(DOCUMENT_FOOTER);
    doc
}
