//! Server-rendered HTML pages.

use std::fmt::Write;

use crate::student::{Gender, Student};

use super::flash::Flash;

const STYLE: &str = r"
body { font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 64rem; color: #222; }
h1 { margin-bottom: 1rem; }
.flash { padding: .6rem 1rem; border-radius: 4px; margin-bottom: .5rem; }
.flash.success { background: #e6f4ea; color: #1e6b35; }
.flash.error { background: #fdecea; color: #8a1c13; }
form.student { display: grid; grid-template-columns: repeat(3, 1fr); gap: .5rem; margin-bottom: 2rem; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: .5rem; border-bottom: 1px solid #ddd; vertical-align: middle; }
img.avatar { width: 40px; height: 40px; border-radius: 50%; object-fit: cover; }
td.actions form { display: inline; }
";

/// Escape text for HTML element content and quoted attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Percent-encode a roll number for use as one URL path segment.
///
/// Segments made only of dots are fully escaped so `.` and `..` are not
/// collapsed by the browser.
#[must_use]
pub fn path_segment(text: &str) -> String {
    if !text.is_empty() && text.bytes().all(|byte| byte == b'.') {
        return "%2E".repeat(text.len());
    }
    urlencoding::encode(text).into_owned()
}

fn layout(title: &str, flashes: &[Flash], body: &str) -> String {
    let mut notices = String::new();
    for flash in flashes {
        let _ = write!(
            notices,
            r#"<div class="flash {}">{}</div>"#,
            flash.kind.as_str(),
            escape(&flash.message)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<h1>{title}</h1>
{notices}
{body}
</body>
</html>
"#,
        title = escape(title),
    )
}

fn gender_options(selected: Option<Gender>) -> String {
    let mut options = String::new();
    if selected.is_none() {
        options.push_str(r#"<option value="" selected disabled>Gender</option>"#);
    }
    for gender in Gender::ALL {
        let marker = if selected == Some(gender) { " selected" } else { "" };
        let _ = write!(options, r#"<option value="{gender}"{marker}>{gender}</option>"#);
    }
    options
}

/// The student list with the add form above it.
#[must_use]
pub fn index_page(students: &[Student], flashes: &[Flash]) -> String {
    let mut body = format!(
        r#"<form class="student" method="post" action="/add">
<input name="roll_no" placeholder="Roll No" required>
<input name="name" placeholder="Name" required>
<input name="email" type="email" placeholder="Email" required>
<input name="contact" placeholder="Contact" required>
<select name="gender" required>{}</select>
<button type="submit">Add Student</button>
</form>
"#,
        gender_options(None)
    );

    if students.is_empty() {
        body.push_str("<p>No students yet.</p>\n");
        return layout("Students", flashes, &body);
    }

    body.push_str(
        "<table>\n<thead><tr><th></th><th>Roll No</th><th>Name</th><th>Email</th>\
         <th>Contact</th><th>Gender</th><th></th></tr></thead>\n<tbody>\n",
    );
    for student in students {
        let segment = path_segment(&student.roll_no);
        let _ = write!(
            body,
            r#"<tr>
<td><img class="avatar" src="{avatar}" alt=""></td>
<td>{roll_no}</td><td>{name}</td><td>{email}</td><td>{contact}</td><td>{gender}</td>
<td class="actions"><a href="/edit/{segment}">Edit</a>
<form method="post" action="/delete/{segment}"><button type="submit">Delete</button></form></td>
</tr>
"#,
            avatar = escape(&student.avatar),
            roll_no = escape(&student.roll_no),
            name = escape(&student.name),
            email = escape(&student.email),
            contact = escape(&student.contact),
            gender = student.gender,
        );
    }
    body.push_str("</tbody>\n</table>\n");

    layout("Students", flashes, &body)
}

/// The edit form for one student.
#[must_use]
pub fn edit_page(student: &Student, flashes: &[Flash]) -> String {
    let body = format!(
        r#"<p><img class="avatar" src="{avatar}" alt=""> Roll No: <strong>{roll_no}</strong></p>
<form class="student" method="post" action="/edit/{segment}">
<input name="name" value="{name}" required>
<input name="email" type="email" value="{email}" required>
<input name="contact" value="{contact}" required>
<select name="gender" required>{options}</select>
<button type="submit">Update Student</button>
</form>
<p><a href="/">Back to list</a></p>
"#,
        avatar = escape(&student.avatar),
        roll_no = escape(&student.roll_no),
        segment = path_segment(&student.roll_no),
        name = escape(&student.name),
        email = escape(&student.email),
        contact = escape(&student.contact),
        options = gender_options(Some(student.gender)),
    );

    layout("Edit Student", flashes, &body)
}
