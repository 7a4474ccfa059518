//! Minimal server-side HTML.
//!
//! Deliberately plain: pages are strings built from the model, every
//! interpolated value goes through [`escape`].

use std::fmt::Write;

use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::models::{Attendance, Event, EventForm, DEFAULT_COLOR, DEFAULT_ICON};
use crate::utils::flash::Banner;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
.notice{padding:.5rem 1rem;border-radius:4px}\
.success{background:#d1fae5}.warning{background:#fef3c7}.error{background:#fee2e2}\
.swatch{display:inline-block;width:.8rem;height:.8rem;border-radius:50%}\
form.inline{display:inline}";

pub enum FormTarget {
    Create,
    Edit(Uuid),
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, banner: Option<&Banner>, body: &str) -> String {
    let notice = banner
        .map(|b| {
            format!(
                r#"<p class="notice {}" role="status">{}</p>"#,
                b.level.as_str(),
                escape(&b.text)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title><style>{STYLE}</style></head>
<body>
<nav><a href="/events">Events</a> · <a href="/events/create">New event</a></nav>
{notice}
{body}
</body>
</html>
"#,
        title = escape(title),
    )
}

fn when(t: &NaiveDateTime) -> String {
    t.format(DISPLAY_FORMAT).to_string()
}

pub fn event_list(events: &[Event], banner: Option<&Banner>) -> String {
    let mut body = String::from("<h1>Events</h1>\n");
    if events.is_empty() {
        body.push_str(r#"<p class="empty">No events yet.</p>"#);
    } else {
        body.push_str("<ul class=\"events\">\n");
        for event in events {
            let _ = writeln!(
                body,
                r#"<li><span class="swatch" style="background:{color}"></span> <a href="/events/{id}">{name}</a> <small>[{icon}] {start} – {end}{place}</small></li>"#,
                color = escape(&event.color),
                id = event.id,
                name = escape(&event.name),
                icon = escape(&event.icon),
                start = when(&event.start_time),
                end = when(&event.end_time),
                place = event
                    .place
                    .as_deref()
                    .map(|p| format!(" @ {}", escape(p)))
                    .unwrap_or_default(),
            );
        }
        body.push_str("</ul>");
    }
    layout("Events", banner, &body)
}

pub fn event_form(target: FormTarget, form: &EventForm, banner: Option<&Banner>) -> String {
    let (title, action) = match target {
        FormTarget::Create => ("New event".to_string(), "/events/create".to_string()),
        FormTarget::Edit(id) => ("Edit event".to_string(), format!("/events/{id}/edit")),
    };
    let value = |v: &Option<String>| escape(v.as_deref().unwrap_or_default());
    let color = form.color.as_deref().unwrap_or(DEFAULT_COLOR);
    let icon = form.icon.as_deref().unwrap_or(DEFAULT_ICON);

    let body = format!(
        r#"<h1>{title}</h1>
<form method="post" action="{action}">
<label>Name <input name="name" maxlength="100" required value="{name}"></label><br>
<label>Place <input name="place" maxlength="200" value="{place}"></label><br>
<label>Start <input type="datetime-local" name="start" required value="{start}"></label><br>
<label>End <input type="datetime-local" name="end" required value="{end}"></label><br>
<label>Color <input type="color" name="color" value="{color}"></label><br>
<label>Icon <input name="icon" maxlength="50" value="{icon}"></label><br>
<button type="submit">Save</button>
</form>"#,
        name = value(&form.name),
        place = value(&form.place),
        start = value(&form.start),
        end = value(&form.end),
        color = escape(color),
        icon = escape(icon),
    );
    layout(&title, banner, &body)
}

/// Detail page. With `confirm_delete` set, the delete form carries the
/// confirmation flag and asks the user to resubmit.
pub fn event_detail(
    event: &Event,
    attendance_count: i64,
    confirm_delete: bool,
    banner: Option<&Banner>,
) -> String {
    let id = event.id;
    let delete_form = if confirm_delete {
        format!(
            r#"<form method="post" action="/events/{id}/delete" class="confirm">
<p>This event has {attendance_count} registered attendance(s). Deleting it removes them too.</p>
<input type="hidden" name="confirm_delete" value="true">
<button type="submit">Confirm deletion</button> <a href="/events/{id}">Cancel</a>
</form>"#
        )
    } else {
        format!(
            r#"<form method="post" action="/events/{id}/delete" class="inline"><button type="submit">Delete</button></form>"#
        )
    };

    let body = format!(
        r#"<h1><span class="swatch" style="background:{color}"></span> {name}</h1>
<dl>
<dt>Place</dt><dd>{place}</dd>
<dt>Start</dt><dd>{start}</dd>
<dt>End</dt><dd>{end}</dd>
<dt>Icon</dt><dd>{icon}</dd>
<dt>Attendances</dt><dd><a href="/events/{id}/attendances">{attendance_count}</a></dd>
</dl>
<p><a href="/events/{id}/edit">Edit</a></p>
{delete_form}"#,
        color = escape(&event.color),
        name = escape(&event.name),
        place = escape(event.place.as_deref().unwrap_or("-")),
        start = when(&event.start_time),
        end = when(&event.end_time),
        icon = escape(&event.icon),
    );
    layout(&event.name, banner, &body)
}

pub fn attendance_list(
    event: &Event,
    attendances: &[Attendance],
    banner: Option<&Banner>,
) -> String {
    let mut body = format!(
        r#"<h1>Attendance · <a href="/events/{id}">{name}</a></h1>
<form method="post" action="/events/{id}/attendances/register">
<label>Name <input name="name" maxlength="100" required></label>
<button type="submit">Register</button>
</form>
"#,
        id = event.id,
        name = escape(&event.name),
    );

    if attendances.is_empty() {
        body.push_str(r#"<p class="empty">Nobody registered yet.</p>"#);
    } else {
        body.push_str("<ol class=\"attendances\">\n");
        for attendance in attendances {
            let _ = writeln!(
                body,
                r#"<li class="attendee">{name} <small>{at}</small> <form method="post" action="/attendances/{id}/delete" class="inline"><button type="submit">Remove</button></form></li>"#,
                name = escape(&attendance.name),
                at = attendance.registered_at.format(DISPLAY_FORMAT),
                id = attendance.id,
            );
        }
        body.push_str("</ol>");
    }
    layout(&format!("Attendance · {}", event.name), banner, &body)
}

pub fn message_page(title: &str, text: &str) -> String {
    let body = format!("<h1>{}</h1>\n<p>{}</p>", escape(title), escape(text));
    layout(title, None, &body)
}

pub fn not_found() -> String {
    message_page("Not found", "The page or record you asked for does not exist.")
}

pub fn database_unavailable() -> String {
    message_page(
        "Database unavailable",
        "The database is not responding right now. Please try again in a few seconds.",
    )
}

pub fn database_error() -> String {
    message_page(
        "Unexpected database error",
        "Something went wrong while talking to the database. The error has been logged.",
    )
}

pub fn service_unavailable() -> String {
    message_page(
        "Service temporarily unavailable",
        "Your change was not saved because the database is waking up. \
         Wait a moment and submit it again.",
    )
}
