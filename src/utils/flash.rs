//! One-shot notices carried across a redirect.
//!
//! The cookie only ever holds a notice code from [`Notice`] plus an
//! HMAC-SHA256 tag, so a forged or stale cookie is dropped rather than rendered.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::state::AppState;
use crate::utils::response::page;

pub const FLASH_COOKIE: &str = "flash";
const TAG_BYTES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub level: Level,
    pub text: String,
}

impl Banner {
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    EventCreated,
    EventUpdated,
    EventDeleted,
    EventDeleteFailed,
    AttendanceRegistered,
    AttendanceRejected,
    AttendanceRegisterFailed,
    AttendanceDeleted,
    AttendanceDeleteFailed,
}

const ALL_NOTICES: [Notice; 9] = [
    Notice::EventCreated,
    Notice::EventUpdated,
    Notice::EventDeleted,
    Notice::EventDeleteFailed,
    Notice::AttendanceRegistered,
    Notice::AttendanceRejected,
    Notice::AttendanceRegisterFailed,
    Notice::AttendanceDeleted,
    Notice::AttendanceDeleteFailed,
];

impl Notice {
    pub fn code(self) -> &'static str {
        match self {
            Notice::EventCreated => "event-created",
            Notice::EventUpdated => "event-updated",
            Notice::EventDeleted => "event-deleted",
            Notice::EventDeleteFailed => "event-delete-failed",
            Notice::AttendanceRegistered => "attendance-registered",
            Notice::AttendanceRejected => "attendance-rejected",
            Notice::AttendanceRegisterFailed => "attendance-register-failed",
            Notice::AttendanceDeleted => "attendance-deleted",
            Notice::AttendanceDeleteFailed => "attendance-delete-failed",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        ALL_NOTICES.into_iter().find(|n| n.code() == code)
    }

    pub fn banner(self) -> Banner {
        let (level, text) = match self {
            Notice::EventCreated => (Level::Success, "Event created successfully"),
            Notice::EventUpdated => (Level::Success, "Event updated successfully"),
            Notice::EventDeleted => (Level::Success, "Event deleted successfully"),
            Notice::EventDeleteFailed => (Level::Error, "Could not delete the event"),
            Notice::AttendanceRegistered => {
                (Level::Success, "Attendance registered successfully")
            }
            Notice::AttendanceRejected => (Level::Error, "An attendee name is required"),
            Notice::AttendanceRegisterFailed => {
                (Level::Error, "Could not register the attendance")
            }
            Notice::AttendanceDeleted => (Level::Success, "Attendance deleted successfully"),
            Notice::AttendanceDeleteFailed => (Level::Error, "Could not delete the attendance"),
        };
        Banner {
            level,
            text: text.to_string(),
        }
    }
}

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies flash cookie values with the application secret.
#[derive(Clone)]
pub struct FlashKey(HmacSha256);

impl FlashKey {
    pub fn new(secret: &str) -> Self {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts keys of any length");
        Self(mac)
    }

    fn mac(&self, code: &str) -> HmacSha256 {
        let mut mac = self.0.clone();
        mac.update(code.as_bytes());
        mac
    }

    pub fn sign(&self, notice: Notice) -> String {
        let tag = self.mac(notice.code()).finalize().into_bytes();
        format!("{}.{}", notice.code(), hex::encode(&tag[..TAG_BYTES]))
    }

    pub fn verify(&self, value: &str) -> Option<Notice> {
        let (code, tag) = value.split_once('.')?;
        let tag = hex::decode(tag).ok()?;
        if tag.len() != TAG_BYTES {
            return None;
        }
        self.mac(code).verify_truncated_left(&tag).ok()?;
        Notice::from_code(code)
    }
}

/// Request-side view of the flash cookie.
pub struct Flash {
    key: FlashKey,
    notice: Option<Notice>,
    had_cookie: bool,
}

impl Flash {
    pub fn banner(&self) -> Option<Banner> {
        self.notice.map(Notice::banner)
    }

    /// Renders a page and clears whatever flash cookie the request carried.
    pub fn respond(self, status: StatusCode, html: String) -> Response {
        let mut response = page(status, html);
        if self.had_cookie {
            response.headers_mut().append(
                header::SET_COOKIE,
                HeaderValue::from_static("flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
            );
        }
        response
    }

    /// 303 redirect that leaves `notice` for the next page.
    pub fn redirect(self, to: &str, notice: Notice) -> Response {
        let mut response = Redirect::to(to).into_response();
        let cookie = format!(
            "{FLASH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            self.key.sign(notice)
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        response
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = cookie_value(&parts.headers, FLASH_COOKIE);
        let notice = raw.as_deref().and_then(|v| state.flash_key.verify(v));
        Ok(Flash {
            key: state.flash_key.clone(),
            notice,
            had_cookie: raw.is_some_and(|v| !v.is_empty()),
        })
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_notice_verifies() {
        let key = FlashKey::new("secret");
        let value = key.sign(Notice::EventCreated);
        assert!(value.starts_with("event-created."));
        assert_eq!(key.verify(&value), Some(Notice::EventCreated));
    }

    #[test]
    fn test_tampered_or_foreign_cookie_rejected() {
        let key = FlashKey::new("secret");
        let value = key.sign(Notice::EventDeleted);
        let forged = value.replace("event-deleted", "event-created");
        assert_eq!(key.verify(&forged), None);
        assert_eq!(FlashKey::new("other").verify(&value), None);
        assert_eq!(key.verify("garbage"), None);
        assert_eq!(key.verify("event-created.zz"), None);
    }

    #[test]
    fn test_tag_is_truncated_hmac() {
        let key = FlashKey::new("secret");
        let value = key.sign(Notice::EventCreated);
        let (_, tag) = value.split_once('.').unwrap();
        assert_eq!(tag.len(), TAG_BYTES * 2);

        let shortened = &value[..value.len() - 2];
        assert_eq!(key.verify(shortened), None);

        let empty = FlashKey::new("");
        let value = empty.sign(Notice::EventDeleted);
        assert_eq!(empty.verify(&value), Some(Notice::EventDeleted));
    }

    #[test]
    fn test_every_code_parses_back() {
        for notice in ALL_NOTICES {
            assert_eq!(Notice::from_code(notice.code()), Some(notice));
        }
    }

    #[test]
    fn test_cookie_value_finds_named_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; flash=abc.def"),
        );
        assert_eq!(cookie_value(&headers, "flash").as_deref(), Some("abc.def"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }
}
