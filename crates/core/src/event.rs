//! 이벤트 레코드: 파이프라인을 흐르는 기본 데이터 단위
//!
//! [`LogEvent`]는 입력 소스에서 생성되어 각 스테이지를 거치며 제자리에서 변경되고,
//! 출력 싱크에서 소비될 때 수명이 끝납니다.
//!
//! 모든 스테이지 입출력은 필드 이름으로 `extra` 맵을 읽고 씁니다.
//! 필드 조회는 키가 없거나 타입이 달라도 실패하지 않습니다 (빈 값/`None` 반환).
//!
//! # 예약 필드
//! 필드 이름 [`MESSAGE_FIELD`](`"message"`)는 `extra`가 아니라 이벤트 본문
//! [`LogEvent::message`]를 가리킵니다 (`get_str`, `set`, `remove`, `contains`).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::SystemTime;

use serde::Serialize;

use crate::value::Value;

/// 이벤트 본문을 가리키는 예약 필드명
pub const MESSAGE_FIELD: &str = "message";

/// 파이프라인 이벤트 레코드
#[derive(Debug, Clone, Serialize)]
pub struct LogEvent {
    /// 이벤트가 나타내는 시각 (기본값: 생성 시각)
    pub timestamp: SystemTime,
    /// 자유 텍스트 본문
    pub message: Option<String>,
    /// 출처/결과 표식 (중복 없음, 순서 무관)
    pub tags: BTreeSet<String>,
    /// 필드명 → 값
    pub extra: HashMap<String, Value>,
}

impl LogEvent {
    /// 현재 시각으로 빈 이벤트를 생성합니다.
    pub fn new() -> Self {
        Self {
            timestamp: SystemTime::now(),
            message: None,
            tags: BTreeSet::new(),
            extra: HashMap::new(),
        }
    }

    /// 본문을 가진 이벤트를 생성합니다.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new()
        }
    }

    /// `extra` 필드를 조회합니다. 없으면 `None`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.extra.get(field)
    }

    /// 문자열 필드를 조회합니다.
    ///
    /// 필드가 없거나 문자열이 아니면 빈 문자열을 반환합니다.
    pub fn get_str(&self, field: &str) -> &str {
        if field == MESSAGE_FIELD {
            return self.message.as_deref().unwrap_or_default();
        }
        self.extra
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// 문자열 필드를 `Option`으로 조회합니다.
    ///
    /// 빈 문자열과 "없음"을 구분해야 할 때 사용합니다.
    pub fn get_opt_str(&self, field: &str) -> Option<&str> {
        if field == MESSAGE_FIELD {
            return self.message.as_deref();
        }
        self.extra.get(field).and_then(Value::as_str)
    }

    /// 맵 필드에서 문자열 항목만 추출합니다.
    ///
    /// 필드가 없거나 맵이 아니면 빈 맵을 반환하며, 문자열이 아닌 항목은 건너뜁니다.
    pub fn get_string_map(&self, field: &str) -> BTreeMap<String, String> {
        self.extra
            .get(field)
            .and_then(Value::as_map)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_owned())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 필드 값을 설정합니다. 기존 값은 덮어씁니다.
    ///
    /// `message` 필드에 문자열이 아닌 값을 설정하면 `Display` 표현이 저장됩니다.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let field = field.into();
        let value = value.into();
        if field == MESSAGE_FIELD {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
            return;
        }
        self.extra.insert(field, value);
    }

    /// 필드를 제거하고 이전 값을 반환합니다.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        if field == MESSAGE_FIELD {
            return self.message.take().map(Value::String);
        }
        self.extra.remove(field)
    }

    /// 필드 존재 여부
    pub fn contains(&self, field: &str) -> bool {
        if field == MESSAGE_FIELD {
            return self.message.is_some();
        }
        self.extra.contains_key(field)
    }

    /// 태그를 추가합니다. 이미 있으면 무시됩니다.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// 태그 존재 여부
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

impl Default for LogEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LogEvent[{}] fields={} tags={}",
            unix_timestamp_str(self.timestamp),
            self.extra.len(),
            self.tags.len(),
        )
    }
}

/// SystemTime을 사람이 읽을 수 있는 형태로 변환합니다.
fn unix_timestamp_str(time: SystemTime) -> String {
    match time.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => {
            let secs = duration.as_secs();
            format!("{secs}")
        }
        Err(_) => "unknown".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_is_absent_not_error() {
        let event = LogEvent::new();
        assert!(event.get("nope").is_none());
        assert_eq!(event.get_str("nope"), "");
        assert!(event.get_string_map("nope").is_empty());
        assert!(!event.contains("nope"));
    }

    #[test]
    fn wrong_type_is_treated_as_absent() {
        let mut event = LogEvent::new();
        event.set("n", 5i64);
        assert_eq!(event.get_str("n"), "");
        assert!(event.get_opt_str("n").is_none());
        assert!(event.get_string_map("n").is_empty());
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut event = LogEvent::new();
        event.set("url", "a");
        event.set("url", "b");
        assert_eq!(event.get_str("url"), "b");
    }

    #[test]
    fn message_field_routes_to_payload() {
        let mut event = LogEvent::with_message("hello");
        assert_eq!(event.get_str(MESSAGE_FIELD), "hello");
        assert!(event.contains(MESSAGE_FIELD));
        assert!(event.extra.is_empty());

        event.set(MESSAGE_FIELD, "changed");
        assert_eq!(event.message.as_deref(), Some("changed"));

        let removed = event.remove(MESSAGE_FIELD);
        assert_eq!(removed, Some(Value::from("changed")));
        assert!(event.message.is_none());
        assert!(!event.contains(MESSAGE_FIELD));
    }

    #[test]
    fn string_map_skips_non_string_entries() {
        let mut map = BTreeMap::new();
        map.insert("X-Request".to_owned(), Value::from("test"));
        map.insert("X-Count".to_owned(), Value::from(3i64));
        let mut event = LogEvent::new();
        event.set("headers", map);

        let headers = event.get_string_map("headers");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers["X-Request"], "test");
    }

    #[test]
    fn tags_suppress_duplicates() {
        let mut event = LogEvent::new();
        event.add_tag("err");
        event.add_tag("err");
        event.add_tag("other");
        assert_eq!(event.tags.len(), 2);
        assert!(event.has_tag("err"));
    }

    #[test]
    fn remove_returns_previous_value() {
        let mut event = LogEvent::new();
        event.set("size", 10i64);
        assert_eq!(event.remove("size"), Some(Value::Integer(10)));
        assert!(event.remove("size").is_none());
    }

    #[test]
    fn display_contains_counts() {
        let mut event = LogEvent::new();
        event.set("a", 1i64);
        event.add_tag("t");
        let display = event.to_string();
        assert!(display.contains("fields=1"));
        assert!(display.contains("tags=1"));
    }

    #[test]
    fn events_are_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<LogEvent>();
    }
}
